//! Configuration loading and `${ENV_VAR}` substitution.
//!
//! Config files: `tessera.toml`, `tessera.yaml`, `tessera.yml` or `tessera.json`,
//! searched in `./` then `~/.config/tessera/`.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{InstallerConfig, ProvidersConfig, TesseraConfig},
};
