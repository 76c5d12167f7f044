//! Factories: the "configurable provider" capability.
//!
//! A factory describes a provider's constructor. Its options are the fields of
//! a typed config struct, `Default` supplies the defaults and a
//! `#[serde(flatten)]` map catches any extra keyword arguments:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! #[serde(default)]
//! struct AcmeConfig {
//!     api_key: String,            // default from `Default`
//!     model: Option<String>,      // no default, reported as null
//!     #[serde(flatten)]
//!     extra: Map<String, Value>,  // catch-all, never reported
//! }
//! ```

use std::marker::PhantomData;

use {
    serde::{Serialize, de::DeserializeOwned},
    serde_json::{Map, Value},
};

use crate::{
    error::{Error, Result},
    provider::Provider,
};

/// Option name → default value (`null` when the option has no default).
pub type ProviderOptions = Map<String, Value>;

/// Builds provider instances from keyword arguments.
pub trait ProviderFactory: Send + Sync {
    /// Identifier the factory is registered under. Lower-case.
    fn id(&self) -> &str;

    /// Declared options with their defaults, excluding the catch-all.
    fn defaults(&self) -> Result<ProviderOptions>;

    /// Instantiate the provider. Keys that match no option are accepted.
    fn create(&self, args: ProviderOptions) -> Result<Box<dyn Provider>>;
}

/// Factory backed by a typed config struct `C`.
pub struct ConfigurableFactory<C> {
    id: &'static str,
    build: fn(C) -> Result<Box<dyn Provider>>,
    _config: PhantomData<fn() -> C>,
}

impl<C> ConfigurableFactory<C> {
    pub const fn new(id: &'static str, build: fn(C) -> Result<Box<dyn Provider>>) -> Self {
        Self {
            id,
            build,
            _config: PhantomData,
        }
    }
}

impl<C> ProviderFactory for ConfigurableFactory<C>
where
    C: Default + Serialize + DeserializeOwned,
{
    fn id(&self) -> &str {
        self.id
    }

    fn defaults(&self) -> Result<ProviderOptions> {
        match serde_json::to_value(C::default())? {
            Value::Object(map) => Ok(map),
            other => Err(Error::message(format!(
                "options of provider '{}' must serialize to an object, got {other}",
                self.id
            ))),
        }
    }

    fn create(&self, args: ProviderOptions) -> Result<Box<dyn Provider>> {
        let config: C =
            serde_json::from_value(Value::Object(args)).map_err(|source| Error::InvalidOptions {
                name: self.id.to_string(),
                source,
            })?;
        (self.build)(config)
    }
}
