/// Config schema types (providers directory, per-provider settings, installer).
use std::{collections::BTreeMap, path::PathBuf};

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    pub providers: ProvidersConfig,
    pub installer: InstallerConfig,
}

/// Where provider files live and how they are recognised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Directory scanned for provider files, relative to the working directory
    /// unless absolute.
    pub dir: PathBuf,
    /// File extension (without the dot) that marks a provider file.
    pub extension: String,
    /// Stem of the package-init file, which is never treated as a provider.
    pub init_stem: String,
    /// Per-provider keyword arguments, keyed by provider identifier.
    ///
    /// ```toml
    /// [providers.settings.openai]
    /// api_key = "${OPENAI_API_KEY}"
    /// model = "gpt-4o"
    /// ```
    pub settings: BTreeMap<String, Map<String, Value>>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("providers"),
            extension: "toml".into(),
            init_stem: "mod".into(),
            settings: BTreeMap::new(),
        }
    }
}

impl ProvidersConfig {
    /// Settings for one provider. Lookup is case-insensitive on the identifier;
    /// an all-lowercase key wins over other spellings, then key order decides.
    pub fn settings_for(&self, name: &str) -> Map<String, Value> {
        let name = name.to_lowercase();
        self.settings
            .get(&name)
            .or_else(|| {
                self.settings
                    .iter()
                    .find(|(key, _)| key.to_lowercase() == name)
                    .map(|(_, settings)| settings)
            })
            .cloned()
            .unwrap_or_default()
    }
}

/// External package installer invoked during provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub program: String,
    /// Arguments placed before the requirement on install.
    pub install_args: Vec<String>,
    /// Arguments that make the program print installed packages as
    /// `name==version` lines.
    pub list_args: Vec<String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            program: "pip".into(),
            install_args: vec!["install".into()],
            list_args: vec!["list".into(), "--format=freeze".into()],
        }
    }
}
