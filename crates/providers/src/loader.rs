//! Loading providers by identifier and wrapping them in a [`ProviderHandle`].

use std::{ops::Deref, path::Path, sync::Arc};

use {
    serde_json::Value,
    tessera_config::ProvidersConfig,
    tracing::{debug, info},
};

use crate::{
    catalog::ProviderCatalog,
    discover::ProviderDir,
    error::{Error, Result},
    factory::{ProviderFactory, ProviderOptions},
    install::{PackageInstaller, ProvisionPlan, ProvisionReport, Provisioner},
    manifest::ProviderManifest,
    provider::{Provider, provider_type_name},
};

/// Resolves provider identifiers against a catalog and a provider directory.
#[derive(Debug, Clone)]
pub struct ProviderLoader {
    catalog: ProviderCatalog,
    dir: ProviderDir,
}

impl ProviderLoader {
    pub fn new(catalog: ProviderCatalog, dir: ProviderDir) -> Self {
        Self { catalog, dir }
    }

    pub fn from_config(catalog: ProviderCatalog, config: &ProvidersConfig) -> Self {
        Self::new(catalog, ProviderDir::from_config(config))
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn dir(&self) -> &ProviderDir {
        &self.dir
    }

    /// Identifiers of the provider files in the provider directory.
    pub fn available(&self) -> Vec<String> {
        self.dir.discover()
    }

    /// The provider's file, parsed.
    pub fn manifest(&self, name: &str) -> Result<ProviderManifest> {
        let path = self
            .dir
            .file_for(name)
            .ok_or_else(|| Error::not_found(name))?;
        ProviderManifest::load(&path)
    }

    /// A provider resolves only when it has a file in the provider directory
    /// and a factory in the catalog.
    fn resolve(&self, name: &str) -> Result<(Arc<dyn ProviderFactory>, ProviderManifest)> {
        let manifest = self.manifest(name)?;
        let factory = self.catalog.get(name)?;
        Ok((factory, manifest))
    }

    /// Options with defaults, including defaults from the provider file, and a
    /// `"provider"` entry.
    pub fn options(&self, name: &str) -> Result<ProviderOptions> {
        let (_, manifest) = self.resolve(name)?;
        let mut options = self.catalog.options(name)?;
        for (key, value) in manifest.defaults {
            if key != "provider" {
                options.insert(key, value);
            }
        }
        Ok(options)
    }

    /// Instantiate a provider with keyword arguments.
    ///
    /// Construction never installs anything; see [`ProviderHandle::provision`].
    pub fn load(&self, name: &str, args: ProviderOptions) -> Result<ProviderHandle> {
        let id = name.to_lowercase();
        let (factory, manifest) = self.resolve(name)?;

        let mut merged = manifest.defaults;
        merged.extend(args);
        merged.remove("provider");

        debug!(provider = %id, type_name = %provider_type_name(&id), "instantiating provider");
        let instance = factory.create(merged)?;

        let mut requirements = instance.requirements();
        for requirement in manifest.requirements {
            if !requirements.contains(&requirement) {
                requirements.push(requirement);
            }
        }

        info!(provider = %id, requirements = requirements.len(), "provider loaded");
        Ok(ProviderHandle {
            name: id,
            instance,
            requirements,
        })
    }
}

/// A loaded provider.
///
/// Derefs to the wrapped `dyn Provider`, so provider methods can be called on
/// the handle directly. [`ProviderHandle::attribute`] answers `"provider"`
/// itself and forwards every other name to the instance.
pub struct ProviderHandle {
    name: String,
    instance: Box<dyn Provider>,
    requirements: Vec<String>,
}

impl ProviderHandle {
    /// Identifier the handle was loaded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requirements of the instance plus those from the provider file.
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    pub fn attribute(&self, key: &str) -> Option<Value> {
        match key {
            "provider" => Some(Value::String(self.name.clone())),
            _ => self.instance.attribute(key),
        }
    }

    /// Which requirements are missing from the environment.
    pub async fn plan(&self, installer: &dyn PackageInstaller) -> Result<ProvisionPlan> {
        Provisioner::new(installer).plan(&self.requirements).await
    }

    /// Install missing requirements through `installer`.
    pub async fn provision(&self, installer: &dyn PackageInstaller) -> Result<ProvisionReport> {
        Provisioner::new(installer)
            .provision(&self.requirements)
            .await
    }
}

impl Deref for ProviderHandle {
    type Target = dyn Provider;

    fn deref(&self) -> &Self::Target {
        self.instance.as_ref()
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("name", &self.name)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

/// Identifiers of the provider files under `dir` with the default layout.
pub fn available_providers(dir: &Path) -> Vec<String> {
    let defaults = ProvidersConfig::default();
    ProviderDir::new(dir, defaults.extension, defaults.init_stem).discover()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::{Map, json},
    };

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "").unwrap();
    }

    fn loader_in(dir: &Path) -> ProviderLoader {
        ProviderLoader::new(
            ProviderCatalog::with_builtins(),
            ProviderDir::new(dir, "toml", "mod"),
        )
    }

    #[test]
    fn manifest_defaults_overlay_options() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("ollama.toml"),
            "[defaults]\nmodel = \"mistral\"\nprovider = \"ignored\"\n",
        )
        .unwrap();

        let options = loader_in(tmp.path()).options("ollama").unwrap();
        assert_eq!(options["model"], json!("mistral"));
        assert_eq!(options["provider"], json!("ollama"));
    }

    #[test]
    fn caller_arguments_win_over_manifest_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("echo.toml"),
            "requirements = [\"tiktoken\"]\n[defaults]\nprefix = \"from-file\"\n",
        )
        .unwrap();
        let loader = loader_in(tmp.path());

        let handle = loader.load("echo", Map::new()).unwrap();
        assert_eq!(handle.attribute("prefix"), Some(json!("from-file")));
        assert_eq!(handle.requirements(), ["tiktoken"]);

        let handle = loader
            .load("echo", args(json!({ "prefix": "from-caller" })))
            .unwrap();
        assert_eq!(handle.attribute("prefix"), Some(json!("from-caller")));
    }

    #[test]
    fn requirements_merge_without_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("echo.toml"),
            "requirements = [\"numpy\", \"torch\"]\n",
        )
        .unwrap();

        let handle = loader_in(tmp.path())
            .load("Echo", args(json!({ "requirements": ["numpy"] })))
            .unwrap();
        assert_eq!(handle.name(), "echo");
        assert_eq!(handle.requirements(), ["numpy", "torch"]);
    }

    #[test]
    fn unknown_provider_names_request() {
        let tmp = tempfile::tempdir().unwrap();
        let err = loader_in(tmp.path()).load("Bard", Map::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref name } if name == "Bard"));
        assert!(err.to_string().contains("Bard"));
    }

    #[test]
    fn broken_manifest_fails_load() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("echo.toml"), "requirements = 1").unwrap();
        let err = loader_in(tmp.path()).load("echo", Map::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidManifest { .. }));
    }

    #[test]
    fn registered_provider_without_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "echo.toml");
        let loader = loader_in(tmp.path());

        let err = loader.load("OpenAI", Map::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref name } if name == "OpenAI"));
        assert!(matches!(
            loader.options("openai").unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(loader.load("echo", Map::new()).is_ok());
    }

    #[test]
    fn file_without_factory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "palm.toml");
        let loader = loader_in(tmp.path());

        assert_eq!(loader.available(), vec!["palm"]);
        let err = loader.load("palm", Map::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref name } if name == "palm"));
    }

    #[test]
    fn mixed_case_file_feeds_the_handle() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("Echo.toml"),
            "requirements = [\"torch\"]\n[defaults]\nprefix = \"file\"\n",
        )
        .unwrap();
        let loader = loader_in(tmp.path());

        assert_eq!(loader.available(), vec!["echo"]);
        for name in ["Echo", "echo"] {
            let handle = loader.load(name, Map::new()).unwrap();
            assert_eq!(handle.requirements(), ["torch"]);
            assert_eq!(handle.attribute("prefix"), Some(json!("file")));
        }
        assert_eq!(loader.options("Echo").unwrap()["prefix"], json!("file"));
    }

    #[tokio::test]
    async fn handle_delegates_to_instance() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "echo.toml");
        let handle = loader_in(tmp.path())
            .load("echo", args(json!({ "prefix": "> ", "temperature": 0.1 })))
            .unwrap();

        assert_eq!(handle.attribute("provider"), Some(json!("echo")));
        assert_eq!(handle.attribute("temperature"), Some(json!(0.1)));
        assert_eq!(handle.attribute("missing"), None);
        assert_eq!(handle.id(), "echo");
        assert_eq!(handle.instruct("hello", 0).await.unwrap(), "> hello");
    }

    #[test]
    fn available_uses_default_layout() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("mod.toml"), "").unwrap();
        std::fs::write(tmp.path().join("openai.toml"), "").unwrap();
        assert_eq!(available_providers(tmp.path()), vec!["openai"]);
    }
}
