use std::{collections::BTreeMap, sync::Arc};

use {serde_json::Value, tracing::debug};

use crate::{
    builtin,
    error::{Error, Result},
    factory::{ProviderFactory, ProviderOptions},
};

/// Startup-populated table of provider factories keyed by identifier.
#[derive(Clone, Default)]
pub struct ProviderCatalog {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderCatalog {
    /// An empty catalog. Use [`Self::with_builtins`] for the shipped providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in provider registered.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        builtin::register_all(&mut catalog);
        catalog
    }

    /// Register a factory under its lower-cased id, replacing any previous one.
    pub fn register(&mut self, factory: impl ProviderFactory + 'static) {
        let id = factory.id().to_lowercase();
        if self.factories.insert(id.clone(), Arc::new(factory)).is_some() {
            debug!(provider = %id, "replaced registered provider factory");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Resolve a factory. Lookup is case-insensitive; the error names the
    /// identifier as requested.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ProviderFactory>> {
        self.factories
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }

    /// Options of a provider with their defaults, plus a `"provider"` entry
    /// holding the lower-cased identifier.
    pub fn options(&self, name: &str) -> Result<ProviderOptions> {
        let name = name.to_lowercase();
        let mut options = self.get(&name)?.defaults()?;
        options.insert("provider".into(), Value::String(name));
        Ok(options)
    }
}

impl std::fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCatalog")
            .field("providers", &self.ids())
            .finish()
    }
}
