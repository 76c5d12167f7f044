//! Provider discovery from a directory.
//!
//! Every regular file `<dir>/<name>.<extension>` names a provider, except the
//! package-init file `<dir>/<init_stem>.<extension>`. Identifiers are the
//! lower-cased file stems.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use {tessera_config::ProvidersConfig, tracing::warn};

/// A directory of provider files and the naming rules applied to it.
#[derive(Debug, Clone)]
pub struct ProviderDir {
    root: PathBuf,
    extension: String,
    init_stem: String,
}

impl ProviderDir {
    pub fn new(
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
        init_stem: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
            init_stem: init_stem.into().to_lowercase(),
        }
    }

    pub fn from_config(config: &ProvidersConfig) -> Self {
        Self::new(
            config.dir.clone(),
            config.extension.clone(),
            config.init_stem.clone(),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Identifiers of the provider files present, sorted.
    ///
    /// A missing or unreadable directory yields an empty list.
    pub fn discover(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .provider_files()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.into_iter().collect()
    }

    /// Path of the provider file for `name`, if it exists.
    ///
    /// Matching ignores case. When several files differ only by case, the
    /// all-lowercase one wins, then the first in path order.
    pub fn file_for(&self, name: &str) -> Option<PathBuf> {
        let name = name.to_lowercase();
        if name.is_empty() || name == self.init_stem {
            return None;
        }
        let exact = self.root.join(format!("{name}.{}", self.extension));
        if exact.is_file() {
            return Some(exact);
        }
        let mut candidates: Vec<PathBuf> = self
            .provider_files()
            .into_iter()
            .filter(|(stem, _)| *stem == name)
            .map(|(_, path)| path)
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }

    /// `(identifier, path)` for every provider file present.
    fn provider_files(&self) -> Vec<(String, PathBuf)> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(dir = %self.root.display(), %e, "failed to read provider entry");
                    continue;
                },
            };
            if let Some(name) = self.provider_name(&path) {
                files.push((name, path));
            }
        }
        files
    }

    fn provider_name(&self, path: &Path) -> Option<String> {
        if !path.is_file() {
            return None;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return None;
        }
        let stem = path.file_stem().and_then(|s| s.to_str())?.to_lowercase();
        (!stem.is_empty() && stem != self.init_stem).then_some(stem)
    }
}

/// Identifiers of the provider files in `dir`, excluding the init file.
pub fn discover_providers(dir: &Path, extension: &str, init_stem: &str) -> Vec<String> {
    ProviderDir::new(dir, extension, init_stem).discover()
}
