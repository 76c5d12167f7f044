//! Provider file contents.
//!
//! A provider file may be empty. When it has content it is parsed according to
//! its extension:
//! ```text
//! description = "Local llama.cpp server"
//! requirements = ["llama-cpp-python"]
//!
//! [defaults]
//! base_url = "http://127.0.0.1:8080"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    factory::ProviderOptions,
};

/// Parsed provider file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderManifest {
    pub description: Option<String>,
    /// Packages required in addition to the ones the instance declares.
    pub requirements: Vec<String>,
    /// Option defaults applied beneath caller-supplied arguments.
    pub defaults: ProviderOptions,
}

impl ProviderManifest {
    /// Read and parse a provider file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw, path)
    }

    /// Parse provider file content; the format follows `path`'s extension.
    pub fn parse(raw: &str, path: &Path) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let parsed = match ext {
            "toml" => toml::from_str(raw).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(raw).map_err(|e| e.to_string()),
            other => Err(format!("unsupported provider file format: .{other}")),
        };
        parsed.map_err(|reason| Error::invalid_manifest(path, reason))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn empty_file_is_default() {
        let manifest = ProviderManifest::parse("\n  \n", Path::new("echo.toml")).unwrap();
        assert_eq!(manifest, ProviderManifest::default());
    }

    #[test]
    fn parses_toml() {
        let raw = r#"
description = "Local server"
requirements = ["llama-cpp-python"]

[defaults]
base_url = "http://127.0.0.1:8080"
temperature = 0.2
"#;
        let manifest = ProviderManifest::parse(raw, Path::new("llamacpp.toml")).unwrap();
        assert_eq!(manifest.description.as_deref(), Some("Local server"));
        assert_eq!(manifest.requirements, vec!["llama-cpp-python"]);
        assert_eq!(manifest.defaults["base_url"], json!("http://127.0.0.1:8080"));
        assert_eq!(manifest.defaults["temperature"], json!(0.2));
    }

    #[test]
    fn parses_yaml_and_json() {
        let yaml = ProviderManifest::parse("requirements: [torch]\n", Path::new("x.yaml")).unwrap();
        assert_eq!(yaml.requirements, vec!["torch"]);

        let json = ProviderManifest::parse(r#"{"defaults":{"model":"m"}}"#, Path::new("x.json"))
            .unwrap();
        assert_eq!(json.defaults["model"], json!("m"));
    }

    #[test]
    fn invalid_content_names_the_file() {
        let err = ProviderManifest::parse("requirements = 3", Path::new("/p/bad.toml")).unwrap_err();
        match err {
            Error::InvalidManifest { path, .. } => assert_eq!(path, Path::new("/p/bad.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
