//! The provider capability every backend implements.

use {async_trait::async_trait, serde_json::Value};

use crate::error::Result;

/// A pluggable backend selected by identifier.
///
/// [`ProviderHandle`](crate::loader::ProviderHandle) derefs to `dyn Provider`,
/// so these methods are callable directly on a loaded handle.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Identifier the provider is registered under (e.g. `"openai"`).
    fn id(&self) -> &str;

    /// External package names this instance needs at runtime.
    fn requirements(&self) -> Vec<String> {
        Vec::new()
    }

    /// Read a named attribute of the instance, usually one of its options.
    ///
    /// Secrets are never returned.
    fn attribute(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Run a single prompt and return the generated text.
    ///
    /// `tokens` is an upper bound on generated tokens; `0` means the
    /// provider's own default.
    async fn instruct(&self, prompt: &str, tokens: usize) -> Result<String>;
}

/// Conventional type name for a provider identifier: first letter upper-cased,
/// the rest lower-cased, then `Provider` (`"openai"` → `"OpenaiProvider"`).
pub fn provider_type_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    let head: String = chars
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default();
    format!("{head}{}Provider", chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_capitalizes_identifier() {
        assert_eq!(provider_type_name("openai"), "OpenaiProvider");
        assert_eq!(provider_type_name("GPT4ALL"), "Gpt4allProvider");
        assert_eq!(provider_type_name(""), "Provider");
    }
}
