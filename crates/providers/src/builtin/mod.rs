//! Providers shipped with the crate.

pub mod echo;
pub mod ollama;
pub mod openai;

use crate::{
    catalog::ProviderCatalog,
    error::{Error, Result},
};

/// Register every built-in provider.
pub fn register_all(catalog: &mut ProviderCatalog) {
    catalog.register(echo::factory());
    catalog.register(ollama::factory());
    catalog.register(openai::factory());
}

/// Shared HTTP client for the network providers.
pub(crate) fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}

/// Map a non-success response to [`Error::Api`].
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}
