//! OpenAI-compatible chat completions.

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    serde_json::{Value, json},
    tracing::debug,
};

use crate::{
    builtin::{check_status, shared_http_client},
    error::{Error, Result},
    factory::ConfigurableFactory,
    provider::Provider,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub requirements: Vec<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
            temperature: 0.7,
            max_tokens: 4096,
            requirements: Vec::new(),
        }
    }
}

pub struct OpenAiProvider {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    temperature: f64,
    max_tokens: u32,
    requirements: Vec<String>,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            api_key: Secret::new(config.api_key),
            model: config.model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            requirements: config.requirements,
        }
    }
}

pub fn factory() -> ConfigurableFactory<OpenAiConfig> {
    ConfigurableFactory::new("openai", build)
}

fn build(config: OpenAiConfig) -> Result<Box<dyn Provider>> {
    Ok(Box::new(OpenAiProvider::new(config)))
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn id(&self) -> &str {
        "openai"
    }

    fn requirements(&self) -> Vec<String> {
        self.requirements.clone()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "model" => Some(json!(self.model)),
            "base_url" => Some(json!(self.base_url)),
            "temperature" => Some(json!(self.temperature)),
            "max_tokens" => Some(json!(self.max_tokens)),
            "requirements" => Some(json!(self.requirements)),
            _ => None,
        }
    }

    async fn instruct(&self, prompt: &str, tokens: usize) -> Result<String> {
        let max_tokens = if tokens > 0 {
            tokens
        } else {
            self.max_tokens as usize
        };
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": max_tokens,
        });

        debug!(model = %self.model, max_tokens, "openai chat completion");
        let response = shared_http_client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let response: ChatResponse = check_status(response).await?.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::message("openai response contained no message content"))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::factory::ProviderFactory};

    fn provider_for(server: &mockito::ServerGuard) -> OpenAiProvider {
        OpenAiProvider::new(OpenAiConfig {
            api_key: "sk-test".into(),
            base_url: format!("{}/v1/", server.url()),
            ..Default::default()
        })
    }

    #[test]
    fn defaults_are_exposed_as_options() {
        let defaults = factory().defaults().unwrap();
        assert_eq!(defaults["api_key"], json!(""));
        assert_eq!(defaults["model"], json!("gpt-4o-mini"));
        assert_eq!(defaults["max_tokens"], json!(4096));
    }

    #[test]
    fn api_key_is_never_an_attribute() {
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: "sk-secret".into(),
            ..Default::default()
        });
        assert_eq!(provider.attribute("api_key"), None);
        assert_eq!(provider.attribute("model"), Some(json!("gpt-4o-mini")));
    }

    #[tokio::test]
    async fn instruct_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 16,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{ "message": { "role": "assistant", "content": "hi there" } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let reply = provider_for(&server).instruct("hello", 16).await.unwrap();
        assert_eq!(reply, "hi there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn instruct_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let err = provider_for(&server).instruct("hello", 0).await.unwrap_err();
        match err {
            Error::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            },
            other => panic!("unexpected error: {other}"),
        }
    }
}
