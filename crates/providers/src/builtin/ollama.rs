//! Local Ollama server (`/api/generate`).

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value, json},
    tracing::debug,
};

use crate::{
    builtin::{check_status, shared_http_client},
    error::Result,
    factory::ConfigurableFactory,
    provider::Provider,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// Left to the server when unset.
    pub temperature: Option<f64>,
    pub requirements: Vec<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3".into(),
            temperature: None,
            requirements: Vec::new(),
        }
    }
}

pub struct OllamaProvider {
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn new(mut config: OllamaConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { config }
    }
}

pub fn factory() -> ConfigurableFactory<OllamaConfig> {
    ConfigurableFactory::new("ollama", build)
}

fn build(config: OllamaConfig) -> Result<Box<dyn Provider>> {
    Ok(Box::new(OllamaProvider::new(config)))
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl Provider for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    fn requirements(&self) -> Vec<String> {
        self.config.requirements.clone()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match serde_json::to_value(&self.config) {
            Ok(Value::Object(mut fields)) => fields.remove(name),
            _ => None,
        }
    }

    async fn instruct(&self, prompt: &str, tokens: usize) -> Result<String> {
        let mut options = Map::new();
        if tokens > 0 {
            options.insert("num_predict".into(), json!(tokens));
        }
        if let Some(temperature) = self.config.temperature {
            options.insert("temperature".into(), json!(temperature));
        }
        let body = json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": options,
        });

        debug!(model = %self.config.model, "ollama generate");
        let response = shared_http_client()
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&body)
            .send()
            .await?;
        let response: GenerateResponse = check_status(response).await?.json().await?;
        Ok(response.response)
    }
}
