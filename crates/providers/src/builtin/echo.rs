//! Offline provider that answers with the prompt itself.

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

use crate::{error::Result, factory::ConfigurableFactory, provider::Provider};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Text placed before every reply.
    pub prefix: String,
    pub requirements: Vec<String>,
    /// Any other keyword arguments, kept and exposed as attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct EchoProvider {
    config: EchoConfig,
}

impl EchoProvider {
    pub fn new(config: EchoConfig) -> Self {
        Self { config }
    }
}

pub fn factory() -> ConfigurableFactory<EchoConfig> {
    ConfigurableFactory::new("echo", build)
}

fn build(config: EchoConfig) -> Result<Box<dyn Provider>> {
    Ok(Box::new(EchoProvider::new(config)))
}

#[async_trait]
impl Provider for EchoProvider {
    fn id(&self) -> &str {
        "echo"
    }

    fn requirements(&self) -> Vec<String> {
        self.config.requirements.clone()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "prefix" => Some(Value::String(self.config.prefix.clone())),
            "requirements" => Some(Value::from(self.config.requirements.clone())),
            other => self.config.extra.get(other).cloned(),
        }
    }

    /// With `tokens > 0` only the first `tokens` words of the prompt are echoed.
    async fn instruct(&self, prompt: &str, tokens: usize) -> Result<String> {
        let body = if tokens == 0 {
            prompt.to_string()
        } else {
            prompt
                .split_whitespace()
                .take(tokens)
                .collect::<Vec<_>>()
                .join(" ")
        };
        Ok(format!("{}{body}", self.config.prefix))
    }
}
