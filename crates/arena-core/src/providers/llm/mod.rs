use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
}

/// Text completion `{model, prompt} -> response` for prompt-backed origins.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> anyhow::Result<LlmResponse>;
    fn provider_name(&self) -> &'static str;
}

pub mod fake;
pub mod openai;
