use super::{LlmClient, LlmResponse};
use async_trait::async_trait;
use serde_json::json;

pub struct OpenAIClient {
    pub base_url: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(base_url: String, api_key: String, temperature: f32, max_tokens: u32) -> Self {
        Self {
            base_url,
            api_key,
            temperature,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, model: &str, prompt: &str) -> anyhow::Result<LlmResponse> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("chat completion API error ({}): {}", status, error_text);
        }

        let json: serde_json::Value = resp.json().await?;

        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("chat completion response missing content"))?
            .to_string();

        Ok(LlmResponse {
            text,
            provider: "openai".to_string(),
            model: model.to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
