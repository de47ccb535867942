//! Assistant-backed origins: `{assistant_id, assistant_version, api_key,
//! prompt, use_case} -> response`.

use crate::model::Assistant;
use crate::redaction::secret_fingerprint;
use async_trait::async_trait;
use serde_json::json;

#[async_trait]
pub trait AssistantClient: Send + Sync {
    async fn invoke(
        &self,
        assistant: &Assistant,
        prompt: &str,
        use_case: &str,
    ) -> anyhow::Result<String>;
}

pub struct HttpAssistantClient {
    pub endpoint: String,
    pub client: reqwest::Client,
}

impl HttpAssistantClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AssistantClient for HttpAssistantClient {
    async fn invoke(
        &self,
        assistant: &Assistant,
        prompt: &str,
        use_case: &str,
    ) -> anyhow::Result<String> {
        tracing::debug!(
            event = "assistant_invoke",
            origin = %assistant.origin,
            assistant_id = %assistant.assistant_id,
            key = %secret_fingerprint(&assistant.api_key),
        );

        let body = json!({
            "assistant_id": assistant.assistant_id,
            "assistant_version": assistant.assistant_version,
            "prompt": prompt,
            "use_case": use_case,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", assistant.api_key))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("assistant API error ({}): {}", status, error_text);
        }

        let json: serde_json::Value = resp.json().await?;
        let text = json
            .pointer("/response")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("assistant response missing 'response'"))?
            .to_string();
        Ok(text)
    }
}

/// Offline assistant that answers with its id and the query.
#[derive(Debug, Clone, Default)]
pub struct EchoAssistant;

#[async_trait]
impl AssistantClient for EchoAssistant {
    async fn invoke(
        &self,
        assistant: &Assistant,
        prompt: &str,
        _use_case: &str,
    ) -> anyhow::Result<String> {
        Ok(format!(
            "[{}@{}] {}",
            assistant.assistant_id, assistant.assistant_version, prompt
        ))
    }
}
