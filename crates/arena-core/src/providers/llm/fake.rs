use super::{LlmClient, LlmResponse};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

/// Offline completion client. Echoes the rendered prompt, optionally after a
/// delay, and fails for models listed in `failing`.
#[derive(Debug, Clone, Default)]
pub struct FakeClient {
    pub delay: Option<Duration>,
    pub failing: HashSet<String>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_for(mut self, model: &str) -> Self {
        self.failing.insert(model.to_string());
        self
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, model: &str, prompt: &str) -> anyhow::Result<LlmResponse> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.failing.contains(model) {
            anyhow::bail!("fake provider error for model {}", model);
        }
        Ok(LlmResponse {
            text: format!("[{}] {}", model, prompt),
            provider: "fake".to_string(),
            model: model.to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
