use crate::config::GenerationSettings;
use crate::engine::round::SlotResponse;
use crate::errors::ArenaError;
use crate::model::Candidate;
use crate::providers::assistant::{AssistantClient, EchoAssistant, HttpAssistantClient};
use crate::providers::llm::fake::FakeClient;
use crate::providers::llm::openai::OpenAIClient;
use crate::providers::llm::LlmClient;
use std::sync::Arc;
use std::time::Duration;

/// Produces both sides of a round through the external collaborators.
///
/// A failing or slow side never fails the round: it comes back as a
/// degraded [`SlotResponse`].
pub struct ResponseGenerator {
    llm: Arc<dyn LlmClient>,
    assistant: Option<Arc<dyn AssistantClient>>,
    model_override: Option<String>,
    timeout: Duration,
}

impl ResponseGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        assistant: Option<Arc<dyn AssistantClient>>,
        model_override: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            assistant,
            model_override,
            timeout,
        }
    }

    pub fn from_settings(settings: &GenerationSettings) -> Self {
        let completion = &settings.completion;
        let (llm, assistant): (Arc<dyn LlmClient>, Option<Arc<dyn AssistantClient>>) =
            match completion.provider.as_str() {
                "fake" => (
                    Arc::new(FakeClient::new()) as Arc<dyn LlmClient>,
                    Some(Arc::new(EchoAssistant) as Arc<dyn AssistantClient>),
                ),
                _ => {
                    let api_key = std::env::var(&completion.api_key_env).unwrap_or_default();
                    if api_key.is_empty() {
                        tracing::warn!(
                            event = "completion_key_missing",
                            env = %completion.api_key_env,
                            "server-side generation will return degraded responses"
                        );
                    }
                    let llm = OpenAIClient::new(
                        completion.base_url.clone(),
                        api_key,
                        completion.temperature,
                        completion.max_tokens,
                    );
                    let assistant = settings.assistant.as_ref().map(|a| {
                        Arc::new(HttpAssistantClient::new(a.endpoint.clone()))
                            as Arc<dyn AssistantClient>
                    });
                    (Arc::new(llm) as Arc<dyn LlmClient>, assistant)
                }
            };
        Self::new(llm, assistant, completion.model.clone(), settings.timeout())
    }

    pub async fn generate(
        &self,
        slot: char,
        candidate: &Candidate,
        query: &str,
    ) -> SlotResponse {
        let call = async {
            match candidate {
                Candidate::Prompt(p) => {
                    let model = self.model_override.as_deref().unwrap_or(&p.origin);
                    self.llm
                        .complete(model, &p.render(query))
                        .await
                        .map(|r| r.text)
                }
                Candidate::Assistant(a) => match &self.assistant {
                    Some(client) => client.invoke(a, query, &a.use_case).await,
                    None => Err(anyhow::anyhow!("no assistant endpoint configured")),
                },
            }
        };

        let message = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => return SlotResponse::ok(text),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {}s", self.timeout.as_secs_f64()),
        };

        let err = ArenaError::Generation { slot, message };
        let provider = if candidate.is_assistant() {
            "assistant"
        } else {
            self.llm.provider_name()
        };
        tracing::warn!(
            event = "generation_degraded",
            slot = %slot,
            origin = candidate.origin(),
            provider = provider,
            error = %err,
        );
        SlotResponse::degraded(err.to_string())
    }

    /// Both sides run concurrently.
    pub async fn generate_pair(
        &self,
        a: &Candidate,
        b: &Candidate,
        query: &str,
    ) -> (SlotResponse, SlotResponse) {
        tokio::join!(self.generate('A', a, query), self.generate('B', b, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assistant, Prompt};

    fn prompt(origin: &str) -> Candidate {
        Candidate::Prompt(Prompt {
            origin: origin.into(),
            use_case: "search".into(),
            version: 1,
            template: "Search: {query}".into(),
        })
    }

    #[tokio::test]
    async fn test_renders_template_with_origin_as_model() {
        let gen = ResponseGenerator::new(
            Arc::new(FakeClient::new()),
            None,
            None,
            Duration::from_secs(5),
        );
        let r = gen.generate('A', &prompt("gpt-4o"), "shoes").await;
        assert_eq!(r, SlotResponse::ok("[gpt-4o] Search: shoes"));
    }

    #[tokio::test]
    async fn test_model_override() {
        let gen = ResponseGenerator::new(
            Arc::new(FakeClient::new()),
            None,
            Some("fixed".into()),
            Duration::from_secs(5),
        );
        let r = gen.generate('A', &prompt("gpt-4o"), "shoes").await;
        assert_eq!(r.text, "[fixed] Search: shoes");
    }

    #[tokio::test]
    async fn test_failure_and_timeout_degrade_one_side_only() {
        let gen = ResponseGenerator::new(
            Arc::new(FakeClient::new().failing_for("bad")),
            None,
            None,
            Duration::from_secs(5),
        );
        let (a, b) = gen.generate_pair(&prompt("bad"), &prompt("good"), "q").await;
        assert!(a.degraded);
        assert!(a.error.unwrap().contains("slot A"));
        assert!(!b.degraded);

        let slow = ResponseGenerator::new(
            Arc::new(FakeClient::new().with_delay(Duration::from_millis(500))),
            None,
            None,
            Duration::from_millis(20),
        );
        let r = slow.generate('B', &prompt("x"), "q").await;
        assert!(r.degraded);
        assert!(r.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_assistant_without_endpoint_is_degraded() {
        let gen = ResponseGenerator::new(
            Arc::new(FakeClient::new()),
            None,
            None,
            Duration::from_secs(5),
        );
        let asst = Candidate::Assistant(Assistant {
            origin: "Conva Assistant".into(),
            use_case: "search".into(),
            version: 1,
            assistant_id: "a1".into(),
            assistant_version: "v2".into(),
            api_key: "secret".into(),
        });
        let r = gen.generate('A', &asst, "q").await;
        assert!(r.degraded);

        let gen = ResponseGenerator::new(
            Arc::new(FakeClient::new()),
            Some(Arc::new(EchoAssistant)),
            None,
            Duration::from_secs(5),
        );
        let r = gen.generate('A', &asst, "q").await;
        assert_eq!(r.text, "[a1@v2] q");
    }
}
