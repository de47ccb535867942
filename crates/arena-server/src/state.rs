use arena_core::config::ArenaConfig;
use arena_core::engine::generation::ResponseGenerator;
use arena_core::engine::Orchestrator;
use arena_core::redaction::RedactionPolicy;
use arena_core::storage::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Applied to assistant keys in `/random_prompts`.
    pub redaction: RedactionPolicy,
}

impl AppState {
    pub fn new(store: Store, cfg: &ArenaConfig) -> Self {
        let generator = ResponseGenerator::from_settings(&cfg.generation);
        Self::with_generator(store, cfg, generator)
    }

    pub fn with_generator(store: Store, cfg: &ArenaConfig, generator: ResponseGenerator) -> Self {
        Self {
            orchestrator: Arc::new(Orchestrator::new(store, cfg, Some(generator))),
            redaction: RedactionPolicy::new(!cfg.generation.expose_assistant_keys),
        }
    }
}
