//! Offline catalog seeding from a YAML file.
//!
//! ```yaml
//! use_cases:
//!   - name: product_search
//!     prompts:
//!       - origin: gpt-4o
//!         prompt: "Suggest products for: {query}"
//!     assistants:
//!       - origin: Conva Assistant
//!         assistant_id: asst-123
//!         assistant_version: "2"
//!         assistant_apikey_env: CONVA_API_KEY
//! ```

use crate::model::{GLOBAL_SCOPE, QUERY_PLACEHOLDER};
use crate::redaction::secret_fingerprint;
use crate::storage::Store;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub use_cases: Vec<UseCaseEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UseCaseEntry {
    pub name: String,
    #[serde(default)]
    pub prompts: Vec<PromptEntry>,
    #[serde(default)]
    pub assistants: Vec<AssistantEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptEntry {
    pub origin: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantEntry {
    pub origin: String,
    pub assistant_id: String,
    pub assistant_version: String,
    #[serde(default)]
    pub assistant_apikey: Option<String>,
    /// Name of an env var holding the key, so it stays out of the file.
    #[serde(default)]
    pub assistant_apikey_env: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub use_cases_created: usize,
    pub prompts: usize,
    pub assistants: usize,
}

pub fn load_catalog(path: &Path) -> anyhow::Result<CatalogFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    let file: CatalogFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse catalog {}", path.display()))?;
    Ok(file)
}

pub fn seed_catalog(store: &Store, file: &CatalogFile) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    for uc in &file.use_cases {
        let name = uc.name.trim();
        if name.is_empty() {
            anyhow::bail!("use case name must not be empty");
        }
        if name == GLOBAL_SCOPE {
            anyhow::bail!("'{}' is reserved for the global leaderboard", GLOBAL_SCOPE);
        }
        if store.insert_use_case(name)? {
            report.use_cases_created += 1;
        }

        for p in &uc.prompts {
            if !p.prompt.contains(QUERY_PLACEHOLDER) {
                tracing::warn!(
                    event = "prompt_without_placeholder",
                    origin = %p.origin,
                    use_case = name,
                );
            }
            let saved = store.insert_prompt(name, &p.origin, &p.prompt)?;
            tracing::info!(
                event = "prompt_seeded",
                origin = %saved.origin,
                use_case = name,
                version = saved.version,
            );
            report.prompts += 1;
        }

        for a in &uc.assistants {
            let key = match (&a.assistant_apikey, &a.assistant_apikey_env) {
                (Some(k), _) => k.clone(),
                (None, Some(env)) => std::env::var(env)
                    .with_context(|| format!("assistant '{}': env var {} not set", a.origin, env))?,
                (None, None) => anyhow::bail!(
                    "assistant '{}' needs assistant_apikey or assistant_apikey_env",
                    a.origin
                ),
            };
            let saved = store.insert_assistant(
                name,
                &a.origin,
                &a.assistant_id,
                &a.assistant_version,
                &key,
            )?;
            tracing::info!(
                event = "assistant_seeded",
                origin = %saved.origin,
                use_case = name,
                version = saved.version,
                key = %secret_fingerprint(&key),
            );
            report.assistants += 1;
        }
    }

    Ok(report)
}
