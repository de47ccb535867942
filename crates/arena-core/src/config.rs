use crate::errors::ConfigError;
use crate::matchmaker::Strategy;
use crate::rating::{DEFAULT_BASELINE, DEFAULT_K_FACTOR};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArenaConfig {
    #[serde(default = "default_version", alias = "configVersion")]
    pub version: u32,
    #[serde(default)]
    pub rating: RatingSettings,
    #[serde(default)]
    pub rounds: RoundSettings,
    #[serde(default)]
    pub matchmaking: MatchmakingSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            rating: RatingSettings::default(),
            rounds: RoundSettings::default(),
            matchmaking: MatchmakingSettings::default(),
            generation: GenerationSettings::default(),
        }
    }
}

fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingSettings {
    #[serde(default = "default_k_factor")]
    pub k_factor: f64,
    #[serde(default = "default_baseline")]
    pub baseline: f64,
    /// Also keep a separate rating table per use case.
    #[serde(default = "default_true")]
    pub per_use_case: bool,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
            baseline: DEFAULT_BASELINE,
            per_use_case: true,
        }
    }
}

fn default_k_factor() -> f64 {
    DEFAULT_K_FACTOR
}

fn default_baseline() -> f64 {
    DEFAULT_BASELINE
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundSettings {
    /// Inactivity window after which an unvoted round is abandoned.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// How long a finalized round is remembered so a repeat vote is reported
    /// as already voted.
    #[serde(default = "default_tombstone")]
    pub tombstone_seconds: u64,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            tombstone_seconds: default_tombstone(),
        }
    }
}

impl RoundSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }

    pub fn tombstone(&self) -> Duration {
        Duration::from_secs(self.tombstone_seconds)
    }
}

fn default_ttl() -> u64 {
    900
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_tombstone() -> u64 {
    3600
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchmakingSettings {
    #[serde(default)]
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationSettings {
    #[serde(default = "default_generation_timeout")]
    pub timeout_seconds: u64,
    /// Include assistant API keys in `/random_prompts` payloads. Only needed
    /// when the client generates responses itself.
    #[serde(default)]
    pub expose_assistant_keys: bool,
    #[serde(default)]
    pub completion: CompletionSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant: Option<AssistantSettings>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_generation_timeout(),
            expose_assistant_keys: false,
            completion: CompletionSettings::default(),
            assistant: None,
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_generation_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionSettings {
    /// openai | fake
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Fixed model for every prompt origin. When unset the origin name is
    /// used as the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    512
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantSettings {
    pub endpoint: String,
}

pub fn load_config(path: &Path, strict: bool) -> Result<ArenaConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw, strict)
        .map_err(|ConfigError(msg)| ConfigError(format!("{} (file: {})", msg, path.display())))
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<ArenaConfig, ConfigError> {
    if !path.exists() {
        tracing::info!(event = "config_default", path = %path.display());
        return Ok(ArenaConfig::default());
    }
    load_config(path, false)
}

pub fn parse_config(raw: &str, strict: bool) -> Result<ArenaConfig, ConfigError> {
    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);

    let cfg: ArenaConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    let meaningful_unknowns: Vec<_> = ignored_keys
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();

    if !meaningful_unknowns.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "Unknown fields detected in strict mode: {:?}",
                meaningful_unknowns
            )));
        }
        tracing::warn!(event = "config_unknown_fields", fields = ?meaningful_unknowns);
    }

    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &ArenaConfig) -> Result<(), ConfigError> {
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    if !cfg.rating.k_factor.is_finite() || cfg.rating.k_factor <= 0.0 {
        return Err(ConfigError(format!(
            "rating.k_factor must be a positive number, got {}",
            cfg.rating.k_factor
        )));
    }
    if !cfg.rating.baseline.is_finite() {
        return Err(ConfigError("rating.baseline must be finite".into()));
    }
    if cfg.rounds.ttl_seconds == 0 {
        return Err(ConfigError("rounds.ttl_seconds must be > 0".into()));
    }
    match cfg.generation.completion.provider.as_str() {
        "openai" | "fake" => {}
        other => {
            return Err(ConfigError(format!(
                "unknown completion provider '{}' (expected openai|fake)",
                other
            )))
        }
    }
    Ok(())
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError(format!("failed to create {}: {}", parent.display(), e)))?;
    }
    std::fs::write(
        path,
        r#"version: 1
rating:
  k_factor: 32
  baseline: 1000
  per_use_case: true
rounds:
  ttl_seconds: 900
  sweep_interval_seconds: 30
  tombstone_seconds: 3600
matchmaking:
  strategy: uniform   # uniform | play_count_weighted
generation:
  timeout_seconds: 60
  expose_assistant_keys: false
  completion:
    provider: openai  # openai | fake
    base_url: https://api.openai.com
    api_key_env: OPENAI_API_KEY
    model: gpt-4o-mini
    max_tokens: 512
  # assistant:
  #   endpoint: http://localhost:9000/invoke
"#,
    )
    .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}
