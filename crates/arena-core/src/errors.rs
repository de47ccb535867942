use crate::engine::round::RoundState;

/// Failure modes of the comparison engine.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The use case has fewer than two distinct origins to compare. Retryable
    /// with another category.
    #[error("not enough candidates for use case '{use_case}': found {found} distinct origin(s), need 2")]
    NotEnoughCandidates { use_case: String, found: usize },

    #[error("unknown use case '{0}'")]
    UnknownUseCase(String),

    #[error("round {0} not found or expired")]
    RoundNotFound(String),

    #[error("round {round_id} is {state}; cannot {op}")]
    InvalidRoundState {
        round_id: String,
        state: RoundState,
        op: &'static str,
    },

    #[error("round {0} has already been voted on")]
    AlreadyVoted(String),

    #[error("invalid rating state for '{origin}': score={score}")]
    InvalidRatingState { origin: String, score: f64 },

    #[error("generation failed for slot {slot}: {message}")]
    Generation { slot: char, message: String },

    #[error("server-side generation is not configured")]
    GenerationUnavailable,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ArenaError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ArenaError::NotEnoughCandidates { .. } => "E_NOT_ENOUGH_CANDIDATES",
            ArenaError::UnknownUseCase(_) => "E_UNKNOWN_USE_CASE",
            ArenaError::RoundNotFound(_) => "E_ROUND_NOT_FOUND",
            ArenaError::InvalidRoundState { .. } => "E_INVALID_ROUND_STATE",
            ArenaError::AlreadyVoted(_) => "E_ALREADY_VOTED",
            ArenaError::InvalidRatingState { .. } => "E_INVALID_RATING_STATE",
            ArenaError::Generation { .. } => "E_GENERATION",
            ArenaError::GenerationUnavailable => "E_GENERATION_UNAVAILABLE",
            ArenaError::Storage(_) => "E_STORAGE",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ArenaError::NotEnoughCandidates { .. } | ArenaError::Generation { .. }
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(pub String);
