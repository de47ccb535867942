use crate::errors::ArenaError;
use crate::model::{Candidate, Outcome, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Text shown to the voter when a collaborator failed for one side.
pub const DEGRADED_PLACEHOLDER: &str = "(no response: generation failed)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundState {
    Open,
    ResponsesReady,
    Voted,
    Finalized,
    Abandoned,
}

impl RoundState {
    pub fn as_str(self) -> &'static str {
        match self {
            RoundState::Open => "OPEN",
            RoundState::ResponsesReady => "RESPONSES_READY",
            RoundState::Voted => "VOTED",
            RoundState::Finalized => "FINALIZED",
            RoundState::Abandoned => "ABANDONED",
        }
    }

    fn can_move_to(self, next: RoundState) -> bool {
        use RoundState::*;
        matches!(
            (self, next),
            (Open, ResponsesReady)
                | (ResponsesReady, Voted)
                | (Voted, Finalized)
                | (Voted, ResponsesReady)
                | (Open, Abandoned)
                | (ResponsesReady, Abandoned)
        )
    }

    pub fn is_abandonable(self) -> bool {
        matches!(self, RoundState::Open | RoundState::ResponsesReady)
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotResponse {
    pub text: String,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SlotResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            degraded: false,
            error: None,
        }
    }

    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            text: DEGRADED_PLACEHOLDER.to_string(),
            degraded: true,
            error: Some(error.into()),
        }
    }
}

/// Set once the vote has been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reveal {
    pub origin_a: String,
    pub origin_b: String,
    pub game_no: i64,
    pub outcome: Outcome,
    pub verdict: Verdict,
    pub winner: String,
}

/// One live comparison. Held only in memory; nothing is persisted until the
/// vote commits.
#[derive(Debug, Clone)]
pub struct Round {
    pub id: String,
    pub use_case: String,
    pub query: Option<String>,
    pub slot_a: Candidate,
    pub slot_b: Candidate,
    pub state: RoundState,
    pub response_a: Option<SlotResponse>,
    pub response_b: Option<SlotResponse>,
    pub reveal: Option<Reveal>,
    pub created_at: DateTime<Utc>,
    pub last_activity: Instant,
    pub finalized_at: Option<Instant>,
}

impl Round {
    pub fn new(
        id: String,
        use_case: String,
        query: Option<String>,
        slot_a: Candidate,
        slot_b: Candidate,
    ) -> Self {
        Self {
            id,
            use_case,
            query,
            slot_a,
            slot_b,
            state: RoundState::Open,
            response_a: None,
            response_b: None,
            reveal: None,
            created_at: Utc::now(),
            last_activity: Instant::now(),
            finalized_at: None,
        }
    }

    pub fn transition(&mut self, next: RoundState, op: &'static str) -> Result<(), ArenaError> {
        if !self.state.can_move_to(next) {
            return Err(ArenaError::InvalidRoundState {
                round_id: self.id.clone(),
                state: self.state,
                op,
            });
        }
        self.state = next;
        self.last_activity = Instant::now();
        if next == RoundState::Finalized {
            self.finalized_at = Some(self.last_activity);
        }
        Ok(())
    }

    /// What the voter may see. Origins stay hidden until the round is
    /// finalized.
    pub fn view(&self) -> RoundView {
        RoundView {
            round_id: self.id.clone(),
            use_case: self.use_case.clone(),
            query: self.query.clone(),
            state: self.state,
            response_a: self.response_a.clone(),
            response_b: self.response_b.clone(),
            reveal: if self.state == RoundState::Finalized {
                self.reveal.clone()
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    pub round_id: String,
    pub use_case: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub state: RoundState,
    pub response_a: Option<SlotResponse>,
    pub response_b: Option<SlotResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal: Option<Reveal>,
}
