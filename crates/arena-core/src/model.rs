use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder substituted with the user query when a prompt template is rendered.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Rating scope that aggregates every use case.
pub const GLOBAL_SCOPE: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCase {
    pub name: String,
}

/// A versioned prompt template for one (origin, use case) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub origin: String,
    pub use_case: String,
    pub version: u32,
    #[serde(rename = "prompt")]
    pub template: String,
}

impl Prompt {
    pub fn render(&self, query: &str) -> String {
        self.template.replace(QUERY_PLACEHOLDER, query)
    }
}

/// An origin backed by an external assistant that needs its own credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    pub origin: String,
    pub use_case: String,
    pub version: u32,
    pub assistant_id: String,
    pub assistant_version: String,
    #[serde(rename = "assistant_apikey")]
    pub api_key: String,
}

/// One competitor in a round: either a prompt template or an assistant.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Prompt(Prompt),
    Assistant(Assistant),
}

impl Candidate {
    pub fn origin(&self) -> &str {
        match self {
            Candidate::Prompt(p) => &p.origin,
            Candidate::Assistant(a) => &a.origin,
        }
    }

    pub fn use_case(&self) -> &str {
        match self {
            Candidate::Prompt(p) => &p.use_case,
            Candidate::Assistant(a) => &a.use_case,
        }
    }

    pub fn version(&self) -> u32 {
        match self {
            Candidate::Prompt(p) => p.version,
            Candidate::Assistant(a) => a.version,
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Candidate::Assistant(_))
    }
}

/// Skill estimate for one origin within a rating scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub origin: String,
    pub score: f64,
    pub games_played: u64,
}

/// Rating-level result of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    AWins,
    BWins,
    Draw,
}

impl Outcome {
    /// Actual score credited to slot A.
    pub fn actual_a(self) -> f64 {
        match self {
            Outcome::AWins => 1.0,
            Outcome::BWins => 0.0,
            Outcome::Draw => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::AWins => "A_WINS",
            Outcome::BWins => "B_WINS",
            Outcome::Draw => "DRAW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A_WINS" => Some(Outcome::AWins),
            "B_WINS" => Some(Outcome::BWins),
            "DRAW" => Some(Outcome::Draw),
            _ => None,
        }
    }
}

/// The vote as cast by the voter, relative to slot A.
///
/// `both_good` and `both_bad` fold into the same draw for rating purposes;
/// the ledger keeps the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Win,
    Loss,
    BothGood,
    BothBad,
}

impl Verdict {
    pub fn outcome(self) -> Outcome {
        match self {
            Verdict::Win => Outcome::AWins,
            Verdict::Loss => Outcome::BWins,
            Verdict::BothGood | Verdict::BothBad => Outcome::Draw,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Win => "win",
            Verdict::Loss => "loss",
            Verdict::BothGood => "both_good",
            Verdict::BothBad => "both_bad",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "win" => Some(Verdict::Win),
            "loss" => Some(Verdict::Loss),
            "both_good" => Some(Verdict::BothGood),
            "both_bad" => Some(Verdict::BothBad),
            _ => None,
        }
    }

    /// Winner column of the ledger: the winning origin, or the draw marker.
    pub fn winner_label(self, origin_a: &str, origin_b: &str) -> String {
        match self {
            Verdict::Win => origin_a.to_string(),
            Verdict::Loss => origin_b.to_string(),
            Verdict::BothGood | Verdict::BothBad => self.as_str().to_string(),
        }
    }
}

/// Immutable ledger entry for one completed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_no: i64,
    pub round_id: String,
    pub query: String,
    pub use_case: String,
    #[serde(rename = "model_a")]
    pub origin_a: String,
    #[serde(rename = "model_b")]
    pub origin_b: String,
    pub response_a: String,
    pub response_b: String,
    pub outcome: Outcome,
    pub verdict: Verdict,
    #[serde(rename = "winner_model")]
    pub winner: String,
    pub created_at: DateTime<Utc>,
}

/// Ledger row before a game number has been assigned.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub round_id: String,
    pub query: String,
    pub use_case: String,
    pub origin_a: String,
    pub origin_b: String,
    pub response_a: String,
    pub response_b: String,
    pub verdict: Verdict,
    pub created_at: DateTime<Utc>,
}
