use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use arena_core::engine::round::{RoundView, SlotResponse};
use arena_core::engine::VoteReceipt;
use arena_core::model::{Candidate, Verdict};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

/// A candidate as handed to a client that generates responses itself.
#[derive(Debug, Serialize)]
pub struct PromptPayload {
    pub origin: String,
    pub use_case: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_apikey: Option<String>,
}

impl PromptPayload {
    fn from_candidate(c: &Candidate, state: &AppState) -> Self {
        match c {
            Candidate::Prompt(p) => Self {
                origin: p.origin.clone(),
                use_case: p.use_case.clone(),
                version: p.version,
                prompt: Some(p.template.clone()),
                assistant_id: None,
                assistant_version: None,
                assistant_apikey: None,
            },
            Candidate::Assistant(a) => Self {
                origin: a.origin.clone(),
                use_case: a.use_case.clone(),
                version: a.version,
                prompt: None,
                assistant_id: Some(a.assistant_id.clone()),
                assistant_version: Some(a.assistant_version.clone()),
                assistant_apikey: Some(state.redaction.redact_key(&a.api_key).into_owned()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RandomPrompts {
    pub round_id: String,
    pub prompts: [PromptPayload; 2],
}

/// GET /random_prompts/{use_case}
pub async fn random_prompts(
    State(state): State<AppState>,
    Path(use_case): Path<String>,
) -> ApiResult<RandomPrompts> {
    let opened = state.orchestrator.open(&use_case, None)?;
    Ok(Json(RandomPrompts {
        round_id: opened.round_id,
        prompts: [
            PromptPayload::from_candidate(&opened.slot_a, &state),
            PromptPayload::from_candidate(&opened.slot_b, &state),
        ],
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateRoundBody {
    pub use_case: String,
    pub query: String,
}

/// POST /rounds: open a round and generate both sides server-side.
pub async fn create_round(
    State(state): State<AppState>,
    body: Result<Json<CreateRoundBody>, JsonRejection>,
) -> ApiResult<RoundView> {
    let Json(body) = body?;
    if body.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }
    let view = state
        .orchestrator
        .open_and_generate(&body.use_case, &body.query)
        .await?;
    Ok(Json(view))
}

/// GET /rounds/{round_id}
pub async fn get_round(
    State(state): State<AppState>,
    Path(round_id): Path<String>,
) -> ApiResult<RoundView> {
    Ok(Json(state.orchestrator.view(&round_id)?))
}

/// Either plain text or a full slot object with the degraded flag.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponseInput {
    Text(String),
    Slot(SlotResponse),
}

impl From<ResponseInput> for SlotResponse {
    fn from(r: ResponseInput) -> Self {
        match r {
            ResponseInput::Text(t) => SlotResponse::ok(t),
            ResponseInput::Slot(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AttachBody {
    #[serde(default)]
    pub query: Option<String>,
    pub response_a: ResponseInput,
    pub response_b: ResponseInput,
}

/// POST /rounds/{round_id}/responses
pub async fn attach_responses(
    State(state): State<AppState>,
    Path(round_id): Path<String>,
    body: Result<Json<AttachBody>, JsonRejection>,
) -> ApiResult<RoundView> {
    let Json(body) = body?;
    let view = state.orchestrator.attach_responses(
        &round_id,
        body.query,
        body.response_a.into(),
        body.response_b.into(),
    )?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct VoteBody {
    pub result: Verdict,
}

/// POST /rounds/{round_id}/vote
pub async fn vote(
    State(state): State<AppState>,
    Path(round_id): Path<String>,
    body: Result<Json<VoteBody>, JsonRejection>,
) -> ApiResult<VoteReceipt> {
    let Json(body) = body?;
    Ok(Json(state.orchestrator.vote(&round_id, body.result).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEloBody {
    pub round_id: String,
    pub result: Verdict,
    /// Optional cross-check from clients that know the pair.
    #[serde(default)]
    pub model_a: Option<String>,
    #[serde(default)]
    pub model_b: Option<String>,
}

/// POST /update_elo
pub async fn update_elo(
    State(state): State<AppState>,
    body: Result<Json<UpdateEloBody>, JsonRejection>,
) -> ApiResult<VoteReceipt> {
    let Json(body) = body?;
    if body.model_a.is_some() || body.model_b.is_some() {
        let (a, b) = state.orchestrator.slot_origins(&body.round_id)?;
        let matches = body.model_a.as_deref().map_or(true, |m| m == a)
            && body.model_b.as_deref().map_or(true, |m| m == b);
        if !matches {
            return Err(ApiError::BadRequest(format!(
                "model_a/model_b do not match round {}",
                body.round_id
            )));
        }
    }
    Ok(Json(
        state.orchestrator.vote(&body.round_id, body.result).await?,
    ))
}
