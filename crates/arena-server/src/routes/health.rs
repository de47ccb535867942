use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub total_games: u64,
    pub open_rounds: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> ApiResult<Health> {
    Ok(Json(Health {
        status: "ok",
        total_games: state.orchestrator.total_games()?,
        open_rounds: state.orchestrator.open_round_count(),
    }))
}
