use crate::error::ApiResult;
use crate::state::AppState;
use arena_core::leaderboard::LeaderboardEntry;
use axum::extract::{Path, State};
use axum::Json;

/// GET /leaderboard/{use_case|all}
pub async fn leaderboard(
    State(state): State<AppState>,
    Path(scope): Path<String>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    Ok(Json(state.orchestrator.leaderboard(&scope)?))
}
