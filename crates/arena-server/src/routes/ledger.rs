use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use arena_core::model::GameRecord;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 1000;

/// GET /total_games
pub async fn total_games(State(state): State<AppState>) -> ApiResult<u64> {
    Ok(Json(state.orchestrator.total_games()?))
}

#[derive(Debug, Deserialize)]
pub struct GamesQuery {
    pub limit: Option<u32>,
}

/// GET /games?limit=N, newest first
pub async fn list_games(
    State(state): State<AppState>,
    query: Result<Query<GamesQuery>, QueryRejection>,
) -> ApiResult<Vec<GameRecord>> {
    let Query(q) = query?;
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let games = state
        .orchestrator
        .store()
        .recent_games(limit)
        .map_err(arena_core::ArenaError::from)?;
    Ok(Json(games))
}

/// GET /games/{game_no}
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_no): Path<i64>,
) -> ApiResult<GameRecord> {
    state
        .orchestrator
        .store()
        .get_game(game_no)
        .map_err(arena_core::ArenaError::from)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("game {} not found", game_no)))
}
