use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

/// GET /fetch_use_cases
pub async fn fetch_use_cases(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.orchestrator.use_cases()?))
}

/// GET /fetch_models
pub async fn fetch_models(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.orchestrator.models()?))
}
