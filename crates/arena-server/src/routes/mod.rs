pub mod catalog;
pub mod health;
pub mod leaderboard;
pub mod ledger;
pub mod rounds;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router with all API routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Catalog reads
        .route("/fetch_use_cases", get(catalog::fetch_use_cases))
        .route("/fetch_models", get(catalog::fetch_models))
        // Rounds
        .route("/random_prompts/{use_case}", get(rounds::random_prompts))
        .route("/rounds", post(rounds::create_round))
        .route("/rounds/{round_id}", get(rounds::get_round))
        .route("/rounds/{round_id}/responses", post(rounds::attach_responses))
        .route("/rounds/{round_id}/vote", post(rounds::vote))
        .route("/update_elo", post(rounds::update_elo))
        // Ledger
        .route("/total_games", get(ledger::total_games))
        .route("/games", get(ledger::list_games))
        .route("/games/{game_no}", get(ledger::get_game))
        // Standings
        .route("/leaderboard/{scope}", get(leaderboard::leaderboard))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
