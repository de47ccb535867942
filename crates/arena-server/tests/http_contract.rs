//! HTTP contract checks against an in-memory arena.

use arena_core::config::ArenaConfig;
use arena_core::engine::generation::ResponseGenerator;
use arena_core::providers::llm::fake::FakeClient;
use arena_core::storage::Store;
use arena_server::{build_router, AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_router() -> axum::Router {
    let store = Store::memory().expect("store");
    store.init_schema().expect("schema");
    store.insert_use_case("product_search").expect("uc");
    store
        .insert_prompt("product_search", "gpt-4o", "Find: {query}")
        .expect("prompt");
    store
        .insert_assistant("product_search", "Conva Assistant", "asst-1", "2", "sk-secret")
        .expect("assistant");
    store.insert_use_case("lonely").expect("uc");
    store
        .insert_prompt("lonely", "gpt-4o", "{query}")
        .expect("prompt");

    let generator = ResponseGenerator::new(
        Arc::new(FakeClient::new()),
        None,
        None,
        Duration::from_secs(5),
    );
    let state = AppState::with_generator(store, &ArenaConfig::default(), generator);
    build_router(state)
}

async fn send(
    router: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

#[tokio::test]
async fn health_and_catalog_reads() {
    let router = test_router();

    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["total_games"], 0);

    let (status, body) = send(&router, Method::GET, "/fetch_use_cases", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["lonely", "product_search"]));

    let (_, body) = send(&router, Method::GET, "/fetch_models", None).await;
    assert_eq!(body, json!(["Conva Assistant", "gpt-4o"]));
}

#[tokio::test]
async fn client_generated_round_end_to_end() {
    let router = test_router();

    // 1. Matchmaking
    let (status, body) = send(&router, Method::GET, "/random_prompts/product_search", None).await;
    assert_eq!(status, StatusCode::OK);
    let round_id = body["round_id"].as_str().expect("round_id").to_string();
    let prompts = body["prompts"].as_array().expect("prompts");
    assert_eq!(prompts.len(), 2);
    assert_ne!(prompts[0]["origin"], prompts[1]["origin"]);
    let model_a = prompts[0]["origin"].as_str().expect("origin").to_string();
    let assistant = prompts
        .iter()
        .find(|p| p["origin"] == "Conva Assistant")
        .expect("assistant side");
    assert_eq!(assistant["assistant_apikey"], "[REDACTED]");
    assert_eq!(assistant["assistant_id"], "asst-1");

    // 2. Responses
    let (status, body) = send(
        &router,
        Method::POST,
        &format!("/rounds/{}/responses", round_id),
        Some(json!({"query": "running shoes", "response_a": "left", "response_b": "right"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "RESPONSES_READY");

    let (_, view) = send(&router, Method::GET, &format!("/rounds/{}", round_id), None).await;
    assert!(view.get("reveal").is_none());
    assert!(!view.to_string().contains("Conva Assistant"));

    // 3. Vote
    let (status, body) = send(
        &router,
        Method::POST,
        "/update_elo",
        Some(json!({"round_id": round_id, "result": "win", "model_a": model_a})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["game_no"], 1);
    assert_eq!(body["total_games"], 1);
    assert_eq!(body["winner"], model_a.as_str());
    assert_eq!(body["outcome"], "A_WINS");

    let (status, body) = send(
        &router,
        Method::POST,
        &format!("/rounds/{}/vote", round_id),
        Some(json!({"result": "loss"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "E_ALREADY_VOTED");
    assert_eq!(body["error"]["retryable"], false);

    // 4. Reads
    let (_, total) = send(&router, Method::GET, "/total_games", None).await;
    assert_eq!(total, json!(1));

    let (_, board) = send(&router, Method::GET, "/leaderboard/all", None).await;
    let board = board.as_array().expect("board");
    assert_eq!(board.len(), 2);
    assert_eq!(board[0]["model_name"], model_a.as_str());
    assert_eq!(board[0]["score"], 1016.0);
    assert_eq!(board[0]["no_of_games"], 1);
    assert_eq!(board[1]["score"], 984.0);

    let (_, scoped) = send(&router, Method::GET, "/leaderboard/product_search", None).await;
    assert_eq!(scoped.as_array().map(|a| a.len()), Some(2));

    let (_, games) = send(&router, Method::GET, "/games?limit=10", None).await;
    assert_eq!(games[0]["model_a"], model_a.as_str());
    assert_eq!(games[0]["winner_model"], model_a.as_str());
    assert_eq!(games[0]["query"], "running shoes");

    let (status, game) = send(&router, Method::GET, "/games/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["round_id"], round_id.as_str());

    let (_, view) = send(&router, Method::GET, &format!("/rounds/{}", round_id), None).await;
    assert_eq!(view["state"], "FINALIZED");
    assert_eq!(view["reveal"]["origin_a"], model_a.as_str());
}

#[tokio::test]
async fn server_generated_round_stays_blind_until_vote() {
    let router = test_router();

    let (status, view) = send(
        &router,
        Method::POST,
        "/rounds",
        Some(json!({"use_case": "product_search", "query": "boots"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", view);
    assert_eq!(view["state"], "RESPONSES_READY");
    let text = view.to_string();
    assert!(!text.contains("origin"));
    // no assistant endpoint is configured, so that side is degraded
    let sides = [&view["response_a"], &view["response_b"]];
    assert_eq!(sides.iter().filter(|s| s["degraded"] == true).count(), 1);

    let round_id = view["round_id"].as_str().expect("round_id");
    let (status, receipt) = send(
        &router,
        Method::POST,
        &format!("/rounds/{}/vote", round_id),
        Some(json!({"result": "both_bad"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["outcome"], "DRAW");
    assert_eq!(receipt["winner"], "both_bad");
}

#[tokio::test]
async fn errors_map_to_statuses() {
    let router = test_router();

    let (status, body) = send(&router, Method::GET, "/random_prompts/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "E_UNKNOWN_USE_CASE");

    let (status, body) = send(&router, Method::GET, "/random_prompts/lonely", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "E_NOT_ENOUGH_CANDIDATES");
    assert_eq!(body["error"]["retryable"], true);

    let (status, body) = send(
        &router,
        Method::POST,
        "/rounds/missing/vote",
        Some(json!({"result": "win"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "E_ROUND_NOT_FOUND");

    let (_, opened) = send(&router, Method::GET, "/random_prompts/product_search", None).await;
    let round_id = opened["round_id"].as_str().expect("round_id");

    let (status, body) = send(
        &router,
        Method::POST,
        &format!("/rounds/{}/vote", round_id),
        Some(json!({"result": "tie"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "E_BAD_REQUEST");

    let (status, body) = send(
        &router,
        Method::POST,
        &format!("/rounds/{}/vote", round_id),
        Some(json!({"result": "win"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "E_INVALID_ROUND_STATE");

    let (status, body) = send(
        &router,
        Method::POST,
        "/update_elo",
        Some(json!({"round_id": round_id, "result": "win", "model_a": "somebody-else"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "E_BAD_REQUEST");

    let (status, body) = send(&router, Method::GET, "/games/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "E_NOT_FOUND");

    let (_, total) = send(&router, Method::GET, "/total_games", None).await;
    assert_eq!(total, json!(0));
}
