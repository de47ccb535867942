pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;

use arena_core::config::load_or_default;
use arena_core::storage::Store;
use config::ServerConfig;

/// Open the store, start the abandonment sweep and serve until shutdown.
pub async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    let arena_cfg = load_or_default(&cfg.config_path)?;

    if cfg.db != ":memory:" {
        if let Some(parent) = std::path::Path::new(&cfg.db)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = Store::open_path(&cfg.db)?;
    store.init_schema()?;

    let state = AppState::new(store, &arena_cfg);
    let sweeper = state.orchestrator.clone().spawn_sweeper();

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&cfg.listen).await?;
    tracing::info!(
        event = "listening",
        addr = %cfg.listen,
        db = %cfg.db,
        k_factor = arena_cfg.rating.k_factor,
        strategy = ?arena_cfg.matchmaking.strategy,
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!(event = "server_stop");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(event = "signal_handler_failed", error = %e);
        std::future::pending::<()>().await;
    }
}
