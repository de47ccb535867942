use anyhow::Result;
use arena_server::config::ServerConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listen address (overrides ARENA_LISTEN)
    #[arg(long)]
    listen: Option<String>,
    /// SQLite database path or :memory: (overrides ARENA_DB)
    #[arg(long)]
    db: Option<String>,
    /// Arena config file (overrides ARENA_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = ServerConfig::from_env();
    if let Some(v) = args.listen {
        cfg.listen = v;
    }
    if let Some(v) = args.db {
        cfg.db = v;
    }
    if let Some(v) = args.config {
        cfg.config_path = v;
    }

    init_logging(&cfg.log_level);

    tracing::info!(event = "server_start", config = ?cfg);

    arena_server::run(cfg).await
}
