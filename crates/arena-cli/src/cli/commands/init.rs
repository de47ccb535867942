use super::{exit_codes, open_store};
use crate::cli::args::InitArgs;
use arena_core::config::write_sample_config;

pub fn run(args: InitArgs) -> anyhow::Result<i32> {
    if args.config.exists() && !args.force {
        eprintln!(
            "config already exists: {} (use --force to overwrite)",
            args.config.display()
        );
    } else {
        write_sample_config(&args.config).map_err(|e| anyhow::anyhow!("config error: {}", e))?;
        eprintln!("wrote config: {}", args.config.display());
    }

    open_store(&args.db.db)?;
    tracing::info!(event = "db_initialized", db = %args.db.db.display());
    eprintln!("database ready: {}", args.db.db.display());
    eprintln!("next: arena seed --catalog catalog.yaml");
    Ok(exit_codes::OK)
}
