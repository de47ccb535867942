pub mod doctor;
pub mod games;
pub mod init;
pub mod leaderboard;
pub mod seed;

use crate::cli::args::{Cli, Command};
use anyhow::Context;
use arena_core::storage::Store;
use std::path::Path;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => init::run(args),
        Command::Seed(args) => seed::run(args),
        Command::Leaderboard(args) => leaderboard::run(args),
        Command::Games(args) => games::run(args),
        Command::TotalGames(args) => games::run_total(args),
        Command::Doctor(args) => doctor::run(args),
    }
}

/// Opens the database and makes sure the schema exists.
pub(crate) fn open_store(db: &Path) -> anyhow::Result<Store> {
    if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = Store::open(db)?;
    store.init_schema()?;
    Ok(store)
}

/// Opens an existing database for reading. A missing file is an error rather
/// than a fresh empty arena.
pub(crate) fn open_existing(db: &Path) -> anyhow::Result<Store> {
    if !db.exists() {
        anyhow::bail!(
            "no database at {} (run `arena init` or `arena seed` first)",
            db.display()
        );
    }
    open_store(db)
}
