use super::{exit_codes, open_existing};
use crate::cli::args::LeaderboardArgs;
use arena_core::config::load_or_default;
use arena_core::leaderboard::leaderboard;
use arena_core::report::console::print_leaderboard;
use arena_core::ArenaError;

pub fn run(args: LeaderboardArgs) -> anyhow::Result<i32> {
    let cfg = match load_or_default(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let store = open_existing(&args.db.db)?;

    let entries = match leaderboard(&store, &args.scope, cfg.rating.per_use_case) {
        Ok(entries) => entries,
        Err(e @ ArenaError::UnknownUseCase(_)) => {
            eprintln!("{}", e);
            return Ok(exit_codes::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_leaderboard(&args.scope, &entries);
    }
    Ok(exit_codes::OK)
}
