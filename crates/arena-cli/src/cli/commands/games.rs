use super::{exit_codes, open_existing};
use crate::cli::args::{DbArgs, GamesArgs};
use arena_core::report::console::print_games;

pub fn run(args: GamesArgs) -> anyhow::Result<i32> {
    let store = open_existing(&args.db.db)?;
    let games = store.recent_games(args.limit)?;
    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&games)?);
    } else {
        print_games(&games);
    }
    Ok(exit_codes::OK)
}

pub fn run_total(args: DbArgs) -> anyhow::Result<i32> {
    let store = open_existing(&args.db)?;
    println!("{}", store.total_games()?);
    Ok(exit_codes::OK)
}
