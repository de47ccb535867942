use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "arena",
    version,
    about = "Offline administration for the blind LLM comparison arena"
)]
pub struct Cli {
    /// Log filter for stderr output (e.g. info, arena_core=debug)
    #[arg(long, global = true, env = "ARENA_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample config and create the database schema
    Init(InitArgs),
    /// Import use cases, prompts and assistants from a catalog YAML file
    Seed(SeedArgs),
    /// Print the ranked standings of a scope
    Leaderboard(LeaderboardArgs),
    /// Print the most recent ledger entries
    Games(GamesArgs),
    /// Print the number of completed games
    TotalGames(DbArgs),
    /// Check the config file and report database statistics
    Doctor(DoctorArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct DbArgs {
    #[arg(long, env = "ARENA_DB", default_value = ".arena/arena.db")]
    pub db: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(long, env = "ARENA_CONFIG", default_value = "arena.yaml")]
    pub config: PathBuf,

    #[command(flatten)]
    pub db: DbArgs,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SeedArgs {
    #[arg(long)]
    pub catalog: PathBuf,

    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct LeaderboardArgs {
    /// Use case name, or "all" for the global board
    #[arg(default_value = "all")]
    pub scope: String,

    #[arg(long, env = "ARENA_CONFIG", default_value = "arena.yaml")]
    pub config: PathBuf,

    #[command(flatten)]
    pub db: DbArgs,

    /// Output format: text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GamesArgs {
    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    #[command(flatten)]
    pub db: DbArgs,

    /// Output format: text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DoctorArgs {
    #[arg(long, env = "ARENA_CONFIG", default_value = "arena.yaml")]
    pub config: PathBuf,

    #[command(flatten)]
    pub db: DbArgs,

    /// Reject unknown config keys instead of warning
    #[arg(long)]
    pub strict: bool,

    /// Output format: text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}
