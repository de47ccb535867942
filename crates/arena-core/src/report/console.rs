use crate::leaderboard::LeaderboardEntry;
use crate::model::GameRecord;
use crate::storage::StoreStats;

pub fn print_leaderboard(scope: &str, entries: &[LeaderboardEntry]) {
    println!("Leaderboard: {}", scope);
    if entries.is_empty() {
        println!("  (no rated origins yet)");
        return;
    }
    println!("{:>4}  {:<32} {:>9} {:>7}", "#", "origin", "score", "games");
    for (i, e) in entries.iter().enumerate() {
        println!(
            "{:>4}  {:<32} {:>9.2} {:>7}",
            i + 1,
            e.model_name,
            e.score,
            e.no_of_games
        );
    }
}

pub fn print_games(games: &[GameRecord]) {
    if games.is_empty() {
        println!("(ledger is empty)");
        return;
    }
    for g in games {
        println!(
            "#{:<5} {}  {:<16} {} vs {} -> {} ({})",
            g.game_no,
            g.created_at.format("%Y-%m-%d %H:%M:%S"),
            g.use_case,
            g.origin_a,
            g.origin_b,
            g.winner,
            g.outcome.as_str()
        );
    }
}

pub fn print_stats(db: &str, stats: &StoreStats) {
    let show = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_else(|| "?".into());
    eprintln!("Database: {}", db);
    eprintln!(
        "  sqlite:        {}",
        stats.sqlite_version.as_deref().unwrap_or("?")
    );
    eprintln!("  use cases:     {}", show(stats.use_cases));
    eprintln!("  prompts:       {}", show(stats.prompts));
    eprintln!("  assistants:    {}", show(stats.assistants));
    eprintln!("  rated origins: {}", show(stats.rated_origins));
    eprintln!("  games:         {}", show(stats.games));
    if let Some(at) = &stats.last_game_at {
        eprintln!("  last game:     {}", at);
    }
}
