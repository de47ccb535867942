use super::{exit_codes, open_store};
use crate::cli::args::DoctorArgs;
use arena_core::config::{load_config, ArenaConfig};
use arena_core::matchmaker::latest_per_origin;
use arena_core::report::console::print_stats;
use arena_core::storage::StoreStats;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct UseCaseHealth {
    name: String,
    origins: usize,
    playable: bool,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    arena_version: &'static str,
    config_path: String,
    config: Option<ArenaConfig>,
    config_error: Option<String>,
    db_path: String,
    stats: Option<StoreStats>,
    use_cases: Vec<UseCaseHealth>,
    suggested_actions: Vec<String>,
}

pub fn run(args: DoctorArgs) -> anyhow::Result<i32> {
    let mut actions = Vec::new();

    let (config, config_error) = if args.config.exists() {
        match load_config(&args.config, args.strict) {
            Ok(cfg) => (Some(cfg), None),
            Err(e) => {
                actions.push(format!("fix {}", args.config.display()));
                (None, Some(e.to_string()))
            }
        }
    } else {
        actions.push("run `arena init` to write a sample config".to_string());
        (Some(ArenaConfig::default()), None)
    };

    let mut stats = None;
    let mut use_cases = Vec::new();
    if args.db.db.exists() {
        let store = open_store(&args.db.db)?;
        stats = Some(store.stats_best_effort()?);
        for name in store.list_use_cases()? {
            let origins = latest_per_origin(store.list_candidates(&name)?).len();
            if origins < 2 {
                actions.push(format!(
                    "use case '{}' has {} origin(s); seed at least 2 to make it playable",
                    name, origins
                ));
            }
            use_cases.push(UseCaseHealth {
                name,
                origins,
                playable: origins >= 2,
            });
        }
        if use_cases.is_empty() {
            actions.push("run `arena seed --catalog <file>` to add use cases".to_string());
        }
    } else {
        actions.push(format!("no database at {}", args.db.db.display()));
    }

    let report = DoctorReport {
        arena_version: env!("CARGO_PKG_VERSION"),
        config_path: args.config.display().to_string(),
        config,
        config_error,
        db_path: args.db.db.display().to_string(),
        stats,
        use_cases,
        suggested_actions: actions,
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("Arena Doctor (v{})", report.arena_version);
        match (&report.config, &report.config_error) {
            (_, Some(err)) => eprintln!("Config: {} (error: {})", report.config_path, err),
            (Some(cfg), None) => eprintln!(
                "Config: {} (k={}, baseline={}, per_use_case={}, strategy={:?})",
                report.config_path,
                cfg.rating.k_factor,
                cfg.rating.baseline,
                cfg.rating.per_use_case,
                cfg.matchmaking.strategy
            ),
            (None, None) => {}
        }
        if let Some(stats) = &report.stats {
            print_stats(&report.db_path, stats);
        }
        for uc in &report.use_cases {
            eprintln!(
                "  {:<24} {} origin(s){}",
                uc.name,
                uc.origins,
                if uc.playable { "" } else { "  [not playable]" }
            );
        }
        if !report.suggested_actions.is_empty() {
            eprintln!("\nNext actions:");
            for a in &report.suggested_actions {
                eprintln!("- {}", a);
            }
        }
    }

    if report.config_error.is_some() {
        return Ok(exit_codes::CONFIG_ERROR);
    }
    Ok(exit_codes::OK)
}
