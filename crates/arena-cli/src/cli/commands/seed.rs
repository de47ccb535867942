use super::{exit_codes, open_store};
use crate::cli::args::SeedArgs;
use arena_core::catalog::{load_catalog, seed_catalog};
use arena_core::matchmaker::latest_per_origin;

pub fn run(args: SeedArgs) -> anyhow::Result<i32> {
    let file = match load_catalog(&args.catalog) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("catalog error: {:#}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    if file.use_cases.is_empty() {
        eprintln!("catalog {} has no use cases", args.catalog.display());
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let store = open_store(&args.db.db)?;
    let report = seed_catalog(&store, &file)?;

    println!(
        "seeded {} prompt(s) and {} assistant(s); {} new use case(s)",
        report.prompts, report.assistants, report.use_cases_created
    );
    for uc in store.list_use_cases()? {
        let origins = latest_per_origin(store.list_candidates(&uc)?);
        println!("  {:<24} {} origin(s)", uc, origins.len());
    }
    Ok(exit_codes::OK)
}
