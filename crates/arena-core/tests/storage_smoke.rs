use arena_core::model::{NewGame, Rating, Verdict, GLOBAL_SCOPE};
use arena_core::storage::{CommitOutcome, RatingChange, Store};
use chrono::Utc;
use tempfile::tempdir;

fn new_game(round_id: &str, verdict: Verdict) -> NewGame {
    NewGame {
        round_id: round_id.into(),
        query: "red shoes".into(),
        use_case: "product_search".into(),
        origin_a: "gpt-4o".into(),
        origin_b: "claude".into(),
        response_a: "A says".into(),
        response_b: "B says".into(),
        verdict,
        created_at: Utc::now(),
    }
}

fn rating(origin: &str, score: f64, games: u64) -> Rating {
    Rating {
        origin: origin.into(),
        score,
        games_played: games,
    }
}

#[test]
fn test_storage_smoke_lifecycle() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("arena.db");

    // 1. Open store, create schema twice (idempotent)
    let store = Store::open(&db_path)?;
    store.init_schema()?;
    store.init_schema()?;

    // 2. Catalog
    assert!(store.insert_use_case("product_search")?);
    assert!(!store.insert_use_case("product_search")?);
    store.insert_use_case("faq")?;
    assert_eq!(store.list_use_cases()?, vec!["faq", "product_search"]);

    let v1 = store.insert_prompt("product_search", "gpt-4o", "v1 {query}")?;
    let v2 = store.insert_prompt("product_search", "gpt-4o", "v2 {query}")?;
    assert_eq!((v1.version, v2.version), (1, 2));
    store.insert_prompt("faq", "gpt-4o", "faq {query}")?;
    store.insert_assistant("product_search", "Conva Assistant", "asst-1", "3", "sk-x")?;

    let candidates = store.list_candidates("product_search")?;
    assert_eq!(candidates.len(), 3);
    assert_eq!(store.fetch_models()?, vec!["Conva Assistant", "gpt-4o"]);

    // 3. Ledger + ratings in one commit
    assert_eq!(store.total_games()?, 0);
    let changes = vec![
        RatingChange {
            scope: GLOBAL_SCOPE.into(),
            prior: None,
            next: rating("gpt-4o", 1016.0, 1),
        },
        RatingChange {
            scope: GLOBAL_SCOPE.into(),
            prior: None,
            next: rating("claude", 984.0, 1),
        },
    ];
    let record = match store.commit_game(&new_game("r-1", Verdict::Win), &changes)? {
        CommitOutcome::Committed(r) => r,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(record.game_no, 1);
    assert_eq!(record.winner, "gpt-4o");
    assert_eq!(store.total_games()?, 1);

    // 4. Reopen: everything is durable
    drop(store);
    let store = Store::open(&db_path)?;
    store.init_schema()?;
    assert_eq!(store.total_games()?, 1);
    let game = store.get_game(1)?.expect("game 1");
    assert_eq!(game.round_id, "r-1");
    assert_eq!(game.verdict, Verdict::Win);
    assert_eq!(
        store.get_rating(GLOBAL_SCOPE, "gpt-4o")?,
        Some(rating("gpt-4o", 1016.0, 1))
    );
    let board = store.list_ratings(GLOBAL_SCOPE)?;
    assert_eq!(board[0].origin, "gpt-4o");

    let stats = store.stats_best_effort()?;
    assert_eq!(stats.games, Some(1));
    assert_eq!(stats.use_cases, Some(2));
    assert_eq!(stats.rated_origins, Some(2));
    Ok(())
}

#[test]
fn test_prompt_requires_known_use_case_and_unique_kind() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    assert!(store.insert_prompt("nope", "gpt", "{query}").is_err());

    store.insert_use_case("uc")?;
    store.insert_prompt("uc", "gpt", "{query}")?;
    let err = store
        .insert_assistant("uc", "gpt", "id", "1", "key")
        .unwrap_err();
    assert!(err.to_string().contains("already registered"));
    Ok(())
}

#[test]
fn test_global_scope_name_is_not_a_use_case() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let err = store.insert_use_case(GLOBAL_SCOPE).unwrap_err();
    assert!(err.to_string().contains("reserved"));
    assert!(!store.use_case_exists(GLOBAL_SCOPE)?);
    assert!(store.insert_prompt(GLOBAL_SCOPE, "gpt", "{query}").is_err());
    Ok(())
}

#[test]
fn test_stale_prior_conflicts_and_writes_nothing() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let seed = vec![
        RatingChange {
            scope: GLOBAL_SCOPE.into(),
            prior: None,
            next: rating("gpt-4o", 1016.0, 1),
        },
        RatingChange {
            scope: GLOBAL_SCOPE.into(),
            prior: None,
            next: rating("claude", 984.0, 1),
        },
    ];
    assert!(matches!(
        store.commit_game(&new_game("r-1", Verdict::Win), &seed)?,
        CommitOutcome::Committed(_)
    ));

    // claude's prior says 0 games, but the row has 1
    let stale = vec![
        RatingChange {
            scope: GLOBAL_SCOPE.into(),
            prior: Some(rating("gpt-4o", 1016.0, 1)),
            next: rating("gpt-4o", 1030.0, 2),
        },
        RatingChange {
            scope: GLOBAL_SCOPE.into(),
            prior: Some(rating("claude", 1000.0, 0)),
            next: rating("claude", 970.0, 1),
        },
    ];
    let outcome = store.commit_game(&new_game("r-2", Verdict::Win), &stale)?;
    assert!(matches!(
        outcome,
        CommitOutcome::Conflict { ref origin, .. } if origin == "claude"
    ));

    // the gpt-4o write in the same transaction was rolled back
    assert_eq!(
        store.get_rating(GLOBAL_SCOPE, "gpt-4o")?,
        Some(rating("gpt-4o", 1016.0, 1))
    );
    assert_eq!(store.total_games()?, 1);
    assert!(store.get_game(2)?.is_none());
    Ok(())
}

#[test]
fn test_duplicate_round_is_refused() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    let changes = vec![RatingChange {
        scope: GLOBAL_SCOPE.into(),
        prior: None,
        next: rating("gpt-4o", 1000.0, 1),
    }];
    store.commit_game(&new_game("r-1", Verdict::BothGood), &changes)?;
    let again = store.commit_game(&new_game("r-1", Verdict::BothGood), &[])?;
    assert!(matches!(again, CommitOutcome::DuplicateRound(1)));
    assert_eq!(store.total_games()?, 1);
    Ok(())
}

#[test]
fn test_game_numbers_are_dense_and_recent_first() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    for i in 1..=5 {
        let out = store.commit_game(&new_game(&format!("r-{}", i), Verdict::BothBad), &[])?;
        match out {
            CommitOutcome::Committed(r) => {
                assert_eq!(r.game_no, i);
                assert_eq!(r.winner, "both_bad");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
    let recent = store.recent_games(3)?;
    let nos: Vec<i64> = recent.iter().map(|g| g.game_no).collect();
    assert_eq!(nos, vec![5, 4, 3]);
    Ok(())
}
