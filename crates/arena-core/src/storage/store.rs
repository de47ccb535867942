use crate::model::{
    Assistant, Candidate, GameRecord, NewGame, Outcome, Prompt, Rating, Verdict, GLOBAL_SCOPE,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub use_cases: Option<u64>,
    pub prompts: Option<u64>,
    pub assistants: Option<u64>,
    pub rated_origins: Option<u64>,
    pub games: Option<u64>,
    pub last_game_at: Option<String>,
    pub sqlite_version: Option<String>,
}

/// New rating for one origin in one scope, plus the row it was computed from.
///
/// `prior: None` means the origin had no row in that scope and was seeded at
/// the baseline.
#[derive(Debug, Clone)]
pub struct RatingChange {
    pub scope: String,
    pub prior: Option<Rating>,
    pub next: Rating,
}

#[derive(Debug)]
pub enum CommitOutcome {
    Committed(GameRecord),
    /// A rating row moved since it was read. Nothing was written.
    Conflict { scope: String, origin: String },
    /// The round already has a ledger row. Nothing was written.
    DuplicateRound(i64),
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite db {}", path.display()))?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// `:memory:` opens an in-memory database, anything else a file.
    pub fn open_path(path: &str) -> anyhow::Result<Self> {
        if path == ":memory:" {
            Self::memory()
        } else {
            Self::open(Path::new(path))
        }
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite connection mutex poisoned"))
    }

    // --- catalog -------------------------------------------------------

    /// Returns false when the use case already existed. The global scope name
    /// is reserved.
    pub fn insert_use_case(&self, name: &str) -> anyhow::Result<bool> {
        if name == GLOBAL_SCOPE {
            anyhow::bail!("'{}' is reserved for the global leaderboard", GLOBAL_SCOPE);
        }
        let conn = self.conn()?;
        let n = conn.execute(
            "INSERT OR IGNORE INTO use_cases(name, created_at) VALUES (?1, ?2)",
            params![name, now_rfc3339()],
        )?;
        Ok(n == 1)
    }

    pub fn use_case_exists(&self, name: &str) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM use_cases WHERE name = ?1",
                params![name],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn list_use_cases(&self) -> anyhow::Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM use_cases ORDER BY name ASC")?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Adds a new prompt version for `(origin, use_case)`. The version is one
    /// past the highest existing version.
    pub fn insert_prompt(
        &self,
        use_case: &str,
        origin: &str,
        template: &str,
    ) -> anyhow::Result<Prompt> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_use_case(&tx, use_case)?;
        if origin_registered(&tx, "assistants", use_case, origin)? {
            anyhow::bail!(
                "origin '{}' is already registered as an assistant for use case '{}'",
                origin,
                use_case
            );
        }
        let version = next_version(&tx, "prompts", use_case, origin)?;
        tx.execute(
            "INSERT INTO prompts(origin, use_case, version, template, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![origin, use_case, version, template, now_rfc3339()],
        )?;
        tx.commit()?;
        Ok(Prompt {
            origin: origin.to_string(),
            use_case: use_case.to_string(),
            version,
            template: template.to_string(),
        })
    }

    pub fn insert_assistant(
        &self,
        use_case: &str,
        origin: &str,
        assistant_id: &str,
        assistant_version: &str,
        api_key: &str,
    ) -> anyhow::Result<Assistant> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_use_case(&tx, use_case)?;
        if origin_registered(&tx, "prompts", use_case, origin)? {
            anyhow::bail!(
                "origin '{}' is already registered as a prompt for use case '{}'",
                origin,
                use_case
            );
        }
        let version = next_version(&tx, "assistants", use_case, origin)?;
        tx.execute(
            "INSERT INTO assistants(origin, use_case, version, assistant_id, assistant_version, api_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                origin,
                use_case,
                version,
                assistant_id,
                assistant_version,
                api_key,
                now_rfc3339()
            ],
        )?;
        tx.commit()?;
        Ok(Assistant {
            origin: origin.to_string(),
            use_case: use_case.to_string(),
            version,
            assistant_id: assistant_id.to_string(),
            assistant_version: assistant_version.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Every prompt and assistant version registered for a use case.
    pub fn list_candidates(&self, use_case: &str) -> anyhow::Result<Vec<Candidate>> {
        let conn = self.conn()?;
        let mut out = Vec::new();

        let mut stmt = conn.prepare(
            "SELECT origin, use_case, version, template FROM prompts
             WHERE use_case = ?1 ORDER BY origin ASC, version ASC",
        )?;
        let rows = stmt.query_map(params![use_case], |r| {
            Ok(Prompt {
                origin: r.get(0)?,
                use_case: r.get(1)?,
                version: r.get(2)?,
                template: r.get(3)?,
            })
        })?;
        for r in rows {
            out.push(Candidate::Prompt(r?));
        }

        let mut stmt = conn.prepare(
            "SELECT origin, use_case, version, assistant_id, assistant_version, api_key
             FROM assistants WHERE use_case = ?1 ORDER BY origin ASC, version ASC",
        )?;
        let rows = stmt.query_map(params![use_case], |r| {
            Ok(Assistant {
                origin: r.get(0)?,
                use_case: r.get(1)?,
                version: r.get(2)?,
                assistant_id: r.get(3)?,
                assistant_version: r.get(4)?,
                api_key: r.get(5)?,
            })
        })?;
        for r in rows {
            out.push(Candidate::Assistant(r?));
        }

        Ok(out)
    }

    /// Distinct origins across prompts and assistants, sorted.
    pub fn fetch_models(&self) -> anyhow::Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT origin FROM prompts UNION SELECT origin FROM assistants ORDER BY 1 ASC",
        )?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    // --- ratings -------------------------------------------------------

    pub fn get_rating(&self, scope: &str, origin: &str) -> anyhow::Result<Option<Rating>> {
        let conn = self.conn()?;
        read_rating(&conn, scope, origin)
    }

    /// Snapshot of a scope, best score first, ties by origin name.
    pub fn list_ratings(&self, scope: &str) -> anyhow::Result<Vec<Rating>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT origin, score, games_played FROM ratings
             WHERE scope = ?1 ORDER BY score DESC, origin ASC",
        )?;
        let rows = stmt.query_map(params![scope], rating_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    // --- ledger --------------------------------------------------------

    pub fn total_games(&self) -> anyhow::Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM games", [], |r| r.get(0))?;
        Ok(n as u64)
    }

    /// Writes every rating change and appends the ledger row in one
    /// transaction.
    ///
    /// Each change is applied as a compare-and-swap on `games_played`: if
    /// the stored row no longer matches `prior` the whole transaction is
    /// rolled back and [`CommitOutcome::Conflict`] is returned.
    pub fn commit_game(
        &self,
        game: &NewGame,
        changes: &[RatingChange],
    ) -> anyhow::Result<CommitOutcome> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT game_no FROM games WHERE round_id = ?1",
                params![game.round_id],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(game_no) = existing {
            return Ok(CommitOutcome::DuplicateRound(game_no));
        }

        let updated_at = game.created_at.to_rfc3339();
        for change in changes {
            let written = match &change.prior {
                None => tx.execute(
                    "INSERT INTO ratings(scope, origin, score, games_played, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(scope, origin) DO NOTHING",
                    params![
                        change.scope,
                        change.next.origin,
                        change.next.score,
                        change.next.games_played as i64,
                        updated_at
                    ],
                )?,
                Some(prior) => tx.execute(
                    "UPDATE ratings SET score = ?1, games_played = ?2, updated_at = ?3
                     WHERE scope = ?4 AND origin = ?5 AND games_played = ?6",
                    params![
                        change.next.score,
                        change.next.games_played as i64,
                        updated_at,
                        change.scope,
                        prior.origin,
                        prior.games_played as i64
                    ],
                )?,
            };
            if written != 1 {
                // tx dropped here: rollback
                return Ok(CommitOutcome::Conflict {
                    scope: change.scope.clone(),
                    origin: change.next.origin.clone(),
                });
            }
        }

        let game_no: i64 = tx.query_row(
            "SELECT COALESCE(MAX(game_no), 0) + 1 FROM games",
            [],
            |r| r.get(0),
        )?;
        let outcome = game.verdict.outcome();
        let winner = game.verdict.winner_label(&game.origin_a, &game.origin_b);
        tx.execute(
            "INSERT INTO games(game_no, round_id, query, use_case, origin_a, origin_b,
                               response_a, response_b, outcome, verdict, winner, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                game_no,
                game.round_id,
                game.query,
                game.use_case,
                game.origin_a,
                game.origin_b,
                game.response_a,
                game.response_b,
                outcome.as_str(),
                game.verdict.as_str(),
                winner,
                updated_at
            ],
        )?;
        tx.commit().context("failed to commit game")?;

        Ok(CommitOutcome::Committed(GameRecord {
            game_no,
            round_id: game.round_id.clone(),
            query: game.query.clone(),
            use_case: game.use_case.clone(),
            origin_a: game.origin_a.clone(),
            origin_b: game.origin_b.clone(),
            response_a: game.response_a.clone(),
            response_b: game.response_b.clone(),
            outcome,
            verdict: game.verdict,
            winner,
            created_at: game.created_at,
        }))
    }

    pub fn get_game(&self, game_no: i64) -> anyhow::Result<Option<GameRecord>> {
        let conn = self.conn()?;
        let game = conn
            .query_row(
                &format!("{} WHERE game_no = ?1", GAME_SELECT),
                params![game_no],
                game_from_row,
            )
            .optional()?;
        Ok(game)
    }

    /// Most recent ledger rows first.
    pub fn recent_games(&self, limit: u32) -> anyhow::Result<Vec<GameRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY game_no DESC LIMIT ?1", GAME_SELECT))?;
        let rows = stmt.query_map(params![limit], game_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn stats_best_effort(&self) -> anyhow::Result<StoreStats> {
        let conn = self.conn()?;
        let count = |table: &str| -> Option<u64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
                r.get::<_, i64>(0)
            })
            .ok()
            .map(|n| n as u64)
        };

        let rated_origins = conn
            .query_row("SELECT COUNT(DISTINCT origin) FROM ratings", [], |r| {
                r.get::<_, i64>(0)
            })
            .ok()
            .map(|n| n as u64);

        let last_game_at: Option<String> = conn
            .query_row(
                "SELECT created_at FROM games ORDER BY game_no DESC LIMIT 1",
                [],
                |r| r.get(0),
            )
            .optional()
            .ok()
            .flatten();

        let sqlite_version: Option<String> = conn
            .query_row("SELECT sqlite_version()", [], |r| r.get(0))
            .ok();

        Ok(StoreStats {
            use_cases: count("use_cases"),
            prompts: count("prompts"),
            assistants: count("assistants"),
            rated_origins,
            games: count("games"),
            last_game_at,
            sqlite_version,
        })
    }
}

const GAME_SELECT: &str = "SELECT game_no, round_id, query, use_case, origin_a, origin_b,
        response_a, response_b, outcome, verdict, winner, created_at FROM games";

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

fn ensure_use_case(conn: &Connection, use_case: &str) -> anyhow::Result<()> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM use_cases WHERE name = ?1",
            params![use_case],
            |r| r.get(0),
        )
        .optional()?;
    if found.is_none() {
        anyhow::bail!("unknown use case '{}'", use_case);
    }
    Ok(())
}

fn origin_registered(
    conn: &Connection,
    table: &str,
    use_case: &str,
    origin: &str,
) -> anyhow::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!(
                "SELECT 1 FROM {} WHERE use_case = ?1 AND origin = ?2 LIMIT 1",
                table
            ),
            params![use_case, origin],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn next_version(
    conn: &Connection,
    table: &str,
    use_case: &str,
    origin: &str,
) -> anyhow::Result<u32> {
    let v: u32 = conn.query_row(
        &format!(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM {} WHERE use_case = ?1 AND origin = ?2",
            table
        ),
        params![use_case, origin],
        |r| r.get(0),
    )?;
    Ok(v)
}

fn read_rating(conn: &Connection, scope: &str, origin: &str) -> anyhow::Result<Option<Rating>> {
    let rating = conn
        .query_row(
            "SELECT origin, score, games_played FROM ratings WHERE scope = ?1 AND origin = ?2",
            params![scope, origin],
            rating_from_row,
        )
        .optional()?;
    Ok(rating)
}

fn rating_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rating> {
    let games: i64 = row.get(2)?;
    Ok(Rating {
        origin: row.get(0)?,
        score: row.get(1)?,
        games_played: games.max(0) as u64,
    })
}

fn game_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GameRecord> {
    let outcome_s: String = row.get(8)?;
    let verdict_s: String = row.get(9)?;
    let created_s: String = row.get(11)?;

    let outcome = Outcome::parse(&outcome_s)
        .ok_or_else(|| conversion_error(8, format!("unknown outcome '{}'", outcome_s)))?;
    let verdict = Verdict::parse(&verdict_s)
        .ok_or_else(|| conversion_error(9, format!("unknown verdict '{}'", verdict_s)))?;
    let created_at = DateTime::parse_from_rfc3339(&created_s)
        .map_err(|e| conversion_error(11, format!("bad timestamp '{}': {}", created_s, e)))?
        .with_timezone(&Utc);

    Ok(GameRecord {
        game_no: row.get(0)?,
        round_id: row.get(1)?,
        query: row.get(2)?,
        use_case: row.get(3)?,
        origin_a: row.get(4)?,
        origin_b: row.get(5)?,
        response_a: row.get(6)?,
        response_b: row.get(7)?,
        outcome,
        verdict,
        winner: row.get(10)?,
        created_at,
    })
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}
