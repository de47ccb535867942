use crate::config::{ArenaConfig, RoundSettings};
use crate::engine::generation::ResponseGenerator;
use crate::engine::locks::OriginLocks;
use crate::engine::round::{Reveal, Round, RoundState, RoundView, SlotResponse};
use crate::errors::ArenaError;
use crate::leaderboard::{leaderboard, LeaderboardEntry};
use crate::matchmaker::Matchmaker;
use crate::model::{Candidate, GameRecord, NewGame, Rating, Verdict, GLOBAL_SCOPE};
use crate::rating::EloEngine;
use crate::storage::{CommitOutcome, RatingChange, Store};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// How often a vote re-reads ratings after losing a compare-and-swap.
const MAX_COMMIT_ATTEMPTS: usize = 3;

/// A freshly opened round as returned to a client that generates responses
/// itself. Carries the full candidates.
#[derive(Debug, Clone)]
pub struct OpenedRound {
    pub round_id: String,
    pub use_case: String,
    pub slot_a: Candidate,
    pub slot_b: Candidate,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteReceipt {
    pub round_id: String,
    pub game_no: i64,
    pub total_games: u64,
    pub origin_a: String,
    pub origin_b: String,
    pub outcome: crate::model::Outcome,
    pub verdict: Verdict,
    pub winner: String,
    /// Global ratings of both origins after the update.
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub abandoned: usize,
    pub purged: usize,
}

pub struct Orchestrator {
    store: Store,
    engine: EloEngine,
    matchmaker: Matchmaker,
    per_use_case: bool,
    settings: RoundSettings,
    generator: Option<ResponseGenerator>,
    rounds: Mutex<HashMap<String, Round>>,
    locks: OriginLocks,
}

impl Orchestrator {
    pub fn new(store: Store, cfg: &ArenaConfig, generator: Option<ResponseGenerator>) -> Self {
        Self {
            store,
            engine: EloEngine::new(cfg.rating.k_factor, cfg.rating.baseline),
            matchmaker: Matchmaker::new(cfg.matchmaking.strategy),
            per_use_case: cfg.rating.per_use_case,
            settings: cfg.rounds.clone(),
            generator,
            rounds: Mutex::new(HashMap::new()),
            locks: OriginLocks::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, Round>> {
        // A panic while holding the lock leaves every round in a valid state.
        self.rounds.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Picks a pair for `use_case` and registers a new round in `OPEN`.
    pub fn open(&self, use_case: &str, query: Option<String>) -> Result<OpenedRound, ArenaError> {
        if !self.store.use_case_exists(use_case)? {
            return Err(ArenaError::UnknownUseCase(use_case.to_string()));
        }

        let candidates = self.store.list_candidates(use_case)?;
        let play_counts: HashMap<String, u64> = self
            .store
            .list_ratings(GLOBAL_SCOPE)?
            .into_iter()
            .map(|r| (r.origin, r.games_played))
            .collect();
        let total = self.store.total_games()?;

        let (slot_a, slot_b) = self.matchmaker.select_pair(
            use_case,
            candidates,
            &play_counts,
            total,
            &mut rand::thread_rng(),
        )?;

        let round_id = uuid::Uuid::new_v4().to_string();
        let round = Round::new(
            round_id.clone(),
            use_case.to_string(),
            query,
            slot_a.clone(),
            slot_b.clone(),
        );
        self.registry().insert(round_id.clone(), round);

        tracing::info!(event = "round_opened", round_id = %round_id, use_case = use_case);
        Ok(OpenedRound {
            round_id,
            use_case: use_case.to_string(),
            slot_a,
            slot_b,
        })
    }

    /// Stores both responses. Valid only from `OPEN`.
    pub fn attach_responses(
        &self,
        round_id: &str,
        query: Option<String>,
        response_a: SlotResponse,
        response_b: SlotResponse,
    ) -> Result<RoundView, ArenaError> {
        let mut rounds = self.registry();
        let round = rounds
            .get_mut(round_id)
            .ok_or_else(|| ArenaError::RoundNotFound(round_id.to_string()))?;

        round.transition(RoundState::ResponsesReady, "attach responses")?;
        if query.is_some() {
            round.query = query;
        }
        round.response_a = Some(response_a);
        round.response_b = Some(response_b);

        tracing::info!(event = "responses_attached", round_id = %round_id);
        Ok(round.view())
    }

    /// Runs both collaborators for an `OPEN` round and attaches the results.
    pub async fn generate_responses(&self, round_id: &str) -> Result<RoundView, ArenaError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(ArenaError::GenerationUnavailable)?;

        let (slot_a, slot_b, query) = {
            let rounds = self.registry();
            let round = rounds
                .get(round_id)
                .ok_or_else(|| ArenaError::RoundNotFound(round_id.to_string()))?;
            if round.state != RoundState::Open {
                return Err(ArenaError::InvalidRoundState {
                    round_id: round_id.to_string(),
                    state: round.state,
                    op: "generate responses",
                });
            }
            (
                round.slot_a.clone(),
                round.slot_b.clone(),
                round.query.clone().unwrap_or_default(),
            )
        };

        let (a, b) = generator.generate_pair(&slot_a, &slot_b, &query).await;
        self.attach_responses(round_id, None, a, b)
    }

    /// Opens a round and generates both responses server-side.
    pub async fn open_and_generate(
        &self,
        use_case: &str,
        query: &str,
    ) -> Result<RoundView, ArenaError> {
        let opened = self.open(use_case, Some(query.to_string()))?;
        self.generate_responses(&opened.round_id).await
    }

    pub fn view(&self, round_id: &str) -> Result<RoundView, ArenaError> {
        self.registry()
            .get(round_id)
            .map(Round::view)
            .ok_or_else(|| ArenaError::RoundNotFound(round_id.to_string()))
    }

    /// Origins behind slots A and B. Not part of any voter-facing view.
    pub fn slot_origins(&self, round_id: &str) -> Result<(String, String), ArenaError> {
        self.registry()
            .get(round_id)
            .map(|r| (r.slot_a.origin().to_string(), r.slot_b.origin().to_string()))
            .ok_or_else(|| ArenaError::RoundNotFound(round_id.to_string()))
    }

    /// Casts the single vote of a round.
    ///
    /// The pair lock is taken first; the round is then claimed (`VOTED`)
    /// under the registry lock and committed with no further `.await`, so a
    /// dropped vote leaves the round untouched. Ratings and the ledger row are
    /// written in one transaction; on any failure the round goes back to
    /// `RESPONSES_READY`.
    pub async fn vote(&self, round_id: &str, verdict: Verdict) -> Result<VoteReceipt, ArenaError> {
        let (origin_a, origin_b) = {
            let rounds = self.registry();
            let round = rounds
                .get(round_id)
                .ok_or_else(|| ArenaError::RoundNotFound(round_id.to_string()))?;
            Self::check_votable(round_id, round)?;
            (
                round.slot_a.origin().to_string(),
                round.slot_b.origin().to_string(),
            )
        };

        let _guard = self.locks.lock_pair(&origin_a, &origin_b).await;

        let snapshot = {
            let mut rounds = self.registry();
            let round = rounds
                .get_mut(round_id)
                .ok_or_else(|| ArenaError::RoundNotFound(round_id.to_string()))?;
            Self::check_votable(round_id, round)?;
            round.transition(RoundState::Voted, "vote")?;
            round.clone()
        };

        match self.commit_vote(&snapshot, verdict) {
            Ok((record, ratings)) => {
                let mut rounds = self.registry();
                if let Some(round) = rounds.get_mut(round_id) {
                    round.reveal = Some(Reveal {
                        origin_a: record.origin_a.clone(),
                        origin_b: record.origin_b.clone(),
                        game_no: record.game_no,
                        outcome: record.outcome,
                        verdict: record.verdict,
                        winner: record.winner.clone(),
                    });
                    round.transition(RoundState::Finalized, "finalize")?;
                }
                tracing::info!(
                    event = "round_finalized",
                    round_id = %round_id,
                    game_no = record.game_no,
                    outcome = record.outcome.as_str(),
                    verdict = record.verdict.as_str(),
                );
                Ok(VoteReceipt {
                    round_id: round_id.to_string(),
                    game_no: record.game_no,
                    total_games: record.game_no as u64,
                    origin_a: record.origin_a,
                    origin_b: record.origin_b,
                    outcome: record.outcome,
                    verdict: record.verdict,
                    winner: record.winner,
                    ratings,
                })
            }
            Err(ArenaError::AlreadyVoted(id)) => {
                // Ledger already holds this round.
                let mut rounds = self.registry();
                if let Some(round) = rounds.get_mut(round_id) {
                    round.transition(RoundState::Finalized, "finalize")?;
                }
                Err(ArenaError::AlreadyVoted(id))
            }
            Err(e) => {
                let mut rounds = self.registry();
                if let Some(round) = rounds.get_mut(round_id) {
                    round.transition(RoundState::ResponsesReady, "roll back vote")?;
                }
                tracing::error!(
                    event = "vote_failed",
                    round_id = %round_id,
                    code = e.code(),
                    error = %e,
                );
                Err(e)
            }
        }
    }

    fn check_votable(round_id: &str, round: &Round) -> Result<(), ArenaError> {
        match round.state {
            RoundState::Voted | RoundState::Finalized => {
                Err(ArenaError::AlreadyVoted(round_id.to_string()))
            }
            RoundState::Abandoned => Err(ArenaError::RoundNotFound(round_id.to_string())),
            RoundState::Open | RoundState::ResponsesReady => Ok(()),
        }
    }

    /// Caller holds the pair lock of both origins.
    fn commit_vote(
        &self,
        round: &Round,
        verdict: Verdict,
    ) -> Result<(GameRecord, Vec<Rating>), ArenaError> {
        let origin_a = round.slot_a.origin();
        let origin_b = round.slot_b.origin();
        let outcome = verdict.outcome();

        let mut scopes = vec![GLOBAL_SCOPE.to_string()];
        if self.per_use_case {
            scopes.push(round.use_case.clone());
        }

        let game = NewGame {
            round_id: round.id.clone(),
            query: round.query.clone().unwrap_or_default(),
            use_case: round.use_case.clone(),
            origin_a: origin_a.to_string(),
            origin_b: origin_b.to_string(),
            response_a: round
                .response_a
                .as_ref()
                .map(|r| r.text.clone())
                .unwrap_or_default(),
            response_b: round
                .response_b
                .as_ref()
                .map(|r| r.text.clone())
                .unwrap_or_default(),
            verdict,
            created_at: Utc::now(),
        };

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let mut changes = Vec::with_capacity(scopes.len() * 2);
            let mut global = Vec::new();
            for scope in &scopes {
                let prior_a = self.store.get_rating(scope, origin_a)?;
                let prior_b = self.store.get_rating(scope, origin_b)?;
                let base_a = prior_a
                    .clone()
                    .unwrap_or_else(|| self.engine.initial(origin_a));
                let base_b = prior_b
                    .clone()
                    .unwrap_or_else(|| self.engine.initial(origin_b));

                let (next_a, next_b) = self.engine.update(&base_a, &base_b, outcome)?;
                if scope == GLOBAL_SCOPE {
                    global = vec![next_a.clone(), next_b.clone()];
                }
                changes.push(RatingChange {
                    scope: scope.clone(),
                    prior: prior_a,
                    next: next_a,
                });
                changes.push(RatingChange {
                    scope: scope.clone(),
                    prior: prior_b,
                    next: next_b,
                });
            }

            match self.store.commit_game(&game, &changes)? {
                CommitOutcome::Committed(record) => return Ok((record, global)),
                CommitOutcome::DuplicateRound(game_no) => {
                    tracing::warn!(
                        event = "vote_duplicate",
                        round_id = %round.id,
                        game_no = game_no,
                    );
                    return Err(ArenaError::AlreadyVoted(round.id.clone()));
                }
                CommitOutcome::Conflict { scope, origin } => {
                    tracing::warn!(
                        event = "rating_conflict",
                        round_id = %round.id,
                        scope = %scope,
                        origin = %origin,
                        attempt = attempt,
                    );
                }
            }
        }

        Err(ArenaError::Storage(anyhow::anyhow!(
            "ratings for {} / {} kept changing; gave up after {} attempts",
            origin_a,
            origin_b,
            MAX_COMMIT_ATTEMPTS
        )))
    }

    /// Drops rounds idle past the TTL and tombstones past their retention.
    /// Rounds mid-vote are never touched.
    pub fn sweep_at(&self, now: Instant) -> SweepReport {
        let ttl = self.settings.ttl();
        let tombstone = self.settings.tombstone();
        let mut report = SweepReport::default();

        let mut rounds = self.registry();
        rounds.retain(|id, round| {
            if round.state.is_abandonable()
                && now.saturating_duration_since(round.last_activity) >= ttl
            {
                if round.transition(RoundState::Abandoned, "abandon").is_ok() {
                    tracing::info!(
                        event = "round_abandoned",
                        round_id = %id,
                        use_case = %round.use_case,
                    );
                    report.abandoned += 1;
                    return false;
                }
            }
            if let Some(at) = round.finalized_at {
                if now.saturating_duration_since(at) >= tombstone {
                    report.purged += 1;
                    return false;
                }
            }
            true
        });

        if report.abandoned > 0 || report.purged > 0 {
            tracing::debug!(
                event = "sweep",
                abandoned = report.abandoned,
                purged = report.purged,
                open = rounds.len(),
            );
        }
        report
    }

    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(Instant::now())
    }

    /// Background abandonment sweep on a fixed interval.
    pub fn spawn_sweeper(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let period = self.settings.sweep_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.sweep();
            }
        })
    }

    /// Rounds not yet finalized.
    pub fn open_round_count(&self) -> usize {
        self.registry()
            .values()
            .filter(|r| r.state != RoundState::Finalized)
            .count()
    }

    pub fn total_games(&self) -> Result<u64, ArenaError> {
        Ok(self.store.total_games()?)
    }

    pub fn leaderboard(&self, scope: &str) -> Result<Vec<LeaderboardEntry>, ArenaError> {
        leaderboard(&self.store, scope, self.per_use_case)
    }

    pub fn use_cases(&self) -> Result<Vec<String>, ArenaError> {
        Ok(self.store.list_use_cases()?)
    }

    pub fn models(&self) -> Result<Vec<String>, ArenaError> {
        Ok(self.store.fetch_models()?)
    }
}
