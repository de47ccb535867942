use crate::errors::ArenaError;
use crate::matchmaker::latest_per_origin;
use crate::model::{Rating, GLOBAL_SCOPE};
use crate::storage::Store;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub model_name: String,
    pub score: f64,
    pub no_of_games: u64,
}

/// Highest score first; equal scores by ascending origin name.
pub fn rank(mut ratings: Vec<Rating>) -> Vec<LeaderboardEntry> {
    ratings.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.origin.cmp(&b.origin),
        other => other,
    });
    ratings
        .into_iter()
        .map(|r| LeaderboardEntry {
            model_name: r.origin,
            score: r.score,
            no_of_games: r.games_played,
        })
        .collect()
}

/// Read-only snapshot of a rating scope.
///
/// With per-use-case ratings disabled, a use-case board is the global table
/// restricted to origins registered for that use case.
pub fn leaderboard(
    store: &Store,
    scope: &str,
    per_use_case: bool,
) -> Result<Vec<LeaderboardEntry>, ArenaError> {
    if scope == GLOBAL_SCOPE {
        return Ok(rank(store.list_ratings(GLOBAL_SCOPE)?));
    }
    if !store.use_case_exists(scope)? {
        return Err(ArenaError::UnknownUseCase(scope.to_string()));
    }
    if per_use_case {
        return Ok(rank(store.list_ratings(scope)?));
    }

    let origins: HashSet<String> = latest_per_origin(store.list_candidates(scope)?)
        .iter()
        .map(|c| c.origin().to_string())
        .collect();
    let ratings = store
        .list_ratings(GLOBAL_SCOPE)?
        .into_iter()
        .filter(|r| origins.contains(&r.origin))
        .collect();
    Ok(rank(ratings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(origin: &str, score: f64) -> Rating {
        Rating {
            origin: origin.into(),
            score,
            games_played: 1,
        }
    }

    #[test]
    fn test_rank_orders_by_score_then_name() {
        let board = rank(vec![
            r("beta", 1000.0),
            r("gamma", 1020.0),
            r("alpha", 1000.0),
            r("delta", 980.5),
        ]);
        let names: Vec<_> = board.iter().map(|e| e.model_name.as_str()).collect();
        assert_eq!(names, ["gamma", "alpha", "beta", "delta"]);
        for w in board.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(vec![]).is_empty());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(&rank(vec![r("m", 1016.0)])[0]).unwrap();
        assert_eq!(json["model_name"], "m");
        assert_eq!(json["no_of_games"], 1);
    }
}
