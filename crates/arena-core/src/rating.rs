//! Pairwise skill rating (Elo).
//!
//! Both participants of one update share the same K, so the score moved from
//! one side is exactly the score gained by the other.

use crate::errors::ArenaError;
use crate::model::{Outcome, Rating};

pub const DEFAULT_K_FACTOR: f64 = 32.0;
pub const DEFAULT_BASELINE: f64 = 1000.0;

/// Probability that a player rated `score_a` beats one rated `score_b`.
pub fn expected_score(score_a: f64, score_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((score_b - score_a) / 400.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloEngine {
    pub k_factor: f64,
    pub baseline: f64,
}

impl Default for EloEngine {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
            baseline: DEFAULT_BASELINE,
        }
    }
}

impl EloEngine {
    pub fn new(k_factor: f64, baseline: f64) -> Self {
        Self { k_factor, baseline }
    }

    /// Rating assigned to an origin the first time it is seen.
    pub fn initial(&self, origin: &str) -> Rating {
        Rating {
            origin: origin.to_string(),
            score: self.baseline,
            games_played: 0,
        }
    }

    pub fn update(
        &self,
        a: &Rating,
        b: &Rating,
        outcome: Outcome,
    ) -> Result<(Rating, Rating), ArenaError> {
        for r in [a, b] {
            if !r.score.is_finite() {
                return Err(ArenaError::InvalidRatingState {
                    origin: r.origin.clone(),
                    score: r.score,
                });
            }
        }

        let expected_a = expected_score(a.score, b.score);
        let expected_b = 1.0 - expected_a;
        let actual_a = outcome.actual_a();
        let actual_b = 1.0 - actual_a;

        let new_a = Rating {
            origin: a.origin.clone(),
            score: a.score + self.k_factor * (actual_a - expected_a),
            games_played: a.games_played + 1,
        };
        let new_b = Rating {
            origin: b.origin.clone(),
            score: b.score + self.k_factor * (actual_b - expected_b),
            games_played: b.games_played + 1,
        };

        // Overflow guard: a huge K can still push a finite score to inf.
        for r in [&new_a, &new_b] {
            if !r.score.is_finite() {
                return Err(ArenaError::InvalidRatingState {
                    origin: r.origin.clone(),
                    score: r.score,
                });
            }
        }

        Ok((new_a, new_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn rating(origin: &str, score: f64, games: u64) -> Rating {
        Rating {
            origin: origin.into(),
            score,
            games_played: games,
        }
    }

    #[test]
    fn test_expected_score_equal_ratings() {
        assert!((expected_score(1500.0, 1500.0) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_win_from_equal_ratings() {
        let engine = EloEngine::new(32.0, 1000.0);
        let a = engine.initial("a");
        let b = engine.initial("b");

        let (a1, b1) = engine.update(&a, &b, Outcome::AWins).unwrap();
        assert!((a1.score - 1016.0).abs() < EPS);
        assert!((b1.score - 984.0).abs() < EPS);
        assert!(((a1.score - a.score) - (b.score - b1.score)).abs() < EPS);
        assert!(a1.score > a.score && a.score > b1.score);
        assert_eq!(a1.games_played, 1);
        assert_eq!(b1.games_played, 1);
    }

    #[test]
    fn test_draw_after_win_conserves_total() {
        let engine = EloEngine::new(32.0, 1000.0);
        let (a1, b1) = engine
            .update(&engine.initial("a"), &engine.initial("b"), Outcome::AWins)
            .unwrap();
        let (a2, b2) = engine.update(&a1, &b1, Outcome::Draw).unwrap();

        let expected_a = expected_score(1016.0, 984.0);
        assert!((expected_a - 0.5459).abs() < 1e-3);
        assert!((a2.score - (1016.0 + 32.0 * (0.5 - expected_a))).abs() < EPS);
        assert!((a2.score - 1014.53).abs() < 0.01);
        assert!((b2.score - 985.47).abs() < 0.01);
        assert!((a2.score + b2.score - 2000.0).abs() < EPS);
        assert_eq!(a2.games_played, 2);
    }

    #[test]
    fn test_draw_between_unequal_ratings_conserves_sum() {
        let engine = EloEngine::default();
        let a = rating("a", 1234.5, 7);
        let b = rating("b", 876.25, 3);
        let (a1, b1) = engine.update(&a, &b, Outcome::Draw).unwrap();
        assert!((a1.score + b1.score - (a.score + b.score)).abs() < 1e-9);
        assert!(a1.score < a.score, "favourite loses points on a draw");
        assert_eq!(a1.games_played, 8);
        assert_eq!(b1.games_played, 4);
    }

    #[test]
    fn test_b_wins_mirrors_a_wins() {
        let engine = EloEngine::default();
        let a = rating("a", 1100.0, 1);
        let b = rating("b", 1000.0, 1);
        let (a1, b1) = engine.update(&a, &b, Outcome::BWins).unwrap();
        let (b2, a2) = engine.update(&b, &a, Outcome::AWins).unwrap();
        assert!((a1.score - a2.score).abs() < EPS);
        assert!((b1.score - b2.score).abs() < EPS);
    }

    #[test]
    fn test_non_finite_score_is_rejected() {
        let engine = EloEngine::default();
        let a = rating("a", f64::NAN, 0);
        let b = rating("b", 1000.0, 0);
        let err = engine.update(&a, &b, Outcome::Draw).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidRatingState { ref origin, .. } if origin == "a"));

        let c = rating("c", f64::INFINITY, 0);
        assert!(engine.update(&b, &c, Outcome::AWins).is_err());
    }
}
