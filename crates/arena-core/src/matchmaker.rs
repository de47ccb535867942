//! Pair selection for a round.
//!
//! Only the newest version of each origin competes, and the two sides of a
//! pair never share an origin.

use crate::errors::ArenaError;
use crate::model::Candidate;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Smallest selection weight an origin can get under play-count weighting.
pub const MIN_WEIGHT: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Every ordered pair of distinct origins is equally likely.
    #[default]
    Uniform,
    /// Origins that have played a smaller share of all games are picked more
    /// often.
    PlayCountWeighted,
}

/// Keeps the highest version per origin. Output is ordered by origin.
pub fn latest_per_origin(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut latest: BTreeMap<String, Candidate> = BTreeMap::new();
    for c in candidates {
        match latest.get(c.origin()) {
            Some(existing) if existing.version() >= c.version() => {}
            _ => {
                latest.insert(c.origin().to_string(), c);
            }
        }
    }
    latest.into_values().collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Matchmaker {
    pub strategy: Strategy,
}

impl Matchmaker {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    /// Picks `(slot_a, slot_b)` from the catalog rows of one use case.
    ///
    /// `play_counts` maps origin to games played and `total_games` is the
    /// ledger length; both are only read by [`Strategy::PlayCountWeighted`].
    pub fn select_pair<R: Rng + ?Sized>(
        &self,
        use_case: &str,
        candidates: Vec<Candidate>,
        play_counts: &HashMap<String, u64>,
        total_games: u64,
        rng: &mut R,
    ) -> Result<(Candidate, Candidate), ArenaError> {
        let mut pool = latest_per_origin(candidates);
        if pool.len() < 2 {
            return Err(ArenaError::NotEnoughCandidates {
                use_case: use_case.to_string(),
                found: pool.len(),
            });
        }

        let (ia, ib) = match self.strategy {
            Strategy::Uniform => uniform_indices(pool.len(), rng),
            Strategy::PlayCountWeighted if total_games == 0 => uniform_indices(pool.len(), rng),
            Strategy::PlayCountWeighted => {
                let weights: Vec<f64> = pool
                    .iter()
                    .map(|c| {
                        let played = play_counts.get(c.origin()).copied().unwrap_or(0);
                        play_weight(played, total_games)
                    })
                    .collect();
                weighted_indices(&weights, rng)?
            }
        };

        // Remove the higher index first so the lower one stays valid.
        let (a, b) = if ia > ib {
            let a = pool.swap_remove(ia);
            let b = pool.swap_remove(ib);
            (a, b)
        } else {
            let b = pool.swap_remove(ib);
            let a = pool.swap_remove(ia);
            (a, b)
        };

        tracing::debug!(
            event = "pair_selected",
            use_case = use_case,
            strategy = ?self.strategy,
            origin_a = a.origin(),
            origin_b = b.origin(),
        );
        Ok((a, b))
    }
}

pub fn play_weight(played: u64, total_games: u64) -> f64 {
    if total_games == 0 {
        return 1.0;
    }
    (1.0 - played as f64 / total_games as f64).max(MIN_WEIGHT)
}

fn uniform_indices<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.gen_range(0..n);
    let mut b = rng.gen_range(0..n - 1);
    if b >= a {
        b += 1;
    }
    (a, b)
}

fn weighted_indices<R: Rng + ?Sized>(
    weights: &[f64],
    rng: &mut R,
) -> Result<(usize, usize), ArenaError> {
    let first = WeightedIndex::new(weights)
        .map_err(|e| anyhow::anyhow!("invalid matchmaking weights: {}", e))?;
    let a = first.sample(rng);

    let mut rest = weights.to_vec();
    rest[a] = 0.0;
    let second = WeightedIndex::new(&rest)
        .map_err(|e| anyhow::anyhow!("invalid matchmaking weights: {}", e))?;
    let b = second.sample(rng);
    Ok((a, b))
}
