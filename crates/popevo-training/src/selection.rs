//! Fitness-weighted resampling of the retained top performers.
//!
//! The retained agents are sampled with replacement to fill the rest of the
//! next generation. The chance of picking agent `i` is proportional to a
//! non-negative weight derived from its fitness:
//!
//! - [`Weighting::ScoreShift`] (default): `w_i = s_i - min(s)`. Shifting by
//!   the minimum makes negative rewards usable as weights; the weakest
//!   survivor gets weight 0 and is only kept through elitism.
//! - [`Weighting::Rank`]: `w_i = k - (number of survivors scoring strictly
//!   higher)`, so the best gets `k` and tied scores share a weight.
//!
//! When two or more survivors all score the same (or some score is not
//! finite) the weights cannot tell them apart. Selection then falls back to uniform
//! sampling and the weights are flagged as degenerate.

use rand::{
    Rng,
    distr::{Distribution as _, weighted::WeightedIndex},
};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
#[from_str(rename_all = "snake_case")]
pub enum Weighting {
    #[default]
    ScoreShift,
    Rank,
}

/// Resampling weights for one generation's survivors.
#[derive(Debug, Clone)]
pub struct SelectionWeights {
    weights: Vec<f64>,
    dist: Option<WeightedIndex<f64>>,
}

impl SelectionWeights {
    /// Computes weights for `scores` (one per survivor, any order).
    ///
    /// # Panics
    ///
    /// Panics if `scores` is empty.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(scores: &[f32], weighting: Weighting) -> Self {
        assert!(!scores.is_empty(), "cannot select from an empty set");
        let uniform = || Self {
            weights: vec![1.0; scores.len()],
            dist: None,
        };

        if scores.iter().any(|s| !s.is_finite()) {
            return uniform();
        }
        if let [_] = scores {
            let weights = vec![1.0];
            let dist = WeightedIndex::new(&weights).ok();
            return Self { weights, dist };
        }
        let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if max - min <= 0.0 {
            return uniform();
        }

        let weights = match weighting {
            Weighting::ScoreShift => scores
                .iter()
                .map(|&s| f64::from(s) - f64::from(min))
                .collect::<Vec<_>>(),
            Weighting::Rank => scores
                .iter()
                .map(|s| {
                    let better = scores.iter().filter(|o| *o > s).count();
                    (scores.len() - better) as f64
                })
                .collect(),
        };
        match WeightedIndex::new(&weights) {
            Ok(dist) => Self {
                weights,
                dist: Some(dist),
            },
            Err(_) => uniform(),
        }
    }

    /// Unnormalised weights; all `1.0` when degenerate.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Selection probability of each survivor.
    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        let total = self.weights.iter().sum::<f64>();
        self.weights.iter().map(|w| w / total).collect()
    }

    /// Whether selection fell back to uniform sampling.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.dist.is_none()
    }

    /// Draws one survivor index.
    pub fn sample_one<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        match &self.dist {
            Some(dist) => dist.sample(rng),
            None => rng.random_range(0..self.weights.len()),
        }
    }
}

/// Draws `count` survivor indices with replacement.
pub fn resample<R>(weights: &SelectionWeights, count: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    (0..count).map(|_| weights.sample_one(rng)).collect()
}
