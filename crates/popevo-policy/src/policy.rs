use rand::{
    Rng,
    distr::{Distribution as _, weighted::WeightedIndex},
};
use serde::{Deserialize, Serialize};

use crate::weights::ParamRange;

/// How a policy turns action probabilities into a single action.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
#[from_str(rename_all = "snake_case")]
pub enum ActionSelection {
    /// Highest-probability action; ties go to the lowest index.
    #[default]
    Greedy,
    /// Draw an action from the probability vector.
    Sample,
}

/// A parametric decision function from observations to actions.
///
/// Two policies built with the same architecture differ only in their flat
/// parameter vectors, which is what cloning and mutation operate on.
pub trait Policy: Clone + Send + Sync {
    fn input_len(&self) -> usize;

    fn output_len(&self) -> usize;

    /// Returns one probability per action, summing to 1.
    fn action_probabilities(&self, observation: &[f32]) -> Vec<f32>;

    fn action_selection(&self) -> ActionSelection {
        ActionSelection::Greedy
    }

    fn params(&self) -> &[f32];

    /// Mutable view of the parameters. Callers must keep every value inside
    /// [`param_range`](Self::param_range).
    fn params_mut(&mut self) -> &mut [f32];

    fn param_range(&self) -> ParamRange;

    fn act<R>(&self, observation: &[f32], rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let probabilities = self.action_probabilities(observation);
        select_action(self.action_selection(), &probabilities, rng)
    }
}

/// Picks an action index from a probability vector.
///
/// Sampling falls back to argmax when the probabilities cannot form a
/// distribution (all zero, or non-finite).
pub fn select_action<R>(selection: ActionSelection, probabilities: &[f32], rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    match selection {
        ActionSelection::Greedy => argmax(probabilities),
        ActionSelection::Sample => match WeightedIndex::new(probabilities) {
            Ok(dist) => dist.sample(rng),
            Err(_) => argmax(probabilities),
        },
    }
}

/// Index of the largest value; the first one wins ties. Returns 0 for an
/// empty slice.
#[must_use]
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
