//! Agents: a policy bound to an episode harness.
//!
//! An [`Agent`] plays episodes through a shared [`Harness`] and keeps the
//! [`FitnessRecord`] of its latest evaluation. Mutated copies share the
//! harness and start without a record.

use std::sync::Arc;

use popevo_env::{ConfigError, Environment, Harness, HarnessError};
use popevo_policy::{Policy, weights};
use rand::Rng;
use serde::Serialize;

/// Per-episode total rewards of one agent over one generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FitnessRecord {
    rewards: Vec<f32>,
}

impl FitnessRecord {
    #[must_use]
    pub fn new(rewards: Vec<f32>) -> Self {
        Self { rewards }
    }

    #[must_use]
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    #[must_use]
    pub fn sum(&self) -> f32 {
        self.rewards.iter().sum()
    }

    /// Arithmetic mean of the episode rewards; 0 for an empty record.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.rewards.is_empty() {
            return 0.0;
        }
        self.sum() / self.rewards.len() as f32
    }

    /// Lowest episode reward; `None` for an empty record.
    #[must_use]
    pub fn min(&self) -> Option<f32> {
        self.rewards.iter().copied().reduce(f32::min)
    }

    /// Highest episode reward; `None` for an empty record.
    #[must_use]
    pub fn max(&self) -> Option<f32> {
        self.rewards.iter().copied().reduce(f32::max)
    }

    /// Scalar fitness used for ranking.
    ///
    /// This is the mean reward. With a fixed episode count it orders agents
    /// exactly as the sum does.
    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.mean()
    }
}

impl From<Vec<f32>> for FitnessRecord {
    fn from(rewards: Vec<f32>) -> Self {
        Self::new(rewards)
    }
}

/// A policy bound to a shared, read-only episode harness.
#[derive(Debug)]
pub struct Agent<E, P> {
    harness: Arc<Harness<E>>,
    policy: P,
    record: Option<FitnessRecord>,
}

impl<E, P> Clone for Agent<E, P>
where
    P: Clone,
{
    fn clone(&self) -> Self {
        Self {
            harness: Arc::clone(&self.harness),
            policy: self.policy.clone(),
            record: self.record.clone(),
        }
    }
}

impl<E, P> Agent<E, P>
where
    E: Environment,
    P: Policy,
{
    /// Binds `policy` to `harness`.
    ///
    /// Fails when the policy's input width differs from the observation
    /// length or its output width differs from the action count.
    pub fn new(harness: Arc<Harness<E>>, policy: P) -> Result<Self, ConfigError> {
        check_shape(&harness, &policy)?;
        Ok(Self {
            harness,
            policy,
            record: None,
        })
    }

    #[must_use]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    #[must_use]
    pub fn into_policy(self) -> P {
        self.policy
    }

    #[must_use]
    pub fn harness(&self) -> &Arc<Harness<E>> {
        &self.harness
    }

    /// Rewards from the most recent evaluation, if any.
    #[must_use]
    pub fn record(&self) -> Option<&FitnessRecord> {
        self.record.as_ref()
    }

    /// Fitness from the most recent evaluation; `None` for an agent that has
    /// not been evaluated since it was created.
    #[must_use]
    pub fn fitness(&self) -> Option<f32> {
        self.record.as_ref().map(FitnessRecord::fitness)
    }

    /// Runs `ep_per_gen` episodes and remembers the resulting record.
    pub fn run_generation<R>(
        &mut self,
        ep_per_gen: usize,
        rng: &mut R,
    ) -> Result<FitnessRecord, HarnessError>
    where
        R: Rng + ?Sized,
    {
        let record = self.evaluate(ep_per_gen, rng)?;
        self.record = Some(record.clone());
        Ok(record)
    }

    /// Runs `ep_per_gen` episodes without touching the agent.
    pub fn evaluate<R>(&self, ep_per_gen: usize, rng: &mut R) -> Result<FitnessRecord, HarnessError>
    where
        R: Rng + ?Sized,
    {
        let mut rewards = Vec::with_capacity(ep_per_gen);
        for _ in 0..ep_per_gen {
            let summary = self
                .harness
                .run_episode(|obs, rng| self.policy.act(obs, rng), rng)?;
            rewards.push(summary.total_reward);
        }
        Ok(FitnessRecord::new(rewards))
    }

    /// Creates a new agent with a copy of this policy, perturbing each
    /// parameter with probability `rate` by `N(0, sigma)` noise and clipping
    /// it to the policy's parameter range.
    ///
    /// `rate = 0` yields an exact clone of the parameters.
    #[must_use]
    pub fn clone_mutated<R>(&self, rate: f32, sigma: f32, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut policy = self.policy.clone();
        let range = policy.param_range();
        weights::mutate(policy.params_mut(), sigma, range, rate, rng);
        Self {
            harness: Arc::clone(&self.harness),
            policy,
            record: None,
        }
    }

    /// Moves the agent to another harness, keeping its policy.
    pub fn rebind(&mut self, harness: Arc<Harness<E>>) -> Result<(), ConfigError> {
        check_shape(&harness, &self.policy)?;
        self.harness = harness;
        Ok(())
    }

    pub(crate) fn set_record(&mut self, record: FitnessRecord) {
        self.record = Some(record);
    }
}

pub(crate) fn check_shape<E, P>(harness: &Harness<E>, policy: &P) -> Result<(), ConfigError>
where
    E: Environment,
    P: Policy,
{
    let observation_len = harness.observation_len();
    let action_count = harness.action_count();
    if policy.input_len() != observation_len || policy.output_len() != action_count {
        return Err(ConfigError::PolicyShapeMismatch {
            policy_inputs: policy.input_len(),
            policy_outputs: policy.output_len(),
            observation_len,
            action_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use popevo_policy::ParamRange;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::testing::{ConstRewardEnv, harness, mlp};

    #[test]
    fn test_record_statistics() {
        let record = FitnessRecord::from(vec![1.0, -2.0, 4.0]);
        assert_eq!(record.len(), 3);
        assert_eq!(record.sum(), 3.0);
        assert_eq!(record.mean(), 1.0);
        assert_eq!(record.fitness(), 1.0);
        assert_eq!(record.min(), Some(-2.0));
        assert_eq!(record.max(), Some(4.0));

        let empty = FitnessRecord::new(vec![]);
        assert_eq!(empty.mean(), 0.0);
        assert_eq!(empty.min(), None);
    }

    #[test]
    fn test_single_episode_terminal_reward() {
        let mut rng = Pcg32::seed_from_u64(0);
        let harness = harness(ConstRewardEnv::new(10.0));
        let mut agent = Agent::new(harness, mlp(&[1, 2], &mut rng)).unwrap();
        assert_eq!(agent.fitness(), None);

        let record = agent.run_generation(1, &mut rng).unwrap();
        assert_eq!(record.rewards(), &[10.0]);
        assert_eq!(agent.fitness(), Some(10.0));
    }

    #[test]
    fn test_run_generation_collects_each_episode() {
        let mut rng = Pcg32::seed_from_u64(0);
        let harness = harness(ConstRewardEnv::new(2.5));
        let mut agent = Agent::new(harness, mlp(&[1, 2], &mut rng)).unwrap();
        let record = agent.run_generation(4, &mut rng).unwrap();
        assert_eq!(record.rewards(), &[2.5; 4]);
        assert_eq!(record.sum(), 10.0);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut rng = Pcg32::seed_from_u64(0);
        let harness = harness(ConstRewardEnv::new(1.0));
        let err = Agent::new(harness, mlp(&[3, 2], &mut rng)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::PolicyShapeMismatch {
                policy_inputs: 3,
                policy_outputs: 2,
                observation_len: 1,
                action_count: 2,
            }
        );
    }

    #[test]
    fn test_clone_mutated_zero_rate_is_exact() {
        let mut rng = Pcg32::seed_from_u64(1);
        let harness = harness(ConstRewardEnv::new(1.0));
        let mut agent = Agent::new(harness, mlp(&[1, 4, 2], &mut rng)).unwrap();
        agent.run_generation(1, &mut rng).unwrap();

        let clone = agent.clone_mutated(0.0, 1.0, &mut rng);
        assert_eq!(clone.policy().params(), agent.policy().params());
        assert_eq!(clone.record(), None);
        assert!(Arc::ptr_eq(clone.harness(), agent.harness()));
    }

    #[test]
    fn test_clone_mutated_full_rate_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(2);
        let harness = harness(ConstRewardEnv::new(1.0));
        let agent = Agent::new(harness, mlp(&[1, 4, 2], &mut rng)).unwrap();
        let range = agent.policy().param_range();
        assert_eq!(range, ParamRange::symmetric(1.0));
        for _ in 0..100 {
            let clone = agent.clone_mutated(1.0, 3.0, &mut rng);
            assert_ne!(clone.policy().params(), agent.policy().params());
            assert!(clone.policy().params().iter().all(|&p| range.contains(p)));
        }
    }
}
