//! Small environments and helpers shared by unit tests.

use std::sync::Arc;

use popevo_env::{EpisodeParams, Environment, Harness, HookError, Termination, Transition};
use popevo_policy::{ActionSelection, Mlp, ParamRange};
use rand::Rng;

/// Ends every episode on the first action with a fixed reward.
#[derive(Debug, Clone)]
pub(crate) struct ConstRewardEnv {
    reward: f32,
    observation_len: usize,
}

impl ConstRewardEnv {
    pub(crate) fn new(reward: f32) -> Self {
        Self {
            reward,
            observation_len: 1,
        }
    }

    pub(crate) fn with_observation_len(mut self, observation_len: usize) -> Self {
        self.observation_len = observation_len;
        self
    }
}

impl Environment for ConstRewardEnv {
    type State = ();

    fn observation_len(&self) -> usize {
        self.observation_len
    }

    fn action_count(&self) -> usize {
        2
    }

    fn start_state<R>(&self, _rng: &mut R) -> Result<(), HookError>
    where
        R: Rng + ?Sized,
    {
        Ok(())
    }

    fn observe(&self, _state: &()) -> Result<Vec<f32>, HookError> {
        Ok(vec![1.0; self.observation_len])
    }

    fn take_action<R>(
        &self,
        state: (),
        _action: usize,
        _rng: &mut R,
    ) -> Result<Transition<()>, HookError>
    where
        R: Rng + ?Sized,
    {
        Ok(Transition::terminal(state, self.reward, Termination::GoalReached))
    }
}

/// Rewards the chosen action's index plus uniform noise, so fitness depends
/// on the policy and on the episode RNG.
#[derive(Debug, Clone)]
pub(crate) struct ActionRewardEnv;

impl Environment for ActionRewardEnv {
    type State = f32;

    fn observation_len(&self) -> usize {
        1
    }

    fn action_count(&self) -> usize {
        2
    }

    fn start_state<R>(&self, rng: &mut R) -> Result<f32, HookError>
    where
        R: Rng + ?Sized,
    {
        Ok(rng.random_range(-1.0..1.0))
    }

    fn observe(&self, state: &f32) -> Result<Vec<f32>, HookError> {
        Ok(vec![*state])
    }

    #[expect(clippy::cast_precision_loss)]
    fn take_action<R>(
        &self,
        state: f32,
        action: usize,
        rng: &mut R,
    ) -> Result<Transition<f32>, HookError>
    where
        R: Rng + ?Sized,
    {
        let reward = action as f32 + rng.random_range(0.0..0.1);
        Ok(Transition::terminal(state, reward, Termination::GoalReached))
    }
}

/// Fails every transition.
#[derive(Debug, Clone)]
pub(crate) struct BrokenEnv;

impl Environment for BrokenEnv {
    type State = ();

    fn observation_len(&self) -> usize {
        1
    }

    fn action_count(&self) -> usize {
        2
    }

    fn start_state<R>(&self, _rng: &mut R) -> Result<(), HookError>
    where
        R: Rng + ?Sized,
    {
        Ok(())
    }

    fn observe(&self, _state: &()) -> Result<Vec<f32>, HookError> {
        Ok(vec![0.0])
    }

    fn take_action<R>(
        &self,
        _state: (),
        _action: usize,
        _rng: &mut R,
    ) -> Result<Transition<()>, HookError>
    where
        R: Rng + ?Sized,
    {
        Err(HookError::new("simulator crashed"))
    }
}

pub(crate) fn harness<E>(env: E) -> Arc<Harness<E>>
where
    E: Environment,
{
    let params = EpisodeParams {
        steps_per_episode: 5,
        stat_every: 1,
    };
    Arc::new(Harness::new(env, params).unwrap())
}

pub(crate) fn mlp<R>(layers: &[usize], rng: &mut R) -> Mlp
where
    R: Rng + ?Sized,
{
    Mlp::random(
        layers.to_vec(),
        ParamRange::symmetric(1.0),
        ActionSelection::Greedy,
        rng,
    )
    .unwrap()
}

pub(crate) fn mlps<R>(count: usize, layers: &[usize], rng: &mut R) -> Vec<Mlp>
where
    R: Rng + ?Sized,
{
    (0..count).map(|_| mlp(layers, rng)).collect()
}
