//! Episode driver: runs one bounded episode against an [`Environment`].
//!
//! The harness owns no domain logic. For each step it asks the environment
//! for an observation, asks the caller for an action, applies the action and
//! accumulates the reward, stopping when the environment reports a
//! [`Termination`] or the step budget is exhausted.
//!
//! Every hook output is checked before it is used: observations must have the
//! advertised length and contain only finite values, rewards must be finite
//! and actions must lie in `0..action_count`. Anything else fails the episode
//! with a [`HarnessError`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Environment, HarnessError, HookKind, Termination, Transition};

/// Episode-level parameters shared by every agent bound to a harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EpisodeParams {
    /// Maximum number of actions per episode.
    pub steps_per_episode: usize,
    /// Generations between detailed statistics reports.
    pub stat_every: usize,
}

impl Default for EpisodeParams {
    fn default() -> Self {
        Self {
            steps_per_episode: 50,
            stat_every: 10,
        }
    }
}

impl EpisodeParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_episode == 0 {
            return Err(ConfigError::ZeroStepsPerEpisode);
        }
        if self.stat_every == 0 {
            return Err(ConfigError::ZeroStatEvery);
        }
        Ok(())
    }
}

/// How an episode ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeEnd {
    Terminated(Termination),
    /// The step budget ran out.
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub total_reward: f32,
    pub steps: usize,
    pub end: EpisodeEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub observation: Vec<f32>,
    pub action: usize,
    pub reward: f32,
}

/// A fully recorded episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub summary: EpisodeSummary,
    pub steps: Vec<StepRecord>,
    /// Rendered states, starting with the start state. Empty when the
    /// environment does not implement `display`.
    pub frames: Vec<String>,
}

#[derive(Debug, Default)]
struct Trace {
    steps: Vec<StepRecord>,
    frames: Vec<String>,
}

/// An environment together with its validated episode parameters.
#[derive(Debug, Clone)]
pub struct Harness<E> {
    env: E,
    params: EpisodeParams,
}

impl<E> Harness<E>
where
    E: Environment,
{
    /// Binds an environment to episode parameters.
    ///
    /// Fails when the parameters are out of range or the environment
    /// advertises an empty observation or action space.
    pub fn new(env: E, params: EpisodeParams) -> Result<Self, ConfigError> {
        params.validate()?;
        if env.observation_len() == 0 {
            return Err(ConfigError::EmptyObservation);
        }
        if env.action_count() == 0 {
            return Err(ConfigError::NoActions);
        }
        Ok(Self { env, params })
    }

    #[must_use]
    pub fn env(&self) -> &E {
        &self.env
    }

    #[must_use]
    pub fn params(&self) -> &EpisodeParams {
        &self.params
    }

    #[must_use]
    pub fn observation_len(&self) -> usize {
        self.env.observation_len()
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.env.action_count()
    }

    /// Runs one episode, choosing each action with `act`.
    pub fn run_episode<F, R>(&self, mut act: F, rng: &mut R) -> Result<EpisodeSummary, HarnessError>
    where
        F: FnMut(&[f32], &mut R) -> usize,
        R: Rng + ?Sized,
    {
        self.drive(|obs, rng| Ok(act(obs, rng)), None, rng)
    }

    /// Runs one episode and keeps the full `(observation, action, reward)` trace.
    pub fn record_episode<F, R>(&self, mut act: F, rng: &mut R) -> Result<Episode, HarnessError>
    where
        F: FnMut(&[f32], &mut R) -> usize,
        R: Rng + ?Sized,
    {
        let mut trace = Trace::default();
        let summary = self.drive(|obs, rng| Ok(act(obs, rng)), Some(&mut trace), rng)?;
        Ok(Episode {
            summary,
            steps: trace.steps,
            frames: trace.frames,
        })
    }

    /// Runs one episode driven by the environment's own `default_action` hook.
    pub fn run_episode_with_default_actions<R>(
        &self,
        rng: &mut R,
    ) -> Result<EpisodeSummary, HarnessError>
    where
        R: Rng + ?Sized,
    {
        if !self.env.has_default_action() {
            return Err(ConfigError::MissingHook(HookKind::DefaultAction).into());
        }
        self.drive(
            |obs, _rng| match self.env.default_action(obs) {
                Some(result) => result.map_err(HarnessError::hook(HookKind::DefaultAction)),
                None => Err(ConfigError::MissingHook(HookKind::DefaultAction).into()),
            },
            None,
            rng,
        )
    }

    fn drive<F, R>(
        &self,
        mut choose: F,
        mut trace: Option<&mut Trace>,
        rng: &mut R,
    ) -> Result<EpisodeSummary, HarnessError>
    where
        F: FnMut(&[f32], &mut R) -> Result<usize, HarnessError>,
        R: Rng + ?Sized,
    {
        let mut state = self
            .env
            .start_state(rng)
            .map_err(HarnessError::hook(HookKind::StartState))?;
        if let Some(trace) = trace.as_deref_mut()
            && let Some(frame) = self.env.display(&state)
        {
            trace.frames.push(frame);
        }

        let mut total_reward = 0.0;
        for step in 0..self.params.steps_per_episode {
            let observation = self.observe(&state)?;
            let action = choose(&observation, rng)?;
            let action_count = self.env.action_count();
            if action >= action_count {
                return Err(HarnessError::ActionOutOfRange {
                    action,
                    action_count,
                });
            }

            let Transition {
                state: next,
                reward,
                termination,
            } = self
                .env
                .take_action(state, action, rng)
                .map_err(HarnessError::hook(HookKind::TakeAction))?;
            if !reward.is_finite() {
                return Err(HarnessError::malformed(
                    HookKind::TakeAction,
                    format!("reward {reward} is not finite"),
                ));
            }
            total_reward += reward;
            state = next;

            if let Some(trace) = trace.as_deref_mut() {
                if let Some(frame) = self.env.display(&state) {
                    trace.frames.push(frame);
                }
                trace.steps.push(StepRecord {
                    observation,
                    action,
                    reward,
                });
            }

            if let Some(termination) = termination {
                tracing::trace!(step, total_reward, ?termination, "episode terminated");
                return Ok(EpisodeSummary {
                    total_reward,
                    steps: step + 1,
                    end: EpisodeEnd::Terminated(termination),
                });
            }
        }

        tracing::trace!(total_reward, "episode timed out");
        Ok(EpisodeSummary {
            total_reward,
            steps: self.params.steps_per_episode,
            end: EpisodeEnd::Timeout,
        })
    }

    fn observe(&self, state: &E::State) -> Result<Vec<f32>, HarnessError> {
        let observation = self
            .env
            .observe(state)
            .map_err(HarnessError::hook(HookKind::Observe))?;
        let expected = self.env.observation_len();
        if observation.len() != expected {
            return Err(HarnessError::malformed(
                HookKind::Observe,
                format!("expected {expected} values, got {}", observation.len()),
            ));
        }
        if let Some(v) = observation.iter().find(|v| !v.is_finite()) {
            return Err(HarnessError::malformed(
                HookKind::Observe,
                format!("observation contains non-finite value {v}"),
            ));
        }
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::HookError;

    /// Counts steps; reaches the goal after `goal_after` actions of type 1.
    #[derive(Debug)]
    struct CounterEnv {
        goal_after: u32,
    }

    impl Environment for CounterEnv {
        type State = u32;

        fn observation_len(&self) -> usize {
            1
        }

        fn action_count(&self) -> usize {
            2
        }

        fn start_state<R>(&self, _rng: &mut R) -> Result<u32, HookError>
        where
            R: Rng + ?Sized,
        {
            Ok(0)
        }

        #[expect(clippy::cast_precision_loss)]
        fn observe(&self, state: &u32) -> Result<Vec<f32>, HookError> {
            Ok(vec![*state as f32])
        }

        fn take_action<R>(
            &self,
            state: u32,
            action: usize,
            _rng: &mut R,
        ) -> Result<Transition<u32>, HookError>
        where
            R: Rng + ?Sized,
        {
            if action == 0 {
                return Ok(Transition::running(state, -1.0));
            }
            let next = state + 1;
            if next >= self.goal_after {
                Ok(Transition::terminal(next, 10.0, Termination::GoalReached))
            } else {
                Ok(Transition::running(next, 1.0))
            }
        }

        fn display(&self, state: &u32) -> Option<String> {
            Some(format!("[{state}]"))
        }

        fn default_action(&self, _observation: &[f32]) -> Option<Result<usize, HookError>> {
            Some(Ok(1))
        }

        fn has_default_action(&self) -> bool {
            true
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Fault {
        StartFails,
        ShortObservation,
        NanObservation,
        NanReward,
        TakeActionFails,
    }

    #[derive(Debug)]
    struct FaultyEnv(Fault);

    impl Environment for FaultyEnv {
        type State = ();

        fn observation_len(&self) -> usize {
            2
        }

        fn action_count(&self) -> usize {
            1
        }

        fn start_state<R>(&self, _rng: &mut R) -> Result<(), HookError>
        where
            R: Rng + ?Sized,
        {
            match self.0 {
                Fault::StartFails => Err(HookError::new("no start state")),
                _ => Ok(()),
            }
        }

        fn observe(&self, _state: &()) -> Result<Vec<f32>, HookError> {
            match self.0 {
                Fault::ShortObservation => Ok(vec![0.0]),
                Fault::NanObservation => Ok(vec![0.0, f32::NAN]),
                _ => Ok(vec![0.0, 0.0]),
            }
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
            match self.0 {
                Fault::NanReward => Ok(Transition::running((), f32::NAN)),
                Fault::TakeActionFails => Err(HookError::new("boom")),
                _ => Ok(Transition::running((), 0.0)),
            }
        }
    }

    fn params(steps_per_episode: usize) -> EpisodeParams {
        EpisodeParams {
            steps_per_episode,
            stat_every: 1,
        }
    }

    #[test]
    fn test_goal_stops_episode_early() {
        let harness = Harness::new(CounterEnv { goal_after: 3 }, params(10)).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        let summary = harness.run_episode(|_, _| 1, &mut rng).unwrap();
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.total_reward, 12.0);
        assert_eq!(summary.end, EpisodeEnd::Terminated(Termination::GoalReached));
    }

    #[test]
    fn test_step_budget_times_out() {
        let harness = Harness::new(CounterEnv { goal_after: 3 }, params(4)).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        let summary = harness.run_episode(|_, _| 0, &mut rng).unwrap();
        assert_eq!(summary.steps, 4);
        assert_eq!(summary.total_reward, -4.0);
        assert!(summary.end.is_timeout());
    }

    #[test]
    fn test_record_episode_keeps_trace_and_frames() {
        let harness = Harness::new(CounterEnv { goal_after: 2 }, params(10)).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        let episode = harness.record_episode(|_, _| 1, &mut rng).unwrap();
        assert_eq!(episode.steps.len(), 2);
        assert_eq!(episode.steps[0].observation, vec![0.0]);
        assert_eq!(episode.steps[1].observation, vec![1.0]);
        assert_eq!(episode.steps[1].reward, 10.0);
        assert_eq!(episode.frames, vec!["[0]", "[1]", "[2]"]);
    }

    #[test]
    fn test_default_action_hook_drives_episode() {
        let harness = Harness::new(CounterEnv { goal_after: 5 }, params(10)).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        let summary = harness.run_episode_with_default_actions(&mut rng).unwrap();
        assert_eq!(summary.steps, 5);
        assert!(summary.end.is_terminated());
    }

    #[test]
    fn test_missing_default_action_hook() {
        let harness = Harness::new(FaultyEnv(Fault::NanReward), params(10)).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        let err = harness.run_episode_with_default_actions(&mut rng).unwrap_err();
        assert_eq!(
            err,
            HarnessError::Config(ConfigError::MissingHook(HookKind::DefaultAction))
        );
    }

    #[test]
    fn test_out_of_range_action_is_rejected() {
        let harness = Harness::new(CounterEnv { goal_after: 5 }, params(10)).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        let err = harness.run_episode(|_, _| 2, &mut rng).unwrap_err();
        assert_eq!(
            err,
            HarnessError::ActionOutOfRange {
                action: 2,
                action_count: 2
            }
        );
    }

    #[test]
    fn test_hook_failures_propagate() {
        let mut rng = Pcg32::seed_from_u64(0);
        let cases = [
            (Fault::StartFails, HookKind::StartState, false),
            (Fault::ShortObservation, HookKind::Observe, true),
            (Fault::NanObservation, HookKind::Observe, true),
            (Fault::NanReward, HookKind::TakeAction, true),
            (Fault::TakeActionFails, HookKind::TakeAction, false),
        ];
        for (fault, expected_hook, expect_malformed) in cases {
            let harness = Harness::new(FaultyEnv(fault), params(3)).unwrap();
            let err = harness.run_episode(|_, _| 0, &mut rng).unwrap_err();
            match err {
                HarnessError::HookFailed { hook, .. } => {
                    assert!(!expect_malformed, "{fault:?}");
                    assert_eq!(hook, expected_hook, "{fault:?}");
                }
                HarnessError::Malformed { hook, .. } => {
                    assert!(expect_malformed, "{fault:?}");
                    assert_eq!(hook, expected_hook, "{fault:?}");
                }
                other => panic!("unexpected error for {fault:?}: {other}"),
            }
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let env = CounterEnv { goal_after: 1 };
        assert_eq!(
            Harness::new(env, params(0)).unwrap_err(),
            ConfigError::ZeroStepsPerEpisode
        );
        let env = CounterEnv { goal_after: 1 };
        let err = Harness::new(
            env,
            EpisodeParams {
                steps_per_episode: 1,
                stat_every: 0,
            },
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::ZeroStatEvery);
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: EpisodeParams = serde_json::from_str(r#"{"steps_per_episode": 7}"#).unwrap();
        assert_eq!(params.steps_per_episode, 7);
        assert_eq!(params.stat_every, EpisodeParams::default().stat_every);
    }
}
