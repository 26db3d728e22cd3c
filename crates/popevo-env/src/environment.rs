//! The capability interface every environment implements.
//!
//! An environment owns the domain logic (transitions, rewards, observations)
//! and nothing else. Episode bookkeeping lives in [`Harness`](crate::Harness).
//! Parameters that size the environment (grid width, arena radius, ...) are
//! fields of the implementing type, never ambient state: resizing means
//! constructing a new value and rebinding it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::HookError;

/// Reason an environment ended an episode before the step budget ran out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The agent achieved the environment's objective.
    GoalReached,
    /// The agent entered a terminal failure state.
    Penalty,
}

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub state: S,
    pub reward: f32,
    pub termination: Option<Termination>,
}

impl<S> Transition<S> {
    /// A transition that keeps the episode running.
    pub fn running(state: S, reward: f32) -> Self {
        Self {
            state,
            reward,
            termination: None,
        }
    }

    /// A transition that ends the episode.
    pub fn terminal(state: S, reward: f32, termination: Termination) -> Self {
        Self {
            state,
            reward,
            termination: Some(termination),
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.termination.is_some()
    }
}

/// Domain hooks consumed by the episode harness.
///
/// Hooks must be pure functions of the state (and RNG) they are given. The
/// harness never inspects `State`; it only threads it from
/// [`start_state`](Self::start_state) through [`take_action`](Self::take_action).
pub trait Environment: Send + Sync {
    type State;

    /// Length of every observation vector returned by [`observe`](Self::observe).
    fn observation_len(&self) -> usize;

    /// Number of discrete actions; valid actions are `0..action_count()`.
    fn action_count(&self) -> usize;

    fn start_state<R>(&self, rng: &mut R) -> Result<Self::State, HookError>
    where
        R: Rng + ?Sized;

    fn observe(&self, state: &Self::State) -> Result<Vec<f32>, HookError>;

    fn take_action<R>(
        &self,
        state: Self::State,
        action: usize,
        rng: &mut R,
    ) -> Result<Transition<Self::State>, HookError>
    where
        R: Rng + ?Sized;

    /// Renders a state for reporting. Never used for control decisions.
    fn display(&self, _state: &Self::State) -> Option<String> {
        None
    }

    /// Built-in action choice used when no policy drives the episode.
    ///
    /// `None` means the environment has no such hook; `Some(Err(_))` means
    /// the hook exists but failed.
    fn default_action(&self, _observation: &[f32]) -> Option<Result<usize, HookError>> {
        None
    }

    /// Whether [`default_action`](Self::default_action) is implemented.
    fn has_default_action(&self) -> bool {
        false
    }
}
