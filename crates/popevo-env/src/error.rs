use std::borrow::Cow;

/// Rejected configuration detected at construction time.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("steps_per_episode must be at least 1")]
    ZeroStepsPerEpisode,
    #[display("stat_every must be at least 1")]
    ZeroStatEvery,
    #[display("environment must produce at least one observation value")]
    EmptyObservation,
    #[display("environment must offer at least one action")]
    NoActions,
    #[display("grid {width}x{height} must have at least two cells")]
    GridTooSmall { width: usize, height: usize },
    #[display("grid {width}x{height} has more cells than can be addressed")]
    GridTooLarge { width: usize, height: usize },
    #[display("environment does not provide the {_0} hook")]
    MissingHook(#[error(not(source))] HookKind),
    #[display(
        "policy shape {policy_inputs}->{policy_outputs} does not match environment shape \
         {observation_len}->{action_count}"
    )]
    PolicyShapeMismatch {
        policy_inputs: usize,
        policy_outputs: usize,
        observation_len: usize,
        action_count: usize,
    },
    #[display("take_top ({take_top}) must be between 1 and total_agents ({total_agents})")]
    InvalidTakeTop { take_top: usize, total_agents: usize },
    #[display("total_agents must be at least 1")]
    EmptyPopulation,
    #[display("population holds {actual} agents but total_agents is {expected}")]
    PopulationSizeMismatch { expected: usize, actual: usize },
    #[display("ep_per_gen must be at least 1")]
    ZeroEpisodesPerGeneration,
    #[display("mutation_chance ({_0}) must lie in [0, 1]")]
    InvalidMutationChance(#[error(not(source))] f32),
    #[display("mutation_sigma ({_0}) must be finite and non-negative")]
    InvalidMutationSigma(#[error(not(source))] f32),
}

/// Domain hooks of an [`Environment`](crate::Environment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum HookKind {
    #[display("start_state")]
    StartState,
    #[display("observe")]
    Observe,
    #[display("take_action")]
    TakeAction,
    #[display("default_action")]
    DefaultAction,
}

/// Failure reported by an environment hook implementation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{message}")]
pub struct HookError {
    message: Cow<'static, str>,
}

impl HookError {
    pub fn new<M>(message: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Episode failure. Always fatal for the episode that raised it.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum HarnessError {
    #[display("{hook} hook failed: {source}")]
    #[from(ignore)]
    HookFailed { hook: HookKind, source: HookError },
    #[display("{hook} hook returned a malformed value: {detail}")]
    #[from(ignore)]
    Malformed {
        hook: HookKind,
        #[error(not(source))]
        detail: String,
    },
    #[display("policy chose action {action} but only {action_count} actions exist")]
    #[from(ignore)]
    ActionOutOfRange { action: usize, action_count: usize },
    #[display("{_0}")]
    Config(ConfigError),
}

impl HarnessError {
    pub(crate) fn hook(hook: HookKind) -> impl FnOnce(HookError) -> Self {
        move |source| Self::HookFailed { hook, source }
    }

    pub(crate) fn malformed<D>(hook: HookKind, detail: D) -> Self
    where
        D: Into<String>,
    {
        Self::Malformed {
            hook,
            detail: detail.into(),
        }
    }
}
