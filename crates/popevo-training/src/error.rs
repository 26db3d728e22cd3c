use popevo_env::{ConfigError, HarnessError};

/// Failure of a population-level operation.
///
/// Both kinds are fatal to the current call: no partial generation is
/// reported and the population is left as it was.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainingError {
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("agent {agent} failed during evaluation: {source}")]
    #[from(ignore)]
    Evaluation { agent: usize, source: HarnessError },
}
