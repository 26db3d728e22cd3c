use anyhow::ensure;
use popevo_env::EpisodeParams;
use popevo_policy::ActionSelection;
use popevo_training::EvolutionParams;
use serde::{Deserialize, Serialize};

/// Run configuration, loadable from JSON with `--config`.
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TrainingConfig {
    /// Seed for every random draw; a random seed is picked when absent.
    pub seed: Option<u64>,
    pub evolution: EvolutionParams,
    pub episode: EpisodeParams,
    pub network: NetworkConfig,
    /// Grid sizes trained in order; the population carries over between stages.
    pub stages: Vec<GridStage>,
    /// Generations averaged by the running top-performer mean.
    pub running_window: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: None,
            evolution: EvolutionParams::default(),
            episode: EpisodeParams::default(),
            network: NetworkConfig::default(),
            stages: vec![
                GridStage {
                    width: 4,
                    height: 4,
                    generations: 30,
                },
                GridStage {
                    width: 10,
                    height: 10,
                    generations: 70,
                },
            ],
            running_window: 10,
        }
    }
}

impl TrainingConfig {
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        self.evolution.validate()?;
        self.episode.validate()?;
        ensure!(!self.stages.is_empty(), "at least one grid stage is required");
        ensure!(self.running_window > 0, "running_window must be at least 1");
        ensure!(
            self.network.weight_limit.is_finite() && self.network.weight_limit > 0.0,
            "network.weight_limit must be a positive number"
        );
        Ok(())
    }

    pub(crate) fn total_generations(&self) -> usize {
        self.stages.iter().map(|s| s.generations).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct NetworkConfig {
    /// Hidden layer widths between the observation and action layers.
    pub hidden: Vec<usize>,
    /// Parameters are constrained to `[-weight_limit, weight_limit]`.
    pub weight_limit: f32,
    pub action_selection: ActionSelection,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden: vec![16],
            weight_limit: 1.0,
            action_selection: ActionSelection::Greedy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GridStage {
    pub width: usize,
    pub height: usize,
    pub generations: usize,
}
