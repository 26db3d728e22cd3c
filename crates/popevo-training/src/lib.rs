//! Population-based training of policies in episodic environments.
//!
//! Instead of following a gradient, the engine evaluates many agents per
//! generation, keeps the best, and refills the population with mutated copies
//! of the survivors, favouring fitter survivors.
//!
//! # How Training Works
//!
//! 1. **Population** - a fixed number of [`Agent`]s, each owning a policy and
//!    sharing one read-only [`Harness`](popevo_env::Harness)
//! 2. **Evaluation** - each agent plays `ep_per_gen` episodes; the per-episode
//!    rewards form its [`FitnessRecord`]
//! 3. **Ranking** - agents are sorted by mean reward
//! 4. **Selection** - the top `take_top` agents survive unchanged
//! 5. **Resampling and mutation** - the remaining slots are filled with mutated
//!    copies of survivors, drawn with fitness-proportional weights
//! 6. **Reporting** - a [`GenerationReport`] summarises the generation
//!
//! # Architecture
//!
//! ```text
//! Population (evolve)
//!     ↓ evaluates
//! Agent (policy + shared harness)
//!     ↓ runs episodes through
//! Harness (popevo-env)
//!     ↓ calls hooks of
//! Environment
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use popevo_env::{EpisodeParams, Harness, gridworld::GridWorld};
//! use popevo_policy::{ActionSelection, Mlp, ParamRange};
//! use popevo_training::{EvolutionParams, Population};
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//!
//! let mut rng = Pcg32::seed_from_u64(0);
//! let harness = Arc::new(Harness::new(GridWorld::new(4, 4)?, EpisodeParams::default())?);
//! let params = EvolutionParams::default();
//! let policies = (0..params.total_agents)
//!     .map(|_| Mlp::random(vec![6, 16, 4], ParamRange::symmetric(1.0), ActionSelection::Greedy, &mut rng))
//!     .collect::<Result<Vec<_>, _>>()?;
//! let mut population = Population::new(harness, policies, params, rng)?;
//! for _ in 0..10 {
//!     let report = population.evolve()?;
//!     println!("{}: {:.2}", report.generation, report.sum_rewards);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use self::{
    agent::{Agent, FitnessRecord},
    error::TrainingError,
    population::{EvolutionParams, Population},
    report::{GenerationDetail, GenerationReport},
    selection::{SelectionWeights, Weighting},
};

pub mod agent;
mod error;
pub mod population;
pub mod report;
pub mod selection;

#[cfg(test)]
mod testing;
