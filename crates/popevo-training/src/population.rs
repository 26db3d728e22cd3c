//! Population manager: evaluation, ranking, elitism, resampling and mutation.
//!
//! # Algorithm
//!
//! Each call to [`Population::evolve`] runs one generation:
//!
//! 1. **Evaluate** - every agent plays `ep_per_gen` episodes
//! 2. **Rank** - agents are stably sorted by descending fitness (mean reward)
//! 3. **Select** - the top `take_top` agents survive unchanged
//! 4. **Resample** - the remaining `total_agents - take_top` slots are filled
//!    by drawing survivors with replacement, weighted by fitness
//!    (see [`selection`](crate::selection))
//! 5. **Mutate** - every drawn copy is replaced with a mutated clone
//! 6. **Report** - a [`GenerationReport`] summarises the evaluated generation
//!
//! The population size never changes, and survivors keep their parameters
//! bit-for-bit until they are evaluated again.
//!
//! # Determinism
//!
//! All randomness comes from the population's own `Pcg32`. Before evaluation
//! every agent gets a seed drawn from it, and its episodes run on a generator
//! built from that seed. Results are therefore identical whether agents are
//! evaluated sequentially or on scoped threads.

use std::{iter, mem, panic, sync::Arc, thread};

use popevo_env::{ConfigError, Environment, Harness, HarnessError};
use popevo_policy::Policy;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    Agent, FitnessRecord, TrainingError,
    agent::check_shape,
    report::{self, GenerationReport},
    selection::{self, SelectionWeights, Weighting},
};

/// Evolution parameters, validated when a population is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvolutionParams {
    /// Number of agents in every generation.
    pub total_agents: usize,
    /// Episodes each agent plays per generation.
    pub ep_per_gen: usize,
    /// Number of top agents retained unchanged (elitism).
    pub take_top: usize,
    /// Probability of perturbing each parameter of a resampled copy.
    pub mutation_chance: f32,
    /// Standard deviation of the Gaussian perturbation.
    pub mutation_sigma: f32,
    /// How survivor fitness becomes resampling weight.
    pub weighting: Weighting,
    /// Evaluate agents on scoped threads.
    pub parallel: bool,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            total_agents: 100,
            ep_per_gen: 10,
            take_top: 10,
            mutation_chance: 0.15,
            mutation_sigma: 0.1,
            weighting: Weighting::default(),
            parallel: true,
        }
    }
}

impl EvolutionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_agents == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.take_top == 0 || self.take_top > self.total_agents {
            return Err(ConfigError::InvalidTakeTop {
                take_top: self.take_top,
                total_agents: self.total_agents,
            });
        }
        if self.ep_per_gen == 0 {
            return Err(ConfigError::ZeroEpisodesPerGeneration);
        }
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(ConfigError::InvalidMutationChance(self.mutation_chance));
        }
        if !self.mutation_sigma.is_finite() || self.mutation_sigma < 0.0 {
            return Err(ConfigError::InvalidMutationSigma(self.mutation_sigma));
        }
        Ok(())
    }
}

/// A fixed-size set of agents evolved one generation at a time.
#[derive(Debug)]
pub struct Population<E, P> {
    harness: Arc<Harness<E>>,
    agents: Vec<Agent<E, P>>,
    params: EvolutionParams,
    rng: Pcg32,
    generation: usize,
}

impl<E, P> Population<E, P>
where
    E: Environment,
    P: Policy,
{
    /// Creates a population from an initial set of policies.
    ///
    /// Fails if `params` is invalid, if `policies.len() != total_agents`, or if
    /// any policy does not fit the environment.
    pub fn new(
        harness: Arc<Harness<E>>,
        policies: Vec<P>,
        params: EvolutionParams,
        rng: Pcg32,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        if policies.len() != params.total_agents {
            return Err(ConfigError::PopulationSizeMismatch {
                expected: params.total_agents,
                actual: policies.len(),
            });
        }
        let agents = policies
            .into_iter()
            .map(|policy| Agent::new(Arc::clone(&harness), policy))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            harness,
            agents,
            params,
            rng,
            generation: 0,
        })
    }

    /// Creates a population of `total_agents` policies built by `make_policy`.
    ///
    /// `make_policy` draws from the population RNG, so the initial
    /// population is reproducible from the RNG seed.
    pub fn random<F>(
        harness: Arc<Harness<E>>,
        params: EvolutionParams,
        mut make_policy: F,
        mut rng: Pcg32,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&mut Pcg32) -> P,
    {
        params.validate()?;
        let policies = iter::repeat_with(|| make_policy(&mut rng))
            .take(params.total_agents)
            .collect();
        Self::new(harness, policies, params, rng)
    }

    /// Current agents. After [`evolve`](Self::evolve), the first `take_top`
    /// are the survivors in rank order, followed by the mutated copies.
    #[must_use]
    pub fn agents(&self) -> &[Agent<E, P>] {
        &self.agents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of completed generations.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    #[must_use]
    pub fn harness(&self) -> &Arc<Harness<E>> {
        &self.harness
    }

    /// Rebinds every agent to a new harness, keeping the learned policies.
    ///
    /// This is how the environment is reconfigured between generations (for
    /// example to grow a grid). Fails without changing anything when the new
    /// environment's observation or action widths differ.
    pub fn rebind(&mut self, harness: Arc<Harness<E>>) -> Result<(), ConfigError> {
        for agent in &self.agents {
            check_shape(&harness, agent.policy())?;
        }
        for agent in &mut self.agents {
            agent.rebind(Arc::clone(&harness))?;
        }
        self.harness = harness;
        tracing::info!(
            generation = self.generation,
            "population rebound to a new environment"
        );
        Ok(())
    }

    /// Runs one generation and replaces the population with its offspring.
    ///
    /// On error the population is left untouched and no report is produced.
    pub fn evolve(&mut self) -> Result<GenerationReport, TrainingError> {
        let EvolutionParams {
            ep_per_gen,
            take_top,
            mutation_chance,
            mutation_sigma,
            weighting,
            ..
        } = self.params;
        let total_agents = self.agents.len();

        // Step 1: evaluation
        let seeds = iter::repeat_with(|| self.rng.random::<u64>())
            .take(total_agents)
            .collect::<Vec<_>>();
        let records = self
            .evaluate(&seeds, ep_per_gen)
            .map_err(|(agent, source)| TrainingError::Evaluation { agent, source })?;

        // Step 2: ranking
        let order = report::rank(&records);
        let mut report = report::summarize_ranked(&records, &order, take_top)
            .ok_or(ConfigError::EmptyPopulation)?;
        report.generation = self.generation;
        if self.generation % self.harness.params().stat_every == 0 {
            report.detail = report::detail(
                &records,
                self.agents.iter().map(|a| a.policy().params()),
            );
        }

        for (agent, record) in iter::zip(&mut self.agents, records) {
            agent.set_record(record);
        }

        // Step 3: selection
        let mut position = vec![0; total_agents];
        for (rank, &i) in order.iter().enumerate() {
            position[i] = rank;
        }
        let mut ranked = mem::take(&mut self.agents)
            .into_iter()
            .zip(position)
            .collect::<Vec<_>>();
        ranked.sort_by_key(|(_, rank)| *rank);
        let mut next = ranked
            .into_iter()
            .take(take_top)
            .map(|(agent, _)| agent)
            .collect::<Vec<_>>();

        // Step 4: resampling
        let refill = total_agents - take_top;
        let picks = if refill == 0 {
            vec![]
        } else {
            let scores = next
                .iter()
                .map(|a| a.fitness().unwrap_or(f32::NEG_INFINITY))
                .collect::<Vec<_>>();
            let weights = SelectionWeights::new(&scores, weighting);
            report.degenerate_selection = weights.is_degenerate();
            if weights.is_degenerate() {
                tracing::warn!(
                    generation = self.generation,
                    "survivors are indistinguishable; resampling uniformly"
                );
            }
            selection::resample(&weights, refill, &mut self.rng)
        };

        // Step 5: mutation
        let children = picks
            .iter()
            .map(|&i| next[i].clone_mutated(mutation_chance, mutation_sigma, &mut self.rng))
            .collect::<Vec<_>>();
        next.extend(children);
        debug_assert_eq!(next.len(), total_agents);
        self.agents = next;

        tracing::info!(
            generation = self.generation,
            best = report.avg,
            sum = report.sum_rewards,
            "generation evolved"
        );
        tracing::debug!(
            generation = self.generation,
            top_means = ?report.top_means,
            picks = ?picks,
            "resampled survivors"
        );

        self.generation += 1;
        Ok(report)
    }

    fn evaluate(
        &self,
        seeds: &[u64],
        ep_per_gen: usize,
    ) -> Result<Vec<FitnessRecord>, (usize, HarnessError)> {
        let evaluate = |agent: &Agent<E, P>, seed: u64| {
            let mut rng = Pcg32::seed_from_u64(seed);
            agent.evaluate(ep_per_gen, &mut rng)
        };

        let results = if self.params.parallel {
            thread::scope(|s| {
                let handles = iter::zip(&self.agents, seeds)
                    .map(|(agent, &seed)| s.spawn(move || evaluate(agent, seed)))
                    .collect::<Vec<_>>();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                    .collect::<Vec<_>>()
            })
        } else {
            iter::zip(&self.agents, seeds)
                .map(|(agent, &seed)| evaluate(agent, seed))
                .collect()
        };

        results
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.map_err(|e| (i, e)))
            .collect()
    }
}
