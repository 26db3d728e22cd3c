//! Per-generation summaries for external reporting.
//!
//! Everything here is a pure function of fitness records (and, for
//! [`GenerationDetail`], policy parameters). Nothing in this module feeds back
//! into evolution.

use popevo_stats::descriptive::DescriptiveStats;
use serde::Serialize;

use crate::FitnessRecord;

/// Summary of one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    /// Zero-based index of the generation that was evaluated.
    pub generation: usize,
    /// Per-episode rewards of the best agent.
    pub best_rewards: Vec<f32>,
    /// Sum of `best_rewards`.
    pub sum_rewards: f32,
    /// Mean of `best_rewards`.
    pub avg: f32,
    /// Minimum of `best_rewards`.
    pub min: f32,
    /// Maximum of `best_rewards`.
    pub max: f32,
    /// Mean reward of each retained top agent, best first.
    pub top_means: Vec<f32>,
    /// Resampling fell back to uniform because survivors were indistinguishable.
    pub degenerate_selection: bool,
    /// Population-wide statistics, present every `stat_every` generations.
    pub detail: Option<GenerationDetail>,
}

/// Extra statistics computed on reporting generations only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationDetail {
    /// Fitness distribution over the whole population.
    pub fitness: DescriptiveStats,
    /// Mean over parameters of each parameter's normalised standard deviation
    /// across the population. Approaches 0 as the population converges.
    pub param_diversity: f32,
}

/// Indices of `records` ordered by descending fitness.
///
/// The sort is stable, so agents with equal fitness keep their original order.
/// `-0.0` and `0.0` count as equal.
#[must_use]
pub fn rank(records: &[FitnessRecord]) -> Vec<usize> {
    // adding 0.0 maps -0.0 to 0.0
    let keys = records.iter().map(|r| r.fitness() + 0.0).collect::<Vec<_>>();
    let mut order = (0..records.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| keys[b].total_cmp(&keys[a]));
    order
}

/// Builds a report from one generation's fitness records.
///
/// `generation`, `degenerate_selection` and `detail` are left at their
/// defaults for the caller to fill in. Returns `None` when `records` is empty.
#[must_use]
pub fn summarize(records: &[FitnessRecord], take_top: usize) -> Option<GenerationReport> {
    summarize_ranked(records, &rank(records), take_top)
}

pub(crate) fn summarize_ranked(
    records: &[FitnessRecord],
    order: &[usize],
    take_top: usize,
) -> Option<GenerationReport> {
    let best = &records[*order.first()?];
    let stats = DescriptiveStats::new(best.rewards().iter().copied())?;
    let top_means = order
        .iter()
        .take(take_top)
        .map(|&i| records[i].mean())
        .collect();
    Some(GenerationReport {
        generation: 0,
        best_rewards: best.rewards().to_vec(),
        sum_rewards: stats.sum,
        avg: stats.mean,
        min: stats.min,
        max: stats.max,
        top_means,
        degenerate_selection: false,
        detail: None,
    })
}

/// Computes population-wide statistics.
///
/// `params` yields one parameter vector per agent; all must have the same
/// length. Returns `None` for an empty population.
#[must_use]
pub fn detail<'a, I>(records: &[FitnessRecord], params: I) -> Option<GenerationDetail>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let fitness = DescriptiveStats::new(records.iter().map(FitnessRecord::fitness))?;
    let params = params.into_iter().collect::<Vec<_>>();
    let param_count = params.first().map_or(0, |p| p.len());
    #[expect(clippy::cast_precision_loss)]
    let param_diversity = if param_count == 0 {
        0.0
    } else {
        (0..param_count)
            .filter_map(|i| DescriptiveStats::new(params.iter().map(|p| p[i])))
            .map(|s| s.normalized_std_dev)
            .sum::<f32>()
            / param_count as f32
    };
    Some(GenerationDetail {
        fitness,
        param_diversity,
    })
}
