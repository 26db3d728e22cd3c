use std::{iter, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use popevo_env::{Harness, gridworld::GridWorld};
use popevo_policy::{ActionSelection, Mlp, ParamRange, Policy as _};
use popevo_stats::running::RunningMean;
use popevo_training::{GenerationReport, Population, Weighting};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{
    config::{GridStage, TrainingConfig},
    util,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// JSON run configuration; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,
    /// Evaluate agents on a single thread
    #[arg(long)]
    sequential: bool,
    /// Override how survivor fitness becomes resampling weight
    #[arg(long, value_name = "score_shift|rank")]
    weighting: Option<Weighting>,
    /// Override how policies pick an action
    #[arg(long, value_name = "greedy|sample")]
    action_selection: Option<ActionSelection>,
    /// Print the best agent's episode on every detailed report
    #[arg(long)]
    show_episodes: bool,
    /// Output file path for the JSON run log
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TrainingRun<'a> {
    seed: u64,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    config: &'a TrainingConfig,
    reports: &'a [StageReport],
}

#[derive(Debug, Serialize)]
struct StageReport {
    width: usize,
    height: usize,
    #[serde(flatten)]
    report: GenerationReport,
}

impl TrainArg {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply_overrides(&self, config: &mut TrainingConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if self.sequential {
            config.evolution.parallel = false;
        }
        if let Some(weighting) = self.weighting {
            config.evolution.weighting = weighting;
        }
        if let Some(selection) = self.action_selection {
            config.network.action_selection = selection;
        }
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        config,
        show_episodes,
        output,
        ..
    } = arg;

    let mut config = match config {
        Some(path) => util::load_json::<TrainingConfig>("training config", path)?,
        None => TrainingConfig::default(),
    };
    arg.apply_overrides(&mut config);
    config.validate().context("Invalid training configuration")?;
    tracing::debug!(?config, "loaded training configuration");

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut demo_rng = Pcg32::seed_from_u64(seed.wrapping_add(1));

    let first = config.stages[0];
    let harness = stage_harness(&config, first)?;
    let layers = iter::once(harness.observation_len())
        .chain(config.network.hidden.iter().copied())
        .chain(iter::once(harness.action_count()))
        .collect::<Vec<_>>();
    let range = ParamRange::symmetric(config.network.weight_limit);
    let policies = (0..config.evolution.total_agents)
        .map(|_| {
            Mlp::random(
                layers.clone(),
                range,
                config.network.action_selection,
                &mut rng,
            )
        })
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to build initial policies")?;
    let mut population = Population::new(harness, policies, config.evolution, rng)?;

    eprintln!(
        "Training {} agents ({} parameters each) for {} generations, seed {seed}",
        config.evolution.total_agents,
        Mlp::param_count(&layers),
        config.total_generations(),
    );

    let started_at = Utc::now();
    let mut running = RunningMean::new(config.running_window);
    let mut reports = vec![];
    for (i, stage) in config.stages.iter().enumerate() {
        if i > 0 {
            population
                .rebind(stage_harness(&config, *stage)?)
                .context("Failed to switch grid size")?;
        }
        eprintln!("Stage #{i}: {}x{} grid", stage.width, stage.height);

        for _ in 0..stage.generations {
            let report = population.evolve()?;
            #[expect(clippy::cast_precision_loss)]
            let top_mean =
                report.top_means.iter().sum::<f32>() / report.top_means.len() as f32;
            running.push(top_mean);
            print_report(&report, top_mean, &running);

            if *show_episodes && report.detail.is_some() {
                let best = population.agents()[0].policy();
                let episode = population
                    .harness()
                    .record_episode(|obs, rng| best.act(obs, rng), &mut demo_rng)?;
                eprintln!("  Best agent episode ({:?}):", episode.summary.end);
                for frame in &episode.frames {
                    for line in frame.lines() {
                        eprintln!("    {line}");
                    }
                    eprintln!();
                }
            }

            reports.push(StageReport {
                width: stage.width,
                height: stage.height,
                report,
            });
        }
    }
    let finished_at = Utc::now();

    eprintln!("Training completed.");
    if let Some(last) = reports.last() {
        eprintln!("  Final best sum:   {:.3}", last.report.sum_rewards);
    }
    if let Some(mean) = running.mean() {
        eprintln!("  Running top mean: {mean:.3}");
    }
    eprintln!("  Elapsed: {}", finished_at - started_at);

    let run = TrainingRun {
        seed,
        started_at,
        finished_at,
        config: &config,
        reports: &reports,
    };
    util::write_json(&run, output.as_deref())?;
    if let Some(path) = output {
        eprintln!("Run log saved to {}", path.display());
    }

    Ok(())
}

fn stage_harness(
    config: &TrainingConfig,
    stage: GridStage,
) -> anyhow::Result<Arc<Harness<GridWorld>>> {
    let world = GridWorld::new(stage.width, stage.height)
        .with_context(|| format!("Invalid grid stage {}x{}", stage.width, stage.height))?;
    Ok(Arc::new(Harness::new(world, config.episode)?))
}

fn print_report(report: &GenerationReport, top_mean: f32, running: &RunningMean) {
    eprintln!("Generation #{}:", report.generation);
    eprintln!("  Best agent:");
    eprintln!("    Rewards: {:.2?}", report.best_rewards);
    eprintln!("    Sum:     {:.3}", report.sum_rewards);
    eprintln!("    Avg:     {:.3}", report.avg);
    eprintln!("    Min:     {:.3}", report.min);
    eprintln!("    Max:     {:.3}", report.max);
    eprintln!(
        "  Top {} means: {:.3?}",
        report.top_means.len(),
        report.top_means
    );
    eprintln!(
        "    => Mean: {top_mean:.3} (running over {}: {:.3})",
        running.len(),
        running.mean().unwrap_or(top_mean)
    );
    if report.degenerate_selection {
        eprintln!("  Selection degenerated to uniform resampling");
    }
    if let Some(detail) = &report.detail {
        eprintln!("  Fitness Stats:");
        eprintln!("    Min:    {:.3}", detail.fitness.min);
        eprintln!("    Max:    {:.3}", detail.fitness.max);
        eprintln!("    Mean:   {:.3}", detail.fitness.mean);
        eprintln!("    Median: {:.3}", detail.fitness.median);
        eprintln!("    StdDev: {:.3}", detail.fitness.std_dev);
        eprintln!("  Param diversity: {:.3}", detail.param_diversity);
    }
}
