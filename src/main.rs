//! Pool Rollout entry point
//!
//! Command-line front end over the planner, the single-win search, the
//! benchmark and plan playback.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};

use pool_rollout::Settings;
use pool_rollout::benchmark::{
    BenchmarkConfig, PlanManyConfig, best_plan, plan_many, run_benchmark,
};
use pool_rollout::persistence::{read_plan, write_plan_incremental};
use pool_rollout::planner::{GreedyPlanner, UniformDirections, find_direction, verify_plan};
use pool_rollout::report::{LogReporter, describe_direction};
use pool_rollout::sim::{Episode, Outcome, Variant};

/// Default spacing of cue and target in the one-ball layout
const ONE_BALL_MIN_DISTANCE: f32 = 100.0;

#[derive(Parser, Debug)]
#[command(name = "pool-rollout")]
#[command(about = "Plan winning shot sequences on a simulated pool table")]
struct Cli {
    /// Settings file; command-line flags override its values
    #[arg(long, default_value = "saved/settings.json")]
    settings: PathBuf,
    /// Physics variant
    #[arg(long, value_enum)]
    variant: Option<CliVariant>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Greedy rollout from the rack to a cleared table
    Plan {
        #[arg(long)]
        samples: Option<u32>,
        /// Direction stream seed
        #[arg(long)]
        seed: Option<u64>,
        /// Shuffle the rack with this seed before planning
        #[arg(long)]
        rack_seed: Option<u64>,
        #[arg(long)]
        no_refine: bool,
        /// Plan file (an incremental name is used when it exists)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Plan with this many consecutive seeds in parallel and keep the shortest plan
        #[arg(long, default_value_t = 1)]
        runs: usize,
        #[arg(long)]
        workers: Option<usize>,
        /// Write the effective settings back to the settings file
        #[arg(long)]
        save_settings: bool,
    },
    /// Search for one shot that clears the table
    FindWin {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        attempts: Option<u32>,
        /// Only the cue and one object ball, placed at random with this seed
        #[arg(long)]
        one_ball: Option<u64>,
        /// Plan file for the winning shot
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Random shots at full speed, re-racking after every finished game
    Benchmark {
        #[arg(long, default_value_t = 100_000)]
        shots: u64,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Replay a saved plan and check that it wins
    Replay {
        input: PathBuf,
        /// Rack shuffle the plan was made with
        #[arg(long)]
        rack_seed: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliVariant {
    Reference,
    Fast,
}

impl From<CliVariant> for Variant {
    fn from(value: CliVariant) -> Self {
        match value {
            CliVariant::Reference => Variant::Reference,
            CliVariant::Fast => Variant::Fast,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut settings = Settings::load_or_default(&cli.settings);
    if let Some(variant) = cli.variant {
        settings.variant = variant.into();
    }

    match cli.command {
        Commands::Plan {
            samples,
            seed,
            rack_seed,
            no_refine,
            output,
            runs,
            workers,
            save_settings,
        } => {
            if let Some(samples) = samples {
                settings.samples = samples;
            }
            if let Some(seed) = seed {
                settings.seed = seed;
            }
            if rack_seed.is_some() {
                settings.rack_seed = rack_seed;
            }
            if no_refine {
                settings.refine = false;
            }
            if let Some(output) = output {
                settings.output = output;
            }
            if let Some(workers) = workers {
                settings.workers = workers;
            }
            if save_settings {
                settings
                    .save(&cli.settings)
                    .with_context(|| format!("failed saving {}", cli.settings.display()))?;
            }
            if runs > 1 {
                plan_parallel(&settings, runs)
            } else {
                plan(&settings)
            }
        }
        Commands::FindWin {
            seed,
            attempts,
            one_ball,
            output,
        } => {
            if let Some(seed) = seed {
                settings.seed = seed;
            }
            if let Some(attempts) = attempts {
                settings.find_win_attempts = attempts;
            }
            find_win(&settings, one_ball, output.as_deref())
        }
        Commands::Benchmark {
            shots,
            workers,
            seed,
        } => {
            let config = BenchmarkConfig {
                variant: settings.variant,
                shots,
                workers: workers.unwrap_or(settings.workers),
                seed: seed.unwrap_or(settings.seed),
                speed: settings.speed,
            };
            benchmark(&config)
        }
        Commands::Replay { input, rack_seed } => replay(&input, rack_seed, settings.speed),
    }
}

fn new_episode(settings: &Settings) -> Episode {
    let mut episode = Episode::new(settings.variant);
    if settings.rack_seed.is_some() {
        episode.reset(settings.rack_seed);
    }
    episode
}

fn plan(settings: &Settings) -> Result<()> {
    log::info!(
        "Greedy rollout ({} variant, {} samples, seed {})",
        settings.variant.as_str(),
        settings.samples,
        settings.seed
    );

    let mut episode = new_episode(settings);
    let mut directions = UniformDirections::new(settings.seed);
    let mut reporter = LogReporter::new();

    let plan = GreedyPlanner::new(&mut episode, &mut directions, settings.planner_config())?
        .run(&mut reporter)
        .context("greedy rollout failed")?;

    save(&settings.output, settings.variant, &plan.directions())
}

fn plan_parallel(settings: &Settings, runs: usize) -> Result<()> {
    log::info!(
        "Greedy rollout over {} seeds from {} ({} variant, {} samples)",
        runs,
        settings.seed,
        settings.variant.as_str(),
        settings.samples
    );

    let config = PlanManyConfig {
        variant: settings.variant,
        planner: settings.planner_config(),
        base_seed: settings.seed,
        runs,
        rack_seed: settings.rack_seed,
        workers: settings.workers,
    };
    let plans = plan_many(&config)?;
    let best = best_plan(&plans).ok_or_else(|| anyhow!("no seed produced a plan"))?;

    log::info!(
        "{}/{} seeds converged; best is seed {} with {} shots, {} ticks",
        plans.len(),
        runs,
        best.seed,
        best.plan.len(),
        best.plan.total_ticks()
    );

    save(&settings.output, settings.variant, &best.plan.directions())
}

fn find_win(settings: &Settings, one_ball: Option<u64>, output: Option<&Path>) -> Result<()> {
    let mut episode = match one_ball {
        Some(layout_seed) => {
            let mut episode = Episode::new(settings.variant);
            episode.reset_one_ball(layout_seed, ONE_BALL_MIN_DISTANCE);
            episode
        }
        None => new_episode(settings),
    };
    let mut directions = UniformDirections::new(settings.seed);

    let trial = find_direction(
        &mut episode,
        &mut directions,
        settings.speed,
        settings.find_win_attempts,
        |settled| settled.outcome == Outcome::Victory,
    )?;

    log::info!(
        "Winning shot {}: {} balls in {} ticks",
        describe_direction(trial.direction),
        trial.sunk,
        trial.ticks
    );

    match output {
        Some(path) => save(path, settings.variant, &[trial.direction]),
        None => Ok(()),
    }
}

fn benchmark(config: &BenchmarkConfig) -> Result<()> {
    log::info!(
        "Benchmark running... ({} variant, {} shots)",
        config.variant.as_str(),
        config.shots
    );

    let report = run_benchmark(config)?;
    let info = report.info;

    log::info!(
        "Benchmark finished in {}ms ({} workers)",
        report.elapsed.as_millis(),
        report.workers
    );
    log::info!(
        "Ticks: {}, Balls: {}, Wins: {}, Losses: {}",
        info.ticks,
        info.sunk,
        info.wins,
        info.losses
    );
    log::info!(
        "Ticks/ms: {:.2}, Shots/ms: {:.2}",
        report.ticks_per_ms(),
        report.shots_per_ms()
    );
    Ok(())
}

fn replay(input: &Path, rack_seed: Option<u64>, speed: f32) -> Result<()> {
    let (variant, directions) =
        read_plan(input).with_context(|| format!("failed reading {}", input.display()))?;
    log::info!(
        "Replaying {} shots ({} variant) from {}",
        directions.len(),
        variant.as_str(),
        input.display()
    );

    // The file does not record the rack; the canonical one is assumed
    let mut episode = Episode::new(variant);
    if rack_seed.is_some() {
        episode.reset(rack_seed);
    }
    let report = verify_plan(&mut episode, &directions, speed)?;

    for (i, step) in report.steps.iter().enumerate() {
        log::info!(
            "Shot {} {} - Balls: {}, Ticks: {}",
            i + 1,
            describe_direction(step.direction),
            step.sunk,
            step.ticks
        );
    }
    log::info!(
        "Plan verified: {} balls in {} ticks",
        report.total_sunk,
        report.total_ticks
    );
    Ok(())
}

fn save(path: &Path, variant: Variant, directions: &[glam::Vec2]) -> Result<()> {
    let written = write_plan_incremental(path, variant, directions)
        .with_context(|| format!("failed writing plan near {}", path.display()))?;
    log::info!("Saved {} shots to {}", directions.len(), written.display());
    Ok(())
}
