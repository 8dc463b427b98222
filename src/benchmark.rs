//! Parallel drivers over independent episodes
//!
//! Every worker owns a private episode and a seeded direction stream
//! (`seed = base + worker index`, wrapping), so nothing is shared while
//! running and results are merged afterwards.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::planner::{
    DirectionSource, GreedyPlanner, NoopObserver, Plan, PlanError, PlannerConfig,
    UniformDirections,
};
use crate::sim::{Episode, Outcome, Variant};

/// Totals over a run of random shots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub shots: u64,
    pub ticks: u64,
    pub sunk: u64,
    pub wins: u32,
    pub losses: u32,
}

impl GameInfo {
    pub fn merge(self, other: GameInfo) -> GameInfo {
        GameInfo {
            shots: self.shots + other.shots,
            ticks: self.ticks + other.ticks,
            sunk: self.sunk + other.sunk,
            wins: self.wins + other.wins,
            losses: self.losses + other.losses,
        }
    }
}

/// Play `shots` random shots at full speed, re-racking whenever a game ends
pub fn run_game_instance<D: DirectionSource>(
    episode: &mut Episode,
    directions: &mut D,
    shots: u64,
    speed: f32,
) -> GameInfo {
    episode.reset(None);
    let mut info = GameInfo::default();

    for _ in 0..shots {
        episode.apply_shot(directions.next_direction(), speed);
        let settled = episode.settle();

        info.shots += 1;
        info.ticks += settled.ticks as u64;
        info.sunk += settled.sunk as u64;
        match settled.outcome {
            Outcome::Victory => info.wins += 1,
            Outcome::Loss => info.losses += 1,
            Outcome::Running => {}
        }

        if settled.outcome.is_terminal() {
            episode.reset(None);
        }
    }

    info
}

#[derive(Debug, Clone, Copy)]
pub struct BenchmarkConfig {
    pub variant: Variant,
    /// Total shots across all workers
    pub shots: u64,
    /// Worker count (0 = one per core)
    pub workers: usize,
    pub seed: u64,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct BenchmarkReport {
    pub info: GameInfo,
    pub workers: usize,
    pub elapsed: Duration,
}

impl BenchmarkReport {
    pub fn ticks_per_ms(&self) -> f64 {
        self.info.ticks as f64 / self.elapsed_ms()
    }

    pub fn shots_per_ms(&self) -> f64 {
        self.info.shots as f64 / self.elapsed_ms()
    }

    fn elapsed_ms(&self) -> f64 {
        (self.elapsed.as_secs_f64() * 1000.0).max(f64::EPSILON)
    }
}

/// Shots handled by worker `index` when `total` is split `workers` ways
fn worker_share(total: u64, workers: usize, index: usize) -> u64 {
    let workers = workers as u64;
    let index = index as u64;
    total / workers + u64::from(index < total % workers)
}

fn with_pool<T: Send>(workers: usize, job: impl FnOnce() -> T + Send) -> Result<T> {
    if workers == 0 {
        return Ok(job());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("failed to build rayon threadpool")?;
    Ok(pool.install(job))
}

pub fn run_benchmark(config: &BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.shots == 0 {
        return Err(anyhow!("benchmark needs at least one shot"));
    }

    let started = Instant::now();
    let (workers, parts) = with_pool(config.workers, || {
        let workers = rayon::current_num_threads().max(1);
        let parts: Vec<GameInfo> = (0..workers)
            .into_par_iter()
            .map(|index| {
                let mut episode = Episode::new(config.variant);
                let mut directions = UniformDirections::new(config.seed.wrapping_add(index as u64));
                let share = worker_share(config.shots, workers, index);
                let info = run_game_instance(&mut episode, &mut directions, share, config.speed);
                log::debug!("Worker {}/{} simulated {} shots", index + 1, workers, share);
                info
            })
            .collect();
        (workers, parts)
    })?;

    let info = parts.into_iter().fold(GameInfo::default(), GameInfo::merge);

    Ok(BenchmarkReport {
        info,
        workers,
        elapsed: started.elapsed(),
    })
}

/// A plan together with the direction seed that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeededPlan {
    pub seed: u64,
    pub plan: Plan,
}

impl SeededPlan {
    fn rank(&self) -> (usize, u64) {
        (self.plan.len(), self.plan.total_ticks())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlanManyConfig {
    pub variant: Variant,
    pub planner: PlannerConfig,
    /// Direction seeds are `base_seed..base_seed + runs`, wrapping past `u64::MAX`
    pub base_seed: u64,
    pub runs: usize,
    /// Rack shuffle applied before planning (`None` keeps the canonical rack)
    pub rack_seed: Option<u64>,
    pub workers: usize,
}

fn plan_one(config: &PlanManyConfig, seed: u64) -> Result<Plan, PlanError> {
    let mut episode = Episode::new(config.variant);
    if config.rack_seed.is_some() {
        episode.reset(config.rack_seed);
    }
    let mut directions = UniformDirections::new(seed);
    GreedyPlanner::new(&mut episode, &mut directions, config.planner)?.run(&mut NoopObserver)
}

/// Plan the same table with several direction seeds in parallel.
///
/// Failed runs are logged and left out; results come back in seed order.
pub fn plan_many(config: &PlanManyConfig) -> Result<Vec<SeededPlan>> {
    let results: Vec<(u64, Result<Plan, PlanError>)> = with_pool(config.workers, || {
        (0..config.runs as u64)
            .into_par_iter()
            .map(|offset| {
                let seed = config.base_seed.wrapping_add(offset);
                (seed, plan_one(config, seed))
            })
            .collect()
    })?;

    let mut plans = Vec::with_capacity(results.len());
    for (seed, result) in results {
        match result {
            Ok(plan) => plans.push(SeededPlan { seed, plan }),
            Err(e) => log::warn!("Seed {} failed: {}", seed, e),
        }
    }
    Ok(plans)
}

/// Fewest shots first, then fewest total ticks, then lowest seed
pub fn best_plan(plans: &[SeededPlan]) -> Option<&SeededPlan> {
    plans.iter().min_by_key(|p| (p.rank(), p.seed))
}
