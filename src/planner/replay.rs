//! Plan playback

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{PlanError, ReplayFailure, ShotEngine, Trial};
use crate::sim::Outcome;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// One record per shot actually taken
    pub steps: Vec<Trial>,
    /// Outcome after the last shot taken
    pub outcome: Outcome,
    pub total_ticks: u64,
    pub total_sunk: u32,
}

/// Shoot `directions` in order from the engine's current table.
///
/// Stops early at the first terminal outcome; the engine is left where the
/// last shot put it.
pub fn replay<E: ShotEngine>(engine: &mut E, directions: &[Vec2], speed: f32) -> ReplayReport {
    let mut report = ReplayReport::default();

    for &direction in directions {
        let settled = engine.shoot(direction, speed);
        report.steps.push(Trial::new(direction, settled));
        report.total_ticks += settled.ticks as u64;
        report.total_sunk += settled.sunk;
        report.outcome = settled.outcome;

        if settled.outcome.is_terminal() {
            break;
        }
    }

    report
}

/// Replay and require the plan to clear the table with its final shot
pub fn verify_plan<E: ShotEngine>(
    engine: &mut E,
    directions: &[Vec2],
    speed: f32,
) -> Result<ReplayReport, PlanError> {
    let report = replay(engine, directions, speed);
    let taken = report.steps.len();

    let reason = match report.outcome {
        Outcome::Loss => Some((taken, ReplayFailure::Loss)),
        Outcome::Victory if taken < directions.len() => {
            Some((taken + 1, ReplayFailure::ShotsAfterVictory))
        }
        Outcome::Victory => None,
        Outcome::Running => Some((taken, ReplayFailure::Unfinished)),
    };

    match reason {
        Some((step, reason)) => Err(PlanError::Replay { step, reason }),
        None => Ok(report),
    }
}
