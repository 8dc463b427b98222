//! Local search around a sampled direction

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{PlanError, ShotEngine, Trial};
use crate::consts::*;
use crate::sim::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Offset added to one component of the direction before renormalizing
    pub increment: f32,
    pub passes: u32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            increment: REFINE_INCREMENT,
            passes: REFINE_PASSES,
        }
    }
}

impl RefineConfig {
    fn deltas(&self) -> [Vec2; 4] {
        let i = self.increment;
        [
            Vec2::new(i, 0.0),
            Vec2::new(0.0, i),
            Vec2::new(-i, 0.0),
            Vec2::new(0.0, -i),
        ]
    }
}

/// Result of [`refine`]
#[derive(Debug, Clone)]
pub struct Refinement<S> {
    /// Best trial seen, the center itself if nothing beat it
    pub trial: Trial,
    /// `Victory` when a neighbor cleared the table
    pub outcome: Outcome,
    /// Table after `trial`, present only when a neighbor beat the center
    pub snapshot: Option<S>,
}

impl<S> Refinement<S> {
    #[inline]
    pub fn improved(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Hill-climb `center` by nudging its direction.
///
/// Every neighbor is shot from `anchor` and the engine is rolled back after
/// it. A strictly better neighbor becomes the new center at once, so later
/// nudges in the same pass start from it. Shots that pocket the cue are
/// ignored. A neighbor that clears the table ends the search immediately and
/// leaves the engine in that cleared state.
pub fn refine<E: ShotEngine>(
    engine: &mut E,
    anchor: &E::Snapshot,
    center: Trial,
    speed: f32,
    config: RefineConfig,
) -> Result<Refinement<E::Snapshot>, PlanError> {
    let mut best = center;
    let mut snapshot: Option<E::Snapshot> = None;

    for _ in 0..config.passes {
        for delta in config.deltas() {
            let direction = (best.direction + delta).normalize_or_zero();
            if direction == Vec2::ZERO {
                continue;
            }

            let settled = engine.shoot(direction, speed);
            let trial = Trial::new(direction, settled);

            match settled.outcome {
                Outcome::Victory => {
                    return Ok(Refinement {
                        trial,
                        outcome: Outcome::Victory,
                        snapshot,
                    });
                }
                Outcome::Loss => {}
                Outcome::Running => {
                    if trial.beats(&best) {
                        best = trial;
                        let target = snapshot.get_or_insert_with(|| engine.new_snapshot());
                        engine.capture(target)?;
                    }
                }
            }

            engine.restore(anchor)?;
        }
    }

    Ok(Refinement {
        trial: best,
        outcome: Outcome::Running,
        snapshot,
    })
}
