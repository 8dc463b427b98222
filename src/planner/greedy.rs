//! Greedy rollout
//!
//! Each step samples random shots from a fixed anchor, keeps the one that
//! sinks the most balls in the fewest ticks, optionally polishes it with
//! local search, and commits it. Any sample that clears the table ends the
//! whole plan on the spot.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::refine::{RefineConfig, refine};
use super::{DirectionSource, PlanError, PlanEvent, PlanObserver, ShotEngine, Trial};
use crate::consts::*;
use crate::sim::Outcome;

/// Where the planner stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlannerState {
    /// Drawing samples for the current step
    #[default]
    Sampling,
    /// A direction was appended; the next call samples the next step
    StepCommitted,
    /// The table has been cleared
    Converged,
    /// A step sank nothing within its budget
    Exhausted,
}

impl PlannerState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, PlannerState::Converged | PlannerState::Exhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Random shots tried per step
    pub samples: u32,
    /// Magnitude applied to every direction
    pub speed: f32,
    /// Local search after sampling (`None` skips it)
    pub refine: Option<RefineConfig>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            speed: SHOT_SPEED,
            refine: Some(RefineConfig::default()),
        }
    }
}

/// Committed shots, in play order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<Trial>,
}

impl Plan {
    pub fn directions(&self) -> Vec<Vec2> {
        self.steps.iter().map(|t| t.direction).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_sunk(&self) -> u32 {
        self.steps.iter().map(|t| t.sunk).sum()
    }

    pub fn total_ticks(&self) -> u64 {
        self.steps.iter().map(|t| t.ticks as u64).sum()
    }
}

/// Step-at-a-time greedy planner over any [`ShotEngine`]
pub struct GreedyPlanner<'a, E: ShotEngine, D: DirectionSource> {
    engine: &'a mut E,
    directions: &'a mut D,
    config: PlannerConfig,
    anchor: E::Snapshot,
    state: PlannerState,
    plan: Plan,
}

impl<'a, E: ShotEngine, D: DirectionSource> GreedyPlanner<'a, E, D> {
    /// Anchor the planner at the engine's current table
    pub fn new(
        engine: &'a mut E,
        directions: &'a mut D,
        config: PlannerConfig,
    ) -> Result<Self, PlanError> {
        let mut anchor = engine.new_snapshot();
        engine.capture(&mut anchor)?;

        Ok(Self {
            engine,
            directions,
            config,
            anchor,
            state: PlannerState::Sampling,
            plan: Plan::default(),
        })
    }

    #[inline]
    pub fn state(&self) -> PlannerState {
        self.state
    }

    #[inline]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn into_plan(self) -> Plan {
        self.plan
    }

    /// Run steps until the table is cleared
    pub fn run(mut self, observer: &mut dyn PlanObserver) -> Result<Plan, PlanError> {
        while self.step(observer)? != PlannerState::Converged {}
        Ok(self.plan)
    }

    /// Plan one shot.
    ///
    /// Returns `StepCommitted` or `Converged`; a step that sinks nothing
    /// moves the planner to `Exhausted` and fails. Calling this in a
    /// terminal state is a no-op returning that state, or the exhaustion
    /// error again.
    pub fn step(&mut self, observer: &mut dyn PlanObserver) -> Result<PlannerState, PlanError> {
        match self.state {
            PlannerState::Converged => return Ok(self.state),
            PlannerState::Exhausted => {
                return Err(PlanError::ExhaustedSearch {
                    step: self.plan.len() + 1,
                    samples: self.config.samples,
                });
            }
            PlannerState::Sampling | PlannerState::StepCommitted => {}
        }

        self.state = PlannerState::Sampling;
        let step = self.plan.len() + 1;
        let speed = self.config.speed;

        let mut best: Option<Trial> = None;
        let mut best_snapshot = self.engine.new_snapshot();

        for sample in 0..self.config.samples {
            let direction = self.directions.next_direction();
            let settled = self.engine.shoot(direction, speed);
            let trial = Trial::new(direction, settled);

            match settled.outcome {
                Outcome::Victory => return Ok(self.converge(trial, observer)),
                Outcome::Loss => {}
                Outcome::Running => {
                    if best.is_none_or(|b| trial.beats(&b)) {
                        best = Some(trial);
                        self.engine.capture(&mut best_snapshot)?;
                        observer.on_event(&PlanEvent::TrialImproved {
                            step,
                            sample,
                            trial,
                        });
                    }
                }
            }

            self.engine.restore(&self.anchor)?;
        }

        let best = match best {
            Some(trial) if trial.sunk > 0 => trial,
            _ => {
                self.state = PlannerState::Exhausted;
                observer.on_event(&PlanEvent::Exhausted {
                    step,
                    samples: self.config.samples,
                });
                return Err(PlanError::ExhaustedSearch {
                    step,
                    samples: self.config.samples,
                });
            }
        };

        let mut committed = best;
        if let Some(refine_config) = self.config.refine {
            let refined = refine(&mut *self.engine, &self.anchor, best, speed, refine_config)?;
            if refined.outcome == Outcome::Victory {
                return Ok(self.converge(refined.trial, observer));
            }
            if let Some(snapshot) = refined.snapshot {
                observer.on_event(&PlanEvent::Refined {
                    step,
                    from: best,
                    to: refined.trial,
                });
                committed = refined.trial;
                best_snapshot = snapshot;
            }
        }

        self.engine.copy_into(&best_snapshot, &mut self.anchor)?;
        self.engine.restore(&self.anchor)?;
        self.plan.steps.push(committed);
        self.state = PlannerState::StepCommitted;

        observer.on_event(&PlanEvent::StepCommitted {
            step,
            trial: committed,
            total_sunk: self.plan.total_sunk(),
        });

        Ok(self.state)
    }

    fn converge(&mut self, trial: Trial, observer: &mut dyn PlanObserver) -> PlannerState {
        self.plan.steps.push(trial);
        self.state = PlannerState::Converged;
        observer.on_event(&PlanEvent::Converged {
            steps: self.plan.len(),
            trial,
        });
        self.state
    }
}
