//! Log output for planner events

use glam::Vec2;

use crate::angle_of;
use crate::consts::BODY_COUNT;
use crate::planner::{PlanEvent, PlanObserver};

const OBJECT_BALLS: u32 = BODY_COUNT as u32 - 1;

/// `(x, y)` plus the heading in degrees
pub fn describe_direction(dir: Vec2) -> String {
    format!("({:.4}, {:.4}) @ {:.2}°", dir.x, dir.y, angle_of(dir).to_degrees())
}

/// Writes planner progress through the `log` facade.
///
/// Step commits and the final result go to `info`; per-sample improvements
/// and refinements go to `debug`.
#[derive(Debug, Default)]
pub struct LogReporter {
    total_ticks: u64,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks of every committed step so far
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }
}

impl PlanObserver for LogReporter {
    fn on_event(&mut self, event: &PlanEvent) {
        match *event {
            PlanEvent::TrialImproved { step, sample, trial } => {
                log::debug!(
                    "Step {} sample {}: {} balls in {} ticks",
                    step,
                    sample,
                    trial.sunk,
                    trial.ticks
                );
            }
            PlanEvent::Refined { step, from, to } => {
                log::debug!(
                    "Step {} refined {} -> {} ({} -> {} balls, {} -> {} ticks)",
                    step,
                    describe_direction(from.direction),
                    describe_direction(to.direction),
                    from.sunk,
                    to.sunk,
                    from.ticks,
                    to.ticks
                );
            }
            PlanEvent::StepCommitted {
                step,
                trial,
                total_sunk,
            } => {
                self.total_ticks += trial.ticks as u64;
                log::info!(
                    "Step {} - Balls: {} ({}/{}), Ticks: {}",
                    step,
                    trial.sunk,
                    total_sunk,
                    OBJECT_BALLS,
                    trial.ticks
                );
            }
            PlanEvent::Converged { steps, trial } => {
                self.total_ticks += trial.ticks as u64;
                log::info!(
                    "Victory in {} shots, {} ticks total (last shot {})",
                    steps,
                    self.total_ticks,
                    describe_direction(trial.direction)
                );
            }
            PlanEvent::Exhausted { step, samples } => {
                log::warn!("Step {}: nothing fell in {} samples", step, samples);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Trial;

    fn trial(ticks: u32) -> Trial {
        Trial {
            ticks,
            sunk: 2,
            direction: Vec2::Y,
        }
    }

    #[test]
    fn test_describe_direction_includes_heading() {
        assert_eq!(describe_direction(Vec2::Y), "(0.0000, 1.0000) @ 90.00°");
    }

    #[test]
    fn test_reporter_sums_committed_ticks() {
        let mut reporter = LogReporter::new();
        reporter.on_event(&PlanEvent::TrialImproved { step: 1, sample: 0, trial: trial(999) });
        reporter.on_event(&PlanEvent::StepCommitted { step: 1, trial: trial(120), total_sunk: 2 });
        reporter.on_event(&PlanEvent::Converged { steps: 2, trial: trial(80) });
        assert_eq!(reporter.total_ticks(), 200);
    }
}
