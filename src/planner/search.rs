//! Blind search for a single shot with a given result

use crate::consts::FIND_WIN_MAX_ATTEMPTS;
use crate::sim::{Outcome, Settled};

use super::{DirectionSource, PlanError, ShotEngine, Trial};

/// Shoot random directions until one settles the way `accept` wants.
///
/// The engine is rolled back after every attempt, the accepted one included,
/// so it is left exactly as it was found.
pub fn find_direction<E, D, F>(
    engine: &mut E,
    directions: &mut D,
    speed: f32,
    max_attempts: u32,
    mut accept: F,
) -> Result<Trial, PlanError>
where
    E: ShotEngine,
    D: DirectionSource,
    F: FnMut(&Settled) -> bool,
{
    let mut anchor = engine.new_snapshot();
    engine.capture(&mut anchor)?;

    for _ in 0..max_attempts {
        let direction = directions.next_direction();
        let settled = engine.shoot(direction, speed);
        engine.restore(&anchor)?;

        if accept(&settled) {
            return Ok(Trial::new(direction, settled));
        }
    }

    Err(PlanError::Timeout {
        attempts: max_attempts,
    })
}

/// A direction that clears the table in one shot, within the default budget
pub fn find_single_win<E, D>(
    engine: &mut E,
    directions: &mut D,
    speed: f32,
) -> Result<Trial, PlanError>
where
    E: ShotEngine,
    D: DirectionSource,
{
    find_direction(engine, directions, speed, FIND_WIN_MAX_ATTEMPTS, |settled| {
        settled.outcome == Outcome::Victory
    })
}
