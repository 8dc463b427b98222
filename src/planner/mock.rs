//! Scripted engine for planner tests

use glam::Vec2;

use super::ShotEngine;
use crate::sim::{EpisodeId, Outcome, Settled, SnapshotError};

type Script = Box<dyn Fn(u32, Vec2) -> Settled>;

/// Outcome of a shot is `script(balls already down, direction)`
pub struct MockEngine {
    id: EpisodeId,
    pub down: u32,
    pending: Option<Vec2>,
    pub shots: u32,
    script: Script,
}

#[derive(Debug, Clone)]
pub struct MockSnapshot {
    owner: EpisodeId,
    down: Option<u32>,
}

impl MockEngine {
    pub fn new(script: impl Fn(u32, Vec2) -> Settled + 'static) -> Self {
        // Borrow a real identity so binding checks behave like the episode's
        let id = crate::sim::Episode::new(crate::sim::Variant::Fast).id();
        Self {
            id,
            down: 0,
            pending: None,
            shots: 0,
            script: Box::new(script),
        }
    }
}

pub fn running(sunk: u32, ticks: u32) -> Settled {
    Settled {
        ticks,
        sunk,
        outcome: Outcome::Running,
    }
}

pub fn finished(outcome: Outcome, sunk: u32, ticks: u32) -> Settled {
    Settled {
        ticks,
        sunk,
        outcome,
    }
}

impl ShotEngine for MockEngine {
    type Snapshot = MockSnapshot;

    fn new_snapshot(&self) -> MockSnapshot {
        MockSnapshot {
            owner: self.id,
            down: None,
        }
    }

    fn apply_shot(&mut self, direction: Vec2, _speed: f32) {
        self.pending = Some(direction);
    }

    fn settle(&mut self) -> Settled {
        let Some(direction) = self.pending.take() else {
            return Settled::default();
        };
        self.shots += 1;
        let result = (self.script)(self.down, direction);
        self.down += result.sunk;
        result
    }

    fn capture(&self, snapshot: &mut MockSnapshot) -> Result<(), SnapshotError> {
        if snapshot.owner != self.id {
            return Err(SnapshotError::Incompatible {
                bound: snapshot.owner,
                other: self.id,
            });
        }
        snapshot.down = Some(self.down);
        Ok(())
    }

    fn restore(&mut self, snapshot: &MockSnapshot) -> Result<(), SnapshotError> {
        self.down = snapshot.down.ok_or(SnapshotError::NotCaptured)?;
        self.pending = None;
        Ok(())
    }

    fn copy_into(&self, from: &MockSnapshot, to: &mut MockSnapshot) -> Result<(), SnapshotError> {
        if from.owner != to.owner {
            return Err(SnapshotError::Incompatible {
                bound: to.owner,
                other: from.owner,
            });
        }
        to.down = Some(from.down.ok_or(SnapshotError::NotCaptured)?);
        Ok(())
    }
}
