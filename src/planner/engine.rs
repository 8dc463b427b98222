//! The physics capability the planners need

use glam::Vec2;

use crate::sim::{Episode, Settled, Snapshot, SnapshotError};

/// Anything that can take a shot, run it to rest and roll back.
pub trait ShotEngine {
    type Snapshot;

    /// An empty snapshot bound to this engine
    fn new_snapshot(&self) -> Self::Snapshot;

    fn apply_shot(&mut self, direction: Vec2, speed: f32);

    fn settle(&mut self) -> Settled;

    fn capture(&self, snapshot: &mut Self::Snapshot) -> Result<(), SnapshotError>;

    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<(), SnapshotError>;

    fn copy_into(
        &self,
        from: &Self::Snapshot,
        to: &mut Self::Snapshot,
    ) -> Result<(), SnapshotError>;

    /// Apply a shot and run it to rest
    fn shoot(&mut self, direction: Vec2, speed: f32) -> Settled {
        self.apply_shot(direction, speed);
        self.settle()
    }
}

impl ShotEngine for Episode {
    type Snapshot = Snapshot;

    fn new_snapshot(&self) -> Snapshot {
        Snapshot::new(self)
    }

    fn apply_shot(&mut self, direction: Vec2, speed: f32) {
        Episode::apply_shot(self, direction, speed)
    }

    fn settle(&mut self) -> Settled {
        Episode::settle(self)
    }

    fn capture(&self, snapshot: &mut Snapshot) -> Result<(), SnapshotError> {
        snapshot.capture(self)
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        snapshot.restore(self)
    }

    fn copy_into(&self, from: &Snapshot, to: &mut Snapshot) -> Result<(), SnapshotError> {
        from.copy_into(to)
    }
}
