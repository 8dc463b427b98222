//! Snapshot and rollback
//!
//! A snapshot records which bodies are in play and where they sit. It is
//! bound to the episode it was created for and refuses to touch any other
//! one. Velocities are never recorded: restoring puts the table at rest.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::episode::{Episode, EpisodeId};
use crate::consts::BODY_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot is bound to episode {bound:?}, not {other:?}")]
    Incompatible { bound: EpisodeId, other: EpisodeId },
    #[error("snapshot has never been captured")]
    NotCaptured,
}

/// Recorded state of one body
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyRecord {
    pub active: bool,
    pub pos: Vec2,
}

/// Restorable copy of an episode's body placement
#[derive(Debug, Clone)]
pub struct Snapshot {
    episode: EpisodeId,
    records: [BodyRecord; BODY_COUNT],
    valid: bool,
}

impl Snapshot {
    /// An empty snapshot bound to `episode`
    pub fn new(episode: &Episode) -> Self {
        Self {
            episode: episode.id(),
            records: [BodyRecord::default(); BODY_COUNT],
            valid: false,
        }
    }

    #[inline]
    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn records(&self) -> &[BodyRecord; BODY_COUNT] {
        &self.records
    }

    fn check_binding(&self, other: EpisodeId) -> Result<(), SnapshotError> {
        if self.episode == other {
            Ok(())
        } else {
            Err(SnapshotError::Incompatible {
                bound: self.episode,
                other,
            })
        }
    }

    /// Record active flags and positions of every body
    pub fn capture(&mut self, episode: &Episode) -> Result<(), SnapshotError> {
        self.check_binding(episode.id())?;

        for (record, body) in self.records.iter_mut().zip(episode.bodies()) {
            record.active = body.active;
            record.pos = body.pos;
        }
        self.valid = true;
        Ok(())
    }

    /// Write the recorded placement back and stop every body
    pub fn restore(&self, episode: &mut Episode) -> Result<(), SnapshotError> {
        self.check_binding(episode.id())?;
        if !self.valid {
            return Err(SnapshotError::NotCaptured);
        }

        for (body, record) in episode.bodies_mut().iter_mut().zip(&self.records) {
            body.halt();
            body.active = record.active;
            body.pos = record.pos;
        }
        episode.mark_settled();
        Ok(())
    }

    /// Copy this snapshot's records into `other`, which becomes valid.
    ///
    /// Both must be bound to the same episode and `self` must have been
    /// captured; on failure neither snapshot changes.
    pub fn copy_into(&self, other: &mut Snapshot) -> Result<(), SnapshotError> {
        other.check_binding(self.episode)?;
        if !self.valid {
            return Err(SnapshotError::NotCaptured);
        }

        other.records = self.records;
        other.valid = true;
        Ok(())
    }
}
