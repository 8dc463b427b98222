//! Deterministic simulation module
//!
//! Everything a shot touches lives here. This module must stay pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body index)
//! - No I/O beyond debug logging

pub mod body;
pub mod episode;
pub mod snapshot;
pub mod table;

pub use body::{Body, ContactResult, resolve_contact, resolve_cushion};
pub use episode::{Episode, EpisodeId, Outcome, Settled, TickReport, Variant};
pub use snapshot::{BodyRecord, Snapshot, SnapshotError};
pub use table::{Cushion, Pocket, STANDARD_CUSHION, STANDARD_POCKETS, STANDARD_RACK, Table};
