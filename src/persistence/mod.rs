//! Plan persistence
//!
//! Features:
//! - Compact binary plan format (variant byte + f32 LE pairs)
//! - Incremental file naming, existing files are never overwritten
//! - Strict parsing (empty, unknown variant and partial records rejected)

pub mod plan_file;

pub use plan_file::{PlanFileError, read_plan, write_plan_incremental};
