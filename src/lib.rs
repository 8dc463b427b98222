//! Pool Rollout - shot planning on a simulated pool table
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, table, episode, rollback)
//! - `planner`: Greedy rollout, local refinement and single-shot search
//! - `persistence`: Binary plan files
//! - `settings`: Planner configuration
//! - `benchmark`: Parallel fan-out over independent episodes
//! - `report`: Log formatting for planner events

pub mod benchmark;
pub mod persistence;
pub mod planner;
pub mod report;
pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;

/// Simulation and planning constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz)
    pub const SIM_DT: f32 = 0.02;

    /// Number of bodies on the table (cue + 15 object balls)
    pub const BODY_COUNT: usize = 16;
    /// Index of the cue body
    pub const CUE: usize = 0;
    /// Index of the body that keeps its rack slot on reset, together with the cue
    pub const ANCHOR_BALL: usize = 1;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 15.0;
    pub const BALL_MASS: f32 = 1.0;

    /// Velocity multiplier applied every tick
    pub const LINEAR_DAMPING: f32 = 0.98;
    /// Squared speed below which a body is stopped outright
    pub const STOP_EPSILON_SQ: f32 = 1.0;
    /// Ball-ball restitution
    pub const RESTITUTION: f32 = 0.95;
    /// Cushion bounce factor
    pub const CUSHION_BOUNCINESS: f32 = 0.9;
    /// A ball falls when closer than this fraction of (ball + pocket radius)
    pub const POCKET_MARGIN: f32 = 0.88;

    /// Spin model (reference variant only)
    pub const SPIN_DAMPING: f32 = 0.95;
    pub const SPIN_STOP: f32 = 1.0;
    pub const SPIN_TRANSFER: f32 = 0.1;

    /// Shot magnitude applied to every planned direction
    pub const SHOT_SPEED: f32 = 1500.0;
    /// Seed used by `reset(None)`
    pub const DEFAULT_RACK_SEED: u64 = 4477;
    /// Minimum inset from the cushion for randomly placed balls
    pub const SAFE_MARGIN: f32 = 28.0;
    /// Target placements tried by `reset_one_ball` before giving up
    pub const ONE_BALL_MAX_DRAWS: u32 = 10_000;

    /// Planner defaults
    pub const DEFAULT_SAMPLES: u32 = 10_000;
    pub const REFINE_INCREMENT: f32 = 0.01;
    pub const REFINE_PASSES: u32 = 10;
    pub const FIND_WIN_MAX_ATTEMPTS: u32 = 10_000;
}

/// Squared length below which a random draw is rejected as directionless
pub const MIN_DIRECTION_LENGTH_SQ: f32 = 0.001;

/// Angle of a direction in radians, in (-π, π]
#[inline]
pub fn angle_of(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}
