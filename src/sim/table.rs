//! Table geometry
//!
//! The cushion is an axis-aligned rectangle; pockets are circles sitting on
//! (or just outside) its edges. A `Table` never changes after construction
//! and is shared between every episode of the same layout.

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Axis-aligned cushion rectangle (left/top/right/bottom edges)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cushion {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Cushion {
    pub const fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// The rectangle a ball center may occupy (edges pulled in by `radius`)
    #[inline]
    pub fn inset(&self, radius: f32) -> Cushion {
        Cushion::from_ltrb(
            self.left + radius,
            self.top + radius,
            self.right - radius,
            self.bottom - radius,
        )
    }
}

/// A circular pocket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    pub center: Vec2,
    pub radius: f32,
}

impl Pocket {
    pub const fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            center: Vec2::new(x, y),
            radius,
        }
    }
}

/// Rack slots: cue, then the apex/anchor ball, then the rest of the triangle
pub const STANDARD_RACK: [Vec2; BODY_COUNT] = [
    Vec2::new(721.0, 504.0),
    Vec2::new(1179.0, 504.0),
    Vec2::new(1127.0, 504.0),
    Vec2::new(1153.0, 486.0),
    Vec2::new(1153.0, 522.0),
    Vec2::new(1179.0, 468.0),
    Vec2::new(1179.0, 540.0),
    Vec2::new(1205.0, 450.0),
    Vec2::new(1205.0, 486.0),
    Vec2::new(1205.0, 522.0),
    Vec2::new(1205.0, 558.0),
    Vec2::new(1231.0, 432.0),
    Vec2::new(1231.0, 468.0),
    Vec2::new(1231.0, 504.0),
    Vec2::new(1231.0, 540.0),
    Vec2::new(1231.0, 576.0),
];

/// Corners first, then the two side pockets
pub const STANDARD_POCKETS: [Pocket; 6] = [
    Pocket::new(482.0, 286.0, 20.0),
    Pocket::new(1438.0, 286.0, 20.0),
    Pocket::new(483.0, 722.0, 20.0),
    Pocket::new(1437.0, 722.0, 20.0),
    Pocket::new(960.0, 285.0, 20.0),
    Pocket::new(960.0, 723.0, 20.0),
];

pub const STANDARD_CUSHION: Cushion = Cushion::from_ltrb(484.0, 289.0, 1436.0, 719.0);

/// Immutable table description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    cushion: Cushion,
    pockets: Vec<Pocket>,
    ball_radius: f32,
    rack: [Vec2; BODY_COUNT],
}

impl Table {
    /// Build a table.
    ///
    /// # Panics
    ///
    /// Panics on a malformed layout: non-positive ball or pocket radius, a
    /// cushion too small to hold a ball, or no pockets at all. These are
    /// construction-time contract violations; nothing is validated once the
    /// simulation runs.
    pub fn new(
        cushion: Cushion,
        pockets: Vec<Pocket>,
        ball_radius: f32,
        rack: [Vec2; BODY_COUNT],
    ) -> Self {
        assert!(ball_radius > 0.0, "ball radius must be positive");
        assert!(!pockets.is_empty(), "table needs at least one pocket");
        assert!(
            pockets.iter().all(|p| p.radius > 0.0),
            "pocket radius must be positive"
        );
        assert!(
            cushion.width() > 2.0 * ball_radius && cushion.height() > 2.0 * ball_radius,
            "cushion too small for a ball"
        );

        Self {
            cushion,
            pockets,
            ball_radius,
            rack,
        }
    }

    /// The canonical table every variant plays on
    pub fn standard() -> Arc<Table> {
        Arc::new(Table::new(
            STANDARD_CUSHION,
            STANDARD_POCKETS.to_vec(),
            BALL_RADIUS,
            STANDARD_RACK,
        ))
    }

    #[inline]
    pub fn cushion(&self) -> &Cushion {
        &self.cushion
    }

    #[inline]
    pub fn pockets(&self) -> &[Pocket] {
        &self.pockets
    }

    #[inline]
    pub fn ball_radius(&self) -> f32 {
        self.ball_radius
    }

    #[inline]
    pub fn rack(&self) -> &[Vec2; BODY_COUNT] {
        &self.rack
    }

    /// Uniform position at least `SAFE_MARGIN` away from every cushion edge
    pub fn random_safe_position<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let area = self.cushion.inset(SAFE_MARGIN);
        Vec2::new(
            area.left + rng.random::<f32>() * area.width(),
            area.top + rng.random::<f32>() * area.height(),
        )
    }
}
