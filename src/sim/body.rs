//! Body state and contact primitives
//!
//! Every ball is a circle of the table's ball radius with equal mass. A body
//! advances by one fixed step at a time; contacts are resolved in place on
//! the flat body array owned by the episode.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::table::{Cushion, Pocket};
use crate::consts::*;

/// A single ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Rotation about the table normal (radians, reference variant only)
    #[serde(default)]
    pub angle: f32,
    /// Angular velocity (reference variant only)
    #[serde(default)]
    pub spin: f32,
    pub active: bool,
}

impl Body {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            angle: 0.0,
            spin: 0.0,
            active: true,
        }
    }

    /// Active and either translating or spinning
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.active && (self.vel != Vec2::ZERO || self.spin != 0.0)
    }

    /// Drop all motion (position and active flag are kept)
    #[inline]
    pub fn halt(&mut self) {
        self.vel = Vec2::ZERO;
        self.angle = 0.0;
        self.spin = 0.0;
    }

    /// Advance by one step: damping, then position, then the stop rule
    #[inline]
    pub fn integrate(&mut self, dt: f32, with_spin: bool) {
        if !self.active {
            return;
        }

        self.vel *= LINEAR_DAMPING;
        self.pos += self.vel * dt;

        if with_spin {
            self.spin *= SPIN_DAMPING;
            self.angle += self.spin * dt;
            if self.spin.abs() < SPIN_STOP {
                self.spin = 0.0;
            }
        }

        // Hard stop so the damping tail terminates
        if self.vel.length_squared() < STOP_EPSILON_SQ {
            self.vel = Vec2::ZERO;
        }
    }

    /// Whether the body has dropped into any pocket
    #[inline]
    pub fn in_pocket(&self, radius: f32, pockets: &[Pocket]) -> bool {
        if !self.active {
            return false;
        }
        pockets.iter().any(|pocket| {
            let threshold = (radius + pocket.radius) * POCKET_MARGIN;
            (self.pos - pocket.center).length_squared() < threshold * threshold
        })
    }

    /// Broad-phase contact test: both in play, overlapping, at least one moving
    #[inline]
    pub fn touches(&self, other: &Body, radius: f32) -> bool {
        if !self.active || !other.active {
            return false;
        }
        if !self.is_moving() && !other.is_moving() {
            return false;
        }
        let reach = radius + radius;
        (self.pos - other.pos).length_squared() < reach * reach
    }
}

/// Result of resolving a ball-ball contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactResult {
    /// Unit normal from the first body toward the second
    pub normal: Vec2,
    /// Overlap removed by position correction
    pub penetration: f32,
    /// Whether an impulse was exchanged (bodies were approaching)
    pub impulse: bool,
}

/// Separate two overlapping bodies and exchange an impulse along the normal.
///
/// Position correction is split by inverse mass so the whole overlap is
/// removed in one step. The impulse is only applied while the bodies close
/// along the normal; already-separating pairs are only pushed apart.
pub fn resolve_contact(
    a: &mut Body,
    b: &mut Body,
    radius: f32,
    with_spin: bool,
) -> Option<ContactResult> {
    let delta = b.pos - a.pos;
    let dist_sq = delta.length_squared();
    if dist_sq < 0.0001 {
        // Coincident centers have no usable normal
        return None;
    }

    let dist = dist_sq.sqrt();
    let penetration = radius + radius - dist;
    if penetration <= 0.0 {
        return None;
    }

    let normal = delta / dist;
    let inv_a = 1.0 / BALL_MASS;
    let inv_b = 1.0 / BALL_MASS;
    let inv_sum = inv_a + inv_b;

    a.pos -= normal * (penetration * (inv_a / inv_sum));
    b.pos += normal * (penetration * (inv_b / inv_sum));

    let relative = a.vel - b.vel;

    if with_spin {
        let tangent = Vec2::new(-normal.y, normal.x);
        let torque = relative.dot(tangent) * SPIN_TRANSFER;
        a.spin += torque / (radius * radius);
        b.spin += torque / (radius * radius);
    }

    let approach_speed = relative.dot(normal);
    if approach_speed <= 0.0 {
        return Some(ContactResult {
            normal,
            penetration,
            impulse: false,
        });
    }

    let j = (1.0 + RESTITUTION) * approach_speed / inv_sum;
    a.vel -= normal * (j * inv_a);
    b.vel += normal * (j * inv_b);

    Some(ContactResult {
        normal,
        penetration,
        impulse: true,
    })
}

/// Clamp a moving body into `bounds` (the cushion already inset by the ball
/// radius) and bounce the clamped velocity component. Returns true on contact.
pub fn resolve_cushion(body: &mut Body, bounds: &Cushion) -> bool {
    if !body.is_moving() {
        return false;
    }

    let mut hit = false;

    if body.pos.x < bounds.left {
        body.pos.x = bounds.left;
        body.vel.x = -body.vel.x * CUSHION_BOUNCINESS;
        hit = true;
    } else if body.pos.x > bounds.right {
        body.pos.x = bounds.right;
        body.vel.x = -body.vel.x * CUSHION_BOUNCINESS;
        hit = true;
    }

    if body.pos.y < bounds.top {
        body.pos.y = bounds.top;
        body.vel.y = -body.vel.y * CUSHION_BOUNCINESS;
        hit = true;
    } else if body.pos.y > bounds.bottom {
        body.pos.y = bounds.bottom;
        body.vel.y = -body.vel.y * CUSHION_BOUNCINESS;
        hit = true;
    }

    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::table::{STANDARD_CUSHION, STANDARD_POCKETS};

    fn moving(pos: Vec2, vel: Vec2) -> Body {
        let mut body = Body::at(pos);
        body.vel = vel;
        body
    }

    #[test]
    fn test_integrate_applies_damping_then_moves() {
        let mut body = moving(Vec2::new(100.0, 100.0), Vec2::new(100.0, 0.0));
        body.integrate(SIM_DT, false);
        assert!((body.vel.x - 98.0).abs() < 1e-4);
        assert!((body.pos.x - (100.0 + 98.0 * SIM_DT)).abs() < 1e-4);
    }

    #[test]
    fn test_slow_body_is_zeroed_exactly() {
        // 1.0 * 0.98 squared is below the stop epsilon
        let mut body = moving(Vec2::new(600.0, 400.0), Vec2::new(1.0, 0.0));
        body.integrate(SIM_DT, false);
        assert_eq!(body.vel, Vec2::ZERO);
        assert!(!body.is_moving());

        let rest = body.pos;
        body.integrate(SIM_DT, false);
        assert_eq!(body.vel, Vec2::ZERO);
        assert_eq!(body.pos, rest);
    }

    #[test]
    fn test_inactive_body_does_not_move() {
        let mut body = moving(Vec2::new(600.0, 400.0), Vec2::new(500.0, 0.0));
        body.active = false;
        body.integrate(SIM_DT, false);
        assert_eq!(body.pos, Vec2::new(600.0, 400.0));
        assert!(!body.is_moving());
    }

    #[test]
    fn test_head_on_contact_transfers_momentum() {
        let mut a = moving(Vec2::new(100.0, 100.0), Vec2::new(500.0, 0.0));
        let mut b = Body::at(Vec2::new(128.0, 100.0));

        assert!(a.touches(&b, BALL_RADIUS));
        let result = resolve_contact(&mut a, &mut b, BALL_RADIUS, false).unwrap();

        assert!(result.impulse);
        assert!((result.penetration - 2.0).abs() < 1e-4);
        // Symmetric correction: overlap fully removed
        assert!((a.pos.distance(b.pos) - 2.0 * BALL_RADIUS).abs() < 1e-3);
        assert!((a.pos.x - 99.0).abs() < 1e-4);
        // (1 + e) / 2 of the closing speed moves to the struck ball
        assert!((b.vel.x - 487.5).abs() < 1e-2);
        assert!((a.vel.x - 12.5).abs() < 1e-2);
        // Momentum is conserved
        assert!((a.vel.x + b.vel.x - 500.0).abs() < 1e-2);
    }

    #[test]
    fn test_separating_bodies_get_no_impulse() {
        let mut a = moving(Vec2::new(100.0, 100.0), Vec2::new(-300.0, 0.0));
        let mut b = Body::at(Vec2::new(120.0, 100.0));

        let result = resolve_contact(&mut a, &mut b, BALL_RADIUS, false).unwrap();
        assert!(!result.impulse);
        assert_eq!(a.vel, Vec2::new(-300.0, 0.0));
        assert_eq!(b.vel, Vec2::ZERO);
        assert!((a.pos.distance(b.pos) - 2.0 * BALL_RADIUS).abs() < 1e-3);
    }

    #[test]
    fn test_resting_pair_is_not_a_contact() {
        let a = Body::at(Vec2::new(100.0, 100.0));
        let b = Body::at(Vec2::new(110.0, 100.0));
        assert!(!a.touches(&b, BALL_RADIUS));
    }

    #[test]
    fn test_coincident_centers_are_skipped() {
        let mut a = moving(Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0));
        let mut b = Body::at(Vec2::new(100.0, 100.0));
        assert!(resolve_contact(&mut a, &mut b, BALL_RADIUS, false).is_none());
    }

    #[test]
    fn test_cushion_clamps_and_bounces() {
        let bounds = STANDARD_CUSHION.inset(BALL_RADIUS);
        let mut body = moving(Vec2::new(bounds.left - 4.0, 500.0), Vec2::new(-200.0, 50.0));

        assert!(resolve_cushion(&mut body, &bounds));
        assert_eq!(body.pos.x, bounds.left);
        assert!((body.vel.x - 180.0).abs() < 1e-3);
        assert_eq!(body.vel.y, 50.0);
    }

    #[test]
    fn test_cushion_ignores_resting_body() {
        let bounds = STANDARD_CUSHION.inset(BALL_RADIUS);
        let mut body = Body::at(Vec2::new(bounds.left - 4.0, 500.0));
        assert!(!resolve_cushion(&mut body, &bounds));
        assert_eq!(body.pos.x, bounds.left - 4.0);
    }

    #[test]
    fn test_pocket_threshold() {
        let pocket = STANDARD_POCKETS[0];
        let threshold = (BALL_RADIUS + pocket.radius) * POCKET_MARGIN;

        let inside = Body::at(pocket.center + Vec2::new(threshold - 0.5, 0.0));
        let outside = Body::at(pocket.center + Vec2::new(threshold + 0.5, 0.0));
        assert!(inside.in_pocket(BALL_RADIUS, &STANDARD_POCKETS));
        assert!(!outside.in_pocket(BALL_RADIUS, &STANDARD_POCKETS));
    }

    #[test]
    fn test_spin_decays_to_rest() {
        let mut body = Body::at(Vec2::new(600.0, 400.0));
        body.spin = 10.0;
        let mut ticks = 0;
        while body.is_moving() {
            body.integrate(SIM_DT, true);
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(body.spin, 0.0);
        assert!(body.angle > 0.0);
    }
}
