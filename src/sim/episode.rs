//! Episode controller
//!
//! Owns the 16 bodies of one table, advances them with a fixed timestep and
//! classifies how a shot ended.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, resolve_contact, resolve_cushion};
use super::table::{Cushion, Table};
use crate::consts::*;

static NEXT_EPISODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an episode. Snapshots bind to this, not to
/// the episode's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeId(u64);

impl EpisodeId {
    fn next() -> Self {
        Self(NEXT_EPISODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Physics variant. The discriminant is the selector byte of plan files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Variant {
    /// Tracks coarse spin; spinning bodies keep the table unsettled
    Reference = 0,
    /// Translation only
    #[default]
    Fast = 1,
}

impl Variant {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Variant::Reference),
            1 => Some(Variant::Fast),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Reference => "reference",
            Variant::Fast => "fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reference" | "normal" | "ref" => Some(Variant::Reference),
            "fast" | "optimized" => Some(Variant::Fast),
            _ => None,
        }
    }

    #[inline]
    pub fn has_spin(self) -> bool {
        self == Variant::Reference
    }
}

/// How the current shot stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    Running,
    /// Every object ball is down
    Victory,
    /// The cue ball was pocketed
    Loss,
}

impl Outcome {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != Outcome::Running
    }
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub sunk: u32,
    /// Ball-ball pairs that exchanged an impulse this tick
    pub contacts: u32,
    pub outcome: Outcome,
}

/// Result of running a shot to rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settled {
    pub ticks: u32,
    pub sunk: u32,
    pub outcome: Outcome,
}

/// One table in play
#[derive(Debug)]
pub struct Episode {
    id: EpisodeId,
    variant: Variant,
    table: Arc<Table>,
    /// Cushion pulled in by the ball radius, cached for the wall pass
    bounds: Cushion,
    bodies: [Body; BODY_COUNT],
    settled: bool,
}

impl Episode {
    /// Standard table, bodies in their rack slots
    pub fn new(variant: Variant) -> Self {
        Self::with_table(variant, Table::standard())
    }

    pub fn with_table(variant: Variant, table: Arc<Table>) -> Self {
        let bodies = table.rack().map(Body::at);
        Self::from_bodies(variant, table, bodies)
    }

    /// Start from an arbitrary arrangement (custom layouts, tests)
    pub fn from_bodies(variant: Variant, table: Arc<Table>, bodies: [Body; BODY_COUNT]) -> Self {
        let bounds = table.cushion().inset(table.ball_radius());
        let settled = !bodies.iter().any(Body::is_moving);
        Self {
            id: EpisodeId::next(),
            variant,
            table,
            bounds,
            bodies,
            settled,
        }
    }

    #[inline]
    pub fn id(&self) -> EpisodeId {
        self.id
    }

    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[inline]
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    #[inline]
    pub fn bodies(&self) -> &[Body; BODY_COUNT] {
        &self.bodies
    }

    #[inline]
    pub(crate) fn bodies_mut(&mut self) -> &mut [Body; BODY_COUNT] {
        &mut self.bodies
    }

    #[inline]
    pub fn cue(&self) -> &Body {
        &self.bodies[CUE]
    }

    /// No active body moving and no shot pending
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub(crate) fn mark_settled(&mut self) {
        self.settled = true;
    }

    pub fn any_moving(&self) -> bool {
        self.bodies.iter().any(Body::is_moving)
    }

    pub fn active_object_balls(&self) -> usize {
        self.bodies[1..].iter().filter(|b| b.active).count()
    }

    /// Classify the table as it stands right now
    pub fn outcome(&self) -> Outcome {
        if self.bodies[CUE].in_pocket(self.table.ball_radius(), self.table.pockets()) {
            Outcome::Loss
        } else if self.active_object_balls() == 0 {
            Outcome::Victory
        } else {
            Outcome::Running
        }
    }

    /// Set the cue velocity to `direction * speed`. The direction is taken
    /// as given; callers normalize.
    pub fn apply_shot(&mut self, direction: Vec2, speed: f32) {
        self.bodies[CUE].vel = direction * speed;
        self.settled = false;
    }

    /// Advance every body by one fixed step.
    ///
    /// Order: integrate and pocket-test each body by index, then all
    /// ball-ball pairs, then the cushion pass. A pocketed cue ends the tick
    /// at once with `Loss` and reports no sinks for the tick, even if an
    /// object ball fell earlier in the same pass. Clearing the last object
    /// ball ends the tick at once with `Victory`. Either way the table is
    /// brought to rest.
    pub fn tick(&mut self) -> TickReport {
        let with_spin = self.variant.has_spin();
        let radius = self.table.ball_radius();
        let mut sunk = 0;

        for i in 0..BODY_COUNT {
            self.bodies[i].integrate(SIM_DT, with_spin);

            if !self.bodies[i].in_pocket(radius, self.table.pockets()) {
                continue;
            }

            if i == CUE {
                self.halt_all();
                return TickReport {
                    outcome: Outcome::Loss,
                    ..TickReport::default()
                };
            }

            let body = &mut self.bodies[i];
            body.halt();
            body.active = false;
            sunk += 1;

            if self.active_object_balls() == 0 {
                self.halt_all();
                return TickReport {
                    sunk,
                    contacts: 0,
                    outcome: Outcome::Victory,
                };
            }
        }

        let mut contacts = 0;
        for i in 0..BODY_COUNT {
            for j in (i + 1)..BODY_COUNT {
                let (head, tail) = self.bodies.split_at_mut(j);
                let (a, b) = (&mut head[i], &mut tail[0]);
                if !a.touches(b, radius) {
                    continue;
                }
                if let Some(contact) = resolve_contact(a, b, radius, with_spin) {
                    contacts += u32::from(contact.impulse);
                }
            }
        }

        for body in &mut self.bodies {
            resolve_cushion(body, &self.bounds);
        }

        TickReport {
            sunk,
            contacts,
            outcome: Outcome::Running,
        }
    }

    /// Tick until nothing moves or the shot ends. Calling this on a table
    /// at rest reports zero ticks and `Running`.
    pub fn settle(&mut self) -> Settled {
        let mut result = Settled::default();

        while self.any_moving() {
            let report = self.tick();
            result.ticks += 1;
            result.sunk += report.sunk;

            if report.outcome.is_terminal() {
                result.outcome = report.outcome;
                break;
            }
        }

        self.settled = true;
        result
    }

    /// Re-rack: cue and anchor ball keep their slots, the rest are shuffled
    /// among the remaining slots. `None` uses the fixed default rack seed.
    pub fn reset(&mut self, seed: Option<u64>) {
        let seed = seed.unwrap_or(DEFAULT_RACK_SEED);
        let mut rng = Pcg32::seed_from_u64(seed);
        let slots = shuffled_slots(&mut rng);

        let rack = *self.table.rack();
        for (body, slot) in self.bodies.iter_mut().zip(slots) {
            *body = Body::at(rack[slot]);
        }
        self.settled = true;

        log::debug!("Episode {:?} re-racked with seed {}", self.id, seed);
    }

    /// Single-target layout: only the cue and the anchor ball are in play,
    /// both at random safe spots at least `min_distance` apart.
    ///
    /// # Panics
    ///
    /// Panics if `min_distance` cannot fit on the table, or if no target spot
    /// that far from the cue turns up in `ONE_BALL_MAX_DRAWS` draws.
    pub fn reset_one_ball(&mut self, seed: u64, min_distance: f32) {
        let area = self.table.cushion().inset(SAFE_MARGIN);
        let diagonal = Vec2::new(area.width(), area.height()).length();
        assert!(
            min_distance < diagonal,
            "min distance {min_distance} does not fit on the table"
        );

        let mut rng = Pcg32::seed_from_u64(seed);
        let rack = *self.table.rack();
        for (i, body) in self.bodies.iter_mut().enumerate() {
            *body = Body::at(rack[i]);
            body.active = i == CUE || i == ANCHOR_BALL;
        }

        let cue_pos = self.table.random_safe_position(&mut rng);
        let min_sq = min_distance * min_distance;
        let target_pos = (0..ONE_BALL_MAX_DRAWS)
            .map(|_| self.table.random_safe_position(&mut rng))
            .find(|candidate| candidate.distance_squared(cue_pos) >= min_sq)
            .unwrap_or_else(|| {
                panic!("no spot at least {min_distance} from the cue after {ONE_BALL_MAX_DRAWS} draws")
            });

        self.bodies[CUE].pos = cue_pos;
        self.bodies[ANCHOR_BALL].pos = target_pos;
        self.settled = true;

        log::debug!(
            "Episode {:?} one-ball layout: cue {:?}, target {:?}",
            self.id,
            cue_pos,
            target_pos
        );
    }

    fn halt_all(&mut self) {
        for body in &mut self.bodies {
            body.halt();
        }
    }
}

/// Partial Fisher-Yates over slot indices that never moves the cue or anchor
fn shuffled_slots<R: Rng>(rng: &mut R) -> [usize; BODY_COUNT] {
    let mut slots: [usize; BODY_COUNT] = std::array::from_fn(|i| i);

    for i in (0..BODY_COUNT).rev() {
        if i == CUE || i == ANCHOR_BALL {
            continue;
        }
        let j = rng.random_range(0..=i);
        if j == CUE || j == ANCHOR_BALL {
            continue;
        }
        slots.swap(i, j);
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lone_ball_episode(cue: Vec2, target: Vec2) -> Episode {
        let table = Table::standard();
        let mut bodies = table.rack().map(Body::at);
        for body in bodies.iter_mut().skip(2) {
            body.active = false;
        }
        bodies[CUE].pos = cue;
        bodies[ANCHOR_BALL].pos = target;
        Episode::from_bodies(Variant::Fast, table, bodies)
    }

    #[test]
    fn test_new_episode_is_racked_and_settled() {
        let episode = Episode::new(Variant::Fast);
        assert!(episode.is_settled());
        assert_eq!(episode.active_object_balls(), 15);
        assert_eq!(episode.outcome(), Outcome::Running);
        for (body, slot) in episode.bodies().iter().zip(episode.table().rack()) {
            assert_eq!(body.pos, *slot);
            assert!(body.active);
        }
    }

    #[test]
    fn test_episodes_have_distinct_ids() {
        let a = Episode::new(Variant::Fast);
        let b = Episode::new(Variant::Fast);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_settle_on_rest_is_idle() {
        let mut episode = Episode::new(Variant::Fast);
        let result = episode.settle();
        assert_eq!(result, Settled::default());
        assert_eq!(result.outcome, Outcome::Running);
    }

    #[test]
    fn test_apply_shot_unsettles() {
        let mut episode = Episode::new(Variant::Fast);
        episode.apply_shot(Vec2::new(1.0, 0.0), SHOT_SPEED);
        assert!(!episode.is_settled());
        assert_eq!(episode.cue().vel, Vec2::new(SHOT_SPEED, 0.0));

        let result = episode.settle();
        assert!(result.ticks > 0);
        assert!(episode.is_settled());
        assert!(!episode.any_moving());

        // Second call is a no-op
        assert_eq!(episode.settle(), Settled::default());
    }

    #[test]
    fn test_scratch_is_loss() {
        // Cue aimed straight at the top-left corner pocket, nothing in the way
        let mut episode = lone_ball_episode(Vec2::new(700.0, 500.0), Vec2::new(1200.0, 600.0));
        let aim = (Vec2::new(482.0, 286.0) - episode.cue().pos).normalize();
        episode.apply_shot(aim, SHOT_SPEED);

        let result = episode.settle();
        assert_eq!(result.outcome, Outcome::Loss);
        assert_eq!(result.sunk, 0);
        assert_eq!(episode.outcome(), Outcome::Loss);
        assert!(!episode.any_moving());
    }

    #[test]
    fn test_cue_sink_overrides_same_tick_object_sink() {
        let table = Table::standard();
        let pocket = table.pockets()[0].center;
        let mut bodies = table.rack().map(Body::at);
        // Both already over a pocket; the cue is processed first
        bodies[CUE].pos = pocket;
        bodies[CUE].vel = Vec2::new(10.0, 10.0);
        bodies[5].pos = table.pockets()[1].center;
        let mut episode = Episode::from_bodies(Variant::Fast, table, bodies);

        let report = episode.tick();
        assert_eq!(report.outcome, Outcome::Loss);
        assert_eq!(report.sunk, 0);
        assert!(episode.bodies()[5].active);
    }

    #[test]
    fn test_object_sink_deactivates_and_counts() {
        let table = Table::standard();
        let mut bodies = table.rack().map(Body::at);
        bodies[7].pos = table.pockets()[4].center;
        bodies[7].vel = Vec2::new(0.0, -50.0);
        let mut episode = Episode::from_bodies(Variant::Fast, table, bodies);

        let report = episode.tick();
        assert_eq!(report, TickReport { sunk: 1, contacts: 0, outcome: Outcome::Running });
        assert!(!episode.bodies()[7].active);
        assert_eq!(episode.bodies()[7].vel, Vec2::ZERO);
        assert_eq!(episode.active_object_balls(), 14);
    }

    #[test]
    fn test_tick_counts_impulse_contacts() {
        let mut episode = lone_ball_episode(Vec2::new(700.0, 500.0), Vec2::new(731.0, 500.0));
        episode.bodies_mut()[CUE].vel = Vec2::new(SHOT_SPEED, 0.0);
        episode.settled = false;

        let report = episode.tick();
        assert_eq!(report.contacts, 1);
        assert_eq!(report.outcome, Outcome::Running);
        let target = episode.bodies()[ANCHOR_BALL].vel;
        assert!(target.x > 0.0);
        assert!(episode.bodies()[CUE].vel.x < target.x);

        // Separating after the hit, so the next tick exchanges nothing
        assert_eq!(episode.tick().contacts, 0);
    }

    #[test]
    fn test_last_object_sink_is_victory() {
        let table = Table::standard();
        let pocket = table.pockets()[5].center;
        let mut episode = lone_ball_episode(Vec2::new(700.0, 500.0), pocket);
        // Nudge so the pocket test runs on a live body
        episode.bodies_mut()[ANCHOR_BALL].vel = Vec2::new(0.0, 30.0);
        episode.settled = false;

        let result = episode.settle();
        assert_eq!(result, Settled { ticks: 1, sunk: 1, outcome: Outcome::Victory });
        assert_eq!(episode.outcome(), Outcome::Victory);
    }

    #[test]
    fn test_reset_keeps_cue_and_anchor() {
        let mut episode = Episode::new(Variant::Fast);
        episode.apply_shot(Vec2::new(1.0, 0.0), SHOT_SPEED);
        episode.settle();

        episode.reset(Some(42));
        let rack = *episode.table().rack();
        assert_eq!(episode.bodies()[CUE].pos, rack[CUE]);
        assert_eq!(episode.bodies()[ANCHOR_BALL].pos, rack[ANCHOR_BALL]);
        assert!(episode.bodies().iter().all(|b| b.active && b.vel == Vec2::ZERO));
        assert!(episode.is_settled());

        // Still a permutation of the rack
        let mut used = [false; BODY_COUNT];
        for body in episode.bodies() {
            let slot = rack.iter().position(|p| *p == body.pos).unwrap();
            assert!(!used[slot]);
            used[slot] = true;
        }
    }

    #[test]
    fn test_reset_is_deterministic_per_seed() {
        let mut a = Episode::new(Variant::Fast);
        let mut b = Episode::new(Variant::Reference);
        a.reset(Some(9));
        b.reset(Some(9));
        assert_eq!(a.bodies(), b.bodies());

        a.reset(None);
        b.reset(Some(DEFAULT_RACK_SEED));
        assert_eq!(a.bodies(), b.bodies());
    }

    #[test]
    #[should_panic(expected = "no spot at least")]
    fn test_one_ball_layout_gives_up_on_unreachable_distance() {
        let mut episode = Episode::new(Variant::Fast);
        // Just under the safe-area diagonal: only opposite corners qualify
        episode.reset_one_ball(3, 970.0);
    }

    #[test]
    fn test_one_ball_layout() {
        let mut episode = Episode::new(Variant::Fast);
        episode.reset_one_ball(3, 100.0);
        assert_eq!(episode.active_object_balls(), 1);
        assert!(episode.bodies()[ANCHOR_BALL].active);
        let gap = episode.bodies()[CUE].pos.distance(episode.bodies()[ANCHOR_BALL].pos);
        assert!(gap >= 100.0);
    }

    #[test]
    fn test_variant_byte_round_trip() {
        for variant in [Variant::Reference, Variant::Fast] {
            assert_eq!(Variant::from_byte(variant.as_byte()), Some(variant));
            assert_eq!(Variant::from_str(variant.as_str()), Some(variant));
        }
        assert_eq!(Variant::from_byte(7), None);
    }

    #[test]
    fn test_reference_variant_settles() {
        let mut episode = Episode::new(Variant::Reference);
        episode.apply_shot(Vec2::new(1.0, 0.02).normalize(), SHOT_SPEED);
        let result = episode.settle();
        assert!(result.ticks > 0);
        assert!(!episode.any_moving());
    }
}
