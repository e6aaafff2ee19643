//! Collision detection helpers
//!
//! Everything in the arena is a circle, so the tests here are cheap. The
//! broad phase is a per-axis bounding check; the narrow phase compares
//! squared distances so no square roots are taken for misses.

use glam::Vec2;

/// Slack added to the broad-phase box so fast movers are not skipped
pub const BROAD_PHASE_SLACK: f32 = 20.0;

/// Axis-aligned pre-filter. False means the circles certainly miss.
#[inline]
pub fn broad_phase(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius + BROAD_PHASE_SLACK;
    (a.x - b.x).abs() <= reach && (a.y - b.y).abs() <= reach
}

/// Strict circle overlap
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let sum = a_radius + b_radius;
    a.distance_squared(b) < sum * sum
}

/// Broad phase followed by the exact circle test
#[inline]
pub fn circle_hit(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    broad_phase(a, a_radius, b, b_radius) && circles_overlap(a, a_radius, b, b_radius)
}

/// Displacement that pushes circle `a` out of circle `b`.
///
/// Bodies are allowed to overlap by `tolerance` before they push apart. The
/// push is `strength` times the remaining overlap, along the line between
/// centres. Coincident centres have no defined direction and produce `None`.
pub fn separation(
    a: Vec2,
    a_radius: f32,
    b: Vec2,
    b_radius: f32,
    tolerance: f32,
    strength: f32,
) -> Option<Vec2> {
    let delta = a - b;
    let dist = delta.length();
    let min_dist = a_radius + b_radius - tolerance;
    if dist <= 0.0 || dist >= min_dist || !dist.is_finite() {
        return None;
    }
    Some(delta / dist * (min_dist - dist) * strength)
}

/// Last tick each enemy slot was struck by each continuous-field weapon.
///
/// Rows are enemy pool slots, columns are weapon catalog indices. A row is
/// wiped whenever its slot is handed to a new enemy.
#[derive(Debug, Clone)]
pub struct HitLedger {
    weapons: usize,
    cells: Vec<Option<u64>>,
}

impl HitLedger {
    pub fn new(weapons: usize, slots: usize) -> Self {
        Self {
            weapons,
            cells: vec![None; weapons * slots],
        }
    }

    fn ensure_slot(&mut self, slot: usize) {
        let needed = (slot + 1) * self.weapons;
        if self.cells.len() < needed {
            self.cells.resize(needed, None);
        }
    }

    /// Forget a slot's history (new occupant)
    pub fn reset_slot(&mut self, slot: usize) {
        self.ensure_slot(slot);
        let start = slot * self.weapons;
        self.cells[start..start + self.weapons].fill(None);
    }

    /// Record a hit on `tick`. Returns false if this pair was already hit on that tick.
    pub fn try_hit(&mut self, slot: usize, weapon: usize, tick: u64) -> bool {
        debug_assert!(weapon < self.weapons, "weapon index outside catalog");
        self.ensure_slot(slot);
        let cell = &mut self.cells[slot * self.weapons + weapon];
        if *cell == Some(tick) {
            return false;
        }
        *cell = Some(tick);
        true
    }

    pub fn last_hit(&self, slot: usize, weapon: usize) -> Option<u64> {
        self.cells
            .get(slot * self.weapons + weapon)
            .copied()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 10.0));
        assert!(!circles_overlap(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0));
    }

    #[test]
    fn test_broad_phase_rejects_far() {
        assert!(!broad_phase(Vec2::ZERO, 5.0, Vec2::new(100.0, 0.0), 5.0));
        assert!(broad_phase(Vec2::ZERO, 5.0, Vec2::new(25.0, 25.0), 5.0));
    }

    #[test]
    fn test_circle_hit_diagonal_miss() {
        // Inside the box, outside the circle
        assert!(!circle_hit(Vec2::ZERO, 10.0, Vec2::new(18.0, 18.0), 10.0));
    }

    #[test]
    fn test_separation_pushes_apart() {
        let push = separation(Vec2::new(5.0, 0.0), 10.0, Vec2::ZERO, 10.0, 5.0, 0.1).unwrap();
        // min_dist 15, overlap 10, strength 0.1
        assert!((push.x - 1.0).abs() < 1e-5);
        assert_eq!(push.y, 0.0);
    }

    #[test]
    fn test_separation_coincident_skipped() {
        assert!(separation(Vec2::ONE, 10.0, Vec2::ONE, 10.0, 5.0, 0.1).is_none());
    }

    #[test]
    fn test_separation_tolerance() {
        // 16 apart with radii 10+10-5=15: no push
        assert!(separation(Vec2::new(16.0, 0.0), 10.0, Vec2::ZERO, 10.0, 5.0, 0.1).is_none());
    }

    #[test]
    fn test_ledger_once_per_tick() {
        let mut ledger = HitLedger::new(3, 2);
        assert!(ledger.try_hit(0, 1, 7));
        assert!(!ledger.try_hit(0, 1, 7));
        assert!(ledger.try_hit(0, 2, 7));
        assert!(ledger.try_hit(0, 1, 8));
        assert_eq!(ledger.last_hit(0, 1), Some(8));
    }

    #[test]
    fn test_ledger_grows_and_resets() {
        let mut ledger = HitLedger::new(2, 1);
        assert!(ledger.try_hit(5, 0, 1));
        ledger.reset_slot(5);
        assert_eq!(ledger.last_hit(5, 0), None);
        assert!(ledger.try_hit(5, 0, 1));
    }
}
