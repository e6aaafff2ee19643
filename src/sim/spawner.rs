//! Time-driven enemy spawning
//!
//! Difficulty is a pure function of elapsed minutes and the map multiplier:
//! enemies come faster, in larger numbers, from stronger tiers, with more hp.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::World;
use crate::consts::*;
use crate::tuning::EnemyDef;

/// Minute thresholds at which the base tier steps up
const TIER_BANDS: [f32; 3] = [1.0, 4.0, 8.0];
/// Chance an individual spawn is pulled one tier early
const EARLY_TIER_CHANCE: f64 = 0.1;

/// Milliseconds between spawns
pub fn spawn_interval_ms(minutes: f32, difficulty: f32) -> f32 {
    (1500.0 - 150.0 * minutes).max(100.0) / difficulty
}

/// Live enemy ceiling
pub fn population_cap(minutes: f32, difficulty: f32) -> usize {
    ((50.0 + 50.0 * minutes) * difficulty).min(MAX_ENEMIES as f32) as usize
}

/// Base tier for the elapsed time, before the early-escalation roll
pub fn base_tier(minutes: f32) -> usize {
    TIER_BANDS.iter().filter(|&&band| minutes > band).count()
}

/// Distance from the player at which enemies appear: just past the view corner
pub fn spawn_ring_radius() -> f32 {
    (VIEW_WIDTH * VIEW_WIDTH + VIEW_HEIGHT * VIEW_HEIGHT).sqrt() / 2.0 + SPAWN_MARGIN
}

/// Stats of a spawned enemy after time and map scaling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledStats {
    pub hp: f32,
    pub damage: f32,
    pub speed: f32,
}

pub fn scale_enemy(def: &EnemyDef, minutes: f32, difficulty: f32) -> ScaledStats {
    ScaledStats {
        hp: def.hp * (1.0 + 0.5 * minutes) * difficulty,
        damage: def.damage * (1.0 + (difficulty - 1.0) * 0.5),
        speed: def.speed * (1.0 + (difficulty - 1.0) * 0.2),
    }
}

/// Spawn timer state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spawner {
    /// Time since the last spawn (ms)
    pub timer_ms: f32,
    /// Total enemies spawned this run
    pub spawned: u64,
}

impl Spawner {
    /// Advance the timer; spawn one enemy when due and under the cap
    pub fn update(world: &mut World, dt_ms: f32) {
        world.spawner.timer_ms += dt_ms;

        let minutes = world.run.minutes();
        let interval = spawn_interval_ms(minutes, world.difficulty);
        let cap = population_cap(minutes, world.difficulty);

        if world.spawner.timer_ms > interval && world.enemies.len() < cap {
            spawn_enemy(world, minutes);
            world.spawner.timer_ms = 0.0;
        }
    }
}

/// Pick a tier, place the enemy on the spawn ring and pull it from the pool
pub fn spawn_enemy(world: &mut World, minutes: f32) {
    let tiers = world.tuning.enemies.len();
    let mut tier = base_tier(minutes).min(tiers - 1);
    if world.rng.random_bool(EARLY_TIER_CHANCE) && tier + 1 < tiers {
        tier += 1;
    }

    let angle = world.rng.random_range(0.0..std::f32::consts::TAU);
    let anim_phase = world.rng.random_range(0.0..10.0);
    let ring = spawn_ring_radius();
    let raw = world.player.pos + Vec2::new(angle.cos(), angle.sin()) * ring;
    let pos = Vec2::new(raw.x.clamp(0.0, WORLD_WIDTH), raw.y.clamp(0.0, WORLD_HEIGHT));

    let def = &world.tuning.enemies[tier];
    let scaled = scale_enemy(def, minutes, world.difficulty);

    let (handle, enemy) = world.enemies.acquire();
    enemy.pos = pos;
    enemy.tier = tier;
    enemy.species.clone_from(&def.id);
    enemy.color.clone_from(&def.color);
    enemy.radius = def.radius;
    enemy.hp = scaled.hp;
    enemy.max_hp = scaled.hp;
    enemy.damage = scaled.damage;
    enemy.speed = scaled.speed;
    enemy.xp_value = def.xp_value;
    enemy.knockback = Vec2::ZERO;
    enemy.anim_phase = anim_phase;

    world.hit_ledger.reset_slot(handle.slot());
    world.spawner.spawned += 1;
    log::trace!("Spawned {} (tier {}) at {:?}", def.id, tier, pos);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaProgress;
    use crate::settings::Settings;
    use crate::tuning::Tuning;

    fn world(map: &str) -> World {
        World::new(
            Tuning::default(),
            Settings::with_seed(7),
            "WARRIOR",
            map,
            &MetaProgress::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_spawn_interval_curve() {
        assert_eq!(spawn_interval_ms(0.0, 1.0), 1500.0);
        assert_eq!(spawn_interval_ms(5.0, 1.0), 750.0);
        // Floors at 100 before the map divides it
        assert_eq!(spawn_interval_ms(20.0, 1.0), 100.0);
        assert_eq!(spawn_interval_ms(20.0, 2.0), 50.0);
    }

    #[test]
    fn test_population_cap_curve() {
        assert_eq!(population_cap(0.0, 1.0), 50);
        assert_eq!(population_cap(2.0, 1.3), 195);
        assert_eq!(population_cap(30.0, 1.0), MAX_ENEMIES);
    }

    #[test]
    fn test_tier_bands() {
        assert_eq!(base_tier(0.5), 0);
        assert_eq!(base_tier(1.0), 0);
        assert_eq!(base_tier(1.01), 1);
        assert_eq!(base_tier(4.5), 2);
        assert_eq!(base_tier(9.0), 3);
    }

    #[test]
    fn test_scaling() {
        let def = &Tuning::default().enemies[0];
        let s = scale_enemy(def, 2.0, 1.6);
        assert!((s.hp - def.hp * 2.0 * 1.6).abs() < 1e-4);
        assert!((s.damage - def.damage * 1.3).abs() < 1e-4);
        assert!((s.speed - def.speed * 1.12).abs() < 1e-4);
    }

    #[test]
    fn test_update_fires_after_interval() {
        let mut w = world("GARDEN");
        Spawner::update(&mut w, 1000.0);
        assert_eq!(w.enemies.len(), 0);
        Spawner::update(&mut w, 600.0);
        assert_eq!(w.enemies.len(), 1);
        assert_eq!(w.spawner.timer_ms, 0.0);
    }

    #[test]
    fn test_update_respects_cap() {
        let mut w = world("GARDEN");
        for _ in 0..population_cap(0.0, 1.0) {
            spawn_enemy(&mut w, 0.0);
        }
        Spawner::update(&mut w, 5000.0);
        assert_eq!(w.enemies.len(), 50);
        assert!(w.spawner.timer_ms > 0.0);
    }

    #[test]
    fn test_spawn_placement_on_ring() {
        let mut w = world("PALACE");
        spawn_enemy(&mut w, 0.0);
        let e = &w.enemies.as_slice()[0];
        let dist = e.pos.distance(w.player.pos);
        assert!((dist - spawn_ring_radius()).abs() < 0.01);
        assert!(e.tier <= 1);
        assert!(e.active);
    }

    #[test]
    fn test_early_tier_escalation() {
        let mut w = world("GARDEN");
        for _ in 0..2000 {
            spawn_enemy(&mut w, 0.5);
        }
        let mut counts = [0usize; 4];
        for e in w.enemies.iter() {
            counts[e.tier] += 1;
        }
        assert!(counts[0] > 0);
        // ~10% of 2000
        assert!((140..=260).contains(&counts[1]), "tier 1 spawned {}", counts[1]);
        assert_eq!(counts[2] + counts[3], 0);
    }

    #[test]
    fn test_top_tier_does_not_escalate() {
        let mut w = world("GARDEN");
        for _ in 0..500 {
            spawn_enemy(&mut w, 9.0);
        }
        assert!(w.enemies.iter().all(|e| e.tier == 3));
    }
}
