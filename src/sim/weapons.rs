//! Weapon cooldowns and firing patterns
//!
//! Each owned weapon keeps its own countdown. Follow-up shots (the reverse
//! sword arc, later members of a volley) are queued as timed entries and
//! released inside the step, so a seeded run always fires them on the same
//! step.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;

use super::pool::Handle;
use super::state::World;
use crate::consts::*;
use crate::tuning::{WeaponArchetype, WeaponDef};
use crate::{angle_to_vec, rotate, vec_to_angle};

/// Delay before the reverse arc of a two-handed swing (ms)
const REVERSE_ARC_DELAY_MS: f64 = 200.0;
/// Angular gap between neighbouring shots of a volley (radians)
const VOLLEY_SPREAD: f32 = 0.2;
/// Spin applied to thrown shots per baseline frame (radians)
const THROWN_SPIN: f32 = 0.3;
/// Zone drop distance from the player
const ZONE_OFFSET_MIN: f32 = 50.0;
const ZONE_OFFSET_MAX: f32 = 150.0;

/// Stagger between volley members (ms); slow weapons spread theirs out more
pub fn volley_stagger_ms(base_cooldown_ms: f32) -> f64 {
    if base_cooldown_ms > 200.0 { 50.0 } else { 20.0 }
}

/// Effective refire time after the cooldown stat
pub fn effective_cooldown_ms(base_cooldown_ms: f32, cooldown_stat: f32) -> f32 {
    (base_cooldown_ms * (1.0 - cooldown_stat * 0.1)).max(MIN_COOLDOWN_MS)
}

/// Hit radius: small-area weapons collapse to a 5 unit bullet before the area stat applies
pub fn shot_radius(base_area: f32, area_stat: f32) -> f32 {
    let base = if base_area > 10.0 { base_area } else { 5.0 };
    base * area_stat
}

/// Deferred part of a firing pattern
#[derive(Debug, Clone, PartialEq)]
pub enum ShotKind {
    /// Arc swung the opposite way
    ReverseArc { dir: Vec2 },
    /// Member `index` of a volley of `count`, aimed at the angle captured on fire
    Volley { index: u32, count: u32, aim: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingShot {
    /// Run time the shot becomes due (ms)
    pub due_ms: f64,
    /// Catalog index of the weapon
    pub weapon: usize,
    pub kind: ShotKind,
}

/// Per-run weapon timers and queued follow-up shots
#[derive(Debug, Clone, Default)]
pub struct Arsenal {
    /// Weapon id -> ms until next fire
    pub timers: BTreeMap<String, f32>,
    /// In queue order; due shots are released front to back
    pub pending: Vec<PendingShot>,
}

impl Arsenal {
    /// Drop every queued shot
    pub fn cancel_pending(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cancelled {} queued shots", self.pending.len());
        }
        self.pending.clear();
    }

    /// Forget a weapon that left the inventory (evolved away)
    pub fn forget(&mut self, weapon_id: &str, weapon: usize) {
        self.timers.remove(weapon_id);
        self.pending.retain(|p| p.weapon != weapon);
    }

    /// Release due follow-up shots, then run every owned weapon's countdown
    pub fn update(world: &mut World, dt_ms: f32) {
        release_due_shots(world);

        let owned: Vec<String> = world.run.weapons.keys().cloned().collect();
        for id in owned {
            let Some(index) = world.tuning.weapon_index(&id) else {
                continue;
            };
            let timer = world.arsenal.timers.entry(id).or_insert(0.0);
            *timer -= dt_ms;
            if *timer > 0.0 {
                continue;
            }

            let def = &world.tuning.weapons[index];
            *timer = effective_cooldown_ms(def.cooldown_ms, world.stats.cooldown);
            fire(world, index);
        }
    }
}

fn release_due_shots(world: &mut World) {
    let now = world.run.time_ms;
    if world.arsenal.pending.iter().all(|p| p.due_ms > now) {
        return;
    }

    let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut world.arsenal.pending)
        .into_iter()
        .partition(|p| p.due_ms <= now);
    world.arsenal.pending = waiting;

    for shot in due {
        match shot.kind {
            ShotKind::ReverseArc { dir } => {
                spawn_shot(world, shot.weapon, dir);
            }
            ShotKind::Volley { index, count, aim } => launch_volley_member(world, shot.weapon, index, count, aim),
        }
    }
}

/// Fire one weapon according to its archetype
pub fn fire(world: &mut World, weapon: usize) {
    let def = &world.tuning.weapons[weapon];
    let archetype = def.archetype;
    let amount = def.amount + world.stats.amount;
    let stagger = volley_stagger_ms(def.cooldown_ms);

    world.player.attack_ms = ATTACK_POSE_MS;
    let aim = world.player.aim_angle;
    let now = world.run.time_ms;

    match archetype {
        WeaponArchetype::MeleeArc => {
            let dir = angle_to_vec(aim);
            spawn_shot(world, weapon, dir);
            if amount > 1 {
                world.arsenal.pending.push(PendingShot {
                    due_ms: now + REVERSE_ARC_DELAY_MS,
                    weapon,
                    kind: ShotKind::ReverseArc { dir: -dir },
                });
            }
        }
        WeaponArchetype::Aura => {
            let existing = world.projectiles.iter().any(|p| p.weapon == weapon);
            if !existing {
                let handle = spawn_shot(world, weapon, Vec2::ZERO);
                if let Some(p) = world.projectiles.get_mut(handle) {
                    p.duration_ms = f32::MAX;
                }
            }
        }
        WeaponArchetype::Projectile | WeaponArchetype::Spin | WeaponArchetype::Zone => {
            for index in 0..amount {
                if index == 0 {
                    launch_volley_member(world, weapon, 0, amount, aim);
                } else {
                    world.arsenal.pending.push(PendingShot {
                        due_ms: now + index as f64 * stagger,
                        weapon,
                        kind: ShotKind::Volley { index, count: amount, aim },
                    });
                }
            }
        }
    }
}

fn launch_volley_member(world: &mut World, weapon: usize, index: u32, count: u32, aim: f32) {
    let archetype = world.tuning.weapons[weapon].archetype;
    let speed = world.tuning.weapons[weapon].speed * speed_multiplier(world);

    let zone_spot = if archetype == WeaponArchetype::Zone {
        let r = world.rng.random_range(ZONE_OFFSET_MIN..ZONE_OFFSET_MAX);
        let theta = world.rng.random_range(0.0..std::f32::consts::TAU);
        Some(world.player.pos + angle_to_vec(theta) * r)
    } else {
        None
    };

    let handle = spawn_shot(world, weapon, Vec2::ZERO);
    let Some(p) = world.projectiles.get_mut(handle) else {
        return;
    };

    match zone_spot {
        Some(spot) => {
            p.pos = spot;
            p.vel = Vec2::ZERO;
        }
        None => {
            let spread = (index as f32 - (count as f32 - 1.0) / 2.0) * VOLLEY_SPREAD;
            let dir = rotate(angle_to_vec(aim), spread);
            p.vel = dir * speed;
            p.rotation = vec_to_angle(p.vel);
        }
    }
}

/// Sum of duration bonuses from owned passives (each counts once)
fn duration_multiplier(world: &World) -> f32 {
    1.0 + world
        .run
        .passives
        .keys()
        .filter_map(|id| world.tuning.passive(id))
        .map(|p| p.duration_bonus)
        .sum::<f32>()
}

fn speed_multiplier(world: &World) -> f32 {
    1.0 + world
        .run
        .passives
        .keys()
        .filter_map(|id| world.tuning.passive(id))
        .map(|p| p.speed_bonus)
        .sum::<f32>()
}

/// Pull a shot from the pool at the player, with stats fixed at spawn time
pub fn spawn_shot(world: &mut World, weapon: usize, dir: Vec2) -> Handle {
    let duration = duration_multiplier(world);
    let def: &WeaponDef = &world.tuning.weapons[weapon];
    let stats = &world.stats;

    let rotation = if def.archetype == WeaponArchetype::MeleeArc && dir != Vec2::ZERO {
        vec_to_angle(dir)
    } else {
        world.player.aim_angle
    };

    let damage = def.damage * stats.might;
    let radius = shot_radius(def.area, stats.area);
    let duration_ms = def.duration_ms * duration;
    let pierce = def.pierce;
    let knockback = def.knockback;
    let archetype = def.archetype;
    let gravity = def.gravity;
    let spin = if archetype == WeaponArchetype::Spin { THROWN_SPIN } else { 0.0 };
    let follows_player = matches!(archetype, WeaponArchetype::MeleeArc | WeaponArchetype::Aura);
    let pos = world.player.pos;
    let now = world.run.time_ms;

    let (handle, p) = world.projectiles.acquire();
    p.pos = pos;
    p.vel = Vec2::ZERO;
    p.radius = radius;
    p.damage = damage;
    p.duration_ms = duration_ms;
    p.spawned_at_ms = now;
    p.pierce = pierce;
    p.knockback = knockback;
    p.weapon = weapon;
    p.archetype = archetype;
    p.hit_set.clear();
    p.rotation = rotation;
    p.spin = spin;
    p.gravity = gravity;
    p.follows_player = follows_player;
    handle
}
