//! Position integration for the player, enemies, shots and pickups
//!
//! Speeds are tuned per 16 ms baseline frame, so every displacement is
//! scaled by `dt / BASELINE_FRAME_MS`.

use glam::Vec2;

use super::collision::{circles_overlap, separation};
use super::combat;
use super::state::{Projectile, World};
use crate::consts::*;
use crate::{clamp_to_world, direction_between, vec_to_angle};

/// Overlap enemies may keep before they push apart
const SEPARATION_TOLERANCE: f32 = 5.0;
/// Fraction of the remaining overlap corrected per step
const SEPARATION_STRENGTH: f32 = 0.1;
/// Knockback below this on both axes is ignored
const KNOCKBACK_EPSILON: f32 = 0.1;

/// Displacement multiplier for a step of `dt_ms`
#[inline]
pub fn frame_scale(dt_ms: f32) -> f32 {
    dt_ms / BASELINE_FRAME_MS
}

/// Joystick vector with NaN dropped and length capped at 1
pub fn sanitize_input(raw: Vec2) -> Vec2 {
    if !raw.is_finite() {
        return Vec2::ZERO;
    }
    raw.clamp_length_max(1.0)
}

/// Move, face and aim the player
pub fn update_player(world: &mut World, dt_ms: f32) {
    let input = sanitize_input(world.input);
    let scale = frame_scale(dt_ms);
    let speed = world.stats.move_speed;
    let player = &mut world.player;

    player.is_moving = input.x.abs() > INPUT_DEADZONE || input.y.abs() > INPUT_DEADZONE;
    if player.is_moving {
        player.pos += input * speed * scale;
        player.anim_frame += dt_ms * 0.015;
        player.move_dir = vec_to_angle(input);
        if input.x.abs() > INPUT_DEADZONE {
            player.facing = input.x.signum();
        }
    } else {
        player.anim_frame = 0.0;
    }

    if player.is_moving {
        player.aim_angle = player.move_dir;
    } else if let Some(target) = nearest_enemy(world, AUTO_AIM_RANGE) {
        let player = &mut world.player;
        if let Some((dir, _)) = direction_between(player.pos, target) {
            player.aim_angle = vec_to_angle(dir);
        }
    }

    let player = &mut world.player;
    if player.attack_ms > 0.0 {
        player.attack_ms = (player.attack_ms - dt_ms).max(0.0);
    }
    player.pos = clamp_to_world(player.pos, WORLD_MARGIN);
}

/// Closest live enemy strictly within `range` of the player
pub fn nearest_enemy(world: &World, range: f32) -> Option<Vec2> {
    let origin = world.player.pos;
    world
        .enemies
        .iter()
        .map(|e| (e.pos, e.pos.distance(origin)))
        .filter(|&(_, d)| d < range)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(pos, _)| pos)
}

/// Seek, separate, apply knockback and resolve player contact
pub fn update_enemies(world: &mut World, dt_ms: f32) {
    let scale = frame_scale(dt_ms);
    let mut i = 0;

    while i < world.enemies.len() {
        let player_pos = world.player.pos;
        let enemy = &mut world.enemies.as_mut_slice()[i];
        enemy.anim_phase += dt_ms * 0.005;

        let heading = direction_between(enemy.pos, player_pos);
        if heading.is_some_and(|(_, dist)| dist > DESPAWN_DISTANCE) {
            if let Some(handle) = world.enemies.handle_at(i) {
                world.enemies.release(handle);
            }
            continue;
        }

        if let Some((dir, _)) = heading {
            enemy.pos += dir * enemy.speed * scale;
        }

        let (head, tail) = world.enemies.as_mut_slice().split_at_mut(i + 1);
        let enemy = &mut head[i];
        for other in tail.iter().take(SEPARATION_WINDOW) {
            if let Some(push) = separation(
                enemy.pos,
                enemy.radius,
                other.pos,
                other.radius,
                SEPARATION_TOLERANCE,
                SEPARATION_STRENGTH,
            ) {
                enemy.pos += push;
            }
        }

        if enemy.knockback.x.abs() > KNOCKBACK_EPSILON || enemy.knockback.y.abs() > KNOCKBACK_EPSILON {
            enemy.pos += enemy.knockback;
            enemy.knockback *= KNOCKBACK_DECAY;
        }

        let touching = circles_overlap(enemy.pos, enemy.radius, player_pos, PLAYER_RADIUS);
        let damage = enemy.damage;
        if touching {
            combat::hit_player(world, damage);
        }
        i += 1;
    }
}

/// Advance a shot one step: pinned shots ride with the player, free ones fly
pub fn integrate_projectile(p: &mut Projectile, player_pos: Vec2, dt_ms: f32) {
    let scale = frame_scale(dt_ms);
    if p.follows_player {
        p.pos = player_pos;
    } else {
        p.pos += p.vel * scale;
        p.vel.y += p.gravity * scale;
    }
    p.rotation += p.spin * scale;
}

/// Drag a pickup toward the player. Returns the distance before the pull,
/// or `None` when the pickup is outside `range`.
pub fn pull_toward(pos: &mut Vec2, target: Vec2, range: f32, dt_ms: f32) -> Option<f32> {
    match direction_between(*pos, target) {
        Some((dir, dist)) if dist < range => {
            *pos += dir * GEM_PULL_SPEED * frame_scale(dt_ms);
            Some(dist)
        }
        Some(_) => None,
        None => Some(0.0),
    }
}
