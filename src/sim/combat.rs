//! Damage resolution, kills, pickups and floating numbers
//!
//! Hits only lower hp (clamped at 0). Dead enemies are swept after the
//! projectile pass so dense indices stay valid while shots are resolved.

use glam::Vec2;
use rand::Rng;

use super::collision::circle_hit;
use super::movement::{frame_scale, integrate_projectile, pull_toward};
use super::progression;
use super::state::{GameEvent, GamePhase, GemKind, TextTone, World};
use crate::consts::*;
use crate::direction_between;

/// Heal pickup chance per drop
const HEAL_DROP_CHANCE: f64 = 0.01;
/// Coin pickup chance per drop (after the heal roll fails)
const COIN_DROP_CHANCE: f64 = 0.05;
const COIN_DROP_VALUE: u32 = 10;
/// Coins credited directly per kill
const COINS_PER_KILL: u64 = 1;
/// Floating text lifetime (ms)
const TEXT_LIFETIME_MS: f32 = 800.0;
/// Floating text rise per baseline frame
const TEXT_RISE: f32 = 1.0;

/// Expire, move and resolve every live shot
pub fn update_projectiles(world: &mut World, dt_ms: f32) {
    let now = world.run.time_ms;
    let player_pos = world.player.pos;
    let mut i = 0;

    'shots: while i < world.projectiles.len() {
        let p = &mut world.projectiles.as_mut_slice()[i];
        if p.expired(now) {
            release_projectile(world, i);
            continue;
        }
        integrate_projectile(p, player_pos, dt_ms);

        let (pos, radius, damage, knockback, weapon, archetype) =
            (p.pos, p.radius, p.damage, p.knockback, p.weapon, p.archetype);
        let tick = (now / archetype.hit_window_ms() as f64).floor() as u64;

        for j in 0..world.enemies.len() {
            let enemy = &world.enemies.as_slice()[j];
            if enemy.hp <= 0.0 || !circle_hit(pos, radius, enemy.pos, enemy.radius) {
                continue;
            }
            let Some(handle) = world.enemies.handle_at(j) else {
                continue;
            };

            if archetype.is_continuous() {
                if world.hit_ledger.try_hit(handle.slot(), weapon, tick) {
                    damage_enemy(world, j, damage, knockback);
                }
                continue;
            }

            let shot = &mut world.projectiles.as_mut_slice()[i];
            if !shot.mark_hit(handle) {
                continue;
            }
            let spent = shot.consume_pierce();
            damage_enemy(world, j, damage, knockback);
            if spent {
                release_projectile(world, i);
                continue 'shots;
            }
        }
        i += 1;
    }
}

fn release_projectile(world: &mut World, dense: usize) {
    if let Some(handle) = world.projectiles.handle_at(dense) {
        world.projectiles.release(handle);
    }
}

/// Apply one hit to the enemy at dense index `dense`
pub fn damage_enemy(world: &mut World, dense: usize, damage: f32, knockback: f32) {
    let luck = world.stats.luck;
    let critical = luck > 0.0 && world.rng.random_bool((luck as f64 * 0.1).clamp(0.0, 1.0));
    let dealt = if critical { damage * 2.0 } else { damage };
    let player_pos = world.player.pos;

    let Some(enemy) = world.enemies.as_mut_slice().get_mut(dense) else {
        return;
    };
    enemy.hp = (enemy.hp - dealt).max(0.0);
    if knockback > 0.0
        && let Some((dir, _)) = direction_between(player_pos, enemy.pos)
    {
        enemy.knockback = dir * knockback;
    }
    let text_pos = enemy.pos - Vec2::new(0.0, 15.0);

    let tone = if critical { TextTone::Critical } else { TextTone::Hit };
    spawn_text(world, text_pos, dealt, tone);
}

/// Remove dead enemies: score, coin and drop a gem for each
pub fn sweep_dead(world: &mut World) {
    let mut i = 0;
    while i < world.enemies.len() {
        let enemy = &world.enemies.as_slice()[i];
        if enemy.hp > 0.0 {
            i += 1;
            continue;
        }
        let (pos, xp, species) = (enemy.pos, enemy.xp_value, enemy.species.clone());

        world.run.kill_count += 1;
        world.run.grant_coins(COINS_PER_KILL);
        drop_gem(world, pos, xp);
        world.events.push(GameEvent::EnemyKilled { species, pos });

        if let Some(handle) = world.enemies.handle_at(i) {
            world.enemies.release(handle);
        }
    }
}

/// Roll the pickup kind and place it
pub fn drop_gem(world: &mut World, pos: Vec2, xp_value: u32) {
    let (kind, value) = if world.rng.random_bool(HEAL_DROP_CHANCE) {
        (GemKind::Heal, xp_value)
    } else if world.rng.random_bool(COIN_DROP_CHANCE) {
        (GemKind::Currency, COIN_DROP_VALUE)
    } else {
        (GemKind::Experience, xp_value)
    };

    let (_, gem) = world.gems.acquire();
    gem.pos = pos;
    gem.kind = kind;
    gem.value = value;
}

/// Magnet pickups toward the player and collect those in reach
pub fn update_gems(world: &mut World, dt_ms: f32) {
    let range = world.stats.magnet + world.stats.area * 30.0;
    let player_pos = world.player.pos;
    let mut i = 0;

    while i < world.gems.len() {
        let gem = &mut world.gems.as_mut_slice()[i];
        match pull_toward(&mut gem.pos, player_pos, range, dt_ms) {
            Some(dist) if dist < PICKUP_RADIUS => {
                let (kind, value) = (gem.kind, gem.value);
                if let Some(handle) = world.gems.handle_at(i) {
                    world.gems.release(handle);
                }
                collect(world, kind, value);
            }
            _ => i += 1,
        }
    }
}

fn collect(world: &mut World, kind: GemKind, value: u32) {
    match kind {
        GemKind::Experience => progression::gain_xp(world, value),
        GemKind::Currency => world.run.grant_coins(value as u64),
        GemKind::Heal => {
            world.run.hp = (world.run.hp + HEAL_PICKUP_AMOUNT).min(world.run.max_hp);
            let pos = world.player.pos;
            spawn_text(world, pos, HEAL_PICKUP_AMOUNT, TextTone::Heal);
        }
    }
}

/// Pooled floating number with a little horizontal jitter
pub fn spawn_text(world: &mut World, pos: Vec2, amount: f32, tone: TextTone) {
    let jitter = world.rng.random_range(-10.0..10.0);
    let (_, text) = world.texts.acquire();
    text.pos = Vec2::new(pos.x + jitter, pos.y);
    text.text.clear();
    text.text.push_str(&format!("{}", amount.round() as i64));
    text.tone = tone;
    text.critical = tone == TextTone::Critical;
    text.life = 1.0;
}

/// Rise and fade floating numbers
pub fn update_texts(world: &mut World, dt_ms: f32) {
    let rise = TEXT_RISE * frame_scale(dt_ms);
    let fade = dt_ms / TEXT_LIFETIME_MS;
    let mut i = 0;

    while i < world.texts.len() {
        let text = &mut world.texts.as_mut_slice()[i];
        text.life -= fade;
        text.pos.y -= rise;
        if text.life <= 0.0 {
            if let Some(handle) = world.texts.handle_at(i) {
                world.texts.release(handle);
            }
        } else {
            i += 1;
        }
    }
}

/// Contact damage against the player.
///
/// A blocked contact still burns one baseline frame of invulnerability,
/// whatever the step length. Reaching 0 hp spends a revival if one is left,
/// otherwise ends the run (once).
pub fn hit_player(world: &mut World, damage: f32) {
    if world.phase == GamePhase::GameOver {
        return;
    }
    if world.player.invuln_ms > 0.0 {
        world.player.invuln_ms -= BASELINE_FRAME_MS;
        return;
    }

    world.run.hp = (world.run.hp - damage).max(0.0);
    world.player.invuln_ms = INVULN_MS;
    world.events.push(GameEvent::PlayerDamaged {
        amount: damage,
        hp: world.run.hp,
    });
    let text_pos = world.player.pos - Vec2::new(0.0, 20.0);
    spawn_text(world, text_pos, damage, TextTone::PlayerHurt);

    if world.run.hp > 0.0 {
        return;
    }

    if world.stats.revival >= 1 {
        world.stats.revival -= 1;
        world.run.hp = world.run.max_hp / 2.0;
        log::info!("Revived at {} hp ({} left)", world.run.hp, world.stats.revival);
        world.events.push(GameEvent::Revived {
            revivals_left: world.stats.revival,
        });
        return;
    }

    world.set_phase(GamePhase::GameOver);
    world.events.push(GameEvent::GameOver);
    log::info!(
        "Game over: level {} kills {} time {:.1}s",
        world.run.level,
        world.run.kill_count,
        world.run.time_ms / 1000.0
    );
}
