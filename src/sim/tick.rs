//! Simulation step
//!
//! Advances the world deterministically by one step of host-supplied length.

use glam::Vec2;

use super::combat;
use super::movement;
use super::spawner::Spawner;
use super::state::World;
use super::weapons::Arsenal;

/// Input commands for a single step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Joystick vector; NaN is dropped and length capped at 1
    pub movement: Vec2,
}

/// Advance the world by `dt_ms`.
///
/// Does nothing while paused or after game over, and for non-finite or
/// non-positive deltas.
pub fn tick(world: &mut World, input: &TickInput, dt_ms: f32) {
    if !world.phase.is_running() {
        return;
    }
    if !dt_ms.is_finite() || dt_ms <= 0.0 {
        return;
    }

    world.steps += 1;
    world.run.time_ms += dt_ms as f64;
    world.input = movement::sanitize_input(input.movement);

    Spawner::update(world, dt_ms);
    movement::update_player(world, dt_ms);
    Arsenal::update(world, dt_ms);
    movement::update_enemies(world, dt_ms);
    combat::update_projectiles(world, dt_ms);
    combat::sweep_dead(world);
    combat::update_gems(world, dt_ms);
    combat::update_texts(world, dt_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaProgress;
    use crate::settings::Settings;
    use crate::sim::state::{GamePhase, PauseReason};
    use crate::tuning::Tuning;

    const DT: f32 = 16.0;

    fn world(seed: u64) -> World {
        World::new(
            Tuning::default(),
            Settings::with_seed(seed),
            "WARRIOR",
            "OCEAN",
            &MetaProgress::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_tick_advances_time() {
        let mut w = world(1);
        tick(&mut w, &TickInput::default(), DT);
        assert_eq!(w.steps, 1);
        assert_eq!(w.run.time_ms, 16.0);
        // Starting weapon fires on the first step
        assert_eq!(w.projectiles.len(), 1);
    }

    #[test]
    fn test_tick_pause() {
        let mut w = world(1);
        w.set_phase(GamePhase::Paused(PauseReason::User));
        tick(&mut w, &TickInput::default(), DT);
        assert_eq!(w.steps, 0);
        assert_eq!(w.run.time_ms, 0.0);

        w.set_phase(GamePhase::GameOver);
        tick(&mut w, &TickInput::default(), DT);
        assert_eq!(w.steps, 0);
    }

    #[test]
    fn test_tick_ignores_bad_dt() {
        let mut w = world(1);
        tick(&mut w, &TickInput::default(), f32::NAN);
        tick(&mut w, &TickInput::default(), -5.0);
        tick(&mut w, &TickInput::default(), 0.0);
        assert_eq!(w.steps, 0);
    }

    #[test]
    fn test_determinism() {
        let mut w1 = world(99999);
        let mut w2 = world(99999);

        let inputs = [
            TickInput { movement: Vec2::new(0.5, 0.0) },
            TickInput { movement: Vec2::new(0.0, -1.0) },
            TickInput::default(),
            TickInput { movement: Vec2::new(-0.7, 0.7) },
        ];

        for step in 0..4000 {
            let input = &inputs[(step / 250) % inputs.len()];
            tick(&mut w1, input, DT);
            tick(&mut w2, input, DT);
            if !w1.phase.is_running() {
                break;
            }
        }

        assert_eq!(w1.steps, w2.steps);
        assert_eq!(w1.run, w2.run);
        assert_eq!(w1.spawner.spawned, w2.spawner.spawned);
        assert_eq!(w1.player.pos, w2.player.pos);
        assert_eq!(w1.pending_choices, w2.pending_choices);
        let tiers1: Vec<usize> = w1.enemies.iter().map(|e| e.tier).collect();
        let tiers2: Vec<usize> = w2.enemies.iter().map(|e| e.tier).collect();
        assert_eq!(tiers1, tiers2);
    }
}
