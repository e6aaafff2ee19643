//! Host-facing run lifecycle
//!
//! `Engine` owns one `World` and a `GameHost`. The host drives it with frame
//! deltas and joystick input; the engine calls back synchronously from
//! inside `advance_frame` / `apply_upgrade`.

use glam::Vec2;

use crate::error::{TuningError, UpgradeError};
use crate::meta::MetaProgress;
use crate::settings::Settings;
use crate::sim::movement::sanitize_input;
use crate::sim::progression::{self, UpgradeChoice};
use crate::sim::state::{GameEvent, GamePhase, PauseReason, RunState, World};
use crate::sim::tick::{TickInput, tick};
use crate::tuning::Tuning;

/// Callbacks from the simulation to the embedding UI
pub trait GameHost {
    /// A level-up froze the run; answer with `Engine::apply_upgrade`
    fn on_level_up(&mut self, choices: &[UpgradeChoice]);
    /// Terminal. Called exactly once per run.
    fn on_game_over(&mut self, final_state: &RunState);
    /// Read-only copy for HUDs, roughly one simulated frame in five
    fn on_state_snapshot(&mut self, state: &RunState);
    /// An evolution was chosen; the run holds for the fanfare
    fn on_weapon_evolved(&mut self, _weapon: &str) {}
}

/// Host that ignores every callback
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl GameHost for NullHost {
    fn on_level_up(&mut self, _choices: &[UpgradeChoice]) {}
    fn on_game_over(&mut self, _final_state: &RunState) {}
    fn on_state_snapshot(&mut self, _state: &RunState) {}
}

/// One run of the game
pub struct Engine<H: GameHost> {
    world: World,
    host: H,
    input: TickInput,
    /// Frames in which the simulation ran
    sim_frames: u64,
    game_over_sent: bool,
    stopped: bool,
}

impl<H: GameHost> Engine<H> {
    /// Validate the catalogs and start a run.
    ///
    /// Fails if the tuning is inconsistent or the character/map is unknown.
    pub fn initialize(
        tuning: Tuning,
        settings: Settings,
        character_id: &str,
        map_id: &str,
        meta: &MetaProgress,
        host: H,
    ) -> Result<Self, TuningError> {
        let world = World::new(tuning, settings, character_id, map_id, meta)?;
        Ok(Self {
            world,
            host,
            input: TickInput::default(),
            sim_frames: 0,
            game_over_sent: false,
            stopped: false,
        })
    }

    /// Advance by one host frame of `dt_ms`.
    ///
    /// Long frames are clamped and split into sub-steps. The evolution hold
    /// counts down in host time even though the simulation is frozen.
    pub fn advance_frame(&mut self, dt_ms: f32) {
        if self.stopped {
            return;
        }

        if let GamePhase::Paused(PauseReason::Evolution { remaining_ms }) = self.world.phase {
            let elapsed = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
            let remaining_ms = remaining_ms - elapsed;
            if remaining_ms > 0.0 {
                self.world
                    .set_phase(GamePhase::Paused(PauseReason::Evolution { remaining_ms }));
            } else {
                log::debug!("Evolution hold finished");
                progression::resume(&mut self.world);
            }
        }

        if !self.world.phase.is_running() {
            self.dispatch_events();
            return;
        }

        let (step, count) = self.world.settings.split_frame(dt_ms);
        if count == 0 {
            return;
        }
        for _ in 0..count {
            if !self.world.phase.is_running() {
                break;
            }
            tick(&mut self.world, &self.input, step);
        }
        self.dispatch_events();

        self.sim_frames += 1;
        let interval = self.world.settings.snapshot_rate.interval_frames();
        if self.sim_frames % interval == 0 {
            self.host.on_state_snapshot(&self.world.run);
        }
    }

    /// Joystick vector from the host; NaN becomes 0 and length is capped at 1
    pub fn set_movement_input(&mut self, x: f32, y: f32) {
        self.input.movement = sanitize_input(Vec2::new(x, y));
    }

    /// Apply the host's level-up pick
    pub fn apply_upgrade(&mut self, choice_id: &str) -> Result<(), UpgradeError> {
        if self.stopped {
            return Err(UpgradeError::NoChoicePending);
        }
        progression::apply_upgrade(&mut self.world, choice_id)?;
        self.dispatch_events();
        Ok(())
    }

    /// Pause or resume on host request.
    ///
    /// Resuming never skips a pending level-up choice or an evolution hold.
    pub fn set_paused(&mut self, paused: bool) {
        match (paused, self.world.phase) {
            (true, GamePhase::Running) => {
                self.world.set_phase(GamePhase::Paused(PauseReason::User));
                log::debug!("Paused");
            }
            (false, GamePhase::Paused(PauseReason::User)) => {
                self.world.set_phase(GamePhase::Running);
                log::debug!("Resumed");
            }
            (false, GamePhase::Paused(reason)) => {
                log::debug!("Resume ignored while waiting on {:?}", reason);
            }
            _ => {}
        }
    }

    /// Tear the run down: queued shots are dropped and pools emptied.
    /// Later frames and upgrades are ignored.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.world.clear_entities();
        self.world.events.clear();
        log::info!(
            "Run stopped at {:.1}s (level {}, {} kills)",
            self.world.run.time_ms / 1000.0,
            self.world.run.level,
            self.world.run.kill_count
        );
    }

    fn dispatch_events(&mut self) {
        for event in std::mem::take(&mut self.world.events) {
            match event {
                GameEvent::LevelUp { choices, .. } => self.host.on_level_up(&choices),
                GameEvent::WeaponEvolved { weapon } => self.host.on_weapon_evolved(&weapon),
                GameEvent::GameOver => {
                    if !self.game_over_sent {
                        self.game_over_sent = true;
                        self.host.on_game_over(&self.world.run);
                    }
                }
                GameEvent::Revived { revivals_left } => {
                    log::debug!("Revival used, {} left", revivals_left);
                }
                GameEvent::PlayerDamaged { .. } | GameEvent::EnemyKilled { .. } => {}
            }
        }
    }

    pub fn run_state(&self) -> &RunState {
        &self.world.run
    }

    pub fn phase(&self) -> GamePhase {
        self.world.phase
    }

    /// Choices waiting on `apply_upgrade`
    pub fn pending_choices(&self) -> &[UpgradeChoice] {
        &self.world.pending_choices
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access for tools and tests
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
