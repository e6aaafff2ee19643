//! Game state and core simulation types
//!
//! `RunState` is the serializable summary the host sees. `World` owns it
//! together with every pool, timer and the run's RNG.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::HitLedger;
use super::pool::{Handle, Pool, Pooled};
use super::progression::UpgradeChoice;
use super::spawner::Spawner;
use super::weapons::Arsenal;
use crate::consts::*;
use crate::error::TuningError;
use crate::meta::MetaProgress;
use crate::settings::Settings;
use crate::tuning::{BaseStats, Tuning, WeaponArchetype};

/// Why the simulation is frozen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Waiting for the host to pick an upgrade
    LevelUp,
    /// Evolution fanfare playing; counts down in host frame time
    Evolution { remaining_ms: f32 },
    /// Host asked for a pause
    User,
}

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    Running,
    Paused(PauseReason),
    /// Run ended (terminal)
    GameOver,
}

impl GamePhase {
    pub fn is_running(&self) -> bool {
        matches!(self, GamePhase::Running)
    }
}

/// Notifications produced during a step, drained by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    LevelUp {
        level: u32,
        choices: Vec<UpgradeChoice>,
    },
    WeaponEvolved {
        weapon: String,
    },
    PlayerDamaged {
        amount: f32,
        hp: f32,
    },
    EnemyKilled {
        species: String,
        pos: Vec2,
    },
    Revived {
        revivals_left: u32,
    },
    GameOver,
}

/// Run summary shared with the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    /// Elapsed simulated time (ms)
    pub time_ms: f64,
    pub kill_count: u64,
    /// Coins earned this run
    pub session_coins: u64,
    /// Persistent balance including this run's earnings
    pub total_coins: u64,
    pub is_paused: bool,
    pub is_game_over: bool,
    pub hp: f32,
    pub max_hp: f32,
    /// Weapon id -> level
    pub weapons: BTreeMap<String, u32>,
    /// Passive id -> level
    pub passives: BTreeMap<String, u32>,
}

impl RunState {
    pub fn new(max_hp: f32, starting_weapon: &str, starting_coins: u64) -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: 10,
            time_ms: 0.0,
            kill_count: 0,
            session_coins: 0,
            total_coins: starting_coins,
            is_paused: false,
            is_game_over: false,
            hp: max_hp,
            max_hp,
            weapons: BTreeMap::from([(starting_weapon.to_string(), 1)]),
            passives: BTreeMap::new(),
        }
    }

    /// Coins this run adds to the persistent balance
    pub fn run_currency_delta(&self) -> u64 {
        self.session_coins
    }

    /// Award coins to both the session and persistent counters
    pub fn grant_coins(&mut self, amount: u64) {
        self.session_coins += amount;
        self.total_coins += amount;
    }

    pub fn weapon_level(&self, id: &str) -> u32 {
        self.weapons.get(id).copied().unwrap_or(0)
    }

    pub fn passive_level(&self, id: &str) -> u32 {
        self.passives.get(id).copied().unwrap_or(0)
    }

    pub fn minutes(&self) -> f32 {
        (self.time_ms / 60_000.0) as f32
    }
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// 1.0 facing right, -1.0 facing left
    pub facing: f32,
    /// Radians, last movement heading
    pub move_dir: f32,
    /// Radians, where weapons point
    pub aim_angle: f32,
    pub invuln_ms: f32,
    /// > 0 while the attack pose shows
    pub attack_ms: f32,
    pub anim_frame: f32,
    pub is_moving: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0),
            facing: 1.0,
            move_dir: 0.0,
            aim_angle: 0.0,
            invuln_ms: 0.0,
            attack_ms: 0.0,
            anim_frame: 0.0,
            is_moving: false,
        }
    }
}

/// An enemy entity
#[derive(Debug, Clone, Default)]
pub struct Enemy {
    pub pos: Vec2,
    pub active: bool,
    pub radius: f32,
    pub color: String,
    /// Species id from the enemy catalog
    pub species: String,
    pub tier: usize,
    pub hp: f32,
    pub max_hp: f32,
    /// Contact damage
    pub damage: f32,
    pub speed: f32,
    pub xp_value: u32,
    /// Pending knockback displacement, decays each frame
    pub knockback: Vec2,
    pub anim_phase: f32,
}

impl Pooled for Enemy {
    fn activate(&mut self) {
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.knockback = Vec2::ZERO;
    }
}

/// A weapon hitbox: bullet, thrown blade, slash arc, aura or puddle
#[derive(Debug, Clone)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub active: bool,
    pub radius: f32,
    pub damage: f32,
    pub duration_ms: f32,
    pub spawned_at_ms: f64,
    /// Remaining extra targets; -1 is unlimited
    pub pierce: i32,
    pub knockback: f32,
    /// Catalog index of the firing weapon
    pub weapon: usize,
    pub archetype: WeaponArchetype,
    /// Enemies already struck by this shot
    pub hit_set: Vec<Handle>,
    pub rotation: f32,
    pub spin: f32,
    pub gravity: f32,
    pub follows_player: bool,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            active: false,
            radius: 5.0,
            damage: 0.0,
            duration_ms: 0.0,
            spawned_at_ms: 0.0,
            pierce: 0,
            knockback: 0.0,
            weapon: 0,
            archetype: WeaponArchetype::Projectile,
            hit_set: Vec::new(),
            rotation: 0.0,
            spin: 0.0,
            gravity: 0.0,
            follows_player: false,
        }
    }
}

impl Pooled for Projectile {
    fn activate(&mut self) {
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.hit_set.clear();
    }
}

impl Projectile {
    /// Record a hit against `enemy`; false if it was already struck
    pub fn mark_hit(&mut self, enemy: Handle) -> bool {
        if self.hit_set.contains(&enemy) {
            return false;
        }
        self.hit_set.push(enemy);
        true
    }

    /// Consume one pierce charge. Returns true when the shot is spent.
    pub fn consume_pierce(&mut self) -> bool {
        match self.pierce {
            p if p < 0 => false,
            0 => true,
            _ => {
                self.pierce -= 1;
                false
            }
        }
    }

    pub fn expired(&self, now_ms: f64) -> bool {
        now_ms - self.spawned_at_ms > self.duration_ms as f64
    }
}

/// Pickup kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GemKind {
    #[default]
    Experience,
    Currency,
    Heal,
}

/// A pickup entity
#[derive(Debug, Clone, Default)]
pub struct Gem {
    pub pos: Vec2,
    pub value: u32,
    pub kind: GemKind,
    pub active: bool,
}

impl Pooled for Gem {
    fn activate(&mut self) {
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Colour category for floating numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextTone {
    #[default]
    Hit,
    Critical,
    PlayerHurt,
    Heal,
}

impl TextTone {
    pub fn color(self) -> &'static str {
        match self {
            TextTone::Hit => "#ffffff",
            TextTone::Critical => "#ffff00",
            TextTone::PlayerHurt => "#ff0000",
            TextTone::Heal => "#00ff00",
        }
    }
}

/// Floating damage number (visual only)
#[derive(Debug, Clone, Default)]
pub struct DamageText {
    pub pos: Vec2,
    pub text: String,
    pub tone: TextTone,
    /// 1.0 fresh, fades to 0
    pub life: f32,
    pub critical: bool,
    pub active: bool,
}

impl Pooled for DamageText {
    fn activate(&mut self) {
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.text.clear();
    }
}

/// Pool warm-up sizes
pub const ENEMY_POOL_SIZE: usize = 400;
pub const PROJECTILE_POOL_SIZE: usize = 200;
pub const GEM_POOL_SIZE: usize = 300;
pub const TEXT_POOL_SIZE: usize = 100;

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct World {
    pub tuning: Tuning,
    pub settings: Settings,
    pub character_id: String,
    pub map_id: String,
    pub difficulty: f32,
    pub rng: Pcg32,
    pub run: RunState,
    pub stats: BaseStats,
    pub player: Player,
    /// Joystick vector, magnitude <= 1
    pub input: Vec2,
    pub phase: GamePhase,
    pub enemies: Pool<Enemy>,
    pub projectiles: Pool<Projectile>,
    pub gems: Pool<Gem>,
    pub texts: Pool<DamageText>,
    pub spawner: Spawner,
    pub arsenal: Arsenal,
    pub hit_ledger: HitLedger,
    /// Choices offered at the last level-up, until one is applied
    pub pending_choices: Vec<UpgradeChoice>,
    pub events: Vec<GameEvent>,
    /// Simulation steps taken
    pub steps: u64,
}

impl World {
    /// Build a run for a character on a map with the player's meta progress applied
    pub fn new(
        tuning: Tuning,
        settings: Settings,
        character_id: &str,
        map_id: &str,
        meta: &MetaProgress,
    ) -> Result<Self, TuningError> {
        tuning.validate()?;
        let character = tuning
            .character(character_id)
            .ok_or_else(|| TuningError::UnknownCharacter(character_id.to_string()))?;
        let map = tuning
            .map(map_id)
            .ok_or_else(|| TuningError::UnknownMap(map_id.to_string()))?;

        let mut stats = character.stats;
        meta.apply_to(&tuning, &mut stats);

        let run = RunState::new(stats.max_hp, &character.starting_weapon, meta.coins);
        let difficulty = map.difficulty_multiplier;
        let hit_ledger = HitLedger::new(tuning.weapons.len(), ENEMY_POOL_SIZE);
        let character_id = character.id.clone();
        let map_id = map.id.clone();

        log::info!(
            "Run start: character={} map={} (x{:.1}) seed={} hp={}",
            character_id,
            map_id,
            difficulty,
            settings.seed,
            stats.max_hp
        );

        Ok(Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            tuning,
            settings,
            character_id,
            map_id,
            difficulty,
            run,
            stats,
            player: Player::default(),
            input: Vec2::ZERO,
            phase: GamePhase::Running,
            enemies: Pool::prewarmed(ENEMY_POOL_SIZE),
            projectiles: Pool::prewarmed(PROJECTILE_POOL_SIZE),
            gems: Pool::prewarmed(GEM_POOL_SIZE),
            texts: Pool::prewarmed(TEXT_POOL_SIZE),
            spawner: Spawner::default(),
            arsenal: Arsenal::default(),
            hit_ledger,
            pending_choices: Vec::new(),
            events: Vec::new(),
            steps: 0,
        })
    }

    /// Move to a new phase and mirror it into the run summary flags
    pub fn set_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
        self.run.is_paused = matches!(phase, GamePhase::Paused(_));
        self.run.is_game_over = matches!(phase, GamePhase::GameOver);
    }

    /// Release every pooled entity and forget deferred work
    pub fn clear_entities(&mut self) {
        self.enemies.release_all();
        self.projectiles.release_all();
        self.gems.release_all();
        self.texts.release_all();
        self.arsenal.cancel_pending();
        self.pending_choices.clear();
    }
}
