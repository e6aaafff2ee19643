//! Arena Survivors - simulation core for a top-down arena survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pools, spawning, movement, weapons, progression)
//! - `engine`: Host-facing run lifecycle and callbacks
//! - `tuning`: Data-driven game balance (characters, maps, weapons, passives, shop)
//! - `settings`: Loop and presentation cadence settings
//! - `meta`: Meta-progression carried between runs

pub mod engine;
pub mod error;
pub mod meta;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use engine::{Engine, GameHost, NullHost};
pub use error::{MetaError, TuningError, UpgradeError};
pub use meta::MetaProgress;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// World dimensions
    pub const WORLD_WIDTH: f32 = 4000.0;
    pub const WORLD_HEIGHT: f32 = 4000.0;
    /// Player keeps this far from the world edge
    pub const WORLD_MARGIN: f32 = 20.0;

    /// Visible frustum (spawn ring sits just outside it)
    pub const VIEW_WIDTH: f32 = 800.0;
    pub const VIEW_HEIGHT: f32 = 600.0;
    pub const SPAWN_MARGIN: f32 = 100.0;

    /// Frame length (ms) that per-frame speeds were tuned against
    pub const BASELINE_FRAME_MS: f32 = 16.0;

    /// Player body
    pub const PLAYER_RADIUS: f32 = 15.0;
    /// Invulnerability window after taking contact damage (ms)
    pub const INVULN_MS: f32 = 300.0;
    /// Player attack pose duration after any weapon fires (ms)
    pub const ATTACK_POSE_MS: f32 = 300.0;
    /// Joystick deadzone per axis
    pub const INPUT_DEADZONE: f32 = 0.1;
    /// Auto-aim search radius when standing still
    pub const AUTO_AIM_RANGE: f32 = 400.0;

    /// Enemies further than this from the player are culled
    pub const DESPAWN_DISTANCE: f32 = 1000.0;
    /// Hard ceiling on live enemies regardless of difficulty
    pub const MAX_ENEMIES: usize = 400;
    /// Knockback retained per baseline frame
    pub const KNOCKBACK_DECAY: f32 = 0.85;
    /// Neighbours each enemy checks for separation
    pub const SEPARATION_WINDOW: usize = 4;

    /// Max conventional levels
    pub const MAX_WEAPON_LEVEL: u32 = 8;
    pub const MAX_PASSIVE_LEVEL: u32 = 5;
    /// Inventory slots per category
    pub const MAX_OWNED_WEAPONS: usize = 6;
    pub const MAX_OWNED_PASSIVES: usize = 6;
    /// Upgrade choices offered per level-up
    pub const CHOICES_PER_LEVEL: usize = 3;

    /// Weapon cooldown floor (ms)
    pub const MIN_COOLDOWN_MS: f32 = 50.0;

    /// Pickup collection radius
    pub const PICKUP_RADIUS: f32 = 15.0;
    /// Gem pull speed per baseline frame
    pub const GEM_PULL_SPEED: f32 = 10.0;
    /// Hp restored by a heal pickup
    pub const HEAL_PICKUP_AMOUNT: f32 = 30.0;
}

/// Unit vector from `from` toward `to`, or `None` when the points coincide
#[inline]
pub fn direction_between(from: Vec2, to: Vec2) -> Option<(Vec2, f32)> {
    let delta = to - from;
    let dist = delta.length();
    if dist > 0.0 && dist.is_finite() {
        Some((delta / dist, dist))
    } else {
        None
    }
}

/// Unit vector for an angle in radians
#[inline]
pub fn angle_to_vec(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of a vector in radians
#[inline]
pub fn vec_to_angle(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Clamp a point inside the world rectangle shrunk by `margin`
#[inline]
pub fn clamp_to_world(pos: Vec2, margin: f32) -> Vec2 {
    Vec2::new(
        pos.x.clamp(margin, consts::WORLD_WIDTH - margin),
        pos.y.clamp(margin, consts::WORLD_HEIGHT - margin),
    )
}
