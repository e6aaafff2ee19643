//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (dense pool order, sorted inventories)
//! - Deferred shots are timed queue entries, never callbacks
//! - No rendering or platform dependencies

pub mod collision;
pub mod combat;
pub mod movement;
pub mod pool;
pub mod progression;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod weapons;

pub use collision::HitLedger;
pub use pool::{Handle, Pool, Pooled};
pub use progression::{CURRENCY_BAG_ID, RESTORE_ID, UpgradeChoice};
pub use spawner::Spawner;
pub use state::{
    DamageText, Enemy, GameEvent, GamePhase, Gem, GemKind, PauseReason, Player, Projectile,
    RunState, TextTone, World,
};
pub use tick::{TickInput, tick};
pub use weapons::Arsenal;
