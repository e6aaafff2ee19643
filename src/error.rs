//! Error types
//!
//! The simulation itself never fails mid-frame. Errors only surface at the
//! edges: loading catalogs, applying host choices, and spending meta currency.

/// Catalog validation failures. Any of these refuses engine startup.
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("Failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Unknown character: {0}")]
    UnknownCharacter(String),

    #[error("Unknown map: {0}")]
    UnknownMap(String),

    #[error("{owner} references unknown weapon {weapon}")]
    UnknownWeapon { owner: String, weapon: String },

    #[error("{owner} references unknown passive {passive}")]
    UnknownPassive { owner: String, passive: String },

    #[error("Weapon {weapon} evolves into {target}, which is not flagged as an evolution")]
    EvolutionNotFlagged { weapon: String, target: String },

    #[error("Weapon {0} has an evolution target but no required passive")]
    MissingEvolutionPassive(String),

    #[error("Id {0} is reserved for special upgrade choices")]
    ReservedId(String),

    #[error("Enemy tier table is empty")]
    NoEnemyTiers,

    #[error("Map {map} has non-positive difficulty multiplier {multiplier}")]
    InvalidDifficulty { map: String, multiplier: f32 },
}

/// Host asked for an upgrade the engine never offered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpgradeError {
    #[error("No level-up choice is pending")]
    NoChoicePending,

    #[error("Upgrade {0} was not among the offered choices")]
    NotOffered(String),
}

/// Meta shop purchase failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetaError {
    #[error("Unknown meta upgrade: {0}")]
    UnknownUpgrade(String),

    #[error("Meta upgrade {0} is already at max level")]
    MaxLevel(String),

    #[error("Not enough coins: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
}
