//! Meta-progression carried between runs
//!
//! Coins earned in runs buy permanent shop upgrades. Storage is the host's
//! business; this type only knows the rules and a JSON shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MetaError;
use crate::sim::state::RunState;
use crate::tuning::{BaseStats, Tuning};

/// Persistent player progress
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MetaProgress {
    pub coins: u64,
    /// Upgrade id -> owned level
    #[serde(default)]
    pub upgrades: BTreeMap<String, u32>,
}

impl MetaProgress {
    /// Fresh profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a saved profile
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Owned level of a shop upgrade (0 if never bought)
    pub fn level_of(&self, id: &str) -> u32 {
        self.upgrades.get(id).copied().unwrap_or(0)
    }

    /// Price of the next level, or None if maxed / unknown
    pub fn next_cost(&self, tuning: &Tuning, id: &str) -> Option<u64> {
        let def = tuning.meta_upgrade(id)?;
        let level = self.level_of(id);
        if level >= def.max_level {
            return None;
        }
        Some(def.cost_at(level))
    }

    /// Buy one level of a shop upgrade.
    /// Returns the new level.
    pub fn purchase(&mut self, tuning: &Tuning, id: &str) -> Result<u32, MetaError> {
        let def = tuning
            .meta_upgrade(id)
            .ok_or_else(|| MetaError::UnknownUpgrade(id.to_string()))?;
        let level = self.level_of(id);
        if level >= def.max_level {
            return Err(MetaError::MaxLevel(id.to_string()));
        }

        let cost = def.cost_at(level);
        if self.coins < cost {
            return Err(MetaError::InsufficientFunds {
                needed: cost,
                available: self.coins,
            });
        }

        self.coins -= cost;
        self.upgrades.insert(id.to_string(), level + 1);
        log::info!("Bought {} level {} for {} coins", id, level + 1, cost);
        Ok(level + 1)
    }

    /// Fold every owned shop level into a character's stats.
    ///
    /// Unknown ids in old saves are skipped rather than failing the run.
    pub fn apply_to(&self, tuning: &Tuning, stats: &mut BaseStats) {
        for (id, &level) in &self.upgrades {
            match tuning.meta_upgrade(id) {
                Some(def) => stats.apply(&def.stat_modifier, level.min(def.max_level)),
                None => log::warn!("Ignoring unknown meta upgrade in save: {}", id),
            }
        }
    }

    /// Credit the coins a finished run earned.
    /// Returns the delta that was added.
    pub fn settle_run(&mut self, final_state: &RunState) -> u64 {
        let earned = final_state.run_currency_delta();
        self.coins += earned;
        log::info!("Run settled: +{} coins (balance {})", earned, self.coins);
        earned
    }
}
