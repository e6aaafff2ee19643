//! Data-driven game balance
//!
//! Every catalog the simulation reads lives here: characters, maps, enemy
//! tiers, weapons, passives and the meta shop. `Tuning::default()` is the
//! shipped balance; JSON overrides replace whole catalogs and always go
//! through [`Tuning::validate`] before an engine will start.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::sim::progression::{CURRENCY_BAG_ID, RESTORE_ID};

/// Player stat block. Multipliers start around 1.0, additive stats at 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub max_hp: f32,
    pub move_speed: f32,
    /// Damage multiplier
    pub might: f32,
    /// Hit radius multiplier
    pub area: f32,
    /// Cooldown reduction stat; each point shaves 10% off weapon cooldowns
    pub cooldown: f32,
    /// Extra projectiles per volley
    pub amount: u32,
    /// Pickup attraction range
    pub magnet: f32,
    #[serde(default)]
    pub luck: f32,
    #[serde(default)]
    pub revival: u32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            move_speed: 2.5,
            might: 1.0,
            area: 1.0,
            cooldown: 1.0,
            amount: 0,
            magnet: 50.0,
            luck: 0.0,
            revival: 0,
        }
    }
}

impl BaseStats {
    /// Fold a modifier into the stat block `times` times
    pub fn apply(&mut self, modifier: &StatModifier, times: u32) {
        let n = times as f32;
        self.max_hp += modifier.max_hp * n;
        self.move_speed += modifier.move_speed * n;
        self.might += modifier.might * n;
        self.area += modifier.area * n;
        self.cooldown += modifier.cooldown * n;
        self.amount += modifier.amount * times;
        self.magnet += modifier.magnet * n;
        self.luck += modifier.luck * n;
        self.revival += modifier.revival * times;
    }
}

/// Additive stat deltas granted by a passive or meta upgrade level
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatModifier {
    pub max_hp: f32,
    pub move_speed: f32,
    pub might: f32,
    pub area: f32,
    pub cooldown: f32,
    pub amount: u32,
    pub magnet: f32,
    pub luck: f32,
    pub revival: u32,
}

/// How a weapon behaves when it fires and how its hits are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponArchetype {
    /// Sweeping arc anchored to the player
    MeleeArc,
    /// Straight-flying shot
    Projectile,
    /// Spinning thrown shot (optionally lobbed with gravity)
    Spin,
    /// Permanent field around the player
    Aura,
    /// Stationary puddle dropped near the player
    Zone,
}

impl WeaponArchetype {
    /// Continuous fields re-hit the same enemy on a tick window instead of
    /// tracking a per-shot hit set
    pub fn is_continuous(self) -> bool {
        matches!(self, Self::MeleeArc | Self::Aura | Self::Zone)
    }

    /// Re-hit window for continuous fields (ms)
    pub fn hit_window_ms(self) -> f32 {
        match self {
            Self::MeleeArc => 500.0,
            _ => 300.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub id: String,
    pub name: String,
    pub archetype: WeaponArchetype,
    pub damage: f32,
    /// Base hit radius (values <= 10 collapse to a 5 unit bullet)
    pub area: f32,
    /// Travel speed per baseline frame
    pub speed: f32,
    pub duration_ms: f32,
    pub cooldown_ms: f32,
    pub amount: u32,
    pub knockback: f32,
    /// Extra enemies a shot may pass through; -1 is unlimited
    pub pierce: i32,
    /// Downward acceleration per baseline frame for lobbed shots
    #[serde(default)]
    pub gravity: f32,
    #[serde(default)]
    pub evolves_to: Option<String>,
    #[serde(default)]
    pub requires_passive: Option<String>,
    #[serde(default)]
    pub is_evolution: bool,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stat_modifier: StatModifier,
    /// Flat duration bonus applied to every shot while owned (0.1 = +10%)
    #[serde(default)]
    pub duration_bonus: f32,
    /// Flat travel speed bonus applied to every shot while owned
    #[serde(default)]
    pub speed_bonus: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: String,
    pub name: String,
    pub hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub xp_value: u32,
    pub radius: f32,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDef {
    pub id: String,
    pub name: String,
    /// 1.0 = normal. Scales spawn rate, population and enemy stats.
    pub difficulty_multiplier: f32,
    /// Render-only
    #[serde(default)]
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDef {
    pub id: String,
    pub name: String,
    pub stats: BaseStats,
    pub starting_weapon: String,
    #[serde(default)]
    pub color: String,
}

/// Shop upgrade bought with persistent coins between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaUpgradeDef {
    pub id: String,
    pub name: String,
    pub cost: u64,
    pub cost_scaling: f32,
    pub max_level: u32,
    /// Applied once per owned level at run start
    pub stat_modifier: StatModifier,
}

impl MetaUpgradeDef {
    /// Price of buying the level after `current_level`
    pub fn cost_at(&self, current_level: u32) -> u64 {
        (self.cost as f64 * (self.cost_scaling as f64).powi(current_level as i32)).floor() as u64
    }
}

/// Full balance catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub characters: Vec<CharacterDef>,
    pub maps: Vec<MapDef>,
    /// Enemy tiers, weakest first
    pub enemies: Vec<EnemyDef>,
    pub weapons: Vec<WeaponDef>,
    pub passives: Vec<PassiveDef>,
    pub meta_upgrades: Vec<MetaUpgradeDef>,
}

impl Tuning {
    /// Parse a JSON override (missing catalogs fall back to defaults) and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check every cross-reference in the catalog
    pub fn validate(&self) -> Result<(), TuningError> {
        check_unique("character", self.characters.iter().map(|c| c.id.as_str()))?;
        check_unique("map", self.maps.iter().map(|m| m.id.as_str()))?;
        check_unique("enemy", self.enemies.iter().map(|e| e.id.as_str()))?;
        check_unique("weapon", self.weapons.iter().map(|w| w.id.as_str()))?;
        check_unique("passive", self.passives.iter().map(|p| p.id.as_str()))?;
        check_unique("meta upgrade", self.meta_upgrades.iter().map(|u| u.id.as_str()))?;

        let reserved = [CURRENCY_BAG_ID, RESTORE_ID];
        for id in self
            .weapons
            .iter()
            .map(|w| &w.id)
            .chain(self.passives.iter().map(|p| &p.id))
        {
            if reserved.contains(&id.as_str()) {
                return Err(TuningError::ReservedId(id.clone()));
            }
        }

        if self.enemies.is_empty() {
            return Err(TuningError::NoEnemyTiers);
        }

        for map in &self.maps {
            if !(map.difficulty_multiplier > 0.0) {
                return Err(TuningError::InvalidDifficulty {
                    map: map.id.clone(),
                    multiplier: map.difficulty_multiplier,
                });
            }
        }

        for character in &self.characters {
            if self.weapon(&character.starting_weapon).is_none() {
                return Err(TuningError::UnknownWeapon {
                    owner: character.id.clone(),
                    weapon: character.starting_weapon.clone(),
                });
            }
        }

        for weapon in &self.weapons {
            let Some(target) = &weapon.evolves_to else {
                continue;
            };
            let Some(target_def) = self.weapon(target) else {
                return Err(TuningError::UnknownWeapon {
                    owner: weapon.id.clone(),
                    weapon: target.clone(),
                });
            };
            if !target_def.is_evolution {
                return Err(TuningError::EvolutionNotFlagged {
                    weapon: weapon.id.clone(),
                    target: target.clone(),
                });
            }
            match &weapon.requires_passive {
                None => return Err(TuningError::MissingEvolutionPassive(weapon.id.clone())),
                Some(passive) if self.passive(passive).is_none() => {
                    return Err(TuningError::UnknownPassive {
                        owner: weapon.id.clone(),
                        passive: passive.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    pub fn character(&self, id: &str) -> Option<&CharacterDef> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn map(&self, id: &str) -> Option<&MapDef> {
        self.maps.iter().find(|m| m.id == id)
    }

    pub fn weapon(&self, id: &str) -> Option<&WeaponDef> {
        self.weapons.iter().find(|w| w.id == id)
    }

    /// Catalog position of a weapon; used as its column in hit tables
    pub fn weapon_index(&self, id: &str) -> Option<usize> {
        self.weapons.iter().position(|w| w.id == id)
    }

    pub fn passive(&self, id: &str) -> Option<&PassiveDef> {
        self.passives.iter().find(|p| p.id == id)
    }

    pub fn meta_upgrade(&self, id: &str) -> Option<&MetaUpgradeDef> {
        self.meta_upgrades.iter().find(|u| u.id == id)
    }

    /// The base weapon an evolution replaces
    pub fn evolution_source(&self, evolution_id: &str) -> Option<&WeaponDef> {
        self.weapons
            .iter()
            .find(|w| w.evolves_to.as_deref() == Some(evolution_id))
    }
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), TuningError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(TuningError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            characters: default_characters(),
            maps: default_maps(),
            enemies: default_enemies(),
            weapons: default_weapons(),
            passives: default_passives(),
            meta_upgrades: default_meta_upgrades(),
        }
    }
}

fn default_characters() -> Vec<CharacterDef> {
    vec![
        CharacterDef {
            id: "WARRIOR".into(),
            name: "Antonio".into(),
            stats: BaseStats {
                max_hp: 150.0,
                move_speed: 2.2,
                might: 1.2,
                area: 1.2,
                cooldown: 1.0,
                amount: 0,
                magnet: 50.0,
                ..BaseStats::default()
            },
            starting_weapon: "WHIP".into(),
            color: "#3b82f6".into(),
        },
        CharacterDef {
            id: "MAGE".into(),
            name: "Imelda".into(),
            stats: BaseStats {
                max_hp: 90.0,
                move_speed: 2.6,
                might: 1.0,
                area: 1.1,
                cooldown: 0.9,
                amount: 0,
                magnet: 80.0,
                ..BaseStats::default()
            },
            starting_weapon: "MAGIC_WAND".into(),
            color: "#a855f7".into(),
        },
        CharacterDef {
            id: "RANGER".into(),
            name: "Gennaro".into(),
            stats: BaseStats {
                max_hp: 100.0,
                move_speed: 3.2,
                might: 1.0,
                area: 1.0,
                cooldown: 1.0,
                amount: 1,
                magnet: 60.0,
                ..BaseStats::default()
            },
            starting_weapon: "KNIFE".into(),
            color: "#22c55e".into(),
        },
    ]
}

fn default_maps() -> Vec<MapDef> {
    vec![
        MapDef {
            id: "GARDEN".into(),
            name: "Mad Garden".into(),
            difficulty_multiplier: 1.0,
            theme: "garden".into(),
        },
        MapDef {
            id: "OCEAN".into(),
            name: "Abyssal Temple".into(),
            difficulty_multiplier: 1.3,
            theme: "ocean".into(),
        },
        MapDef {
            id: "PALACE".into(),
            name: "Golden Palace".into(),
            difficulty_multiplier: 1.6,
            theme: "palace".into(),
        },
    ]
}

fn default_enemies() -> Vec<EnemyDef> {
    vec![
        EnemyDef {
            id: "BAT".into(),
            name: "Bat".into(),
            hp: 10.0,
            damage: 5.0,
            speed: 1.8,
            xp_value: 1,
            radius: 10.0,
            color: "#7c3aed".into(),
        },
        EnemyDef {
            id: "SKELETON".into(),
            name: "Skeleton".into(),
            hp: 25.0,
            damage: 8.0,
            speed: 1.4,
            xp_value: 2,
            radius: 14.0,
            color: "#e5e7eb".into(),
        },
        EnemyDef {
            id: "GHOST".into(),
            name: "Ghost".into(),
            hp: 40.0,
            damage: 10.0,
            speed: 2.2,
            xp_value: 4,
            radius: 14.0,
            color: "#93c5fd".into(),
        },
        EnemyDef {
            id: "BOSS".into(),
            name: "Reaper".into(),
            hp: 200.0,
            damage: 20.0,
            speed: 1.1,
            xp_value: 20,
            radius: 28.0,
            color: "#dc2626".into(),
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn weapon(
    id: &str,
    name: &str,
    archetype: WeaponArchetype,
    damage: f32,
    area: f32,
    speed: f32,
    duration_ms: f32,
    cooldown_ms: f32,
    knockback: f32,
    pierce: i32,
    color: &str,
) -> WeaponDef {
    WeaponDef {
        id: id.into(),
        name: name.into(),
        archetype,
        damage,
        area,
        speed,
        duration_ms,
        cooldown_ms,
        amount: 1,
        knockback,
        pierce,
        gravity: 0.0,
        evolves_to: None,
        requires_passive: None,
        is_evolution: false,
        color: color.into(),
    }
}

fn evolving(mut def: WeaponDef, target: &str, passive: &str) -> WeaponDef {
    def.evolves_to = Some(target.into());
    def.requires_passive = Some(passive.into());
    def
}

fn evolution(mut def: WeaponDef) -> WeaponDef {
    def.is_evolution = true;
    def
}

fn default_weapons() -> Vec<WeaponDef> {
    use WeaponArchetype::*;

    let mut axe = weapon("AXE", "Throwing Axe", Spin, 35.0, 25.0, 6.0, 1200.0, 1400.0, 15.0, -1, "#eab308");
    axe.gravity = 0.2;

    vec![
        evolving(
            weapon("WHIP", "Knight's Greatsword", MeleeArc, 25.0, 120.0, 0.0, 300.0, 1200.0, 15.0, -1, "#f43f5e"),
            "BLOODY_TEAR",
            "HOLLOW_HEART",
        ),
        evolution(weapon("BLOODY_TEAR", "Bloody Greatsword", MeleeArc, 50.0, 160.0, 0.0, 350.0, 1000.0, 25.0, -1, "#be123c")),
        evolving(
            weapon("MAGIC_WAND", "Magic Wand", Projectile, 15.0, 10.0, 6.0, 1500.0, 1000.0, 8.0, 1, "#60a5fa"),
            "HOLY_WAND",
            "EMPTY_TOME",
        ),
        evolution(weapon("HOLY_WAND", "Holy Wand", Projectile, 25.0, 12.0, 9.0, 1500.0, 150.0, 10.0, 1, "#1d4ed8")),
        evolving(axe, "DEATH_SPIRAL", "CANDELABRADOR"),
        evolution(weapon("DEATH_SPIRAL", "Death Spiral", Spin, 60.0, 40.0, 8.0, 3000.0, 1300.0, 12.0, -1, "#a16207")),
        evolving(
            weapon("KNIFE", "Shuriken", Spin, 12.0, 12.0, 10.0, 1000.0, 350.0, 3.0, 1, "#cbd5e1"),
            "THOUSAND_EDGE",
            "BRACER",
        ),
        evolution(weapon("THOUSAND_EDGE", "Thousand Edge", Projectile, 20.0, 15.0, 16.0, 1200.0, 60.0, 5.0, 3, "#475569")),
        weapon("GARLIC", "Garlic Aura", Aura, 8.0, 60.0, 0.0, 100.0, 400.0, 4.0, -1, "#fb7185"),
        weapon("HOLY_WATER", "Holy Water", Zone, 20.0, 50.0, 3.0, 2500.0, 2500.0, 0.0, -1, "#38bdf8"),
    ]
}

fn default_passives() -> Vec<PassiveDef> {
    let passive = |id: &str, name: &str, stat_modifier: StatModifier| PassiveDef {
        id: id.into(),
        name: name.into(),
        stat_modifier,
        duration_bonus: 0.0,
        speed_bonus: 0.0,
    };

    vec![
        passive("SPINACH", "Spinach", StatModifier { might: 0.1, ..Default::default() }),
        passive("EMPTY_TOME", "Empty Tome", StatModifier { cooldown: 0.08, ..Default::default() }),
        passive("CANDELABRADOR", "Candelabrador", StatModifier { area: 0.1, ..Default::default() }),
        PassiveDef {
            speed_bonus: 0.1,
            ..passive("BRACER", "Bracer", StatModifier::default())
        },
        PassiveDef {
            duration_bonus: 0.1,
            ..passive("SPELLBINDER", "Spellbinder", StatModifier::default())
        },
        passive("HOLLOW_HEART", "Hollow Heart", StatModifier { max_hp: 20.0, ..Default::default() }),
    ]
}

fn default_meta_upgrades() -> Vec<MetaUpgradeDef> {
    let upgrade = |id: &str, name: &str, cost: u64, cost_scaling: f32, max_level: u32, stat_modifier| {
        MetaUpgradeDef {
            id: id.into(),
            name: name.into(),
            cost,
            cost_scaling,
            max_level,
            stat_modifier,
        }
    };

    vec![
        upgrade("MIGHT", "Might", 100, 1.5, 5, StatModifier { might: 0.05, ..Default::default() }),
        upgrade("ARMOR", "Armor", 80, 1.4, 5, StatModifier { max_hp: 10.0, ..Default::default() }),
        upgrade("SWIFTNESS", "Swiftness", 120, 1.5, 3, StatModifier { move_speed: 0.1, ..Default::default() }),
        upgrade("LUCK", "Luck", 150, 1.6, 3, StatModifier { luck: 0.1, ..Default::default() }),
        upgrade("REVIVAL", "Revival", 1000, 1.0, 1, StatModifier { revival: 1, ..Default::default() }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        Tuning::default().validate().expect("shipped balance must validate");
    }

    #[test]
    fn test_unknown_starting_weapon_rejected() {
        let mut tuning = Tuning::default();
        tuning.characters[0].starting_weapon = "LASER".into();
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::UnknownWeapon { weapon, .. }) if weapon == "LASER"
        ));
    }

    #[test]
    fn test_unflagged_evolution_rejected() {
        let mut tuning = Tuning::default();
        let idx = tuning.weapon_index("HOLY_WAND").unwrap();
        tuning.weapons[idx].is_evolution = false;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::EvolutionNotFlagged { .. })
        ));
    }

    #[test]
    fn test_unknown_required_passive_rejected() {
        let mut tuning = Tuning::default();
        let idx = tuning.weapon_index("WHIP").unwrap();
        tuning.weapons[idx].requires_passive = Some("GOLDEN_EGG".into());
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::UnknownPassive { passive, .. }) if passive == "GOLDEN_EGG"
        ));
    }

    #[test]
    fn test_reserved_id_rejected() {
        let mut tuning = Tuning::default();
        tuning.passives[0].id = CURRENCY_BAG_ID.into();
        assert!(matches!(tuning.validate(), Err(TuningError::ReservedId(_))));
    }

    #[test]
    fn test_partial_json_keeps_default_catalogs() {
        let json = r#"{ "maps": [ { "id": "CRYPT", "name": "Crypt", "difficulty_multiplier": 2.0 } ] }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert_eq!(tuning.maps.len(), 1);
        assert_eq!(tuning.map("CRYPT").unwrap().difficulty_multiplier, 2.0);
        assert!(tuning.weapon("WHIP").is_some());
    }

    #[test]
    fn test_zero_difficulty_rejected() {
        let json = r#"{ "maps": [ { "id": "VOID", "name": "Void", "difficulty_multiplier": 0.0 } ] }"#;
        assert!(matches!(
            Tuning::from_json(json),
            Err(TuningError::InvalidDifficulty { .. })
        ));
    }

    #[test]
    fn test_meta_cost_curve() {
        let tuning = Tuning::default();
        let might = tuning.meta_upgrade("MIGHT").unwrap();
        assert_eq!(might.cost_at(0), 100);
        assert_eq!(might.cost_at(1), 150);
        assert_eq!(might.cost_at(2), 225);
    }

    #[test]
    fn test_stats_apply_multiple_levels() {
        let mut stats = BaseStats::default();
        stats.apply(&StatModifier { might: 0.05, amount: 1, ..Default::default() }, 3);
        assert!((stats.might - 1.15).abs() < 1e-5);
        assert_eq!(stats.amount, 3);
    }
}
