//! Experience, level-ups and upgrade choices
//!
//! A level-up freezes the run and hands the host up to three choices. The
//! run stays frozen until one of them is applied.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GamePhase, PauseReason, World};
use crate::consts::*;
use crate::error::UpgradeError;

/// Fallback reward offered when nothing else can be upgraded
pub const CURRENCY_BAG_ID: &str = "COIN_BAG";
/// Full heal; not generated by the default offer, applied only when offered
pub const RESTORE_ID: &str = "RESTORE";

/// One entry in a level-up offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeChoice {
    Weapon {
        id: String,
        name: String,
        /// Level the weapon reaches if chosen (1 = new)
        next_level: u32,
        evolution: bool,
    },
    Passive {
        id: String,
        name: String,
        next_level: u32,
    },
    CurrencyBag {
        amount: u64,
    },
    Restore,
}

impl UpgradeChoice {
    /// Id the host passes back to `apply_upgrade`
    pub fn choice_id(&self) -> &str {
        match self {
            UpgradeChoice::Weapon { id, .. } | UpgradeChoice::Passive { id, .. } => id,
            UpgradeChoice::CurrencyBag { .. } => CURRENCY_BAG_ID,
            UpgradeChoice::Restore => RESTORE_ID,
        }
    }

    pub fn is_evolution(&self) -> bool {
        matches!(self, UpgradeChoice::Weapon { evolution: true, .. })
    }
}

/// Threshold after `prev`
pub fn next_threshold(prev: u32) -> u32 {
    (prev as f64 * 1.2).floor() as u32 + 5
}

/// Add experience and level up if the threshold is reached
pub fn gain_xp(world: &mut World, amount: u32) {
    world.run.xp += amount;
    try_level_up(world);
}

/// Level up once if enough xp is banked and nothing else holds the run
pub fn try_level_up(world: &mut World) -> bool {
    if !world.phase.is_running() || world.run.xp < world.run.xp_to_next_level {
        return false;
    }
    level_up(world);
    true
}

fn level_up(world: &mut World) {
    let run = &mut world.run;
    run.level += 1;
    run.xp -= run.xp_to_next_level;
    run.xp_to_next_level = next_threshold(run.xp_to_next_level);

    let choices = generate_choices(world);
    log::info!(
        "Level up -> {} (next at {}), offering {:?}",
        world.run.level,
        world.run.xp_to_next_level,
        choices.iter().map(UpgradeChoice::choice_id).collect::<Vec<_>>()
    );

    world.pending_choices = choices.clone();
    world.set_phase(GamePhase::Paused(PauseReason::LevelUp));
    world.events.push(GameEvent::LevelUp {
        level: world.run.level,
        choices,
    });
}

/// Build the level-up offer.
///
/// Eligible evolutions are shuffled separately and placed first so one is
/// always shown. The remaining slots come from weapon and passive upgrades
/// plus new items, shuffled together.
pub fn generate_choices(world: &mut World) -> Vec<UpgradeChoice> {
    let tuning = &world.tuning;
    let run = &world.run;

    let mut evolutions = Vec::new();
    for (id, &level) in &run.weapons {
        let Some(def) = tuning.weapon(id) else {
            continue;
        };
        if level < MAX_WEAPON_LEVEL {
            continue;
        }
        let (Some(target), Some(passive)) = (&def.evolves_to, &def.requires_passive) else {
            continue;
        };
        if run.passive_level(passive) == 0 || run.weapon_level(target) > 0 {
            continue;
        }
        if let Some(evo) = tuning.weapon(target) {
            evolutions.push(UpgradeChoice::Weapon {
                id: evo.id.clone(),
                name: evo.name.clone(),
                next_level: 1,
                evolution: true,
            });
        }
    }

    let mut others = Vec::new();
    if evolutions.len() < CHOICES_PER_LEVEL {
        for (id, &level) in &run.weapons {
            let Some(def) = tuning.weapon(id) else {
                continue;
            };
            if level < MAX_WEAPON_LEVEL && !def.is_evolution {
                others.push(UpgradeChoice::Weapon {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    next_level: level + 1,
                    evolution: false,
                });
            }
        }

        if run.weapons.len() < MAX_OWNED_WEAPONS {
            for def in &tuning.weapons {
                let owned = run.weapons.contains_key(&def.id);
                let evolved = def
                    .evolves_to
                    .as_deref()
                    .is_some_and(|target| run.weapons.contains_key(target));
                if !owned && !def.is_evolution && !evolved {
                    others.push(UpgradeChoice::Weapon {
                        id: def.id.clone(),
                        name: def.name.clone(),
                        next_level: 1,
                        evolution: false,
                    });
                }
            }
        }

        for (id, &level) in &run.passives {
            if level >= MAX_PASSIVE_LEVEL {
                continue;
            }
            if let Some(def) = tuning.passive(id) {
                others.push(UpgradeChoice::Passive {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    next_level: level + 1,
                });
            }
        }

        if run.passives.len() < MAX_OWNED_PASSIVES {
            for def in &tuning.passives {
                if !run.passives.contains_key(&def.id) {
                    others.push(UpgradeChoice::Passive {
                        id: def.id.clone(),
                        name: def.name.clone(),
                        next_level: 1,
                    });
                }
            }
        }
    }

    evolutions.shuffle(&mut world.rng);
    others.shuffle(&mut world.rng);

    let mut picked: Vec<UpgradeChoice> = Vec::with_capacity(CHOICES_PER_LEVEL);
    for choice in evolutions.into_iter().chain(others) {
        if picked.len() >= CHOICES_PER_LEVEL {
            break;
        }
        if picked.iter().all(|c| c.choice_id() != choice.choice_id()) {
            picked.push(choice);
        }
    }

    if picked.is_empty() {
        picked.push(UpgradeChoice::CurrencyBag {
            amount: world.settings.currency_bag_amount,
        });
    }
    picked
}

/// Apply the host's pick for the pending level-up. The id must be one of
/// the offered choices.
pub fn apply_upgrade(world: &mut World, choice_id: &str) -> Result<(), UpgradeError> {
    if world.phase != GamePhase::Paused(PauseReason::LevelUp) {
        return Err(UpgradeError::NoChoicePending);
    }

    let choice = world
        .pending_choices
        .iter()
        .find(|c| c.choice_id() == choice_id)
        .cloned()
        .ok_or_else(|| UpgradeError::NotOffered(choice_id.to_string()))?;
    world.pending_choices.clear();

    match choice {
        UpgradeChoice::Weapon { id, evolution, .. } => {
            let level = world.run.weapons.entry(id.clone()).or_insert(0);
            *level += 1;
            log::info!("Weapon {} -> level {}", id, level);

            if evolution {
                let source = world.tuning.evolution_source(&id).map(|w| w.id.clone());
                if let Some(source_id) = source {
                    world.run.weapons.remove(&source_id);
                    if let Some(index) = world.tuning.weapon_index(&source_id) {
                        world.arsenal.forget(&source_id, index);
                    }
                    log::info!("{} evolved into {}", source_id, id);
                }
                world.events.push(GameEvent::WeaponEvolved { weapon: id });
                world.set_phase(GamePhase::Paused(PauseReason::Evolution {
                    remaining_ms: world.settings.evolution_pause_ms,
                }));
                return Ok(());
            }
        }
        UpgradeChoice::Passive { id, .. } => {
            let level = world.run.passives.entry(id.clone()).or_insert(0);
            *level += 1;
            log::info!("Passive {} -> level {}", id, level);

            if let Some(def) = world.tuning.passive(&id) {
                let before = world.stats.max_hp;
                world.stats.apply(&def.stat_modifier, 1);
                let delta = world.stats.max_hp - before;
                world.run.max_hp = world.stats.max_hp;
                world.run.hp = (world.run.hp + delta).clamp(0.0, world.run.max_hp);
            }
        }
        UpgradeChoice::CurrencyBag { amount } => {
            world.run.grant_coins(amount);
            log::info!("Currency bag: +{} coins", amount);
        }
        UpgradeChoice::Restore => {
            world.run.hp = world.run.max_hp;
            log::info!("Restored to {} hp", world.run.hp);
        }
    }

    resume(world);
    Ok(())
}

/// Leave a choice or evolution pause. Banked xp may immediately trigger the next level-up.
pub fn resume(world: &mut World) {
    world.set_phase(GamePhase::Running);
    try_level_up(world);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaProgress;
    use crate::settings::Settings;
    use crate::tuning::Tuning;

    fn world() -> World {
        World::new(
            Tuning::default(),
            Settings::with_seed(42),
            "WARRIOR",
            "GARDEN",
            &MetaProgress::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_threshold_growth() {
        assert_eq!(next_threshold(10), 17);
        assert_eq!(next_threshold(17), 25);
        assert_eq!(next_threshold(25), 35);
    }

    #[test]
    fn test_gain_xp_levels_once() {
        let mut w = world();
        w.run.xp = 9;
        gain_xp(&mut w, 1);
        assert_eq!(w.run.level, 2);
        assert_eq!(w.run.xp, 0);
        assert_eq!(w.run.xp_to_next_level, 17);
        assert_eq!(w.phase, GamePhase::Paused(PauseReason::LevelUp));
        assert!(w.run.is_paused);
        let level_ups = w
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::LevelUp { .. }))
            .count();
        assert_eq!(level_ups, 1);
    }

    #[test]
    fn test_banked_xp_levels_after_choice() {
        let mut w = world();
        gain_xp(&mut w, 40);
        assert_eq!(w.run.level, 2);
        assert_eq!(w.run.xp, 30);

        let id = w.pending_choices[0].choice_id().to_string();
        apply_upgrade(&mut w, &id).unwrap();
        // 30 >= 17: straight into the next offer
        assert_eq!(w.run.level, 3);
        assert_eq!(w.run.xp, 13);
        assert_eq!(w.phase, GamePhase::Paused(PauseReason::LevelUp));
    }

    #[test]
    fn test_choices_capped_and_unique() {
        let mut w = world();
        for _ in 0..20 {
            let choices = generate_choices(&mut w);
            assert!(!choices.is_empty() && choices.len() <= CHOICES_PER_LEVEL);
            for (i, a) in choices.iter().enumerate() {
                for b in &choices[i + 1..] {
                    assert_ne!(a.choice_id(), b.choice_id());
                }
            }
        }
    }

    #[test]
    fn test_evolution_offered_at_max_level_only() {
        let mut w = world();
        w.run.passives.insert("HOLLOW_HEART".into(), 1);

        w.run.weapons.insert("WHIP".into(), 7);
        for _ in 0..10 {
            let choices = generate_choices(&mut w);
            assert!(choices.iter().all(|c| c.choice_id() != "BLOODY_TEAR"));
        }

        w.run.weapons.insert("WHIP".into(), 8);
        for _ in 0..10 {
            let choices = generate_choices(&mut w);
            assert!(choices.iter().any(|c| c.choice_id() == "BLOODY_TEAR"));
        }
    }

    #[test]
    fn test_evolution_needs_passive() {
        let mut w = world();
        w.run.weapons.insert("WHIP".into(), 8);
        for _ in 0..10 {
            let choices = generate_choices(&mut w);
            assert!(choices.iter().all(|c| !c.is_evolution()));
        }
    }

    /// Every slot full with evolved or maxed weapons and maxed passives
    fn exhausted_world() -> World {
        let mut w = world();
        w.run.weapons.clear();
        for id in ["BLOODY_TEAR", "HOLY_WAND", "DEATH_SPIRAL", "THOUSAND_EDGE"] {
            w.run.weapons.insert(id.into(), 1);
        }
        for id in ["GARLIC", "HOLY_WATER"] {
            w.run.weapons.insert(id.into(), MAX_WEAPON_LEVEL);
        }
        for def in &w.tuning.passives.clone() {
            w.run.passives.insert(def.id.clone(), MAX_PASSIVE_LEVEL);
        }
        w
    }

    #[test]
    fn test_fallback_currency_bag() {
        let mut w = exhausted_world();
        let choices = generate_choices(&mut w);
        assert_eq!(choices, vec![UpgradeChoice::CurrencyBag { amount: 50 }]);
    }

    #[test]
    fn test_fallback_ignores_wounds() {
        let mut w = exhausted_world();
        w.run.hp = 1.0;
        let choices = generate_choices(&mut w);
        assert_eq!(choices, vec![UpgradeChoice::CurrencyBag { amount: 50 }]);
    }

    #[test]
    fn test_apply_evolution_replaces_base() {
        let mut w = world();
        w.run.weapons.insert("WHIP".into(), 8);
        w.run.passives.insert("HOLLOW_HEART".into(), 1);
        w.run.xp = w.run.xp_to_next_level;
        try_level_up(&mut w);

        apply_upgrade(&mut w, "BLOODY_TEAR").unwrap();
        assert_eq!(w.run.weapon_level("WHIP"), 0);
        assert_eq!(w.run.weapon_level("BLOODY_TEAR"), 1);
        assert!(matches!(
            w.phase,
            GamePhase::Paused(PauseReason::Evolution { .. })
        ));
        assert!(w
            .events
            .contains(&GameEvent::WeaponEvolved { weapon: "BLOODY_TEAR".into() }));
    }

    #[test]
    fn test_apply_passive_heals_by_max_hp_delta() {
        let mut w = world();
        w.run.hp = 100.0;
        w.run.xp = 10;
        try_level_up(&mut w);
        w.pending_choices = vec![UpgradeChoice::Passive {
            id: "HOLLOW_HEART".into(),
            name: "Hollow Heart".into(),
            next_level: 1,
        }];

        apply_upgrade(&mut w, "HOLLOW_HEART").unwrap();
        assert_eq!(w.run.max_hp, 170.0);
        assert_eq!(w.run.hp, 120.0);
        assert!(w.phase.is_running());
    }

    #[test]
    fn test_apply_rejects_unoffered() {
        let mut w = world();
        assert_eq!(apply_upgrade(&mut w, "WHIP"), Err(UpgradeError::NoChoicePending));

        w.run.xp = 10;
        try_level_up(&mut w);
        w.pending_choices.retain(|c| c.choice_id() != "GARLIC");
        assert_eq!(
            apply_upgrade(&mut w, "GARLIC"),
            Err(UpgradeError::NotOffered("GARLIC".into()))
        );
        assert!(w.run.is_paused);
    }

    #[test]
    fn test_reserved_ids_need_an_offer() {
        let mut w = world();
        w.run.xp = 10;
        try_level_up(&mut w);
        assert_eq!(w.pending_choices.len(), CHOICES_PER_LEVEL);
        for id in [CURRENCY_BAG_ID, RESTORE_ID] {
            assert_eq!(
                apply_upgrade(&mut w, id),
                Err(UpgradeError::NotOffered(id.into()))
            );
        }
        assert_eq!(w.run.session_coins, 0);
        assert!(w.run.is_paused);
    }

    #[test]
    fn test_fallback_rewards_apply() {
        let mut w = exhausted_world();
        w.run.xp = w.run.xp_to_next_level;
        try_level_up(&mut w);
        apply_upgrade(&mut w, CURRENCY_BAG_ID).unwrap();
        assert_eq!(w.run.session_coins, 50);
        assert!(w.phase.is_running());

        w.run.hp = 1.0;
        w.run.xp = w.run.xp_to_next_level;
        try_level_up(&mut w);
        assert_eq!(
            apply_upgrade(&mut w, RESTORE_ID),
            Err(UpgradeError::NotOffered(RESTORE_ID.into()))
        );
        w.pending_choices = vec![UpgradeChoice::Restore];
        apply_upgrade(&mut w, RESTORE_ID).unwrap();
        assert_eq!(w.run.hp, w.run.max_hp);
    }

    #[test]
    fn test_choice_id_json_shape() {
        let json = serde_json::to_string(&UpgradeChoice::CurrencyBag { amount: 50 }).unwrap();
        assert_eq!(json, r#"{"type":"CURRENCY_BAG","amount":50}"#);
    }
}
