//! Scenario tests through the host-facing engine

use arena_survivors::sim::state::GemKind;
use arena_survivors::sim::{GamePhase, PauseReason, RunState, UpgradeChoice};
use arena_survivors::{Engine, GameHost, MetaProgress, Settings, Tuning, UpgradeError};
use glam::Vec2;

#[derive(Default)]
struct Recorder {
    level_ups: Vec<Vec<UpgradeChoice>>,
    game_overs: Vec<RunState>,
    snapshots: Vec<RunState>,
}

impl GameHost for Recorder {
    fn on_level_up(&mut self, choices: &[UpgradeChoice]) {
        self.level_ups.push(choices.to_vec());
    }

    fn on_game_over(&mut self, final_state: &RunState) {
        self.game_overs.push(final_state.clone());
    }

    fn on_state_snapshot(&mut self, state: &RunState) {
        self.snapshots.push(state.clone());
    }
}

fn engine(character: &str) -> Engine<Recorder> {
    Engine::initialize(
        Tuning::default(),
        Settings::with_seed(2024),
        character,
        "GARDEN",
        &MetaProgress::new(),
        Recorder::default(),
    )
    .unwrap()
}

/// Drop an xp gem on the player so the next frame collects it
fn feed_xp(engine: &mut Engine<Recorder>, value: u32) {
    let world = engine.world_mut();
    let pos = world.player.pos;
    let (_, gem) = world.gems.acquire();
    gem.pos = pos;
    gem.kind = GemKind::Experience;
    gem.value = value;
}

#[test]
fn one_xp_short_levels_exactly_once() {
    let mut e = engine("WARRIOR");
    e.world_mut().run.xp = 9;
    feed_xp(&mut e, 1);
    e.advance_frame(16.0);

    assert_eq!(e.host().level_ups.len(), 1);
    assert_eq!(e.run_state().level, 2);
    assert_eq!(e.run_state().xp, 0);
    assert_eq!(e.run_state().xp_to_next_level, 17);
    assert_eq!(e.phase(), GamePhase::Paused(PauseReason::LevelUp));

    // Frozen until a choice is applied
    let time = e.run_state().time_ms;
    e.advance_frame(16.0);
    assert_eq!(e.run_state().time_ms, time);
    assert_eq!(e.host().level_ups.len(), 1);
}

#[test]
fn evolution_offered_at_level_eight_not_seven() {
    for (level, expect) in [(7, false), (8, true)] {
        let mut e = engine("MAGE");
        {
            let run = &mut e.world_mut().run;
            run.weapons.insert("MAGIC_WAND".into(), level);
            run.passives.insert("EMPTY_TOME".into(), 2);
            run.xp = run.xp_to_next_level - 1;
        }
        feed_xp(&mut e, 1);
        e.advance_frame(16.0);

        let offer = &e.host().level_ups[0];
        let has_evolution = offer.iter().any(|c| c.choice_id() == "HOLY_WAND");
        assert_eq!(has_evolution, expect, "weapon level {level}");
    }
}

#[test]
fn evolution_replaces_base_and_resumes() {
    let mut e = engine("MAGE");
    {
        let run = &mut e.world_mut().run;
        run.weapons.insert("MAGIC_WAND".into(), 8);
        run.passives.insert("EMPTY_TOME".into(), 1);
        run.xp = run.xp_to_next_level - 1;
    }
    feed_xp(&mut e, 1);
    e.advance_frame(16.0);
    e.apply_upgrade("HOLY_WAND").unwrap();

    assert!(!e.run_state().weapons.contains_key("MAGIC_WAND"));
    assert_eq!(e.run_state().weapons.get("HOLY_WAND"), Some(&1));
    assert!(e.run_state().is_paused);

    // 3500 ms hold on host time
    for _ in 0..40 {
        e.advance_frame(100.0);
    }
    assert!(e.phase().is_running());
}

#[test]
fn unoffered_upgrade_fails_loudly() {
    let mut e = engine("WARRIOR");
    e.world_mut().run.xp = 9;
    feed_xp(&mut e, 1);
    e.advance_frame(16.0);

    let offered: Vec<String> = e.host().level_ups[0]
        .iter()
        .map(|c| c.choice_id().to_string())
        .collect();
    let outsider = e
        .world()
        .tuning
        .passives
        .iter()
        .map(|p| p.id.clone())
        .find(|id| !offered.contains(id))
        .unwrap();

    assert_eq!(
        e.apply_upgrade(&outsider),
        Err(UpgradeError::NotOffered(outsider.clone()))
    );
    assert!(e.run_state().is_paused);
    assert!(e.apply_upgrade(&offered[0]).is_ok());
}

#[test]
fn lethal_contact_ends_run_once() {
    let mut e = engine("MAGE");
    e.world_mut().run.hp = 1.0;
    e.world_mut().run.kill_count = 3;

    // Park a spawned enemy on the player
    e.world_mut().run.time_ms = 0.0;
    arena_survivors::sim::spawner::spawn_enemy(e.world_mut(), 0.0);
    let pos = e.world().player.pos;
    e.world_mut().enemies.as_mut_slice()[0].pos = pos + Vec2::new(1.0, 0.0);
    e.world_mut().enemies.as_mut_slice()[0].hp = 1.0e6;

    for _ in 0..20 {
        e.advance_frame(16.0);
    }

    let overs = &e.host().game_overs;
    assert_eq!(overs.len(), 1);
    assert_eq!(overs[0].kill_count, 3);
    assert_eq!(overs[0].level, 1);
    assert_eq!(overs[0].hp, 0.0);
    assert_eq!(e.phase(), GamePhase::GameOver);
}

#[test]
fn snapshots_are_copies_of_run_state() {
    let mut e = engine("RANGER");
    for _ in 0..20 {
        e.advance_frame(16.0);
    }
    let snaps = &e.host().snapshots;
    assert_eq!(snaps.len(), 4);
    assert!(snaps.windows(2).all(|w| w[0].time_ms < w[1].time_ms));
}

#[test]
fn settle_run_credits_session_coins() {
    let mut e = engine("WARRIOR");
    e.world_mut().run.grant_coins(25);
    e.stop();

    let mut meta = MetaProgress {
        coins: 100,
        ..MetaProgress::new()
    };
    assert_eq!(meta.settle_run(e.run_state()), 25);
    assert_eq!(meta.coins, 125);
}
