//! Arena Survivors - headless runner
//!
//! Plays one run without rendering: an autopilot circles the arena and
//! always takes the first offered upgrade. Useful for balance checks and for
//! reproducing seeded runs.
//!
//! # Usage
//!
//! ```bash
//! arena-survivors --seed 42 --character MAGE --map OCEAN --seconds 300
//! arena-survivors --tuning balance.json --meta profile.json --json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use arena_survivors::settings::SnapshotRate;
use arena_survivors::sim::{RunState, UpgradeChoice};
use arena_survivors::{Engine, GameHost, MetaProgress, Settings, Tuning};

/// Host frame length the autopilot simulates (ms)
const FRAME_MS: f32 = 16.0;

#[derive(Parser)]
#[command(name = "arena-survivors")]
#[command(author, version, about = "Arena Survivors - headless simulation runner")]
struct Args {
    /// RNG seed for the run
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Character id from the catalog
    #[arg(long, default_value = "WARRIOR")]
    character: String,

    /// Map id from the catalog
    #[arg(long, default_value = "GARDEN")]
    map: String,

    /// Simulated seconds before the runner gives up
    #[arg(long, default_value_t = 600)]
    seconds: u32,

    /// JSON balance override
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// JSON meta-progression profile (updated with the run's coins)
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Snapshot cadence: every, normal, sparse
    #[arg(long, default_value = "normal")]
    snapshots: SnapshotRate,

    /// Print the final run state as JSON
    #[arg(long)]
    json: bool,
}

/// Collects callbacks for the autopilot loop
#[derive(Default)]
struct AutopilotHost {
    pending_pick: Option<String>,
    snapshots: u64,
    evolutions: Vec<String>,
    final_state: Option<RunState>,
}

impl GameHost for AutopilotHost {
    fn on_level_up(&mut self, choices: &[UpgradeChoice]) {
        self.pending_pick = choices.first().map(|c| c.choice_id().to_string());
    }

    fn on_game_over(&mut self, final_state: &RunState) {
        self.final_state = Some(final_state.clone());
    }

    fn on_state_snapshot(&mut self, state: &RunState) {
        self.snapshots += 1;
        log::trace!("t={:.1}s hp={:.0} lvl={}", state.time_ms / 1000.0, state.hp, state.level);
    }

    fn on_weapon_evolved(&mut self, weapon: &str) {
        log::info!("Autopilot evolved {}", weapon);
        self.evolutions.push(weapon.to_string());
    }
}

fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading tuning {}", path.display()))?;
            Tuning::from_json(&json).with_context(|| format!("loading tuning {}", path.display()))
        }
        None => Ok(Tuning::default()),
    }
}

fn load_meta(path: Option<&PathBuf>) -> Result<MetaProgress> {
    match path {
        Some(path) if path.exists() => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading profile {}", path.display()))?;
            MetaProgress::from_json(&json)
                .with_context(|| format!("parsing profile {}", path.display()))
        }
        _ => Ok(MetaProgress::new()),
    }
}

/// Slow circle around the arena centre, switching direction every half minute
fn autopilot_input(time_ms: f64) -> (f32, f32) {
    let t = (time_ms / 1000.0) as f32;
    let turn = if (t / 30.0) as u32 % 2 == 0 { 1.0 } else { -1.0 };
    let angle = t * 0.4 * turn;
    (angle.cos(), angle.sin())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let tuning = load_tuning(args.tuning.as_ref())?;
    let mut meta = load_meta(args.meta.as_ref())?;
    let settings = Settings {
        snapshot_rate: args.snapshots,
        ..Settings::with_seed(args.seed)
    };

    let mut engine = Engine::initialize(
        tuning,
        settings,
        &args.character,
        &args.map,
        &meta,
        AutopilotHost::default(),
    )
    .context("starting run")?;

    let limit_ms = args.seconds as f64 * 1000.0;
    let mut frames: u64 = 0;
    while engine.run_state().time_ms < limit_ms && engine.host().final_state.is_none() {
        let (x, y) = autopilot_input(engine.run_state().time_ms);
        engine.set_movement_input(x, y);
        engine.advance_frame(FRAME_MS);
        frames += 1;

        if let Some(pick) = engine.host_mut().pending_pick.take() {
            engine
                .apply_upgrade(&pick)
                .with_context(|| format!("applying {pick}"))?;
        }
    }

    engine.stop();
    let final_state = engine
        .host()
        .final_state
        .clone()
        .unwrap_or_else(|| engine.run_state().clone());
    let earned = meta.settle_run(&final_state);

    if let Some(path) = &args.meta {
        let json = meta.to_json().context("serializing profile")?;
        std::fs::write(path, json).with_context(|| format!("writing profile {}", path.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&final_state)?);
    } else {
        let host = engine.host();
        println!(
            "{} on {}: {} after {:.1}s",
            args.character,
            args.map,
            if final_state.is_game_over { "died" } else { "survived" },
            final_state.time_ms / 1000.0
        );
        println!("  level {}  kills {}  coins +{}", final_state.level, final_state.kill_count, earned);
        println!("  weapons {:?}", final_state.weapons);
        println!("  passives {:?}", final_state.passives);
        if !host.evolutions.is_empty() {
            println!("  evolved {:?}", host.evolutions);
        }
        println!("  {} frames, {} snapshots", frames, host.snapshots);
    }

    Ok(())
}
