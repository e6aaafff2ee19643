//! Engine settings
//!
//! Loop cadence and host-facing timings. Balance numbers live in `tuning`.

use serde::{Deserialize, Serialize};

/// How fast the host should expect state snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SnapshotRate {
    /// Every frame (debug overlays)
    Every,
    /// Roughly one frame in five
    #[default]
    Normal,
    /// Roughly one frame in fifteen (low-end hosts)
    Sparse,
}

impl SnapshotRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotRate::Every => "Every",
            SnapshotRate::Normal => "Normal",
            SnapshotRate::Sparse => "Sparse",
        }
    }

    /// Frames between snapshots
    pub fn interval_frames(&self) -> u64 {
        match self {
            SnapshotRate::Every => 1,
            SnapshotRate::Normal => 5,
            SnapshotRate::Sparse => 15,
        }
    }
}

impl std::str::FromStr for SnapshotRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "every" => Ok(SnapshotRate::Every),
            "normal" => Ok(SnapshotRate::Normal),
            "sparse" => Ok(SnapshotRate::Sparse),
            other => Err(format!("unknown snapshot rate: {other}")),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for every random draw in the run
    pub seed: u64,

    // === Loop ===
    /// Frame delta is clamped to this (ms) so a stalled host can't teleport enemies
    pub max_frame_ms: f32,
    /// Longest single simulation step (ms); longer frames are split
    pub max_step_ms: f32,
    /// Maximum sub-steps per frame to prevent spiral of death
    pub max_substeps: u32,

    // === Host sync ===
    pub snapshot_rate: SnapshotRate,
    /// Host frame time the run stays paused after an evolution is chosen (ms)
    pub evolution_pause_ms: f32,

    // === Rewards ===
    /// Coins granted by the fallback currency bag
    pub currency_bag_amount: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,

            max_frame_ms: 100.0,
            max_step_ms: 34.0,
            max_substeps: 4,

            snapshot_rate: SnapshotRate::Normal,
            evolution_pause_ms: 3500.0,

            currency_bag_amount: 50,
        }
    }
}

impl Settings {
    /// Default settings with a specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Split a host frame into equal simulation steps.
    ///
    /// Returns `(step_ms, count)`; `count` is 0 for non-finite or non-positive deltas.
    pub fn split_frame(&self, dt_ms: f32) -> (f32, u32) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return (0.0, 0);
        }
        let dt = dt_ms.min(self.max_frame_ms);
        let max_step = self.max_step_ms.max(1.0);
        let count = ((dt / max_step).ceil() as u32).clamp(1, self.max_substeps.max(1));
        (dt / count as f32, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_frame_normal() {
        let settings = Settings::default();
        let (step, count) = settings.split_frame(16.0);
        assert_eq!(count, 1);
        assert_eq!(step, 16.0);
    }

    #[test]
    fn test_split_frame_long_frame_is_clamped_and_split() {
        let settings = Settings::default();
        let (step, count) = settings.split_frame(5000.0);
        assert_eq!(count, 3);
        assert!((step * count as f32 - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_split_frame_rejects_garbage() {
        let settings = Settings::default();
        assert_eq!(settings.split_frame(f32::NAN).1, 0);
        assert_eq!(settings.split_frame(-3.0).1, 0);
        assert_eq!(settings.split_frame(0.0).1, 0);
    }

    #[test]
    fn test_snapshot_rate_parse() {
        assert_eq!("sparse".parse::<SnapshotRate>(), Ok(SnapshotRate::Sparse));
        assert!("often".parse::<SnapshotRate>().is_err());
    }
}
