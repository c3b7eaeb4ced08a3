//! Demo settings

use anyhow::{Context, Result};
use latch_spatial::glam::Vec2;
use latch_spatial::GridConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime settings, loadable from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub grid: GridConfig,
    pub simulation: SimulationSettings,
    pub watch: WatchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub entity_count: usize,
    pub ticks: u64,
    pub tick_rate_hz: u32,
    pub seed: u64,
    /// World units per second
    pub max_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Movers wrap around this far outside the grid, so they spend some time out of bounds
    pub wrap_margin: f32,
    pub report_interval: u64,
}

/// Region queried every tick
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub center: Vec2,
    pub half_size: Vec2,
    /// Only entities at least this large pass the filter
    pub min_radius: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            simulation: SimulationSettings::default(),
            watch: WatchSettings::default(),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            entity_count: 2_000,
            ticks: 600,
            tick_rate_hz: 60,
            seed: 0x1a7c,
            max_speed: 90.0,
            min_radius: 1.0,
            max_radius: 6.0,
            wrap_margin: 64.0,
            report_interval: 120,
        }
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            center: Vec2::new(512.0, 512.0),
            half_size: Vec2::new(96.0, 64.0),
            min_radius: 3.0,
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::from_json_str(&json)
    }
}
