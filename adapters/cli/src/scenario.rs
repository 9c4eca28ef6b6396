//! TOML scenario files describing a level, its spawner and pre-built towers.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;
use tile_defense_core::{TileCoord, TowerKind};
use tile_defense_system_spawning::Config as SpawnConfig;
use tile_defense_world::WorldConfig;

/// Level description loaded from disk.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Grid layout and navigation options.
    pub(crate) world: WorldConfig,
    /// Enemy spawner settings.
    pub(crate) spawning: SpawningSection,
    /// Towers placed before the first tick.
    pub(crate) towers: Vec<TowerPlacement>,
}

/// Spawner settings in human friendly units.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SpawningSection {
    pub(crate) interval_ms: u64,
    pub(crate) base_speed: f32,
    pub(crate) speed_jitter: f32,
    pub(crate) wave_size: u32,
    pub(crate) seed: u64,
}

impl Default for SpawningSection {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            base_speed: 1.5,
            speed_jitter: 0.25,
            wave_size: 10,
            seed: 0x5eed_7173,
        }
    }
}

impl SpawningSection {
    pub(crate) fn to_config(&self) -> SpawnConfig {
        SpawnConfig::new(
            Duration::from_millis(self.interval_ms),
            self.base_speed,
            self.speed_jitter,
            self.wave_size,
            self.seed,
        )
    }
}

/// Tower requested by a scenario file.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerPlacement {
    #[serde(default = "default_tower_kind")]
    pub(crate) kind: TowerKind,
    pub(crate) tile: TileCoord,
}

const fn default_tower_kind() -> TowerKind {
    TowerKind::Basic
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub(crate) fn from_toml_str(contents: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(contents).context("invalid scenario toml")?;
        scenario
            .world
            .validate()
            .context("scenario describes an unusable grid")?;
        Ok(scenario)
    }
}

/// Parses `column,row` pairs supplied on the command line.
pub(crate) fn parse_tile(value: &str) -> Result<TileCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, got `{value}`"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|error| format!("invalid column `{column}`: {error}"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|error| format!("invalid row `{row}`: {error}"))?;
    Ok(TileCoord::new(column, row))
}
