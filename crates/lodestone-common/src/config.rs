use crate::error::WorldError;
use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime settings for world storage and the tick engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub world_dir: PathBuf,
    pub tick_period_ms: u64,
    pub compression_level: u32,
    pub data_version: i32,
    pub bits_per_block: u8,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            world_dir: PathBuf::from("world"),
            tick_period_ms: 50,
            compression_level: 6,
            data_version: 2724,
            bits_per_block: 4,
        }
    }
}

impl WorldConfig {
    /// Reads a JSON config file. Missing fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: WorldConfig =
            serde_json::from_str(&contents).map_err(|e| WorldError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_period_ms == 0 {
            return Err(WorldError::Config("tick_period_ms must be positive".into()));
        }
        if self.compression_level > 9 {
            return Err(WorldError::Config(format!(
                "compression_level {} is outside 0..=9",
                self.compression_level
            )));
        }
        if !(1..=8).contains(&self.bits_per_block) {
            return Err(WorldError::Config(format!(
                "bits_per_block {} is outside 1..=8",
                self.bits_per_block
            )));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn regions_dir(&self) -> PathBuf {
        self.world_dir.join("regions")
    }

    pub fn region_path(&self, region_x: i32, region_z: i32) -> PathBuf {
        self.regions_dir()
            .join(format!("r.{}.{}.mca", region_x, region_z))
    }
}
