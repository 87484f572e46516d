#![allow(dead_code)]

use lodestone::common::Result;
use lodestone::world::chunk::Chunk;
use lodestone::world::{BlockUpdateScheduler, Region, TickReport};
use lodestone::{Block, BlockPos, Dimension, Material, WorldConfig};
use std::sync::Arc;
use tempfile::TempDir;

/// Top of the stone floor in `flat_chunk`.
pub const FLOOR_Y: i32 = 63;

pub fn temp_config(dir: &TempDir) -> WorldConfig {
    WorldConfig {
        world_dir: dir.path().to_path_buf(),
        tick_period_ms: 10,
        ..WorldConfig::default()
    }
}

/// Stone from y = 0 up to `FLOOR_Y`, air above.
pub fn flat_chunk(chunk_x: i32, chunk_z: i32) -> Result<Chunk> {
    let mut chunk = Chunk::new(chunk_x, chunk_z);
    let stone = Block::new(Material::Stone);
    for y in 0..=FLOOR_Y {
        for z in 0..16 {
            for x in 0..16 {
                chunk.set_block(x, y, z, stone)?;
            }
        }
    }
    chunk.recalculate_heightmaps();
    chunk.is_generated = true;
    Ok(chunk)
}

/// A dimension with a flat chunk at (0, 0), stored under `dir`.
pub fn flat_dimension(dir: &TempDir) -> Arc<Dimension> {
    let dimension = Dimension::new(temp_config(dir)).expect("valid config");
    dimension
        .set_chunk(flat_chunk(0, 0).expect("flat chunk"))
        .expect("chunk inside region (0, 0)");
    dimension
}

pub fn spawn_region(dimension: &Dimension) -> Arc<Region> {
    dimension.region(0, 0).expect("region (0, 0) opens")
}

pub fn scheduler(dimension: &Dimension) -> BlockUpdateScheduler<Dimension> {
    dimension
        .scheduler(spawn_region(dimension))
        .expect("dimension is alive")
}

pub async fn run_ticks(scheduler: &BlockUpdateScheduler<Dimension>, ticks: usize) -> Vec<TickReport> {
    let mut reports = Vec::with_capacity(ticks);
    for _ in 0..ticks {
        reports.push(scheduler.tick().await);
    }
    reports
}

pub fn water(state: u16) -> Block {
    Block::with_state(Material::Water, state)
}

/// A cell resting on the floor, away from the chunk borders.
pub fn surface(x: i32, z: i32) -> BlockPos {
    BlockPos::new(x, FLOOR_Y + 1, z)
}
