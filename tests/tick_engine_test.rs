mod common;

use common::*;
use lodestone::world::physics;
use lodestone::{Block, BlockPos, BlockUpdate, Material, World};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_updates_at_one_position_coalesce() {
    let dir = tempfile::tempdir().unwrap();
    let dimension = flat_dimension(&dir);
    let region = spawn_region(&dimension);
    let scheduler = scheduler(&dimension);
    let position = BlockPos::new(8, 70, 8);
    let sand = Block::new(Material::Sand);
    dimension.set_block_untracked(position, sand);

    region.add_block_update(BlockUpdate::new(position, Block::new(Material::Stone)));
    region.add_block_update(BlockUpdate::new(position, sand));
    assert_eq!(region.pending_update_count(), 1);

    // only the second snapshot runs: the sand falls
    let report = scheduler.tick().await;
    assert_eq!(report.executed, 1);
    assert_eq!(report.neighbor_notifications, 1);
    assert_eq!(dimension.get_block(position), Some(Block::AIR));
    assert_eq!(region.entity_count(), 1);
}

#[tokio::test]
async fn test_falling_block_lands_on_floor() {
    let dir = tempfile::tempdir().unwrap();
    let dimension = flat_dimension(&dir);
    let region = spawn_region(&dimension);
    let scheduler = scheduler(&dimension);
    let position = BlockPos::new(4, 72, 4);
    let gravel = Block::new(Material::Gravel);
    dimension.set_block(position, gravel);

    run_ticks(&scheduler, 200).await;
    assert_eq!(region.entity_count(), 0);
    assert_eq!(dimension.get_block(position), Some(Block::AIR));
    assert_eq!(dimension.get_block(surface(4, 4)), Some(gravel));
    assert_eq!(dimension.get_block(surface(4, 4).below()), Some(Block::new(Material::Stone)));
    assert!(scheduler.tick().await.is_idle());
}

#[tokio::test]
async fn test_water_source_spreads_next_tick() {
    let dir = tempfile::tempdir().unwrap();
    let dimension = flat_dimension(&dir);
    let scheduler = scheduler(&dimension);
    let source = surface(8, 8);
    dimension.set_block(source, water(physics::SOURCE));

    let report = scheduler.tick().await;
    assert_eq!(report.executed, 1);
    assert_eq!(report.neighbor_notifications, 0);
    for direction in BlockPos::CARDINALS {
        assert_eq!(dimension.get_block(source + direction), Some(water(1)));
    }
    assert_eq!(dimension.get_block(source), Some(water(physics::SOURCE)));

    scheduler.tick().await;
    assert_eq!(dimension.get_block(source + BlockPos::FORWARDS + BlockPos::FORWARDS), Some(water(2)));
}

#[tokio::test]
async fn test_flowing_water_between_sources_becomes_source() {
    let dir = tempfile::tempdir().unwrap();
    let dimension = flat_dimension(&dir);
    let region = spawn_region(&dimension);
    let scheduler = scheduler(&dimension);
    let position = surface(8, 8);
    dimension.set_block_untracked(position + BlockPos::LEFT, water(physics::SOURCE));
    dimension.set_block_untracked(position + BlockPos::RIGHT, water(physics::SOURCE));
    dimension.set_block_untracked(position, water(1));
    region.add_block_update(BlockUpdate::new(position, water(1)));

    let report = scheduler.tick().await;
    assert_eq!(report.executed, 1);
    assert_eq!(report.neighbor_notifications, 1);
    assert_eq!(dimension.get_block(position), Some(water(physics::SOURCE)));
    // the promotion write plus the six neighbours
    assert_eq!(region.pending_update_count(), 7);
}

#[tokio::test]
async fn test_delayed_update_is_deferred() {
    let dir = tempfile::tempdir().unwrap();
    let dimension = flat_dimension(&dir);
    let region = spawn_region(&dimension);
    let scheduler = scheduler(&dimension);
    let source = surface(8, 8);
    dimension.set_block_untracked(source, water(physics::SOURCE));
    region.add_block_update(BlockUpdate::at(source).with_delay(1));

    let report = scheduler.tick().await;
    assert_eq!(report.deferred, 1);
    assert_eq!(dimension.get_block(source + BlockPos::LEFT), Some(Block::AIR));

    let report = scheduler.tick().await;
    assert_eq!(report.executed, 1);
    assert_eq!(dimension.get_block(source + BlockPos::LEFT), Some(water(1)));
}

#[tokio::test]
async fn test_background_tickers_run_until_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let dimension = flat_dimension(&dir);
    let source = surface(8, 8);
    dimension.set_block(source, water(physics::SOURCE));

    let cancel = CancellationToken::new();
    dimension.start_ticking(Handle::current(), cancel.clone());
    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), dimension.stop_ticking())
        .await
        .expect("tickers did not stop");

    assert!(!dimension.is_ticking());
    assert_eq!(dimension.get_block(source + BlockPos::RIGHT), Some(water(1)));
}
