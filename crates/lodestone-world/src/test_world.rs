use crate::block::{Block, Material};
use crate::block_update::BlockUpdate;
use crate::world::World;
use lodestone_common::BlockPos;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory world recording every call. Positions never `put` read as unloaded.
#[derive(Default)]
pub struct TestWorld {
    blocks: Mutex<HashMap<BlockPos, Block>>,
    scheduled: Mutex<Vec<BlockUpdate>>,
    spawned: Mutex<Vec<(BlockPos, Material)>>,
    destroyed: Mutex<Vec<Uuid>>,
    writes: Mutex<usize>,
}

impl TestWorld {
    pub fn new() -> Self {
        TestWorld::default()
    }

    /// Fills a horizontal square of side `2 * radius + 1` centred on `center`.
    pub fn fill_layer(&self, center: BlockPos, radius: i32, block: Block) {
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                self.put(center + BlockPos::new(dx, 0, dz), block);
            }
        }
    }

    pub fn put(&self, position: BlockPos, block: Block) {
        self.blocks.lock().insert(position, block);
    }

    pub fn block(&self, position: BlockPos) -> Option<Block> {
        self.blocks.lock().get(&position).copied()
    }

    pub fn scheduled(&self) -> Vec<BlockUpdate> {
        self.scheduled.lock().clone()
    }

    pub fn scheduled_at(&self, position: BlockPos) -> Option<BlockUpdate> {
        self.scheduled
            .lock()
            .iter()
            .rev()
            .find(|update| update.position == position)
            .copied()
    }

    pub fn spawned(&self) -> Vec<(BlockPos, Material)> {
        self.spawned.lock().clone()
    }

    pub fn destroyed(&self) -> Vec<Uuid> {
        self.destroyed.lock().clone()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

impl World for TestWorld {
    fn get_block(&self, position: BlockPos) -> Option<Block> {
        self.block(position)
    }

    fn set_block(&self, position: BlockPos, block: Block) {
        self.set_block_untracked(position, block);
        self.schedule_block_update(BlockUpdate::new(position, block));
    }

    fn set_block_untracked(&self, position: BlockPos, block: Block) {
        self.put(position, block);
        *self.writes.lock() += 1;
    }

    fn schedule_block_update(&self, update: BlockUpdate) {
        self.scheduled.lock().push(update);
    }

    fn spawn_falling_block(&self, position: BlockPos, material: Material) {
        self.spawned.lock().push((position, material));
    }

    fn destroy_entity(&self, id: Uuid) {
        self.destroyed.lock().push(id);
    }
}
