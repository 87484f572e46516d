use crate::block::{Block, Material};
use crate::block_update::BlockUpdate;
use lodestone_common::BlockPos;
use uuid::Uuid;

/// Block and entity access used by physics handlers and entities.
///
/// Methods never fail: a position that is out of the world or in a chunk that was never generated
/// reads as `None` and ignores writes.
pub trait World: Send + Sync {
    fn get_block(&self, position: BlockPos) -> Option<Block>;

    /// Writes a block and schedules an update for it at the same position.
    fn set_block(&self, position: BlockPos, block: Block);

    /// Writes a block without scheduling anything.
    fn set_block_untracked(&self, position: BlockPos, block: Block);

    fn schedule_block_update(&self, update: BlockUpdate);

    fn spawn_falling_block(&self, position: BlockPos, material: Material);

    fn destroy_entity(&self, id: Uuid);
}
