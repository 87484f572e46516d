use crate::block::Block;
use lodestone_common::BlockPos;

/// A pending check or mutation of one block position. A region keeps at most one per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockUpdate {
    pub position: BlockPos,
    /// Snapshot of the block that triggered the update. `None` means the block is looked up
    /// when the update executes.
    pub block: Option<Block>,
    /// Ticks left before the update executes.
    pub delay: u32,
}

impl BlockUpdate {
    pub fn new(position: BlockPos, block: Block) -> Self {
        BlockUpdate {
            position,
            block: Some(block),
            delay: 0,
        }
    }

    pub fn at(position: BlockPos) -> Self {
        BlockUpdate {
            position,
            block: None,
            delay: 0,
        }
    }

    pub fn with_delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }
}
