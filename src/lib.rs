pub use lodestone_common as common;
pub use lodestone_logger as logger;
pub use lodestone_nbt as nbt;
pub use lodestone_world as world;

// Re-export commonly used items
pub use lodestone_common::{BlockPos, Position, WorldConfig, WorldError};
pub use lodestone_world::{Block, BlockUpdate, Dimension, Material, World};
