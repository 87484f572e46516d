pub mod bit_array;
pub mod block;
pub mod block_update;
pub mod chunk;
pub mod codec;
pub mod dimension;
pub mod entity;
pub mod palette;
pub mod physics;
pub mod region;
pub mod region_file;
pub mod scheduler;
pub mod section;
pub mod world;

#[cfg(test)]
mod test_world;

pub use bit_array::BitPackedArray;
pub use block::{Block, Material};
pub use block_update::BlockUpdate;
pub use chunk::{Chunk, HeightmapType};
pub use codec::ChunkCodec;
pub use dimension::Dimension;
pub use entity::{Entity, FallingBlock};
pub use palette::LinearPalette;
pub use region::{ChunkRef, ChunkSlot, Region};
pub use region_file::RegionFile;
pub use scheduler::{BlockUpdateScheduler, TickReport};
pub use section::ChunkSection;
pub use world::World;
