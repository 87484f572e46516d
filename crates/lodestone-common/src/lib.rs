pub mod config;
pub mod error;
pub mod types;

pub use config::WorldConfig;
pub use error::WorldError;
pub use types::{region_local, BlockPos, Position, Result, REGION_SIZE, SECTION_SIZE};
