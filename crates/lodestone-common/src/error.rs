use lodestone_nbt::NbtError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("NBT error: {0}")]
    Nbt(#[from] NbtError),
    #[error("palette index {index} out of range, palette holds {count} entries")]
    PaletteIndexOutOfRange { index: usize, count: usize },
    #[error("palette is full ({capacity} entries)")]
    PaletteFull { capacity: usize },
    #[error("position ({x}, {y}, {z}) is out of bounds")]
    OutOfBounds { x: i32, y: i32, z: i32 },
    #[error("expected {expected} storage words, got {actual}")]
    InvalidStorageLength { expected: usize, actual: usize },
    #[error("unknown block state id {0}")]
    UnknownBlockState(u32),
    #[error("chunk decode error: {0}")]
    ChunkDecode(String),
    #[error("chunk ({x}, {z}) is outside of the region")]
    OutOfRegionBounds { x: i32, z: i32 },
    #[error("corrupt region file: {0}")]
    CorruptRegion(String),
    #[error("unsupported chunk compression {0}")]
    UnsupportedCompression(u8),
    #[error("chunk blob of {0} bytes does not fit the region file")]
    ChunkTooLarge(usize),
    #[error("config error: {0}")]
    Config(String),
}

impl WorldError {
    /// True for failures of the underlying storage, as opposed to malformed data.
    pub fn is_io(&self) -> bool {
        matches!(self, WorldError::Io(_) | WorldError::Nbt(NbtError::Io(_)))
    }
}
