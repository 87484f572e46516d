use crate::bit_array::BitPackedArray;
use crate::block::Block;
use crate::palette::LinearPalette;
use lodestone_common::{Result, WorldError};

pub const SECTION_WIDTH: usize = 16;
pub const SECTION_VOLUME: usize = SECTION_WIDTH * SECTION_WIDTH * SECTION_WIDTH;

/// A 16x16x16 block volume stored as compact palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSection {
    y: i8,
    palette: LinearPalette,
    states: BitPackedArray,
}

impl ChunkSection {
    /// Every cell starts as air, which always occupies palette index 0.
    pub fn new(bits_per_block: u8, y: i8) -> Self {
        let mut palette = LinearPalette::new(bits_per_block);
        palette.get_or_insert(Block::AIR);
        ChunkSection {
            y,
            palette,
            states: BitPackedArray::new(bits_per_block, SECTION_VOLUME),
        }
    }

    pub fn y(&self) -> i8 {
        self.y
    }

    pub fn bits_per_block(&self) -> u8 {
        self.states.bits()
    }

    pub fn palette(&self) -> &LinearPalette {
        &self.palette
    }

    pub fn states(&self) -> &BitPackedArray {
        &self.states
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Result<Block> {
        let index = cell_index(x, y, z)?;
        self.palette.state_at(self.states.get(index))
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, block: Block) -> Result<()> {
        let index = cell_index(x, y, z)?;
        let compact = self.insert_palette_entry(block)?;
        self.states.set(index, compact);
        Ok(())
    }

    pub fn insert_palette_entry(&mut self, block: Block) -> Result<u32> {
        self.palette
            .get_or_insert(block)
            .ok_or(WorldError::PaletteFull {
                capacity: self.palette.capacity(),
            })
    }

    /// Installs raw storage words, then checks every cell against the palette.
    pub fn install_states(&mut self, words: Vec<u64>) -> Result<()> {
        self.states.set_storage(words)?;
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        let count = self.palette.len();
        match self.states.iter().find(|&value| value as usize >= count) {
            Some(value) => Err(WorldError::PaletteIndexOutOfRange {
                index: value as usize,
                count,
            }),
            None => Ok(()),
        }
    }

    pub fn non_air_count(&self) -> usize {
        self.states
            .iter()
            .filter(|&value| {
                self.palette
                    .state_at(value)
                    .map(|block| !block.is_air())
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.non_air_count() == 0
    }
}

fn cell_index(x: usize, y: usize, z: usize) -> Result<usize> {
    if x >= SECTION_WIDTH || y >= SECTION_WIDTH || z >= SECTION_WIDTH {
        return Err(WorldError::OutOfBounds {
            x: x as i32,
            y: y as i32,
            z: z as i32,
        });
    }
    Ok(y * 256 + z * 16 + x)
}
