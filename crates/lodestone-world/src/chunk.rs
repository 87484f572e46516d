use crate::bit_array::BitPackedArray;
use crate::block::Block;
use crate::section::{ChunkSection, SECTION_WIDTH};
use lodestone_common::{Result, WorldError};
use std::collections::HashMap;

pub const SECTION_COUNT: usize = 16;
pub const CHUNK_HEIGHT: usize = SECTION_COUNT * SECTION_WIDTH;
pub const BIOME_COUNT: usize = 1024;
pub const DEFAULT_BIOME: i32 = 1;
pub const DEFAULT_BITS_PER_BLOCK: u8 = 4;

const HEIGHTMAP_BITS: u8 = 9;
const COLUMN_COUNT: usize = SECTION_WIDTH * SECTION_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeightmapType {
    MotionBlocking,
    OceanFloor,
    WorldSurface,
}

impl HeightmapType {
    pub const ALL: [HeightmapType; 3] = [
        HeightmapType::MotionBlocking,
        HeightmapType::OceanFloor,
        HeightmapType::WorldSurface,
    ];

    pub fn tag_name(self) -> &'static str {
        match self {
            HeightmapType::MotionBlocking => "MOTION_BLOCKING",
            HeightmapType::OceanFloor => "OCEAN_FLOOR",
            HeightmapType::WorldSurface => "WORLD_SURFACE",
        }
    }

    fn counts(self, block: Block) -> bool {
        match self {
            HeightmapType::MotionBlocking => block.material.blocks_motion() || block.is_fluid(),
            HeightmapType::OceanFloor => block.material.is_solid(),
            HeightmapType::WorldSurface => !block.is_air(),
        }
    }
}

/// A 16-wide column of sections covering y 0..256.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    x: i32,
    z: i32,
    sections: Vec<ChunkSection>,
    biomes: Vec<i32>,
    heightmaps: HashMap<HeightmapType, BitPackedArray>,
    pub is_generated: bool,
}

impl Chunk {
    pub fn new(x: i32, z: i32) -> Self {
        Chunk::with_bits_per_block(x, z, DEFAULT_BITS_PER_BLOCK)
    }

    pub fn with_bits_per_block(x: i32, z: i32, bits_per_block: u8) -> Self {
        let heightmaps = HeightmapType::ALL
            .iter()
            .map(|&kind| (kind, BitPackedArray::new(HEIGHTMAP_BITS, COLUMN_COUNT)))
            .collect();
        Chunk {
            x,
            z,
            sections: (0..SECTION_COUNT)
                .map(|y| ChunkSection::new(bits_per_block, y as i8))
                .collect(),
            biomes: vec![DEFAULT_BIOME; BIOME_COUNT],
            heightmaps,
            is_generated: false,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn sections(&self) -> &[ChunkSection] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&ChunkSection> {
        self.sections.get(index)
    }

    pub fn section_mut(&mut self, index: usize) -> Option<&mut ChunkSection> {
        self.sections.get_mut(index)
    }

    /// Replaces the section at the section's own `y` index.
    pub fn replace_section(&mut self, section: ChunkSection) -> Result<()> {
        let index = section.y();
        match usize::try_from(index).ok().and_then(|i| self.sections.get_mut(i)) {
            Some(slot) => {
                *slot = section;
                Ok(())
            }
            None => Err(WorldError::ChunkDecode(format!(
                "section index {} outside 0..{}",
                index, SECTION_COUNT
            ))),
        }
    }

    /// Block at chunk-local coordinates: x and z in `0..16`, y in `0..256`.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Result<Block> {
        let (section, local_y) = self.locate(x, y, z)?;
        self.sections[section].get(x as usize, local_y, z as usize)
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: Block) -> Result<()> {
        let (section, local_y) = self.locate(x, y, z)?;
        self.sections[section].set(x as usize, local_y, z as usize, block)
    }

    fn locate(&self, x: i32, y: i32, z: i32) -> Result<(usize, usize)> {
        let width = SECTION_WIDTH as i32;
        if !(0..width).contains(&x) || !(0..width).contains(&z) || !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return Err(WorldError::OutOfBounds { x, y, z });
        }
        let y = y as usize;
        Ok((y / SECTION_WIDTH, y % SECTION_WIDTH))
    }

    pub fn biomes(&self) -> &[i32] {
        &self.biomes
    }

    pub fn set_biomes(&mut self, biomes: Vec<i32>) -> Result<()> {
        if biomes.len() != BIOME_COUNT {
            return Err(WorldError::InvalidStorageLength {
                expected: BIOME_COUNT,
                actual: biomes.len(),
            });
        }
        self.biomes = biomes;
        Ok(())
    }

    /// Biomes are stored per 4x4x4 cell.
    pub fn get_biome(&self, x: i32, y: i32, z: i32) -> Option<i32> {
        self.biome_index(x, y, z).map(|index| self.biomes[index])
    }

    pub fn set_biome(&mut self, x: i32, y: i32, z: i32, biome: i32) -> Result<()> {
        let index = self
            .biome_index(x, y, z)
            .ok_or(WorldError::OutOfBounds { x, y, z })?;
        self.biomes[index] = biome;
        Ok(())
    }

    fn biome_index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        self.locate(x, y, z).ok()?;
        Some((((y >> 2) << 4) | ((z >> 2) << 2) | (x >> 2)) as usize)
    }

    pub fn heightmap(&self, kind: HeightmapType) -> Option<&BitPackedArray> {
        self.heightmaps.get(&kind)
    }

    pub fn set_heightmap_storage(&mut self, kind: HeightmapType, words: Vec<u64>) -> Result<()> {
        self.heightmaps
            .entry(kind)
            .or_insert_with(|| BitPackedArray::new(HEIGHTMAP_BITS, COLUMN_COUNT))
            .set_storage(words)
    }

    /// Height of the column at local (x, z): one above the highest counted block, 0 if none.
    pub fn height(&self, kind: HeightmapType, x: usize, z: usize) -> Option<u32> {
        let heightmap = self.heightmaps.get(&kind)?;
        (x < SECTION_WIDTH && z < SECTION_WIDTH).then(|| heightmap.get(z * SECTION_WIDTH + x))
    }

    pub fn recalculate_heightmaps(&mut self) {
        for kind in HeightmapType::ALL {
            let mut heights = BitPackedArray::new(HEIGHTMAP_BITS, COLUMN_COUNT);
            for z in 0..SECTION_WIDTH {
                for x in 0..SECTION_WIDTH {
                    let top = (0..CHUNK_HEIGHT).rev().find(|&y| {
                        self.get_block(x as i32, y as i32, z as i32)
                            .map(|block| kind.counts(block))
                            .unwrap_or(false)
                    });
                    heights.set(z * SECTION_WIDTH + x, top.map(|y| y as u32 + 1).unwrap_or(0));
                }
            }
            self.heightmaps.insert(kind, heights);
        }
    }

    pub fn non_air_block_count(&self) -> usize {
        self.sections.iter().map(ChunkSection::non_air_count).sum()
    }
}
