mod common;

use assert_matches::assert_matches;
use common::*;
use lodestone::nbt::{NbtFile, Tag};
use lodestone::world::chunk::HeightmapType;
use lodestone::world::codec::{ChunkCodec, LEVEL_TAG};
use lodestone::world::RegionFile;
use lodestone::{Block, BlockPos, Dimension, Material, World};
use std::io::Cursor;

#[test]
fn test_region_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_config(&dir);
    let path = config.region_path(3, 7);
    let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

    {
        let mut file = RegionFile::new(&path);
        file.initialize().unwrap();
        file.set_chunk_bytes(5, 9, payload.clone()).unwrap();
        assert!(file.has_pending_writes());
        file.flush_to_disk().unwrap();
        assert!(!file.has_pending_writes());
    }

    let mut file = RegionFile::new(&path);
    file.initialize().unwrap();
    assert_eq!(file.get_chunk_bytes(5, 9).unwrap(), Some(payload));
    assert!(file.timestamp(5, 9).is_some());
    assert_eq!(file.get_chunk_bytes(0, 0).unwrap(), None);
    assert!(!file.has_chunk(31, 31));
}

#[test]
fn test_chunk_survives_save_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let cobble = BlockPos::new(3, 100, 12);
    let lava = surface(9, 9);
    {
        let dimension = flat_dimension(&dir);
        dimension.set_block_untracked(cobble, Block::new(Material::Cobblestone));
        dimension.set_block_untracked(lava, Block::with_state(Material::Lava, 3));
        {
            let chunk = dimension.get_chunk(0, 0).unwrap().unwrap();
            let mut chunk = chunk.write();
            chunk.set_biome(0, 0, 0, 7).unwrap();
            chunk.recalculate_heightmaps();
        }
        dimension.save_all().unwrap();
        assert!(!spawn_region(&dimension).is_dirty());
    }

    let dimension = Dimension::new(temp_config(&dir)).unwrap();
    assert_eq!(dimension.get_block(cobble), Some(Block::new(Material::Cobblestone)));
    assert_eq!(dimension.get_block(lava), Some(Block::with_state(Material::Lava, 3)));
    assert_eq!(dimension.get_block(surface(0, 0).below()), Some(Block::new(Material::Stone)));
    assert_eq!(dimension.get_block(BlockPos::new(0, 0, 0)), Some(Block::new(Material::Stone)));
    assert_eq!(dimension.get_block(surface(0, 0)), Some(Block::AIR));

    let chunk = dimension.get_chunk(0, 0).unwrap().unwrap();
    let chunk = chunk.read();
    assert!(chunk.is_generated);
    assert_eq!(chunk.get_biome(0, 0, 0), Some(7));
    assert_eq!(chunk.get_biome(15, 255, 15), Some(1));
    assert_eq!(chunk.height(HeightmapType::WorldSurface, 3, 12), Some(101));
    assert_eq!(chunk.height(HeightmapType::OceanFloor, 9, 9), Some(64));
    assert_eq!(chunk.height(HeightmapType::MotionBlocking, 9, 9), Some(65));

    // a neighbouring column was never generated
    assert!(dimension.get_chunk(1, 0).unwrap().is_none());
}

#[test]
fn test_stored_chunk_is_a_level_document() {
    let dir = tempfile::tempdir().unwrap();
    let config = temp_config(&dir);
    let dimension = flat_dimension(&dir);
    dimension.save_all().unwrap();

    let mut file = RegionFile::new(config.region_path(0, 0));
    file.initialize().unwrap();
    let bytes = file.get_chunk_bytes(0, 0).unwrap().unwrap();

    let document = NbtFile::read_gzip(&mut Cursor::new(&bytes)).unwrap();
    assert_eq!(document.name, LEVEL_TAG);
    assert_eq!(document.root.get_int("xPos"), Some(0));
    assert_eq!(document.root.get_int("zPos"), Some(0));
    assert_matches!(document.root.get("Sections"), Some(Tag::List(sections)) if sections.len() == 16);

    let chunk = ChunkCodec::from_config(&config).decode(&bytes).unwrap();
    assert_eq!(chunk.non_air_block_count(), 16 * 16 * 64);
}
