use crate::block::{Block, Material};
use crate::chunk::{Chunk, HeightmapType};
use crate::section::ChunkSection;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use lodestone_common::{Result, WorldConfig, WorldError};
use lodestone_nbt::{Compound, List, Tag, TagKind, TagReader, TagWriter};
use log::debug;

pub const LEVEL_TAG: &str = "Level";
pub const DATA_VERSION_TAG: &str = "DataVersion";

/// Converts chunks to and from their gzip-compressed tag documents.
#[derive(Debug, Clone, Copy)]
pub struct ChunkCodec {
    pub bits_per_block: u8,
    pub compression_level: u32,
    pub data_version: i32,
}

impl ChunkCodec {
    pub fn from_config(config: &WorldConfig) -> Self {
        ChunkCodec {
            bits_per_block: config.bits_per_block,
            compression_level: config.compression_level,
            data_version: config.data_version,
        }
    }

    /// Writes the `Level` compound followed by a separate top-level `DataVersion` int.
    pub fn encode(&self, chunk: &Chunk) -> Result<Vec<u8>> {
        let level = chunk_to_tag(chunk)?;
        let encoder = GzEncoder::new(Vec::new(), Compression::new(self.compression_level));

        let mut writer = TagWriter::new(encoder);
        writer.write_tag(LEVEL_TAG, &Tag::Compound(level))?;
        writer.write_int(DATA_VERSION_TAG, self.data_version)?;
        let encoder = writer.finish()?;
        Ok(encoder.finish()?)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Chunk> {
        self.decode_inner(bytes)
            .map_err(|e| match e {
                // the source is an in-memory slice, so read failures mean a damaged blob
                WorldError::Io(e) => WorldError::ChunkDecode(e.to_string()),
                WorldError::Nbt(e) => WorldError::ChunkDecode(e.to_string()),
                other => other,
            })
    }

    fn decode_inner(&self, bytes: &[u8]) -> Result<Chunk> {
        let mut reader = TagReader::new(GzDecoder::new(bytes));
        let level = match reader.read_next_tag()? {
            Some((name, Tag::Compound(level))) if name == LEVEL_TAG => level,
            Some((name, tag)) => {
                return Err(WorldError::ChunkDecode(format!(
                    "expected a {} compound, found {:?} \"{}\"",
                    LEVEL_TAG,
                    tag.kind(),
                    name
                )))
            }
            None => return Err(WorldError::ChunkDecode("empty chunk document".into())),
        };

        if let Some((name, tag)) = reader.read_next_tag()? {
            match (name.as_str(), tag.as_i32()) {
                (DATA_VERSION_TAG, Some(version)) if version != self.data_version => {
                    debug!("chunk written with data version {}, expected {}", version, self.data_version)
                }
                (DATA_VERSION_TAG, Some(_)) => {}
                _ => debug!("ignoring trailing tag \"{}\" after chunk data", name),
            }
        }

        chunk_from_tag(&level, self.bits_per_block)
    }
}

impl Default for ChunkCodec {
    fn default() -> Self {
        ChunkCodec::from_config(&WorldConfig::default())
    }
}

pub fn chunk_to_tag(chunk: &Chunk) -> Result<Compound> {
    let mut sections = List::with_capacity(TagKind::Compound, chunk.sections().len());
    for section in chunk.sections() {
        let mut palette = List::new(TagKind::Compound);
        // index 0 is always air and is left implicit
        for block in section.palette().iter().skip(1) {
            palette.push(Tag::Compound(
                Compound::new()
                    .with("Name", Tag::String(block.name().to_string()))
                    .with("Id", Tag::Int(block.state_id() as i32)),
            ))?;
        }
        sections.push(Tag::Compound(
            Compound::new()
                .with("Y", Tag::Byte(section.y()))
                .with("Palette", Tag::List(palette))
                .with("BlockStates", Tag::LongArray(section.states().to_long_array())),
        ))?;
    }

    let mut heightmaps = Compound::new();
    for kind in HeightmapType::ALL {
        let storage = chunk
            .heightmap(kind)
            .map(|heightmap| heightmap.to_long_array())
            .unwrap_or_default();
        heightmaps.insert(kind.tag_name(), Tag::LongArray(storage));
    }

    Ok(Compound::new()
        .with("xPos", Tag::Int(chunk.x()))
        .with("zPos", Tag::Int(chunk.z()))
        .with("Biomes", Tag::IntArray(chunk.biomes().to_vec()))
        .with("Heightmaps", Tag::Compound(heightmaps))
        .with("Sections", Tag::List(sections)))
}

pub fn chunk_from_tag(level: &Compound, bits_per_block: u8) -> Result<Chunk> {
    let x = required(level.get_int("xPos"), "xPos")?;
    let z = required(level.get_int("zPos"), "zPos")?;

    let mut chunk = Chunk::with_bits_per_block(x, z, bits_per_block);
    chunk.is_generated = true;

    let sections = required(level.get_list("Sections"), "Sections")?;
    for tag in sections {
        let compound = required(tag.as_compound(), "section compound")?;
        chunk.replace_section(section_from_tag(compound, bits_per_block)?)?;
    }

    if let Some(biomes) = level.get_int_array("Biomes") {
        chunk.set_biomes(biomes.to_vec())?;
    }

    if let Some(heightmaps) = level.get_compound("Heightmaps") {
        for kind in HeightmapType::ALL {
            if let Some(storage) = heightmaps.get_long_array(kind.tag_name()) {
                chunk.set_heightmap_storage(kind, storage.iter().map(|&word| word as u64).collect())?;
            }
        }
    }

    Ok(chunk)
}

fn section_from_tag(compound: &Compound, bits_per_block: u8) -> Result<ChunkSection> {
    let y = required(compound.get_byte("Y"), "Y")?;
    let mut section = ChunkSection::new(bits_per_block, y);

    if let Some(palette) = compound.get_list("Palette") {
        for entry in palette {
            let entry = required(entry.as_compound(), "palette entry")?;
            section.insert_palette_entry(palette_block(entry)?)?;
        }
    }

    let states = required(compound.get_long_array("BlockStates"), "BlockStates")?;
    section.install_states(states.iter().map(|&word| word as u64).collect())?;
    Ok(section)
}

// Resolves by state id, then by name for ids this registry does not know.
fn palette_block(entry: &Compound) -> Result<Block> {
    if let Some(block) = entry
        .get_int("Id")
        .and_then(|id| Block::from_state_id(id as u32))
    {
        return Ok(block);
    }
    entry
        .get_string("Name")
        .and_then(Material::from_name)
        .map(Block::new)
        .ok_or_else(|| {
            WorldError::UnknownBlockState(entry.get_int("Id").unwrap_or(-1) as u32)
        })
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| WorldError::ChunkDecode(format!("missing or mistyped field {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Material;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    fn sample_chunk() -> Chunk {
        let mut chunk = Chunk::new(-7, 12);
        chunk.set_block(0, 0, 0, Block::new(Material::Bedrock)).unwrap();
        for x in 0..16 {
            chunk.set_block(x, 63, 4, Block::new(Material::GrassBlock)).unwrap();
        }
        chunk.set_block(8, 64, 8, Block::with_state(Material::Water, 9)).unwrap();
        chunk.set_block(8, 130, 1, Block::new(Material::Sand)).unwrap();
        chunk.set_biome(0, 0, 0, 6).unwrap();
        chunk.set_biome(12, 200, 12, 24).unwrap();
        chunk.recalculate_heightmaps();
        chunk
    }

    #[test]
    fn test_encode_decode_chunk() {
        let codec = ChunkCodec::default();
        let chunk = sample_chunk();
        let decoded = codec.decode(&codec.encode(&chunk).unwrap()).unwrap();

        assert!(decoded.is_generated);
        assert_eq!((decoded.x(), decoded.z()), (-7, 12));
        assert_eq!(decoded.sections(), chunk.sections());
        assert_eq!(decoded.biomes(), chunk.biomes());
        for kind in HeightmapType::ALL {
            assert_eq!(decoded.heightmap(kind), chunk.heightmap(kind));
        }
        assert_eq!(
            decoded.get_block(8, 64, 8).unwrap(),
            Block::with_state(Material::Water, 9)
        );
    }

    #[test]
    fn test_level_layout() {
        let level = chunk_to_tag(&sample_chunk()).unwrap();
        let names: Vec<&str> = level.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["xPos", "zPos", "Biomes", "Heightmaps", "Sections"]);

        let heightmaps = level.get_compound("Heightmaps").unwrap();
        let names: Vec<&str> = heightmaps.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["MOTION_BLOCKING", "OCEAN_FLOOR", "WORLD_SURFACE"]);

        let sections = level.get_list("Sections").unwrap();
        assert_eq!(sections.len(), 16);
        let first = sections.get(0).unwrap().as_compound().unwrap();
        assert_eq!(first.get_byte("Y"), Some(0));
        let palette = first.get_list("Palette").unwrap();
        // air is implicit, bedrock is the only listed entry
        assert_eq!(palette.len(), 1);
        let entry = palette.get(0).unwrap().as_compound().unwrap();
        assert_eq!(entry.get_string("Name"), Some("minecraft:bedrock"));
        assert_eq!(entry.get_int("Id"), Some(33));
        assert_eq!(first.get_long_array("BlockStates").unwrap().len(), 256);
    }

    #[test]
    fn test_data_version_follows_level() {
        let codec = ChunkCodec::default();
        let bytes = codec.encode(&Chunk::new(0, 0)).unwrap();
        let mut reader = TagReader::new(GzDecoder::new(Cursor::new(bytes)));

        let (name, tag) = reader.read_next_tag().unwrap().unwrap();
        assert_eq!(name, "Level");
        assert!(!tag.as_compound().unwrap().contains("DataVersion"));
        let (name, tag) = reader.read_next_tag().unwrap().unwrap();
        assert_eq!(name, "DataVersion");
        assert_eq!(tag, Tag::Int(2724));
        assert!(reader.read_next_tag().unwrap().is_none());
    }

    #[test]
    fn test_decode_without_data_version() {
        let level = chunk_to_tag(&sample_chunk()).unwrap();
        let mut writer = TagWriter::new(GzEncoder::new(Vec::new(), Compression::default()));
        writer.write_tag("Level", &Tag::Compound(level)).unwrap();
        let bytes = writer.finish().unwrap().finish().unwrap();

        let chunk = ChunkCodec::default().decode(&bytes).unwrap();
        assert_eq!(chunk.get_block(8, 130, 1).unwrap(), Block::new(Material::Sand));
    }

    #[test]
    fn test_decode_damaged_blob() {
        let codec = ChunkCodec::default();
        let mut bytes = codec.encode(&sample_chunk()).unwrap();
        bytes.truncate(bytes.len() / 2);
        assert_matches!(codec.decode(&bytes), Err(WorldError::ChunkDecode(_)));
        assert_matches!(codec.decode(b"not gzip"), Err(WorldError::ChunkDecode(_)));
    }

    #[test]
    fn test_decode_rejects_dangling_palette_index() {
        let mut section = Compound::new()
            .with("Y", Tag::Byte(0))
            .with("Palette", Tag::List(List::new(TagKind::Compound)));
        let mut states = vec![0i64; 256];
        states[0] = 3;
        section.insert("BlockStates", Tag::LongArray(states));
        let mut sections = List::new(TagKind::Compound);
        sections.push(Tag::Compound(section)).unwrap();
        let level = Compound::new()
            .with("xPos", Tag::Int(0))
            .with("zPos", Tag::Int(0))
            .with("Sections", Tag::List(sections));

        assert_matches!(
            chunk_from_tag(&level, 4),
            Err(WorldError::PaletteIndexOutOfRange { index: 3, count: 1 })
        );
        assert_matches!(
            chunk_from_tag(&Compound::new(), 4),
            Err(WorldError::ChunkDecode(_))
        );
    }
}
