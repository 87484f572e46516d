pub mod error;
pub mod reader;
pub mod tag;
pub mod writer;

pub use error::NbtError;
pub use reader::TagReader;
pub use tag::{Compound, List, Tag, TagKind};
pub use writer::TagWriter;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

// NbtFile represents a complete NBT document with a named root compound
#[derive(Debug, Clone, PartialEq)]
pub struct NbtFile {
    pub name: String,
    pub root: Compound,
}

impl NbtFile {
    pub fn new(name: impl Into<String>, root: Compound) -> Self {
        NbtFile {
            name: name.into(),
            root,
        }
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self, NbtError> {
        match TagReader::new(reader).read_next_tag()? {
            Some((name, Tag::Compound(root))) => Ok(NbtFile { name, root }),
            Some((_, other)) => Err(NbtError::RootNotCompound(Some(other.kind()))),
            None => Err(NbtError::RootNotCompound(None)),
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), NbtError> {
        let mut tag_writer = TagWriter::new(writer);
        tag_writer.start_compound(&self.name)?;
        for (name, tag) in self.root.iter() {
            tag_writer.write_tag(name, tag)?;
        }
        tag_writer.end_compound()?;
        tag_writer.try_finish()
    }

    pub fn read_gzip<R: Read>(reader: &mut R) -> Result<Self, NbtError> {
        let mut decoder = GzDecoder::new(reader);
        Self::read(&mut decoder)
    }

    pub fn write_gzip<W: Write>(&self, writer: &mut W) -> Result<(), NbtError> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        self.write(&mut encoder)?;
        encoder.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    #[test]
    fn test_nbt_file() {
        let root = Compound::new()
            .with("name", Tag::String("Test".to_string()))
            .with("value", Tag::Int(42));
        let original = NbtFile::new("test", root);

        let mut buffer = Vec::new();
        original.write(&mut buffer).unwrap();
        let read = NbtFile::read(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(read, original);

        let mut gzip_buffer = Vec::new();
        original.write_gzip(&mut gzip_buffer).unwrap();
        assert_eq!(&gzip_buffer[..2], &[0x1f, 0x8b]);
        let gzip_read = NbtFile::read_gzip(&mut Cursor::new(gzip_buffer)).unwrap();
        assert_eq!(gzip_read, original);
    }

    #[test]
    fn test_nbt_file_rejects_scalar_root() {
        let mut writer = TagWriter::new(Vec::new());
        writer.write_int("answer", 42).unwrap();
        let bytes = writer.finish().unwrap();

        assert_matches!(
            NbtFile::read(&mut Cursor::new(bytes)),
            Err(NbtError::RootNotCompound(Some(TagKind::Int)))
        );
        assert_matches!(
            NbtFile::read(&mut Cursor::new(Vec::new())),
            Err(NbtError::RootNotCompound(None))
        );
    }
}
