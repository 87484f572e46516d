use crate::error::NbtError;
use crate::tag::{Compound, List, Tag, TagKind};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read};

/// Maximum container nesting accepted while decoding.
pub const MAX_DEPTH: usize = 512;

// Upper bound for pre-allocation; a corrupt length prefix must not reserve gigabytes.
const PREALLOCATE_LIMIT: usize = 1 << 16;

/// Streaming tag decoder.
pub struct TagReader<R: Read> {
    reader: R,
}

impl<R: Read> TagReader<R> {
    pub fn new(reader: R) -> Self {
        TagReader { reader }
    }

    /// Reads one named top-level tag. Returns `Ok(None)` when the source is exhausted before the
    /// kind byte.
    pub fn read_next_tag(&mut self) -> Result<Option<(String, Tag)>, NbtError> {
        let type_id = match self.reader.read_u8() {
            Ok(type_id) => type_id,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let kind = TagKind::try_from(type_id)?;
        if kind == TagKind::End {
            return Err(NbtError::StrayEndTag);
        }

        let name = self.read_string()?;
        let tag = self.read_payload(kind, 0)?;
        Ok(Some((name, tag)))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_payload(&mut self, kind: TagKind, depth: usize) -> Result<Tag, NbtError> {
        if depth > MAX_DEPTH {
            return Err(NbtError::DepthLimit(MAX_DEPTH));
        }

        Ok(match kind {
            TagKind::End => return Err(NbtError::StrayEndTag),
            TagKind::Byte => Tag::Byte(self.reader.read_i8()?),
            TagKind::Short => Tag::Short(self.reader.read_i16::<BigEndian>()?),
            TagKind::Int => Tag::Int(self.reader.read_i32::<BigEndian>()?),
            TagKind::Long => Tag::Long(self.reader.read_i64::<BigEndian>()?),
            TagKind::Float => Tag::Float(self.reader.read_f32::<BigEndian>()?),
            TagKind::Double => Tag::Double(self.reader.read_f64::<BigEndian>()?),
            TagKind::ByteArray => {
                let length = self.read_length()?;
                let mut bytes = Vec::with_capacity(length.min(PREALLOCATE_LIMIT));
                for _ in 0..length {
                    bytes.push(self.reader.read_i8()?);
                }
                Tag::ByteArray(bytes)
            }
            TagKind::String => Tag::String(self.read_string()?),
            TagKind::List => {
                let element_kind = TagKind::try_from(self.reader.read_u8()?)?;
                let length = self.read_length()?;
                if element_kind == TagKind::End && length > 0 {
                    return Err(NbtError::StrayEndTag);
                }
                let mut list = List::with_capacity(element_kind, length.min(PREALLOCATE_LIMIT));
                for _ in 0..length {
                    list.push(self.read_payload(element_kind, depth + 1)?)?;
                }
                Tag::List(list)
            }
            TagKind::Compound => {
                let mut compound = Compound::new();
                loop {
                    let child_kind = TagKind::try_from(self.reader.read_u8()?)?;
                    if child_kind == TagKind::End {
                        break;
                    }
                    let child_name = self.read_string()?;
                    let child = self.read_payload(child_kind, depth + 1)?;
                    compound.insert(child_name, child);
                }
                Tag::Compound(compound)
            }
            TagKind::IntArray => {
                let length = self.read_length()?;
                let mut ints = Vec::with_capacity(length.min(PREALLOCATE_LIMIT));
                for _ in 0..length {
                    ints.push(self.reader.read_i32::<BigEndian>()?);
                }
                Tag::IntArray(ints)
            }
            TagKind::LongArray => {
                let length = self.read_length()?;
                let mut longs = Vec::with_capacity(length.min(PREALLOCATE_LIMIT));
                for _ in 0..length {
                    longs.push(self.reader.read_i64::<BigEndian>()?);
                }
                Tag::LongArray(longs)
            }
        })
    }

    fn read_length(&mut self) -> Result<usize, NbtError> {
        let length = self.reader.read_i32::<BigEndian>()?;
        if length < 0 {
            return Err(NbtError::NegativeLength(length));
        }
        Ok(length as usize)
    }

    fn read_string(&mut self) -> Result<String, NbtError> {
        let length = self.reader.read_u16::<BigEndian>()?;
        let mut bytes = vec![0u8; length as usize];
        self.reader.read_exact(&mut bytes)?;
        String::from_utf8(bytes).map_err(|_| NbtError::InvalidString)
    }
}
