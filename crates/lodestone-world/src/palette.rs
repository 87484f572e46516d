use crate::block::Block;
use byteorder::{ReadBytesExt, WriteBytesExt};
use lodestone_common::{Result, WorldError};
use std::io::{self, Read, Write};

/// Dictionary of up to `2^bits` distinct block states, indexed in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearPalette {
    entries: Vec<Block>,
    capacity: usize,
}

impl LinearPalette {
    pub fn new(bits: u8) -> Self {
        let capacity = 1usize << bits;
        LinearPalette {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the compact index for `block`, appending it when unseen. `None` means the palette
    /// is full; nothing is modified in that case.
    pub fn get_or_insert(&mut self, block: Block) -> Option<u32> {
        let state_id = block.state_id();
        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.state_id() == state_id)
        {
            return Some(index as u32);
        }

        if self.is_full() {
            return None;
        }

        self.entries.push(block);
        Some((self.entries.len() - 1) as u32)
    }

    pub fn state_at(&self, index: u32) -> Result<Block> {
        self.entries
            .get(index as usize)
            .copied()
            .ok_or(WorldError::PaletteIndexOutOfRange {
                index: index as usize,
                count: self.entries.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.entries.iter()
    }

    /// VarInt count followed by one VarInt global state id per entry, in index order.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint(writer, self.entries.len() as i32)?;
        for entry in &self.entries {
            write_varint(writer, entry.state_id() as i32)?;
        }
        Ok(())
    }

    /// Appends the entries of a serialized palette in file order, reproducing their indices.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let count = read_varint(reader)?;
        for _ in 0..count {
            let state_id = read_varint(reader)? as u32;
            let block = Block::from_state_id(state_id).ok_or(WorldError::UnknownBlockState(state_id))?;
            if self.get_or_insert(block).is_none() {
                return Err(WorldError::PaletteFull {
                    capacity: self.capacity,
                });
            }
        }
        Ok(())
    }
}

pub fn write_varint<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    let mut value = value as u32;
    loop {
        let mut temp = (value & 0b0111_1111) as u8;
        value >>= 7;
        if value != 0 {
            temp |= 0b1000_0000;
        }
        writer.write_u8(temp)?;
        if value == 0 {
            return Ok(());
        }
    }
}

pub fn read_varint<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut result = 0u32;
    for position in 0..5 {
        let byte = reader.read_u8()?;
        result |= ((byte & 0b0111_1111) as u32) << (7 * position);
        if byte & 0b1000_0000 == 0 {
            return Ok(result as i32);
        }
    }
    Err(io::Error::new(io::ErrorKind::InvalidData, "VarInt is too big"))
}
