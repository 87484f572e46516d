use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use lodestone_common::{Result, WorldError, REGION_SIZE};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SECTOR_SIZE: usize = 4096;
pub const CHUNKS_PER_REGION: usize = (REGION_SIZE * REGION_SIZE) as usize;
/// Location table and timestamp table, one sector each.
pub const HEADER_SECTORS: usize = 2;
pub const COMPRESSION_GZIP: u8 = 1;

// entry header: u32 length (counting the compression byte) + u8 compression
const ENTRY_HEADER: usize = 5;
const MAX_SECTORS_PER_CHUNK: usize = u8::MAX as usize;

/// Container for up to 1024 compressed chunk blobs addressed by region-relative coordinates.
///
/// Sector 0 holds big-endian `offset << 8 | sector_count` locations, sector 1 holds modification
/// timestamps. Writes are buffered until `flush_to_disk`, which rewrites the file compactly.
pub struct RegionFile {
    path: PathBuf,
    locations: Vec<u32>,
    timestamps: Vec<u32>,
    pending: HashMap<usize, Vec<u8>>,
}

impl RegionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RegionFile {
            path: path.into(),
            locations: vec![0; CHUNKS_PER_REGION],
            timestamps: vec![0; CHUNKS_PER_REGION],
            pending: HashMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the file, creating it with an empty index when missing, and loads the index.
    pub fn initialize(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        let length = file.metadata()?.len() as usize;

        if length == 0 {
            debug!("creating region file {}", self.path.display());
            file.write_all(&vec![0u8; HEADER_SECTORS * SECTOR_SIZE])?;
            file.sync_all()?;
            self.locations.fill(0);
            self.timestamps.fill(0);
            return Ok(());
        }

        if length < HEADER_SECTORS * SECTOR_SIZE {
            return Err(WorldError::CorruptRegion(format!(
                "{} is {} bytes, shorter than its header",
                self.path.display(),
                length
            )));
        }

        let total_sectors = length.div_ceil(SECTOR_SIZE);
        for index in 0..CHUNKS_PER_REGION {
            let location = file.read_u32::<BigEndian>()?;
            let (offset, count) = split_location(location);
            if location != 0 && (offset < HEADER_SECTORS || count == 0 || offset + count > total_sectors) {
                return Err(WorldError::CorruptRegion(format!(
                    "slot {} points at sectors {}..{} of {}",
                    index,
                    offset,
                    offset + count,
                    total_sectors
                )));
            }
            self.locations[index] = location;
        }
        for index in 0..CHUNKS_PER_REGION {
            self.timestamps[index] = file.read_u32::<BigEndian>()?;
        }
        Ok(())
    }

    /// Returns the stored blob of a chunk. A damaged entry yields `CorruptRegion` or
    /// `UnsupportedCompression`, never an I/O error.
    pub fn get_chunk_bytes(&self, x: i32, z: i32) -> Result<Option<Vec<u8>>> {
        let index = slot(x, z)?;
        if let Some(bytes) = self.pending.get(&index) {
            return Ok(Some(bytes.clone()));
        }
        if self.locations[index] == 0 {
            return Ok(None);
        }
        let mut file = File::open(&self.path)?;
        self.read_stored(&mut file, index).map(Some)
    }

    /// Buffers a compressed blob; it reaches the disk on the next `flush_to_disk`.
    pub fn set_chunk_bytes(&mut self, x: i32, z: i32, bytes: Vec<u8>) -> Result<()> {
        let index = slot(x, z)?;
        if sectors_for(bytes.len()) > MAX_SECTORS_PER_CHUNK {
            return Err(WorldError::ChunkTooLarge(bytes.len()));
        }
        self.timestamps[index] = unix_time();
        self.pending.insert(index, bytes);
        Ok(())
    }

    pub fn has_chunk(&self, x: i32, z: i32) -> bool {
        slot(x, z)
            .map(|index| self.pending.contains_key(&index) || self.locations[index] != 0)
            .unwrap_or(false)
    }

    pub fn timestamp(&self, x: i32, z: i32) -> Option<u32> {
        slot(x, z).ok().map(|index| self.timestamps[index])
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Rewrites the whole file into a temporary sibling, syncs it and renames it into place.
    pub fn flush_to_disk(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut source = match File::open(&self.path) {
            Ok(file) => Some(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let mut entries: Vec<(usize, Vec<u8>)> = Vec::new();
        for index in 0..CHUNKS_PER_REGION {
            if let Some(bytes) = self.pending.get(&index) {
                entries.push((index, bytes.clone()));
            } else if self.locations[index] != 0 {
                if let Some(file) = source.as_mut() {
                    match self.read_stored(file, index) {
                        Ok(bytes) => entries.push((index, bytes)),
                        Err(e) if e.is_io() => return Err(e),
                        Err(e) => {
                            warn!("dropping unreadable slot {} of {}: {}", index, self.path.display(), e);
                            self.timestamps[index] = 0;
                        }
                    }
                }
            }
        }

        let mut locations = vec![0u32; CHUNKS_PER_REGION];
        let mut next_sector = HEADER_SECTORS;
        for (index, bytes) in &entries {
            let count = sectors_for(bytes.len());
            locations[*index] = ((next_sector as u32) << 8) | count as u32;
            next_sector += count;
        }

        let temp_path = self.path.with_extension("mca.tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            for location in &locations {
                writer.write_u32::<BigEndian>(*location)?;
            }
            for timestamp in &self.timestamps {
                writer.write_u32::<BigEndian>(*timestamp)?;
            }
            for (_, bytes) in &entries {
                writer.write_u32::<BigEndian>(bytes.len() as u32 + 1)?;
                writer.write_u8(COMPRESSION_GZIP)?;
                writer.write_all(bytes)?;
                let used = ENTRY_HEADER + bytes.len();
                let padding = sectors_for(bytes.len()) * SECTOR_SIZE - used;
                writer.write_all(&vec![0u8; padding])?;
            }
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        drop(source);
        fs::rename(&temp_path, &self.path)?;

        debug!(
            "flushed {} chunk(s) to {} ({} total)",
            self.pending.len(),
            self.path.display(),
            entries.len()
        );
        self.locations = locations;
        self.pending.clear();
        Ok(())
    }

    fn read_stored(&self, file: &mut File, index: usize) -> Result<Vec<u8>> {
        let (offset, count) = split_location(self.locations[index]);
        file.seek(SeekFrom::Start((offset * SECTOR_SIZE) as u64))?;
        let length = file.read_u32::<BigEndian>().map_err(|e| truncated(e, index))? as usize;
        if length == 0 || length + 4 > count * SECTOR_SIZE {
            return Err(WorldError::CorruptRegion(format!(
                "slot {} declares {} bytes in {} sector(s)",
                index, length, count
            )));
        }
        let compression = file.read_u8().map_err(|e| truncated(e, index))?;
        if compression != COMPRESSION_GZIP {
            return Err(WorldError::UnsupportedCompression(compression));
        }
        let mut bytes = vec![0u8; length - 1];
        file.read_exact(&mut bytes).map_err(|e| truncated(e, index))?;
        Ok(bytes)
    }
}

// a slot running past the end of the file is damaged data, not a failing disk
fn truncated(e: io::Error, index: usize) -> WorldError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        WorldError::CorruptRegion(format!("slot {} is truncated", index))
    } else {
        e.into()
    }
}

fn slot(x: i32, z: i32) -> Result<usize> {
    if !(0..REGION_SIZE).contains(&x) || !(0..REGION_SIZE).contains(&z) {
        return Err(WorldError::OutOfRegionBounds { x, z });
    }
    Ok((x + z * REGION_SIZE) as usize)
}

fn split_location(location: u32) -> (usize, usize) {
    ((location >> 8) as usize, (location & 0xff) as usize)
}

fn sectors_for(payload: usize) -> usize {
    (payload + ENTRY_HEADER).div_ceil(SECTOR_SIZE)
}

fn unix_time() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0)
}
