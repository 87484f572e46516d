use crate::block_update::BlockUpdate;
use crate::chunk::Chunk;
use crate::codec::ChunkCodec;
use crate::entity::Entity;
use crate::region_file::{RegionFile, CHUNKS_PER_REGION};
use dashmap::DashMap;
use lodestone_common::{region_local, BlockPos, Result, WorldConfig, WorldError, REGION_SIZE};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub type ChunkRef = Arc<RwLock<Chunk>>;

/// Cache state of one chunk column.
#[derive(Clone, Default)]
pub enum ChunkSlot {
    /// The region file has not been consulted yet.
    #[default]
    NotLoaded,
    Loaded(ChunkRef),
    /// The region file holds no usable chunk for this column.
    Absent,
}

/// 32x32 chunk columns backed by one region file, plus the pending block updates and live
/// entities inside them.
///
/// The pending-update map is safe for concurrent producers while the scheduler drains it. A draining
/// pass removes entries one by one, so an update inserted during the drain may run in the current
/// tick or the next one. Updates at different positions run in no particular order.
pub struct Region {
    x: i32,
    z: i32,
    codec: ChunkCodec,
    chunks: Mutex<Vec<ChunkSlot>>,
    region_file: Mutex<RegionFile>,
    block_updates: DashMap<BlockPos, BlockUpdate>,
    entities: DashMap<Uuid, Arc<dyn Entity>>,
    dirty: AtomicBool,
}

impl Region {
    /// Opens (or creates) the region file for region (x, z) under the configured world directory.
    pub fn open(x: i32, z: i32, config: &WorldConfig) -> Result<Self> {
        let mut region_file = RegionFile::new(config.region_path(x, z));
        region_file.initialize()?;
        info!("opened region ({}, {}) at {}", x, z, region_file.path().display());

        Ok(Region {
            x,
            z,
            codec: ChunkCodec::from_config(config),
            chunks: Mutex::new(vec![ChunkSlot::NotLoaded; CHUNKS_PER_REGION]),
            region_file: Mutex::new(region_file),
            block_updates: DashMap::new(),
            entities: DashMap::new(),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn contains_chunk(&self, chunk_x: i32, chunk_z: i32) -> bool {
        chunk_x.div_euclid(REGION_SIZE) == self.x && chunk_z.div_euclid(REGION_SIZE) == self.z
    }

    /// Returns the chunk at region-relative coordinates, loading it from the region file on the
    /// first access. Chunks that fail to decode are treated as never generated.
    pub fn get_chunk(&self, x: i32, z: i32) -> Result<Option<ChunkRef>> {
        let index = slot_index(x, z)?;
        let mut chunks = self.chunks.lock();
        match &chunks[index] {
            ChunkSlot::Loaded(chunk) => return Ok(Some(chunk.clone())),
            ChunkSlot::Absent => return Ok(None),
            ChunkSlot::NotLoaded => {}
        }

        // the slot lock is held across the load, so concurrent misses load once
        let bytes = self.region_file.lock().get_chunk_bytes(x, z);
        let slot = match bytes {
            Ok(None) => ChunkSlot::Absent,
            Err(e) if e.is_io() => return Err(e),
            Err(e) => {
                warn!(
                    "chunk ({}, {}) of region ({}, {}) has a damaged entry, treating it as not generated: {}",
                    x, z, self.x, self.z, e
                );
                ChunkSlot::Absent
            }
            Ok(Some(bytes)) => match self.codec.decode(&bytes) {
                Ok(chunk) => ChunkSlot::Loaded(Arc::new(RwLock::new(chunk))),
                Err(e) if e.is_io() => return Err(e),
                Err(e) => {
                    warn!(
                        "chunk ({}, {}) of region ({}, {}) is unreadable, treating it as not generated: {}",
                        x, z, self.x, self.z, e
                    );
                    ChunkSlot::Absent
                }
            },
        };

        chunks[index] = slot.clone();
        Ok(match slot {
            ChunkSlot::Loaded(chunk) => Some(chunk),
            _ => None,
        })
    }

    /// Installs a chunk, replacing whatever the cache held for its column.
    pub fn set_chunk(&self, chunk: Chunk) -> Result<ChunkRef> {
        if !self.contains_chunk(chunk.x(), chunk.z()) {
            return Err(WorldError::OutOfRegionBounds {
                x: chunk.x(),
                z: chunk.z(),
            });
        }
        let (x, z) = region_local(chunk.x(), chunk.z());
        let chunk = Arc::new(RwLock::new(chunk));
        self.chunks.lock()[slot_index(x, z)?] = ChunkSlot::Loaded(chunk.clone());
        self.mark_dirty();
        Ok(chunk)
    }

    /// Writes the chunk back to the region file and drops it from the cache.
    pub fn unload_chunk(&self, x: i32, z: i32) -> Result<bool> {
        let index = slot_index(x, z)?;
        let mut chunks = self.chunks.lock();
        let chunk = match &chunks[index] {
            ChunkSlot::Loaded(chunk) => chunk.clone(),
            _ => return Ok(false),
        };

        let bytes = self.codec.encode(&chunk.read())?;
        let mut region_file = self.region_file.lock();
        region_file.set_chunk_bytes(x, z, bytes)?;
        region_file.flush_to_disk()?;
        chunks[index] = ChunkSlot::NotLoaded;
        debug!("unloaded chunk ({}, {}) of region ({}, {})", x, z, self.x, self.z);
        Ok(true)
    }

    pub fn loaded_chunks(&self) -> Vec<ChunkRef> {
        self.chunks
            .lock()
            .iter()
            .filter_map(|slot| match slot {
                ChunkSlot::Loaded(chunk) => Some(chunk.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn generated_chunks(&self) -> Vec<ChunkRef> {
        self.loaded_chunks()
            .into_iter()
            .filter(|chunk| chunk.read().is_generated)
            .collect()
    }

    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks
            .lock()
            .iter()
            .filter(|slot| matches!(slot, ChunkSlot::Loaded(_)))
            .count()
    }

    /// Serializes every loaded chunk into the region file and persists it. Must not overlap a
    /// tick of this region.
    pub fn flush(&self) -> Result<()> {
        let chunks = self.loaded_chunks();
        let mut encoded = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let chunk = chunk.read();
            let (x, z) = region_local(chunk.x(), chunk.z());
            encoded.push((x, z, self.codec.encode(&chunk)?));
        }

        let mut region_file = self.region_file.lock();
        for (x, z, bytes) in encoded {
            region_file.set_chunk_bytes(x, z, bytes)?;
        }
        region_file.flush_to_disk()?;
        self.dirty.store(false, Ordering::Release);
        info!("saved {} chunk(s) of region ({}, {})", chunks.len(), self.x, self.z);
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Queues an update, replacing any update still pending at the same position.
    pub fn add_block_update(&self, update: BlockUpdate) {
        self.block_updates.insert(update.position, update);
    }

    /// Removes and returns every pending update.
    pub fn drain_block_updates(&self) -> Vec<BlockUpdate> {
        let positions: Vec<BlockPos> = self.block_updates.iter().map(|entry| *entry.key()).collect();
        positions
            .into_iter()
            .filter_map(|position| self.block_updates.remove(&position).map(|(_, update)| update))
            .collect()
    }

    pub fn pending_update(&self, position: BlockPos) -> Option<BlockUpdate> {
        self.block_updates.get(&position).map(|entry| *entry.value())
    }

    pub fn pending_update_count(&self) -> usize {
        self.block_updates.len()
    }

    pub fn add_entity(&self, entity: Arc<dyn Entity>) {
        self.entities.insert(entity.id(), entity);
    }

    pub fn remove_entity(&self, id: Uuid) -> Option<Arc<dyn Entity>> {
        self.entities.remove(&id).map(|(_, entity)| entity)
    }

    /// Snapshot of the live entities.
    pub fn entities(&self) -> Vec<Arc<dyn Entity>> {
        self.entities.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

fn slot_index(x: i32, z: i32) -> Result<usize> {
    if !(0..REGION_SIZE).contains(&x) || !(0..REGION_SIZE).contains(&z) {
        return Err(WorldError::OutOfRegionBounds { x, z });
    }
    Ok((x + z * REGION_SIZE) as usize)
}
