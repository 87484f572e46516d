use crate::block::{Block, Material};
use crate::block_update::BlockUpdate;
use crate::chunk::{Chunk, CHUNK_HEIGHT};
use crate::entity::FallingBlock;
use crate::region::{ChunkRef, Region};
use crate::scheduler::BlockUpdateScheduler;
use crate::world::World;
use dashmap::DashMap;
use futures::future::join_all;
use lodestone_common::{region_local, BlockPos, Result, WorldConfig, REGION_SIZE};
use log::{debug, error, info};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Ticking {
    runtime: Handle,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

/// A world made of regions that are opened on first use.
pub struct Dimension {
    me: Weak<Dimension>,
    config: WorldConfig,
    regions: DashMap<(i32, i32), Arc<Region>>,
    ticking: Mutex<Option<Ticking>>,
}

impl Dimension {
    pub fn new(config: WorldConfig) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new_cyclic(|me| Dimension {
            me: me.clone(),
            config,
            regions: DashMap::new(),
            ticking: Mutex::new(None),
        }))
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns region (x, z), opening its file on first use. Regions opened while the dimension
    /// is ticking get a ticker of their own.
    pub fn region(&self, x: i32, z: i32) -> Result<Arc<Region>> {
        if let Some(region) = self.regions.get(&(x, z)) {
            return Ok(region.value().clone());
        }

        let mut opened = false;
        let region = self
            .regions
            .entry((x, z))
            .or_try_insert_with(|| {
                opened = true;
                Region::open(x, z, &self.config).map(Arc::new)
            })?
            .value()
            .clone();

        if opened {
            if let Some(ticking) = self.ticking.lock().as_mut() {
                if let Some(handle) = self.spawn_scheduler(&region, ticking) {
                    ticking.handles.push(handle);
                }
            }
        }
        Ok(region)
    }

    pub fn loaded_region(&self, x: i32, z: i32) -> Option<Arc<Region>> {
        self.regions.get(&(x, z)).map(|region| region.value().clone())
    }

    pub fn regions(&self) -> Vec<Arc<Region>> {
        self.regions.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn region_for_block(&self, position: BlockPos) -> Result<Arc<Region>> {
        self.region(position.region_x(), position.region_z())
    }

    pub fn get_chunk(&self, chunk_x: i32, chunk_z: i32) -> Result<Option<ChunkRef>> {
        let region = self.region(chunk_x.div_euclid(REGION_SIZE), chunk_z.div_euclid(REGION_SIZE))?;
        let (x, z) = region_local(chunk_x, chunk_z);
        region.get_chunk(x, z)
    }

    pub fn set_chunk(&self, chunk: Chunk) -> Result<ChunkRef> {
        let region = self.region(
            chunk.x().div_euclid(REGION_SIZE),
            chunk.z().div_euclid(REGION_SIZE),
        )?;
        region.set_chunk(chunk)
    }

    /// Flushes every open region.
    pub fn save_all(&self) -> Result<()> {
        for region in self.regions() {
            region.flush()?;
        }
        Ok(())
    }

    /// Scheduler for one region, ticking against this dimension.
    pub fn scheduler(&self, region: Arc<Region>) -> Option<BlockUpdateScheduler<Dimension>> {
        let world = self.me.upgrade()?;
        Some(BlockUpdateScheduler::new(region, world, self.config.tick_period()))
    }

    /// Starts one ticker per open region, and per region opened later, until `stop_ticking` or
    /// until `cancel` fires.
    pub fn start_ticking(&self, runtime: Handle, cancel: CancellationToken) {
        let mut guard = self.ticking.lock();
        if guard.is_some() {
            return;
        }

        let mut ticking = Ticking {
            runtime,
            cancel,
            handles: Vec::new(),
        };
        for region in self.regions() {
            if let Some(handle) = self.spawn_scheduler(&region, &ticking) {
                ticking.handles.push(handle);
            }
        }
        info!("started {} region ticker(s)", ticking.handles.len());
        *guard = Some(ticking);
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking.lock().is_some()
    }

    /// Cancels all tickers and waits for them to finish their current tick.
    pub async fn stop_ticking(&self) {
        let ticking = self.ticking.lock().take();
        if let Some(ticking) = ticking {
            ticking.cancel.cancel();
            for result in join_all(ticking.handles).await {
                if let Err(e) = result {
                    error!("region ticker failed: {}", e);
                }
            }
        }
    }

    fn spawn_scheduler(&self, region: &Arc<Region>, ticking: &Ticking) -> Option<JoinHandle<()>> {
        let scheduler = self.scheduler(region.clone())?;
        Some(scheduler.spawn(&ticking.runtime, ticking.cancel.child_token()))
    }

    fn write_block(&self, position: BlockPos, block: Block) -> Result<bool> {
        if !(0..CHUNK_HEIGHT as i32).contains(&position.y) {
            return Ok(false);
        }
        let region = self.region_for_block(position)?;
        let (chunk_x, chunk_z) = region_local(position.chunk_x(), position.chunk_z());
        let chunk = match region.get_chunk(chunk_x, chunk_z)? {
            Some(chunk) => chunk,
            None => return Ok(false),
        };
        let (x, y, z) = position.chunk_local();
        chunk.write().set_block(x, y, z, block)?;
        region.mark_dirty();
        Ok(true)
    }

    fn read_block(&self, position: BlockPos) -> Result<Option<Block>> {
        if !(0..CHUNK_HEIGHT as i32).contains(&position.y) {
            return Ok(None);
        }
        let region = self.region_for_block(position)?;
        let (chunk_x, chunk_z) = region_local(position.chunk_x(), position.chunk_z());
        let chunk = match region.get_chunk(chunk_x, chunk_z)? {
            Some(chunk) => chunk,
            None => return Ok(None),
        };
        let (x, y, z) = position.chunk_local();
        let block = chunk.read().get_block(x, y, z)?;
        Ok(Some(block))
    }
}

impl World for Dimension {
    fn get_block(&self, position: BlockPos) -> Option<Block> {
        match self.read_block(position) {
            Ok(block) => block,
            Err(e) => {
                error!("failed to read block at {}: {}", position, e);
                None
            }
        }
    }

    fn set_block(&self, position: BlockPos, block: Block) {
        match self.write_block(position, block) {
            Ok(true) => self.schedule_block_update(BlockUpdate::new(position, block)),
            Ok(false) => debug!("ignoring write to unloaded block {}", position),
            Err(e) => error!("failed to set block at {}: {}", position, e),
        }
    }

    fn set_block_untracked(&self, position: BlockPos, block: Block) {
        if let Err(e) = self.write_block(position, block) {
            error!("failed to set block at {}: {}", position, e);
        }
    }

    fn schedule_block_update(&self, update: BlockUpdate) {
        match self.region_for_block(update.position) {
            Ok(region) => region.add_block_update(update),
            Err(e) => error!("dropping block update at {}: {}", update.position, e),
        }
    }

    fn spawn_falling_block(&self, position: BlockPos, material: Material) {
        match self.region_for_block(position) {
            Ok(region) => {
                let entity = Arc::new(FallingBlock::new(position, material));
                debug!("spawned falling {} at {}", material, position);
                region.add_entity(entity);
            }
            Err(e) => error!("cannot spawn falling block at {}: {}", position, e),
        }
    }

    fn destroy_entity(&self, id: Uuid) {
        for region in self.regions() {
            if region.remove_entity(id).is_some() {
                return;
            }
        }
    }
}
