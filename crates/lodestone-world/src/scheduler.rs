use crate::physics;
use crate::region::Region;
use crate::world::World;
use futures::future::join_all;
use log::{info, trace};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// What a single tick step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub entities_ticked: usize,
    pub executed: usize,
    pub deferred: usize,
    pub neighbor_notifications: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        *self == TickReport::default()
    }
}

/// Drives the entities and pending block updates of one region.
pub struct BlockUpdateScheduler<W: World + 'static> {
    region: Arc<Region>,
    world: Arc<W>,
    period: Duration,
}

impl<W: World + 'static> BlockUpdateScheduler<W> {
    pub fn new(region: Arc<Region>, world: Arc<W>, period: Duration) -> Self {
        BlockUpdateScheduler {
            region,
            world,
            period,
        }
    }

    pub fn region(&self) -> &Arc<Region> {
        &self.region
    }

    /// One tick: entities first, then the drained update batch, then neighbour follow-ups.
    pub async fn tick(&self) -> TickReport {
        let world: &dyn World = self.world.as_ref();
        let mut report = TickReport::default();

        let entities = self.region.entities();
        report.entities_ticked = entities.len();
        join_all(entities.iter().map(|entity| entity.tick(world))).await;

        let mut delayed = Vec::new();
        let mut notify = Vec::new();
        for mut update in self.region.drain_block_updates() {
            if update.delay > 0 {
                update.delay -= 1;
                delayed.push(update);
                continue;
            }
            report.executed += 1;
            if physics::handle_block_update(world, &update) {
                notify.push(update.position);
            }
        }

        report.deferred = delayed.len();
        for update in delayed {
            self.region.add_block_update(update);
        }

        report.neighbor_notifications = notify.len();
        for position in notify {
            physics::notify_neighbors(world, position);
        }

        report
    }

    /// Ticks at a fixed rate until `cancel` fires. Cancellation is observed between ticks only.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "ticking region ({}, {}) every {:?}",
            self.region.x(),
            self.region.z(),
            self.period
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let report = self.tick().await;
                    if !report.is_idle() {
                        trace!("region ({}, {}) tick: {:?}", self.region.x(), self.region.z(), report);
                    }
                }
            }
        }

        info!("stopped ticking region ({}, {})", self.region.x(), self.region.z());
    }

    pub fn spawn(self, runtime: &tokio::runtime::Handle, cancel: CancellationToken) -> JoinHandle<()> {
        runtime.spawn(self.run(cancel))
    }
}
