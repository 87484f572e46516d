use crate::block::{Block, Material};
use crate::world::World;
use futures::future::BoxFuture;
use lodestone_common::{BlockPos, Position};
use parking_lot::Mutex;
use uuid::Uuid;

pub trait Entity: Send + Sync {
    fn id(&self) -> Uuid;

    fn position(&self) -> Position;

    /// Advances the entity by one tick. Entities of a region tick concurrently.
    fn tick<'a>(&'a self, world: &'a dyn World) -> BoxFuture<'a, ()>;
}

const GRAVITY: Position = Position::new(0.0, -0.02, 0.0);
const WIND_RESISTANCE: f64 = 0.98;
// lowest y a falling block may reach before it is discarded
const WORLD_FLOOR: f64 = 0.0;

#[derive(Debug, Clone, Copy)]
struct Motion {
    position: Position,
    velocity: Position,
    alive_ticks: u32,
    landed: bool,
}

/// A block falling under gravity. It becomes a block again on the first tick that finds a
/// non-air block beneath it.
pub struct FallingBlock {
    id: Uuid,
    material: Material,
    spawn_position: Position,
    motion: Mutex<Motion>,
}

impl FallingBlock {
    pub fn new(position: BlockPos, material: Material) -> Self {
        let position = position.to_position();
        FallingBlock {
            id: Uuid::new_v4(),
            material,
            spawn_position: position,
            motion: Mutex::new(Motion {
                position,
                velocity: Position::default(),
                alive_ticks: 0,
                landed: false,
            }),
        }
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn spawn_position(&self) -> Position {
        self.spawn_position
    }

    pub fn velocity(&self) -> Position {
        self.motion.lock().velocity
    }

    pub fn alive_ticks(&self) -> u32 {
        self.motion.lock().alive_ticks
    }

    fn step(&self, world: &dyn World) {
        let (beneath, landing, discarded) = {
            let mut motion = self.motion.lock();
            if motion.landed {
                return;
            }
            motion.alive_ticks += 1;
            motion.velocity = (motion.velocity + GRAVITY).scale(WIND_RESISTANCE);
            motion.position = motion.position + motion.velocity;

            let beneath = Position::new(
                motion.position.x,
                motion.position.y - 1.0,
                motion.position.z,
            )
            .block_pos();
            let landing = world
                .get_block(beneath)
                .map(|block| !block.is_air())
                .unwrap_or(false);
            let discarded = !landing && motion.position.y < WORLD_FLOOR;
            motion.landed = landing || discarded;
            (beneath, landing, discarded)
        };

        if landing {
            world.set_block(beneath.above(), Block::new(self.material));
        }
        if landing || discarded {
            world.destroy_entity(self.id);
        }
    }
}

impl Entity for FallingBlock {
    fn id(&self) -> Uuid {
        self.id
    }

    fn position(&self) -> Position {
        self.motion.lock().position
    }

    fn tick<'a>(&'a self, world: &'a dyn World) -> BoxFuture<'a, ()> {
        Box::pin(async move { self.step(world) })
    }
}
