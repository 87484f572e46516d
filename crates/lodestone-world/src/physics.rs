//! Block physics run by the scheduler. Handlers return `true` when the six neighbours of the
//! updated position need a follow-up update.

use crate::block::{Block, Material};
use crate::block_update::BlockUpdate;
use crate::world::World;
use lodestone_common::BlockPos;

pub const SOURCE: u16 = 0;
/// Liquid states at or above this value are falling; the flow level is `state - FALLING`.
pub const FALLING: u16 = 8;
/// Flow level that never spreads sideways.
pub const TERMINAL_LEVEL: u16 = 7;

/// Runs the handler matching the update's block. Updates without a snapshot use the block
/// currently in the world.
pub fn handle_block_update(world: &dyn World, update: &BlockUpdate) -> bool {
    let block = match update.block.or_else(|| world.get_block(update.position)) {
        Some(block) => block,
        None => return false,
    };

    if block.is_fluid() {
        handle_liquid(world, update.position, block)
    } else if block.material.is_gravity_affected() {
        handle_falling_block(world, update.position, block)
    } else {
        false
    }
}

pub fn notify_neighbors(world: &dyn World, position: BlockPos) {
    for neighbor in position.neighbors() {
        world.schedule_block_update(BlockUpdate::at(neighbor));
    }
}

pub fn handle_falling_block(world: &dyn World, position: BlockPos, block: Block) -> bool {
    if !replaceable_or_fluid(world, position.below()) {
        return false;
    }
    world.set_block(position, Block::AIR);
    world.spawn_falling_block(position, block.material);
    true
}

pub fn handle_liquid(world: &dyn World, position: BlockPos, block: Block) -> bool {
    let material = block.material;
    let below = position.below();
    let mut state = block.state;

    if state == SOURCE {
        // sides that lead straight down; when some but not all do, flow toward the first one
        let paths: Vec<BlockPos> = BlockPos::CARDINALS
            .iter()
            .map(|&direction| position + direction)
            .filter(|&side| replaceable_or_fluid(world, side) && replaceable_or_fluid(world, side.below()))
            .collect();
        if !paths.is_empty() && paths.len() != BlockPos::CARDINALS.len() {
            world.set_block(paths[0], Block::with_state(material, state + 1));
            return false;
        }
    }

    if state >= FALLING {
        if let Some(above) = world.get_block(position.above()) {
            if !above.is_fluid() {
                world.set_block(position, Block::AIR);
                world.schedule_block_update(BlockUpdate::at(below));
                return false;
            }
        }

        if is_replaceable(world, below) {
            world.set_block(below, Block::with_state(material, state));
            return false;
        }

        state = 1;
        world.set_block_untracked(position, Block::with_state(material, state));
    }

    let neighbors: Vec<(BlockPos, Option<Block>)> = BlockPos::CARDINALS
        .iter()
        .map(|&direction| {
            let side = position + direction;
            (side, world.get_block(side))
        })
        .collect();

    if state == 1 && material == Material::Water {
        let sources = neighbors
            .iter()
            .filter_map(|(_, neighbor)| *neighbor)
            .filter(|neighbor| neighbor.material == material && neighbor.state == SOURCE)
            .count();
        if sources > 1 {
            world.set_block(position, Block::new(Material::Water));
            return true;
        }
    }

    if state > SOURCE {
        let lowest = neighbors
            .iter()
            .filter_map(|(_, neighbor)| *neighbor)
            .filter(|neighbor| neighbor.material == material)
            .map(|neighbor| neighbor.state)
            .fold(state, u16::min);
        let fed_from_above = world
            .get_block(position.above())
            .map(|above| above.material == material)
            .unwrap_or(false);
        if lowest >= state && !fed_from_above {
            world.set_block(position, Block::AIR);
            return true;
        }
    }

    if let Some(beneath) = world.get_block(below) {
        if beneath.material == material {
            return false;
        }
        if beneath.is_replaceable() {
            world.set_block(below, Block::with_state(material, state + FALLING));
            return false;
        }
    }

    if state == TERMINAL_LEVEL {
        return false;
    }

    for (side, neighbor) in neighbors {
        let Some(neighbor) = neighbor else {
            continue;
        };
        if neighbor.is_replaceable() || (neighbor.material == material && neighbor.state > state + 1) {
            world.set_block(side, Block::with_state(material, state + 1));
        }
    }
    false
}

fn is_replaceable(world: &dyn World, position: BlockPos) -> bool {
    world
        .get_block(position)
        .map(|block| block.is_replaceable())
        .unwrap_or(false)
}

fn replaceable_or_fluid(world: &dyn World, position: BlockPos) -> bool {
    world
        .get_block(position)
        .map(|block| block.is_replaceable() || block.is_fluid())
        .unwrap_or(false)
}
