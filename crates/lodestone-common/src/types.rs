use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

pub type Result<T> = std::result::Result<T, crate::error::WorldError>;

pub const SECTION_SIZE: i32 = 16;
pub const REGION_SIZE: i32 = 32;

/// Integer block coordinates in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const UP: BlockPos = BlockPos::new(0, 1, 0);
    pub const DOWN: BlockPos = BlockPos::new(0, -1, 0);
    pub const FORWARDS: BlockPos = BlockPos::new(0, 0, 1);
    pub const BACKWARDS: BlockPos = BlockPos::new(0, 0, -1);
    pub const LEFT: BlockPos = BlockPos::new(-1, 0, 0);
    pub const RIGHT: BlockPos = BlockPos::new(1, 0, 0);

    /// Cardinal directions in the order liquid physics probes them.
    pub const CARDINALS: [BlockPos; 4] = [
        BlockPos::FORWARDS,
        BlockPos::BACKWARDS,
        BlockPos::LEFT,
        BlockPos::RIGHT,
    ];

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        BlockPos { x, y, z }
    }

    pub fn above(self) -> Self {
        self + BlockPos::UP
    }

    pub fn below(self) -> Self {
        self + BlockPos::DOWN
    }

    /// The four cardinal neighbours followed by the cells below and above.
    pub fn neighbors(self) -> [BlockPos; 6] {
        [
            self + BlockPos::FORWARDS,
            self + BlockPos::BACKWARDS,
            self + BlockPos::LEFT,
            self + BlockPos::RIGHT,
            self.below(),
            self.above(),
        ]
    }

    pub fn chunk_x(self) -> i32 {
        self.x.div_euclid(SECTION_SIZE)
    }

    pub fn chunk_z(self) -> i32 {
        self.z.div_euclid(SECTION_SIZE)
    }

    pub fn region_x(self) -> i32 {
        self.chunk_x().div_euclid(REGION_SIZE)
    }

    pub fn region_z(self) -> i32 {
        self.chunk_z().div_euclid(REGION_SIZE)
    }

    /// Coordinates inside the owning chunk column: x and z in `0..16`, y unchanged.
    pub fn chunk_local(self) -> (i32, i32, i32) {
        (
            self.x.rem_euclid(SECTION_SIZE),
            self.y,
            self.z.rem_euclid(SECTION_SIZE),
        )
    }

    pub fn to_position(self) -> Position {
        Position::new(self.x as f64, self.y as f64, self.z as f64)
    }
}

impl Add for BlockPos {
    type Output = BlockPos;

    fn add(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;

    fn sub(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Chunk column coordinates relative to the owning region, both in `0..32`.
pub fn region_local(chunk_x: i32, chunk_z: i32) -> (i32, i32) {
    (chunk_x.rem_euclid(REGION_SIZE), chunk_z.rem_euclid(REGION_SIZE))
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z }
    }

    pub fn block_pos(self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }

    pub fn scale(self, factor: f64) -> Self {
        Position::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}
