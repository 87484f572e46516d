use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    Air,
    Stone,
    GrassBlock,
    Dirt,
    Cobblestone,
    Bedrock,
    Water,
    Lava,
    Sand,
    RedSand,
    Gravel,
    Grass,
    Snow,
    VoidAir,
    CaveAir,
}

struct MaterialEntry {
    material: Material,
    base_id: u32,
    state_count: u16,
    name: &'static str,
}

// Global state ids follow the 1.16 block registry. Each material owns `state_count` consecutive
// ids starting at `base_id`.
const REGISTRY: &[MaterialEntry] = &[
    MaterialEntry { material: Material::Air, base_id: 0, state_count: 1, name: "minecraft:air" },
    MaterialEntry { material: Material::Stone, base_id: 1, state_count: 1, name: "minecraft:stone" },
    MaterialEntry { material: Material::GrassBlock, base_id: 8, state_count: 2, name: "minecraft:grass_block" },
    MaterialEntry { material: Material::Dirt, base_id: 10, state_count: 1, name: "minecraft:dirt" },
    MaterialEntry { material: Material::Cobblestone, base_id: 14, state_count: 1, name: "minecraft:cobblestone" },
    MaterialEntry { material: Material::Bedrock, base_id: 33, state_count: 1, name: "minecraft:bedrock" },
    MaterialEntry { material: Material::Water, base_id: 34, state_count: 16, name: "minecraft:water" },
    MaterialEntry { material: Material::Lava, base_id: 50, state_count: 16, name: "minecraft:lava" },
    MaterialEntry { material: Material::Sand, base_id: 66, state_count: 1, name: "minecraft:sand" },
    MaterialEntry { material: Material::RedSand, base_id: 67, state_count: 1, name: "minecraft:red_sand" },
    MaterialEntry { material: Material::Gravel, base_id: 68, state_count: 1, name: "minecraft:gravel" },
    MaterialEntry { material: Material::Grass, base_id: 1341, state_count: 1, name: "minecraft:grass" },
    MaterialEntry { material: Material::Snow, base_id: 3921, state_count: 8, name: "minecraft:snow" },
    MaterialEntry { material: Material::VoidAir, base_id: 9915, state_count: 1, name: "minecraft:void_air" },
    MaterialEntry { material: Material::CaveAir, base_id: 9916, state_count: 1, name: "minecraft:cave_air" },
];

impl Material {
    fn entry(self) -> &'static MaterialEntry {
        // every variant has exactly one row, in declaration order
        &REGISTRY[self as usize]
    }

    pub fn base_id(self) -> u32 {
        self.entry().base_id
    }

    pub fn state_count(self) -> u16 {
        self.entry().state_count
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn from_name(name: &str) -> Option<Material> {
        REGISTRY
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.material)
    }

    pub fn is_air(self) -> bool {
        matches!(self, Material::Air | Material::VoidAir | Material::CaveAir)
    }

    pub fn is_fluid(self) -> bool {
        matches!(self, Material::Water | Material::Lava)
    }

    /// Blocks that may be overwritten by flowing liquids and falling blocks.
    pub fn is_replaceable(self) -> bool {
        self.is_air() || matches!(self, Material::Grass | Material::Snow)
    }

    pub fn is_gravity_affected(self) -> bool {
        matches!(self, Material::Sand | Material::RedSand | Material::Gravel)
    }

    pub fn is_solid(self) -> bool {
        !self.is_replaceable() && !self.is_fluid()
    }

    pub fn blocks_motion(self) -> bool {
        self.is_solid()
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A material together with its state. The global state id is `material.base_id() + state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub material: Material,
    pub state: u16,
}

impl Block {
    pub const AIR: Block = Block {
        material: Material::Air,
        state: 0,
    };

    pub fn new(material: Material) -> Self {
        Block { material, state: 0 }
    }

    /// Builds a block with an explicit state, clamped to the material's state range.
    pub fn with_state(material: Material, state: u16) -> Self {
        let max = material.state_count().saturating_sub(1);
        Block {
            material,
            state: state.min(max),
        }
    }

    pub fn state_id(&self) -> u32 {
        self.material.base_id() + self.state as u32
    }

    pub fn from_state_id(id: u32) -> Option<Block> {
        REGISTRY
            .iter()
            .find(|entry| id >= entry.base_id && id < entry.base_id + entry.state_count as u32)
            .map(|entry| Block {
                material: entry.material,
                state: (id - entry.base_id) as u16,
            })
    }

    pub fn name(&self) -> &'static str {
        self.material.name()
    }

    pub fn is_air(&self) -> bool {
        self.material.is_air()
    }

    pub fn is_fluid(&self) -> bool {
        self.material.is_fluid()
    }

    pub fn is_replaceable(&self) -> bool {
        self.material.is_replaceable()
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::AIR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_rows_match_variants() {
        for (index, entry) in REGISTRY.iter().enumerate() {
            assert_eq!(entry.material as usize, index);
        }
    }

    #[test]
    fn test_state_ids() {
        assert_eq!(Block::AIR.state_id(), 0);
        assert_eq!(Block::with_state(Material::Water, 8).state_id(), 42);
        assert_eq!(
            Block::from_state_id(42),
            Some(Block::with_state(Material::Water, 8))
        );
        assert_eq!(Block::from_state_id(66), Some(Block::new(Material::Sand)));
        assert_eq!(Block::from_state_id(2), None);
        assert_eq!(Block::with_state(Material::Stone, 3).state, 0);
    }

    #[test]
    fn test_material_flags() {
        assert!(Material::CaveAir.is_replaceable());
        assert!(Material::Grass.is_replaceable());
        assert!(!Material::Water.is_replaceable());
        assert!(Material::Lava.is_fluid());
        assert!(Material::Gravel.is_gravity_affected());
        assert!(Material::Stone.is_solid());
        assert!(!Material::Snow.blocks_motion());
        assert_eq!(Material::from_name("minecraft:red_sand"), Some(Material::RedSand));
        assert_eq!(Material::from_name("minecraft:unknown"), None);
    }
}
