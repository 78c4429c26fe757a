//! Block registry: maps compact [`BlockId`] values to [`BlockDef`] properties
//! that the entity simulation reacts to.
//!
//! The registry is built once per process and shared by every region. Air is
//! always id 0 so that freshly allocated sections are empty space.

use std::collections::HashMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tessera_math::{Aabb, Axis, BlockPos};

use crate::error::RegistryError;
use crate::fluid::FluidKind;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact identifier stored in every voxel cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockId(pub u16);

/// Ids of the blocks registered by [`BlockRegistry::standard`].
pub mod ids {
    use super::BlockId;

    pub const AIR: BlockId = BlockId(0);
    pub const STONE: BlockId = BlockId(1);
    pub const DIRT: BlockId = BlockId(2);
    pub const GRASS_BLOCK: BlockId = BlockId(3);
    pub const BEDROCK: BlockId = BlockId(4);
    pub const OBSIDIAN: BlockId = BlockId(5);
    pub const HAY_BLOCK: BlockId = BlockId(6);
    pub const SLIME_BLOCK: BlockId = BlockId(7);
    pub const SOUL_SAND: BlockId = BlockId(8);
    pub const ICE: BlockId = BlockId(9);
    pub const STONE_SLAB: BlockId = BlockId(10);
    pub const FIRE: BlockId = BlockId(11);
    pub const POWDER_SNOW: BlockId = BlockId(12);
    pub const NETHER_PORTAL_X: BlockId = BlockId(13);
    pub const NETHER_PORTAL_Z: BlockId = BlockId(14);
    pub const END_PORTAL: BlockId = BlockId(15);
    pub const WATER: BlockId = BlockId(16);
    pub const LAVA: BlockId = BlockId(17);
}

/// Collision geometry of one cell, in cell-local `[0, 1]` coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BlockShape {
    /// Nothing to collide with.
    Empty,
    /// The whole cube.
    Full,
    /// A union of boxes.
    Boxes(Vec<Aabb>),
}

impl BlockShape {
    /// Bottom `height` of the cube.
    pub fn lower(height: f64) -> Self {
        BlockShape::Boxes(vec![Aabb::new(DVec3::ZERO, DVec3::new(1.0, height, 1.0))])
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BlockShape::Empty => true,
            BlockShape::Full => false,
            BlockShape::Boxes(boxes) => boxes.is_empty(),
        }
    }

    /// Shape boxes placed at `pos`.
    pub fn world_boxes(&self, pos: BlockPos) -> Vec<Aabb> {
        let origin = pos.as_dvec3();
        match self {
            BlockShape::Empty => Vec::new(),
            BlockShape::Full => vec![Aabb::unit_block(pos)],
            BlockShape::Boxes(boxes) => boxes.iter().map(|b| b.translate(origin)).collect(),
        }
    }
}

/// Fluid content of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidContent {
    pub kind: FluidKind,
    /// 8 for a source, 1..=7 for flowing fluid.
    pub amount: u8,
    /// Flowing straight down from above.
    pub falling: bool,
}

/// What happens to an entity whose box overlaps a portal block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalKind {
    /// Frame-bound portal; the axis is the one the portal plane spans.
    Nether(Axis),
    /// Immediate transfer to or from the end.
    End,
}

/// Full descriptor for a block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockDef {
    /// Registry name (e.g. "stone", "water_3").
    pub name: String,
    /// Collision geometry.
    pub shape: BlockShape,
    /// Fluid held by this block, if any.
    pub fluid: Option<FluidContent>,
    /// Sets entities on fire on contact.
    pub burning: bool,
    /// Entities sink into it and freeze.
    pub powder_snow: bool,
    /// Portal behaviour on contact.
    pub portal: Option<PortalKind>,
    /// Valid nether portal frame material.
    pub portal_frame: bool,
    /// Eyes inside this block suffocate.
    pub suffocating: bool,
    /// Scales fall damage when landing on this block.
    pub fall_damage_multiplier: f32,
    /// Scales horizontal velocity of entities standing on it.
    pub speed_factor: f32,
    /// Ground friction.
    pub friction: f32,
}

impl BlockDef {
    /// Empty, non-interacting block.
    pub fn air(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shape: BlockShape::Empty,
            fluid: None,
            burning: false,
            powder_snow: false,
            portal: None,
            portal_frame: false,
            suffocating: false,
            fall_damage_multiplier: 1.0,
            speed_factor: 1.0,
            friction: 0.6,
        }
    }

    /// Full solid cube that suffocates.
    pub fn solid(name: &str) -> Self {
        Self {
            shape: BlockShape::Full,
            suffocating: true,
            ..Self::air(name)
        }
    }

    /// Fluid block with no collision.
    pub fn fluid(name: &str, kind: FluidKind, amount: u8, falling: bool) -> Self {
        Self {
            fluid: Some(FluidContent {
                kind,
                amount,
                falling,
            }),
            ..Self::air(name)
        }
    }

    pub fn is_air(&self) -> bool {
        self.shape.is_empty() && self.fluid.is_none() && !self.burning && self.portal.is_none()
            && !self.powder_snow
    }

    /// Blocks fluid flow and counts for the surface heightmap.
    pub fn blocks_motion(&self) -> bool {
        !self.shape.is_empty()
    }

    /// Solid full cube: a valid floor for portal frames.
    pub fn is_sturdy(&self) -> bool {
        self.shape == BlockShape::Full
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`BlockId`] → [`BlockDef`] with O(1) lookup by index and by name.
#[derive(Debug)]
pub struct BlockRegistry {
    /// Dense array where `index == BlockId.0`.
    defs: Vec<BlockDef>,
    name_to_id: HashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Registry holding only air at id 0.
    pub fn new() -> Self {
        let mut name_to_id = HashMap::new();
        name_to_id.insert("air".to_string(), ids::AIR);
        Self {
            defs: vec![BlockDef::air("air")],
            name_to_id,
        }
    }

    /// Registry with the blocks named in [`ids`] plus flowing fluid levels.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let defs = [
            BlockDef::solid("stone"),
            BlockDef::solid("dirt"),
            BlockDef::solid("grass_block"),
            BlockDef::solid("bedrock"),
            BlockDef {
                portal_frame: true,
                ..BlockDef::solid("obsidian")
            },
            BlockDef {
                fall_damage_multiplier: 0.2,
                ..BlockDef::solid("hay_block")
            },
            BlockDef {
                fall_damage_multiplier: 0.0,
                friction: 0.8,
                ..BlockDef::solid("slime_block")
            },
            BlockDef {
                shape: BlockShape::lower(14.0 / 16.0),
                speed_factor: 0.4,
                ..BlockDef::solid("soul_sand")
            },
            BlockDef {
                friction: 0.98,
                ..BlockDef::solid("ice")
            },
            BlockDef {
                shape: BlockShape::lower(0.5),
                suffocating: false,
                ..BlockDef::solid("stone_slab")
            },
            BlockDef {
                burning: true,
                ..BlockDef::air("fire")
            },
            BlockDef {
                powder_snow: true,
                ..BlockDef::air("powder_snow")
            },
            BlockDef {
                portal: Some(PortalKind::Nether(Axis::X)),
                ..BlockDef::air("nether_portal_x")
            },
            BlockDef {
                portal: Some(PortalKind::Nether(Axis::Z)),
                ..BlockDef::air("nether_portal_z")
            },
            BlockDef {
                portal: Some(PortalKind::End),
                ..BlockDef::air("end_portal")
            },
            BlockDef::fluid("water", FluidKind::Water, 8, false),
            BlockDef::fluid("lava", FluidKind::Lava, 8, false),
        ];
        for def in defs {
            // Names above are unique and far below the id limit.
            let _ = registry.register(def);
        }
        for kind in [FluidKind::Water, FluidKind::Lava] {
            for amount in 1..=7u8 {
                let _ = registry.register(BlockDef::fluid(
                    &format!("{}_{amount}", kind.name()),
                    kind,
                    amount,
                    false,
                ));
            }
            let _ = registry.register(BlockDef::fluid(
                &format!("{}_falling", kind.name()),
                kind,
                8,
                true,
            ));
        }
        registry
    }

    /// Registers a new block and returns its id.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] for a reused name,
    /// [`RegistryError::RegistryFull`] once all ids are taken.
    pub fn register(&mut self, def: BlockDef) -> Result<BlockId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.defs.len() > u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }
        let id = BlockId(self.defs.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.defs.push(def);
        Ok(id)
    }

    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.defs.get(id.0 as usize)
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Id of the block holding `kind` at `amount`, falling or not.
    pub fn fluid_block(&self, kind: FluidKind, amount: u8, falling: bool) -> Option<BlockId> {
        if falling {
            self.lookup_by_name(&format!("{}_falling", kind.name()))
        } else if amount >= 8 {
            self.lookup_by_name(kind.name())
        } else {
            self.lookup_by_name(&format!("{}_{amount}", kind.name()))
        }
    }

    /// Nether portal block spanning `axis`.
    pub fn nether_portal(&self, axis: Axis) -> BlockId {
        match axis {
            Axis::Z => ids::NETHER_PORTAL_Z,
            Axis::X | Axis::Y => ids::NETHER_PORTAL_X,
        }
    }

    /// Number of registered blocks, air included.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// True if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.defs.len() <= 1
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
