//! In-memory voxel storage: 16³ sections keyed by [`SectionPos`].
//!
//! [`VoxelWorld`] implements every query trait in [`crate::query`]. Cells in
//! sections that were never written read as air; writes allocate sections on
//! demand. Nether portal blocks are indexed on write so portal searches never
//! scan terrain.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tessera_math::BlockPos;

use crate::block::{BlockId, BlockRegistry, PortalKind, ids};
use crate::dimension::DimensionType;
use crate::error::WorldError;
use crate::query::{
    BlockGetter, CollisionGetter, FluidGetter, HeightmapGetter, LevelWriter, PortalIndex,
};

/// Edge length of a section in cells.
pub const SECTION_SIZE: i32 = 16;
const SECTION_VOLUME: usize = (SECTION_SIZE * SECTION_SIZE * SECTION_SIZE) as usize;

/// Identifies a section in the section grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl SectionPos {
    /// Section containing `pos` and the cell's index inside it.
    pub fn of(pos: BlockPos) -> (SectionPos, usize) {
        let section = SectionPos {
            x: pos.x.div_euclid(SECTION_SIZE),
            y: pos.y.div_euclid(SECTION_SIZE),
            z: pos.z.div_euclid(SECTION_SIZE),
        };
        let lx = pos.x.rem_euclid(SECTION_SIZE) as usize;
        let ly = pos.y.rem_euclid(SECTION_SIZE) as usize;
        let lz = pos.z.rem_euclid(SECTION_SIZE) as usize;
        let size = SECTION_SIZE as usize;
        (section, (ly * size + lz) * size + lx)
    }
}

/// Dense block storage for one section.
#[derive(Clone, Debug)]
struct Section {
    blocks: Box<[BlockId]>,
    non_air: u16,
}

impl Section {
    fn new() -> Self {
        Self {
            blocks: vec![ids::AIR; SECTION_VOLUME].into_boxed_slice(),
            non_air: 0,
        }
    }

    fn get(&self, index: usize) -> BlockId {
        self.blocks.get(index).copied().unwrap_or(ids::AIR)
    }

    /// Store `id` and return what was there.
    fn set(&mut self, index: usize, id: BlockId) -> BlockId {
        let Some(slot) = self.blocks.get_mut(index) else {
            tracing::warn!("Section::set index out of bounds: {}", index);
            return ids::AIR;
        };
        let previous = std::mem::replace(slot, id);
        match (previous == ids::AIR, id == ids::AIR) {
            (true, false) => self.non_air += 1,
            (false, true) => self.non_air -= 1,
            _ => {}
        }
        previous
    }
}

/// Chunked voxel world for one region.
pub struct VoxelWorld {
    registry: Arc<BlockRegistry>,
    sections: FxHashMap<SectionPos, Section>,
    portals: FxHashSet<BlockPos>,
    min_y: i32,
    max_y: i32,
    /// Incremented on every successful write.
    version: u64,
}

impl VoxelWorld {
    /// Empty world spanning the dimension's buildable height.
    pub fn new(registry: Arc<BlockRegistry>, dimension: &DimensionType) -> Self {
        Self {
            registry,
            sections: FxHashMap::default(),
            portals: FxHashSet::default(),
            min_y: dimension.min_y,
            max_y: dimension.max_y(),
            version: 0,
        }
    }

    /// Fill the inclusive box spanned by `a` and `b`.
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, id: BlockId) -> Result<(), WorldError> {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    self.set_block(BlockPos::new(x, y, z), id)?;
                }
            }
        }
        Ok(())
    }

    pub fn shared_registry(&self) -> Arc<BlockRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn is_nether_portal(&self, id: BlockId) -> bool {
        self.registry
            .get(id)
            .is_some_and(|def| matches!(def.portal, Some(PortalKind::Nether(_))))
    }
}

impl BlockGetter for VoxelWorld {
    fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    fn block(&self, pos: BlockPos) -> Result<BlockId, WorldError> {
        if pos.y < self.min_y || pos.y >= self.max_y {
            return Ok(ids::AIR);
        }
        let (section, index) = SectionPos::of(pos);
        Ok(self
            .sections
            .get(&section)
            .map_or(ids::AIR, |s| s.get(index)))
    }

    fn min_y(&self) -> i32 {
        self.min_y
    }

    fn max_y(&self) -> i32 {
        self.max_y
    }
}

impl FluidGetter for VoxelWorld {}
impl CollisionGetter for VoxelWorld {}
impl HeightmapGetter for VoxelWorld {}

impl PortalIndex for VoxelWorld {
    fn portals_within(&self, center: BlockPos, radius: i32) -> Result<Vec<BlockPos>, WorldError> {
        let mut found: Vec<BlockPos> = self
            .portals
            .iter()
            .filter(|p| (p.x - center.x).abs() <= radius && (p.z - center.z).abs() <= radius)
            .copied()
            .collect();
        found.sort_unstable();
        Ok(found)
    }
}

impl LevelWriter for VoxelWorld {
    fn set_block(&mut self, pos: BlockPos, id: BlockId) -> Result<(), WorldError> {
        if pos.y < self.min_y || pos.y >= self.max_y {
            return Err(WorldError::OutOfHeight {
                y: pos.y,
                min_y: self.min_y,
                max_y: self.max_y,
            });
        }
        if self.registry.get(id).is_none() {
            return Err(WorldError::UnknownBlock { id, pos });
        }
        let (section, index) = SectionPos::of(pos);
        let previous = self
            .sections
            .entry(section)
            .or_insert_with(Section::new)
            .set(index, id);

        if self.is_nether_portal(id) {
            self.portals.insert(pos);
        } else if self.is_nether_portal(previous) {
            self.portals.remove(&pos);
        }
        self.version += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
