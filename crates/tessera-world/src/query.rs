//! Read/write interfaces the entity simulation uses to see the world.
//!
//! Every read returns `Result` so that a corrupt or missing section surfaces
//! as an error for the entity being ticked instead of as bogus geometry.

use tessera_math::{Aabb, BlockPos};

use crate::block::{BlockDef, BlockId, BlockRegistry};
use crate::error::WorldError;
use crate::fluid::{FluidState, compute_fluid_state};

/// Block lookup.
pub trait BlockGetter {
    fn registry(&self) -> &BlockRegistry;

    fn block(&self, pos: BlockPos) -> Result<BlockId, WorldError>;

    /// Lowest buildable y.
    fn min_y(&self) -> i32;

    /// One past the highest buildable y.
    fn max_y(&self) -> i32;

    fn block_def(&self, pos: BlockPos) -> Result<&BlockDef, WorldError> {
        let id = self.block(pos)?;
        self.registry()
            .get(id)
            .ok_or(WorldError::UnknownBlock { id, pos })
    }
}

/// Fluid lookup.
pub trait FluidGetter: BlockGetter {
    fn fluid_state(&self, pos: BlockPos) -> Result<FluidState, WorldError> {
        compute_fluid_state(self, pos)
    }
}

/// Voxel collision shapes.
pub trait CollisionGetter: BlockGetter {
    /// Every block shape intersecting `region`.
    fn block_collisions(&self, region: &Aabb) -> Result<Vec<Aabb>, WorldError> {
        let mut shapes = Vec::new();
        if region.is_degenerate() || !region.is_finite() {
            return Ok(shapes);
        }
        let (lo, hi) = region.block_range();
        let y_lo = lo.y.max(self.min_y());
        let y_hi = hi.y.min(self.max_y());
        for x in lo.x..hi.x {
            for y in y_lo..y_hi {
                for z in lo.z..hi.z {
                    let pos = BlockPos::new(x, y, z);
                    let def = self.block_def(pos)?;
                    shapes.extend(
                        def.shape
                            .world_boxes(pos)
                            .into_iter()
                            .filter(|b| b.intersects(region)),
                    );
                }
            }
        }
        Ok(shapes)
    }
}

/// Surface heightmap.
pub trait HeightmapGetter: BlockGetter {
    /// One above the highest motion-blocking or fluid cell in the column,
    /// or `min_y` for an empty column.
    fn surface_height(&self, x: i32, z: i32) -> Result<i32, WorldError> {
        for y in (self.min_y()..self.max_y()).rev() {
            let def = self.block_def(BlockPos::new(x, y, z))?;
            if def.blocks_motion() || def.fluid.is_some() {
                return Ok(y + 1);
            }
        }
        Ok(self.min_y())
    }
}

/// Lookup of nether portal blocks by proximity.
pub trait PortalIndex {
    /// Portal blocks within a square horizontal `radius` of `center`.
    fn portals_within(&self, center: BlockPos, radius: i32) -> Result<Vec<BlockPos>, WorldError>;
}

/// Block mutation, used to build portals and arrival platforms.
pub trait LevelWriter {
    fn set_block(&mut self, pos: BlockPos, id: BlockId) -> Result<(), WorldError>;
}

/// Everything a region needs from its geometry backend.
pub trait Level:
    FluidGetter + CollisionGetter + HeightmapGetter + PortalIndex + LevelWriter + Send + Sync
{
}

impl<T> Level for T where
    T: FluidGetter + CollisionGetter + HeightmapGetter + PortalIndex + LevelWriter + Send + Sync
{
}
