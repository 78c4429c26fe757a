//! Static world state the entity simulation runs against: block definitions,
//! fluids, the world border, dimension descriptors, the query traits entity
//! code is written against, an in-memory [`VoxelWorld`] backend and portal
//! geometry.

pub mod block;
pub mod border;
pub mod dimension;
pub mod error;
pub mod fluid;
pub mod portal;
pub mod query;
pub mod storage;

pub use block::{BlockDef, BlockId, BlockRegistry, BlockShape, FluidContent, PortalKind, ids};
pub use border::WorldBorder;
pub use dimension::{DimensionKind, DimensionType};
pub use error::{RegistryError, WorldError};
pub use fluid::{FluidKind, FluidState};
pub use portal::{FoundRectangle, PortalExit};
pub use query::{
    BlockGetter, CollisionGetter, FluidGetter, HeightmapGetter, Level, LevelWriter, PortalIndex,
};
pub use storage::VoxelWorld;
