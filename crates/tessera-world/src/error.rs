//! Error types for world queries and block registration.

use tessera_math::BlockPos;
use thiserror::Error;

use crate::block::BlockId;

/// A geometry, fluid or block query that could not be answered.
///
/// Entity ticks treat every variant as fatal for the entity being ticked.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    /// The cell lies in a section that is not resident.
    #[error("section containing {0} is not loaded")]
    Unloaded(BlockPos),
    /// The cell holds an id the registry does not know.
    #[error("unknown block id {id:?} at {pos}")]
    UnknownBlock { id: BlockId, pos: BlockPos },
    /// A write outside the buildable height of the region.
    #[error("y={y} outside buildable range [{min_y}, {max_y})")]
    OutOfHeight { y: i32, min_y: i32, max_y: i32 },
}

/// Errors that can occur during block registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A block with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// All 65 536 ids are in use.
    #[error("block registry is full (max 65536 blocks)")]
    RegistryFull,
}
