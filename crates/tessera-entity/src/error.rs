//! Error types for entity ticks, riding, persistence, spawning and transfer.

use bevy_ecs::entity::Entity;
use glam::DVec3;
use tessera_world::WorldError;
use thiserror::Error;

/// A tick that could not complete. The entity keeps its pre-tick state.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("entity {0:?} does not exist")]
    MissingEntity(Entity),
    #[error("world query failed: {0}")]
    World(#[from] WorldError),
    #[error("bounding box became non-finite near {0:?}")]
    CorruptBounds(DVec3),
    #[error(transparent)]
    Riding(#[from] RidingError),
}

/// Vehicle/passenger graph failures.
#[derive(Debug, Error, PartialEq)]
pub enum RidingError {
    #[error("entity {0:?} does not exist")]
    MissingEntity(Entity),
    #[error("passenger link between {rider:?} and {vehicle:?} is one-sided")]
    BrokenLink { rider: Entity, vehicle: Entity },
}

/// Entity record encoding and validation failures.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to encode entity record: {0}")]
    Encode(#[source] postcard::Error),
    #[error("failed to decode entity record: {0}")]
    Decode(#[source] postcard::Error),
    #[error("record for {found} cannot be loaded into a {expected}")]
    TypeMismatch { expected: String, found: String },
    #[error("record field `{0}` is not finite")]
    NonFinite(&'static str),
}

/// Entity creation failures.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("unknown entity type `{0}`")]
    UnknownType(String),
    #[error("entity type `{0}` is already registered")]
    DuplicateType(String),
    #[error("spawn position {0:?} is not finite")]
    InvalidPosition(DVec3),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Dimension transfer failures. A transfer with no exit is `Ok(None)`, not an error.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("entity {0:?} does not exist in the source region")]
    MissingEntity(Entity),
    #[error("world query failed during transfer: {0}")]
    World(#[from] WorldError),
    #[error(transparent)]
    Riding(#[from] RidingError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}
