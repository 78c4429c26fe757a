//! Simulation driver errors.

use tessera_config::ConfigError;
use tessera_entity::SpawnError;
use tessera_world::{DimensionKind, WorldError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("a region for {0:?} is already loaded")]
    DuplicateRegion(DimensionKind),
    #[error("no region loaded for {0:?}")]
    UnknownRegion(DimensionKind),
    #[error("failed to spawn entity: {0}")]
    Spawn(#[from] SpawnError),
    #[error("failed to build world: {0}")]
    World(#[from] WorldError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
