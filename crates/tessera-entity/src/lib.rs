//! Entity simulation core: shared entity state, the per-tick pipeline
//! (portals, fluids, fire, air, collision-resolved movement, freezing),
//! damage and death, riding, persistence records, and the [`Region`]
//! container that owns a dimension's entities.
//!
//! Per-tick logic works on a detached [`EntityState`] snapshot; a
//! [`Region`] commits the snapshot back only when the step succeeds.

pub mod attributes;
pub mod collision;
pub mod components;
pub mod context;
pub mod damage;
pub mod effects;
pub mod environment;
pub mod error;
pub mod events;
pub mod fluids;
pub mod living;
pub mod movement;
pub mod persist;
pub mod region;
pub mod riding;
pub mod tick;
pub mod transfer;
pub mod types;

#[cfg(test)]
mod test_support;

pub use attributes::{Attribute, AttributeMap, AttributeModifier, Operation};
pub use components::{
    Collidable, DeathProtection, EntityCore, EntityDimensions, Pose, RemovalReason, Rideable,
    ShieldStance,
};
pub use context::{EntityState, SimContext, WorldView};
pub use damage::{DamageKind, DamageSource};
pub use effects::{ActiveEffects, EffectInstance, MobEffect};
pub use error::{PersistError, RidingError, SpawnError, TickError, TransferError};
pub use events::{EntityEvent, EntityStatus, GameEventKind, Sound};
pub use living::Living;
pub use movement::MoverType;
pub use persist::EntityRecord;
pub use region::Region;
pub use transfer::transfer;
pub use types::{EntityType, EntityTypeRegistry};
