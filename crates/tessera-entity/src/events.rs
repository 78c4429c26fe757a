//! Outbound notifications produced by ticks and damage.
//!
//! The simulation never calls into presentation or AI code. Everything the
//! outside world may care about is appended to the region outbox as an
//! [`EntityEvent`] and matched on by the driver.

use bevy_ecs::entity::Entity;
use glam::DVec3;
use tessera_world::DimensionKind;

use crate::components::RemovalReason;

/// Status bytes broadcast to observers of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntityStatus {
    Hurt = 2,
    Death = 3,
    ShieldBlock = 29,
    ShieldDisable = 30,
    Thorns = 33,
    TotemUsed = 35,
    HurtDrown = 36,
    HurtBurn = 37,
    HurtFreeze = 57,
    DeathPoof = 60,
}

impl EntityStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sound {
    Step,
    Swim,
    Splash,
    FallSmall,
    FallBig,
    Hurt,
    Death,
    Burn,
    Extinguish,
    ShieldBlock,
    ShieldBreak,
    TotemUse,
    PortalTravel,
}

/// Vibration-style world notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameEventKind {
    Step,
    Swim,
    HitGround,
    EntityDamaged,
    EntityKilled,
    Teleport,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityEvent {
    Status {
        entity: Entity,
        status: EntityStatus,
    },
    Sound {
        entity: Entity,
        sound: Sound,
        volume: f32,
    },
    GameEvent {
        entity: Entity,
        kind: GameEventKind,
        position: DVec3,
    },
    /// Forced relocation; any pathing toward the old position is stale.
    PathStop { entity: Entity },
    Removed {
        entity: Entity,
        reason: RemovalReason,
    },
    LootDropped {
        entity: Entity,
        killer: Option<Entity>,
    },
    KillCredited {
        killer: Entity,
        victim: Entity,
        score: i32,
    },
    /// The portal timer expired or an end portal was touched.
    PortalTransfer {
        entity: Entity,
        destination: DimensionKind,
    },
}

impl EntityEvent {
    /// The entity the event is about.
    pub fn entity(&self) -> Entity {
        match self {
            EntityEvent::Status { entity, .. }
            | EntityEvent::Sound { entity, .. }
            | EntityEvent::GameEvent { entity, .. }
            | EntityEvent::PathStop { entity }
            | EntityEvent::Removed { entity, .. }
            | EntityEvent::LootDropped { entity, .. }
            | EntityEvent::PortalTransfer { entity, .. } => *entity,
            EntityEvent::KillCredited { victim, .. } => *victim,
        }
    }
}
