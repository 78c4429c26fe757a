//! Borrowed views handed to per-entity simulation code.

use bevy_ecs::entity::Entity;
use glam::DVec3;
use rand_chacha::ChaCha8Rng;
use tessera_config::Config;
use tessera_math::Aabb;
use tessera_world::{DimensionType, Level, WorldBorder};

use crate::components::{DeathProtection, EntityCore, ShieldStance};
use crate::events::{EntityEvent, EntityStatus, GameEventKind, Sound};
use crate::living::Living;

/// Read-only surroundings of the entity being simulated.
pub struct WorldView<'a> {
    pub level: &'a dyn Level,
    pub border: &'a WorldBorder,
    pub dimension: &'a DimensionType,
    pub raining: bool,
    /// Boxes of nearby collidable entities, excluding the entity itself and
    /// anything riding the same vehicle.
    pub entity_shapes: &'a [Aabb],
}

/// Mutable per-tick services: config, clock, randomness and the outbox.
pub struct SimContext<'a> {
    pub entity: Entity,
    pub config: &'a Config,
    pub game_time: u64,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut Vec<EntityEvent>,
}

impl SimContext<'_> {
    pub fn emit(&mut self, event: EntityEvent) {
        self.events.push(event);
    }

    pub fn status(&mut self, status: EntityStatus) {
        let entity = self.entity;
        self.emit(EntityEvent::Status { entity, status });
    }

    pub fn sound(&mut self, sound: Sound, volume: f32) {
        let entity = self.entity;
        self.emit(EntityEvent::Sound {
            entity,
            sound,
            volume,
        });
    }

    pub fn game_event(&mut self, kind: GameEventKind, position: DVec3) {
        let entity = self.entity;
        self.emit(EntityEvent::GameEvent {
            entity,
            kind,
            position,
        });
    }
}

/// Working copy of one entity's components.
///
/// Ticks and damage operate on this copy; the region writes it back only
/// when the operation succeeds.
#[derive(Clone, Debug)]
pub struct EntityState {
    pub core: EntityCore,
    pub living: Option<Living>,
    pub shield: Option<ShieldStance>,
    pub protection: Option<DeathProtection>,
}

impl EntityState {
    pub fn new(core: EntityCore) -> Self {
        Self {
            core,
            living: None,
            shield: None,
            protection: None,
        }
    }

    pub fn is_living(&self) -> bool {
        self.living.is_some()
    }

    /// Living and already through the death transition.
    pub fn is_dead(&self) -> bool {
        self.living.as_ref().is_some_and(|l| l.dead || l.is_dead_or_dying())
    }
}
