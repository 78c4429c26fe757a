//! Shared fixtures for unit tests.

use std::sync::Arc;

use bevy_ecs::entity::Entity;
use glam::DVec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tessera_config::Config;
use tessera_math::BlockPos;
use tessera_world::{BlockRegistry, DimensionType, VoxelWorld, WorldBorder, ids};
use uuid::Uuid;

use crate::components::EntityCore;
use crate::context::{EntityState, SimContext, WorldView};
use crate::events::{EntityEvent, EntityStatus};
use crate::living::Living;
use crate::types::EntityTypeRegistry;

pub fn victim() -> Entity {
    Entity::from_raw(1)
}

pub fn attacker() -> Entity {
    Entity::from_raw(2)
}

/// A fresh entity of a builtin type standing at `(0.5, 64, 0.5)`.
pub fn state(key: &str) -> EntityState {
    state_at(key, DVec3::new(0.5, 64.0, 0.5))
}

pub fn state_at(key: &str, position: DVec3) -> EntityState {
    let kind = EntityTypeRegistry::builtin()
        .get(key)
        .unwrap_or_else(|| panic!("no builtin type {key}"));
    let living = kind.living.as_ref().map(Living::new);
    let core = EntityCore::new(kind, Uuid::nil(), position, 300);
    EntityState {
        core,
        living,
        shield: None,
        protection: None,
    }
}

/// Overworld with a stone floor whose top face is at `floor_top`.
pub fn flat_world(floor_top: i32) -> VoxelWorld {
    let mut world = VoxelWorld::new(Arc::new(BlockRegistry::standard()), &DimensionType::overworld());
    world
        .fill(
            BlockPos::new(-16, floor_top - 1, -16),
            BlockPos::new(16, floor_top - 1, 16),
            ids::STONE,
        )
        .unwrap();
    world
}

/// Config, clock, randomness and outbox for driving simulation code directly.
pub struct Harness {
    pub config: Config,
    pub rng: ChaCha8Rng,
    pub events: Vec<EntityEvent>,
    pub game_time: u64,
    pub border: WorldBorder,
    pub dimension: DimensionType,
    pub raining: bool,
    pub entity_shapes: Vec<tessera_math::Aabb>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            rng: ChaCha8Rng::seed_from_u64(7),
            events: Vec::new(),
            game_time: 1000,
            border: WorldBorder::default(),
            dimension: DimensionType::overworld(),
            raining: false,
            entity_shapes: Vec::new(),
        }
    }

    pub fn cx(&mut self) -> SimContext<'_> {
        SimContext {
            entity: victim(),
            config: &self.config,
            game_time: self.game_time,
            rng: &mut self.rng,
            events: &mut self.events,
        }
    }

    /// View and context over `level` at the same time.
    pub fn split<'a>(&'a mut self, level: &'a VoxelWorld) -> (WorldView<'a>, SimContext<'a>) {
        let view = WorldView {
            level,
            border: &self.border,
            dimension: &self.dimension,
            raining: self.raining,
            entity_shapes: &self.entity_shapes,
        };
        let cx = SimContext {
            entity: victim(),
            config: &self.config,
            game_time: self.game_time,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        (view, cx)
    }

    pub fn statuses(&self) -> Vec<EntityStatus> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EntityEvent::Status { status, .. } => Some(*status),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&EntityEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}
