//! Entity-type descriptors and the registry that acts as the entity factory.
//!
//! A type carries everything that is fixed per kind of entity: its size, how
//! it reacts to fire, fluids and portals, and the base attributes of living
//! kinds. Per-instance state lives in [`crate::components`].

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::{EntityDimensions, Pose};
use crate::error::SpawnError;

/// Base values for entities that have health.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LivingTraits {
    pub max_health: f32,
    pub movement_speed: f64,
    pub armor: f64,
    pub armor_toughness: f64,
    pub knockback_resistance: f64,
    /// Never loses air under water.
    pub breathes_underwater: bool,
    /// Ignores fall damage entirely.
    pub fall_damage_immune: bool,
    /// Score awarded to the killer.
    pub death_score: i32,
}

impl Default for LivingTraits {
    fn default() -> Self {
        Self {
            max_health: 20.0,
            movement_speed: 0.1,
            armor: 0.0,
            armor_toughness: 0.0,
            knockback_resistance: 0.0,
            breathes_underwater: false,
            fall_damage_immune: false,
            death_score: 0,
        }
    }
}

/// Immutable descriptor shared by every entity of one kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    /// Registry key, e.g. `"zombie"`.
    pub key: String,
    pub width: f32,
    pub height: f32,
    /// Eye height while standing.
    pub eye_height: f32,
    pub fire_immune: bool,
    /// Grace period after leaving fire before fire blocks ignite again.
    pub fire_immune_ticks: i32,
    pub pushed_by_fluids: bool,
    /// Normalise the summed fluid current before scaling it.
    pub normalizes_fluid_push: bool,
    /// Solid to other entities' movement.
    pub collidable: bool,
    /// Zero means the entity cannot be ridden without forcing.
    pub max_passengers: usize,
    /// Seat height above the feet; defaults to three quarters of the height.
    pub passenger_offset: Option<f64>,
    pub max_up_step: f32,
    /// Downward acceleration per tick in air.
    pub gravity: f64,
    /// Emits step and swim markers while moving.
    pub emits_steps: bool,
    pub can_freeze: bool,
    pub can_change_dimensions: bool,
    /// Ticks spent inside a nether portal before transfer.
    pub portal_wait_ticks: i32,
    /// Ticks after a transfer before portals work again.
    pub portal_cooldown_ticks: i32,
    /// `Some` for kinds that have health and take damage.
    pub living: Option<LivingTraits>,
}

impl EntityType {
    /// A plain non-living type with the common defaults.
    pub fn basic(key: &str, width: f32, height: f32) -> Self {
        Self {
            key: key.to_string(),
            width,
            height,
            eye_height: height * 0.85,
            fire_immune: false,
            fire_immune_ticks: 1,
            pushed_by_fluids: true,
            normalizes_fluid_push: true,
            collidable: false,
            max_passengers: 0,
            passenger_offset: None,
            max_up_step: 0.0,
            gravity: 0.08,
            emits_steps: false,
            can_freeze: false,
            can_change_dimensions: true,
            portal_wait_ticks: 1,
            portal_cooldown_ticks: 300,
            living: None,
        }
    }

    /// A living type with `max_health` and the common mob defaults.
    pub fn mob(key: &str, width: f32, height: f32, max_health: f32) -> Self {
        Self {
            max_up_step: 0.6,
            emits_steps: true,
            can_freeze: true,
            living: Some(LivingTraits {
                max_health,
                death_score: 1,
                ..LivingTraits::default()
            }),
            ..Self::basic(key, width, height)
        }
    }

    pub fn is_living(&self) -> bool {
        self.living.is_some()
    }

    /// Box size for a pose.
    pub fn dimensions_for(&self, pose: Pose) -> EntityDimensions {
        match pose {
            Pose::Standing => EntityDimensions::new(self.width, self.height),
            Pose::Crouching => EntityDimensions::new(self.width, self.height * 0.8333),
            Pose::Swimming | Pose::FallFlying => EntityDimensions::new(self.width, self.width),
            Pose::Sleeping | Pose::Dying => EntityDimensions::new(0.2, 0.2),
        }
    }

    /// Eye height for a pose.
    pub fn eye_height_for(&self, pose: Pose) -> f32 {
        match pose {
            Pose::Standing => self.eye_height,
            other => self.dimensions_for(other).height * 0.85,
        }
    }

    /// Seat height above the feet for passengers.
    pub fn seat_height(&self) -> f64 {
        self.passenger_offset
            .unwrap_or(self.height as f64 * 0.75)
    }
}

/// Factory of entity types keyed by name.
#[derive(Clone, Debug, Default)]
pub struct EntityTypeRegistry {
    types: FxHashMap<String, Arc<EntityType>>,
}

impl EntityTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in kinds.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for kind in builtin_types() {
            // Keys below are distinct.
            let _ = registry.register(kind);
        }
        registry
    }

    pub fn register(&mut self, kind: EntityType) -> Result<Arc<EntityType>, SpawnError> {
        if self.types.contains_key(&kind.key) {
            return Err(SpawnError::DuplicateType(kind.key));
        }
        let shared = Arc::new(kind);
        self.types.insert(shared.key.clone(), Arc::clone(&shared));
        Ok(shared)
    }

    pub fn get(&self, key: &str) -> Option<Arc<EntityType>> {
        self.types.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.types.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

fn builtin_types() -> Vec<EntityType> {
    let player = EntityType {
        eye_height: 1.62,
        normalizes_fluid_push: false,
        portal_wait_ticks: 80,
        portal_cooldown_ticks: 10,
        living: Some(LivingTraits {
            death_score: 0,
            ..LivingTraits::default()
        }),
        ..EntityType::mob("player", 0.6, 1.8, 20.0)
    };
    let zombie = EntityType {
        eye_height: 1.74,
        living: Some(LivingTraits {
            movement_speed: 0.23,
            armor: 2.0,
            death_score: 1,
            ..LivingTraits::default()
        }),
        ..EntityType::mob("zombie", 0.6, 1.95, 20.0)
    };
    let drowned = EntityType {
        living: Some(LivingTraits {
            breathes_underwater: true,
            movement_speed: 0.23,
            armor: 2.0,
            death_score: 1,
            ..LivingTraits::default()
        }),
        ..EntityType::mob("drowned", 0.6, 1.95, 20.0)
    };
    let pig = EntityType {
        max_passengers: 1,
        passenger_offset: Some(0.9 * 0.75),
        ..EntityType::mob("pig", 0.9, 0.9, 10.0)
    };
    let blaze = EntityType {
        fire_immune: true,
        can_freeze: false,
        gravity: 0.08,
        living: Some(LivingTraits {
            armor: 6.0,
            fall_damage_immune: true,
            death_score: 1,
            ..LivingTraits::default()
        }),
        ..EntityType::mob("blaze", 0.6, 1.8, 20.0)
    };
    let item = EntityType {
        gravity: 0.04,
        ..EntityType::basic("item", 0.25, 0.25)
    };
    let boat = EntityType {
        collidable: true,
        max_passengers: 2,
        passenger_offset: Some(-0.1),
        ..EntityType::basic("boat", 1.375, 0.5625)
    };
    vec![player, zombie, drowned, pig, blaze, item, boat]
}
