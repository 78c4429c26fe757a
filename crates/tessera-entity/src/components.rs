//! ECS components describing entity state.
//!
//! [`EntityCore`] is present on every entity. Capabilities are opt-in
//! components: [`crate::living::Living`] for health, [`Rideable`] for seats,
//! [`Collidable`] for entities others bump into, [`DeathProtection`] for
//! last-stand charges and [`ShieldStance`] for blocking.

use std::sync::Arc;

use bevy_ecs::component::Component;
use bevy_ecs::entity::Entity;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tessera_math::{Aabb, BlockPos, view_vector};
use tessera_world::FluidKind;
use uuid::Uuid;

use crate::types::EntityType;

/// Why an entity left its region. Set once, never cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalReason {
    Killed,
    Discarded,
    UnloadedToChunk,
    UnloadedWithPlayer,
    ChangedDimension,
}

impl RemovalReason {
    /// The entity is gone for good rather than stored elsewhere.
    pub fn should_destroy(self) -> bool {
        matches!(self, RemovalReason::Killed | RemovalReason::Discarded)
    }

    /// The entity should be written out with the chunk it left.
    pub fn should_save(self) -> bool {
        self == RemovalReason::UnloadedToChunk
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pose {
    #[default]
    Standing,
    FallFlying,
    Sleeping,
    Swimming,
    Crouching,
    Dying,
}

/// Box size in blocks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDimensions {
    pub width: f32,
    pub height: f32,
}

impl EntityDimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn make_bounding_box(&self, feet: DVec3) -> Aabb {
        Aabb::from_feet(feet, self.width as f64, self.height as f64)
    }
}

/// Result flags of the last movement resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    pub horizontal: bool,
    pub vertical: bool,
    /// Vertical collision while moving down.
    pub vertical_below: bool,
    /// Horizontal collision that barely deflected the motion.
    pub minor_horizontal: bool,
}

/// Fluid submersion, recomputed from scratch every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FluidContact {
    heights: [f64; 2],
    /// Touching water this tick.
    pub in_water: bool,
    /// Fluid covering the eyes.
    pub eye_fluid: Option<FluidKind>,
    pub in_rain: bool,
}

impl FluidContact {
    fn slot(kind: FluidKind) -> usize {
        match kind {
            FluidKind::Water => 0,
            FluidKind::Lava => 1,
        }
    }

    /// How far the fluid surface reaches above the bottom of the box.
    pub fn height(&self, kind: FluidKind) -> f64 {
        self.heights[Self::slot(kind)]
    }

    pub fn set_height(&mut self, kind: FluidKind, height: f64) {
        self.heights[Self::slot(kind)] = height;
    }

    pub fn clear_heights(&mut self) {
        self.heights = [0.0; 2];
    }

    pub fn in_lava(&self) -> bool {
        self.height(FluidKind::Lava) > 0.0
    }

    pub fn eyes_in(&self, kind: FluidKind) -> bool {
        self.eye_fluid == Some(kind)
    }
}

/// Nether portal timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PortalState {
    /// Ticks until portals affect the entity again.
    pub cooldown: i32,
    /// Ticks spent inside a portal.
    pub time: i32,
    /// Touched a nether portal during the last movement.
    pub inside: bool,
    /// Portal block last touched.
    pub entrance: Option<BlockPos>,
}

/// State shared by every entity.
#[derive(Component, Clone, Debug)]
pub struct EntityCore {
    pub kind: Arc<EntityType>,
    pub uuid: Uuid,
    pub age: u32,

    pub position: DVec3,
    pub prev_position: DVec3,
    pub velocity: DVec3,
    pub yaw: f32,
    pub pitch: f32,
    pub prev_yaw: f32,
    pub prev_pitch: f32,
    pub on_ground: bool,
    pub collisions: CollisionFlags,
    pub fall_distance: f32,
    pub pose: Pose,
    pub dimensions: EntityDimensions,
    pub eye_height: f32,
    pub bounding_box: Aabb,
    pub no_gravity: bool,
    /// Velocity multiplier from cobweb-like blocks touched this tick.
    pub stuck_multiplier: Option<DVec3>,
    pub piston_deltas: DVec3,
    pub piston_game_time: u64,
    pub move_dist: f32,
    pub next_step: f32,

    /// Positive while burning, negative while immune to fire blocks.
    pub fire_ticks: i32,
    pub frozen_ticks: i32,
    pub air: i32,
    /// Ticks spent underwater with no air left, reset by each drowning hit.
    pub drowning_ticks: i32,
    pub fluids: FluidContact,
    pub in_powder_snow: bool,
    pub was_in_powder_snow: bool,
    pub was_on_fire: bool,
    pub invulnerable: bool,
    pub portal: PortalState,

    pub vehicle: Option<Entity>,
    pub passengers: Vec<Entity>,
    pub boarding_cooldown: i32,

    pub removal: Option<RemovalReason>,
}

impl EntityCore {
    pub fn new(kind: Arc<EntityType>, uuid: Uuid, position: DVec3, max_air: i32) -> Self {
        let dimensions = kind.dimensions_for(Pose::Standing);
        let eye_height = kind.eye_height_for(Pose::Standing);
        let fire_ticks = -kind.fire_immune_ticks;
        Self {
            kind,
            uuid,
            age: 0,
            position,
            prev_position: position,
            velocity: DVec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            prev_yaw: 0.0,
            prev_pitch: 0.0,
            on_ground: false,
            collisions: CollisionFlags::default(),
            fall_distance: 0.0,
            pose: Pose::Standing,
            dimensions,
            eye_height,
            bounding_box: dimensions.make_bounding_box(position),
            no_gravity: false,
            stuck_multiplier: None,
            piston_deltas: DVec3::ZERO,
            piston_game_time: 0,
            move_dist: 0.0,
            next_step: 1.0,
            fire_ticks,
            frozen_ticks: 0,
            air: max_air,
            drowning_ticks: 0,
            fluids: FluidContact::default(),
            in_powder_snow: false,
            was_in_powder_snow: false,
            was_on_fire: false,
            invulnerable: false,
            portal: PortalState::default(),
            vehicle: None,
            passengers: Vec::new(),
            boarding_cooldown: 0,
            removal: None,
        }
    }

    /// Move the feet to `position` and rebuild the box around them.
    pub fn set_pos(&mut self, position: DVec3) {
        self.position = position;
        self.bounding_box = self.dimensions.make_bounding_box(position);
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
        self.refresh_dimensions();
    }

    /// Re-derive box size and eye height from the pose.
    pub fn refresh_dimensions(&mut self) {
        self.dimensions = self.kind.dimensions_for(self.pose);
        self.eye_height = self.kind.eye_height_for(self.pose);
        self.bounding_box = self.dimensions.make_bounding_box(self.position);
    }

    pub fn eye_y(&self) -> f64 {
        self.position.y + self.eye_height as f64
    }

    pub fn eye_position(&self) -> DVec3 {
        DVec3::new(self.position.x, self.eye_y(), self.position.z)
    }

    pub fn view_vector(&self) -> DVec3 {
        view_vector(self.pitch, self.yaw)
    }

    pub fn fire_immune(&self) -> bool {
        self.kind.fire_immune
    }

    pub fn is_on_fire(&self) -> bool {
        !self.fire_immune() && self.fire_ticks > 0
    }

    /// Burn for at least `seconds`.
    pub fn set_seconds_on_fire(&mut self, seconds: i32) {
        let ticks = seconds * 20;
        if self.fire_ticks < ticks {
            self.fire_ticks = ticks;
        }
    }

    pub fn clear_fire(&mut self) {
        self.fire_ticks = 0;
    }

    pub fn reset_fall_distance(&mut self) {
        self.fall_distance = 0.0;
    }

    pub fn in_water(&self) -> bool {
        self.fluids.in_water
    }

    pub fn in_lava(&self) -> bool {
        self.fluids.in_lava()
    }

    pub fn in_water_or_rain(&self) -> bool {
        self.fluids.in_water || self.fluids.in_rain
    }

    pub fn is_passenger(&self) -> bool {
        self.vehicle.is_some()
    }

    pub fn is_vehicle(&self) -> bool {
        !self.passengers.is_empty()
    }

    pub fn is_removed(&self) -> bool {
        self.removal.is_some()
    }

    /// Record a removal reason. The first reason wins.
    pub fn set_removed(&mut self, reason: RemovalReason) -> bool {
        if self.removal.is_some() {
            return false;
        }
        self.removal = Some(reason);
        true
    }

    pub fn is_fully_frozen(&self, ticks_to_freeze: i32) -> bool {
        self.frozen_ticks >= ticks_to_freeze
    }
}

/// Accepts passengers up to a limit.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rideable {
    pub max_passengers: usize,
}

/// Blocks the movement of other entities like a solid block.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Collidable;

/// Last-stand charges consumed instead of dying.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathProtection {
    pub charges: u32,
}

/// A shield that can be raised to block frontal hits.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldStance {
    pub durability: i32,
    pub max_durability: i32,
    pub raised: bool,
}

impl ShieldStance {
    pub fn new(max_durability: i32) -> Self {
        Self {
            durability: max_durability,
            max_durability,
            raised: false,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.raised && self.durability > 0
    }

    /// Wear the shield by `amount`. Returns `true` when it breaks.
    pub fn wear(&mut self, amount: i32) -> bool {
        if self.durability <= 0 {
            return false;
        }
        self.durability = (self.durability - amount).max(0);
        if self.durability == 0 {
            self.raised = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityTypeRegistry;

    fn zombie() -> EntityCore {
        let kind = EntityTypeRegistry::builtin().get("zombie").unwrap();
        EntityCore::new(kind, Uuid::nil(), DVec3::new(0.5, 64.0, 0.5), 300)
    }

    #[test]
    fn test_new_entity_box_matches_type() {
        let core = zombie();
        assert!((core.bounding_box.size().y - 1.95).abs() < 1e-6);
        assert!((core.bounding_box.min.y - 64.0).abs() < 1e-9);
        assert_eq!(core.fire_ticks, -1);
    }

    #[test]
    fn test_set_pos_moves_box() {
        let mut core = zombie();
        core.set_pos(DVec3::new(10.0, 5.0, -3.0));
        assert!((core.bounding_box.center().x - 10.0).abs() < 1e-9);
        assert!((core.bounding_box.min.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_removal_reason_set_once() {
        let mut core = zombie();
        assert!(core.set_removed(RemovalReason::Killed));
        assert!(!core.set_removed(RemovalReason::Discarded));
        assert_eq!(core.removal, Some(RemovalReason::Killed));
    }

    #[test]
    fn test_fire_only_increases() {
        let mut core = zombie();
        core.set_seconds_on_fire(8);
        assert_eq!(core.fire_ticks, 160);
        core.set_seconds_on_fire(2);
        assert_eq!(core.fire_ticks, 160);
        assert!(core.is_on_fire());
    }

    #[test]
    fn test_shield_breaks_at_zero() {
        let mut shield = ShieldStance::new(5);
        shield.raised = true;
        assert!(!shield.wear(3));
        assert!(shield.wear(4));
        assert_eq!(shield.durability, 0);
        assert!(!shield.is_blocking());
    }

    #[test]
    fn test_dying_pose_shrinks_box() {
        let mut core = zombie();
        core.set_pose(Pose::Dying);
        assert!((core.bounding_box.size().x - 0.2).abs() < 1e-6);
    }
}
