//! Entity records: the persistent subset of an entity's state and its
//! binary encoding.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::attributes::AttributeMap;
use crate::components::{DeathProtection, Pose, ShieldStance};
use crate::context::EntityState;
use crate::effects::ActiveEffects;
use crate::error::PersistError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LivingRecord {
    pub health: f32,
    pub absorption: f32,
    pub hurt_time: i32,
    pub death_time: i32,
    pub attributes: AttributeMap,
    pub effects: ActiveEffects,
}

/// Saved entity, without the region-local id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub type_key: String,
    pub uuid: Uuid,
    pub position: DVec3,
    pub velocity: DVec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fall_distance: f32,
    pub fire_ticks: i32,
    pub air: i32,
    pub on_ground: bool,
    pub invulnerable: bool,
    pub portal_cooldown: i32,
    pub frozen_ticks: i32,
    pub pose: Pose,
    pub age: u32,
    pub no_gravity: bool,
    pub living: Option<LivingRecord>,
    pub shield: Option<ShieldStance>,
    pub protection: Option<DeathProtection>,
}

impl EntityRecord {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
        postcard::to_allocvec(self).map_err(PersistError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
        postcard::from_bytes(bytes).map_err(PersistError::Decode)
    }

    fn check_finite(&self) -> Result<(), PersistError> {
        let checks: [(&'static str, bool); 6] = [
            ("position", self.position.is_finite()),
            ("velocity", self.velocity.is_finite()),
            ("yaw", self.yaw.is_finite()),
            ("pitch", self.pitch.is_finite()),
            ("fall_distance", self.fall_distance.is_finite()),
            (
                "health",
                self.living
                    .as_ref()
                    .is_none_or(|l| l.health.is_finite() && l.absorption.is_finite()),
            ),
        ];
        match checks.into_iter().find(|(_, ok)| !ok) {
            Some((field, _)) => Err(PersistError::NonFinite(field)),
            None => Ok(()),
        }
    }
}

/// Capture the persistent part of `state`.
pub fn save_without_id(state: &EntityState) -> EntityRecord {
    let core = &state.core;
    EntityRecord {
        type_key: core.kind.key.clone(),
        uuid: core.uuid,
        position: core.position,
        velocity: core.velocity,
        yaw: core.yaw,
        pitch: core.pitch,
        fall_distance: core.fall_distance,
        fire_ticks: core.fire_ticks,
        air: core.air,
        on_ground: core.on_ground,
        invulnerable: core.invulnerable,
        portal_cooldown: core.portal.cooldown,
        frozen_ticks: core.frozen_ticks,
        pose: core.pose,
        age: core.age,
        no_gravity: core.no_gravity,
        living: state.living.as_ref().map(|l| LivingRecord {
            health: l.health(),
            absorption: l.absorption(),
            hurt_time: l.hurt_time,
            death_time: l.death_time,
            attributes: l.attributes.clone(),
            effects: l.effects.clone(),
        }),
        shield: state.shield,
        protection: state.protection,
    }
}

/// Overwrite `state` with `record`. The record must be for the same type and
/// hold only finite numbers; on error `state` is untouched.
pub fn load(state: &mut EntityState, record: &EntityRecord) -> Result<(), PersistError> {
    if record.type_key != state.core.kind.key {
        return Err(PersistError::TypeMismatch {
            expected: state.core.kind.key.clone(),
            found: record.type_key.clone(),
        });
    }
    record.check_finite()?;

    let core = &mut state.core;
    core.uuid = record.uuid;
    core.set_pose(record.pose);
    core.set_pos(record.position);
    core.prev_position = record.position;
    core.velocity = record.velocity;
    core.yaw = record.yaw;
    core.pitch = record.pitch;
    core.prev_yaw = record.yaw;
    core.prev_pitch = record.pitch;
    core.fall_distance = record.fall_distance;
    core.fire_ticks = record.fire_ticks;
    core.air = record.air;
    core.on_ground = record.on_ground;
    core.invulnerable = record.invulnerable;
    core.portal.cooldown = record.portal_cooldown;
    core.frozen_ticks = record.frozen_ticks;
    core.age = record.age;
    core.no_gravity = record.no_gravity;

    match (state.living.as_mut(), record.living.as_ref()) {
        (Some(living), Some(saved)) => {
            living.attributes = saved.attributes.clone();
            living.effects = saved.effects.clone();
            living.set_health(saved.health);
            living.set_absorption(saved.absorption);
            living.hurt_time = saved.hurt_time;
            living.death_time = saved.death_time;
        }
        (None, Some(_)) => warn!(kind = %record.type_key, "ignoring living data for non-living type"),
        _ => {}
    }
    state.shield = record.shield;
    state.protection = record.protection;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attribute, AttributeModifier, Operation};
    use crate::effects::{EffectInstance, MobEffect};
    use crate::test_support::state;

    #[test]
    fn test_record_survives_encoding() {
        let mut s = state("zombie");
        s.core.set_pos(DVec3::new(12.5, 70.0, -3.25));
        s.core.velocity = DVec3::new(0.1, -0.2, 0.3);
        s.core.yaw = 45.0;
        s.core.pitch = -30.0;
        s.core.fire_ticks = 40;
        s.core.frozen_ticks = 60;
        s.core.portal.cooldown = 12;
        s.shield = Some(ShieldStance::new(336));
        {
            let living = s.living.as_mut().unwrap();
            living.set_health(7.5);
            living.effects.add(MobEffect::Resistance, EffectInstance::new(1, 200));
            living.attributes.add_modifier(
                Attribute::Armor,
                AttributeModifier::new("plate", 4.0, Operation::Add),
            );
        }
        let record = save_without_id(&s);
        let decoded = EntityRecord::from_bytes(&record.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, record);

        let mut fresh = state("zombie");
        load(&mut fresh, &decoded).unwrap();
        assert_eq!(fresh.core.position, DVec3::new(12.5, 70.0, -3.25));
        assert_eq!(fresh.core.bounding_box, s.core.bounding_box);
        assert_eq!(fresh.core.velocity, s.core.velocity);
        assert_eq!((fresh.core.yaw, fresh.core.pitch), (45.0, -30.0));
        assert_eq!(fresh.core.fire_ticks, 40);
        assert_eq!(fresh.core.frozen_ticks, 60);
        assert_eq!(fresh.core.portal.cooldown, 12);
        assert_eq!(fresh.shield, s.shield);
        let living = fresh.living.as_ref().unwrap();
        assert_eq!(living.health(), 7.5);
        assert_eq!(living.attributes.value(Attribute::Armor), 6.0);
        assert!(living.effects.has(MobEffect::Resistance));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let record = save_without_id(&state("zombie"));
        let mut pig = state("pig");
        let err = load(&mut pig, &record).unwrap_err();
        assert!(matches!(err, PersistError::TypeMismatch { .. }));
    }

    #[test]
    fn test_non_finite_rejected_without_change() {
        let mut record = save_without_id(&state("zombie"));
        record.velocity.y = f64::INFINITY;
        record.air = 5;
        let mut target = state("zombie");
        let err = load(&mut target, &record).unwrap_err();
        assert!(matches!(err, PersistError::NonFinite("velocity")));
        assert_eq!(target.core.air, 300);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = EntityRecord::from_bytes(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, PersistError::Decode(_)));
    }
}
