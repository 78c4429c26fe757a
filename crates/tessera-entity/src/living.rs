//! The damageable capability: health, absorption, timers and combat memory.

use bevy_ecs::component::Component;
use bevy_ecs::entity::Entity;

use crate::attributes::{Attribute, AttributeMap};
use crate::damage::DamageSource;
use crate::effects::ActiveEffects;
use crate::types::LivingTraits;

/// A damage source and the game time it landed.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageRecord {
    pub source: DamageSource,
    pub stamp: u64,
}

/// The last entity to hurt this one and when.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackerRecord {
    pub entity: Entity,
    pub stamp: u64,
}

#[derive(Component, Clone, Debug)]
pub struct Living {
    health: f32,
    absorption: f32,
    pub attributes: AttributeMap,
    pub effects: ActiveEffects,
    /// Ticks left in the post-hit invulnerability window.
    pub invulnerable_time: i32,
    /// Amount of the hit that opened the current window.
    pub last_hurt: f32,
    pub hurt_time: i32,
    pub hurt_duration: i32,
    pub death_time: i32,
    /// Set once by the death transition.
    pub dead: bool,
    pub last_damage: Option<DamageRecord>,
    pub last_attacker: Option<AttackerRecord>,
    /// Score collected from kills credited to this entity.
    pub kill_score: i32,
}

impl Living {
    pub fn new(traits: &LivingTraits) -> Self {
        let attributes = AttributeMap::for_living(traits);
        let health = attributes.value(Attribute::MaxHealth) as f32;
        Self {
            health,
            absorption: 0.0,
            attributes,
            effects: ActiveEffects::new(),
            invulnerable_time: 0,
            last_hurt: 0.0,
            hurt_time: 0,
            hurt_duration: 0,
            death_time: 0,
            dead: false,
            last_damage: None,
            last_attacker: None,
            kill_score: 0,
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.attributes.value(Attribute::MaxHealth) as f32
    }

    /// Set health, clamped to `[0, max_health]`. NaN is ignored.
    pub fn set_health(&mut self, health: f32) {
        if health.is_nan() {
            tracing::warn!("ignoring NaN health");
            return;
        }
        self.health = health.clamp(0.0, self.max_health());
    }

    pub fn heal(&mut self, amount: f32) {
        if self.health > 0.0 && amount > 0.0 {
            self.set_health(self.health + amount);
        }
    }

    pub fn absorption(&self) -> f32 {
        self.absorption
    }

    pub fn set_absorption(&mut self, absorption: f32) {
        if absorption.is_nan() {
            return;
        }
        self.absorption = absorption.max(0.0);
    }

    pub fn is_dead_or_dying(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_alive(&self) -> bool {
        !self.dead && self.health > 0.0
    }

    /// Re-clamp health after a max-health change.
    pub fn sync_max_health(&mut self) {
        let max = self.max_health();
        if self.health > max {
            self.health = max;
        }
    }

    /// The last damage source, unless it is older than `expiry` ticks.
    pub fn last_damage_source(&self, game_time: u64, expiry: u64) -> Option<&DamageSource> {
        self.last_damage
            .as_ref()
            .filter(|r| game_time.saturating_sub(r.stamp) <= expiry)
            .map(|r| &r.source)
    }

    /// Drop combat memory that has aged out.
    pub fn expire_memory(&mut self, game_time: u64, damage_expiry: u64, credit_window: u64) {
        if self
            .last_damage
            .as_ref()
            .is_some_and(|r| game_time.saturating_sub(r.stamp) > damage_expiry)
        {
            self.last_damage = None;
        }
        if self
            .last_attacker
            .is_some_and(|a| game_time.saturating_sub(a.stamp) > credit_window)
        {
            self.last_attacker = None;
        }
    }
}
