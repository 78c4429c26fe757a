//! The damage pipeline.
//!
//! `hurt` runs a hit through rejection checks, shield blocking, the
//! invulnerability window, armor and resistance mitigation and the
//! absorption buffer before touching health. Knockback and the death
//! transition hang off the end of it.

use bevy_ecs::entity::Entity;
use glam::DVec3;
use rand::Rng;
use tracing::{debug, warn};

use crate::attributes::Attribute;
use crate::components::{EntityCore, Pose};
use crate::context::{EntityState, SimContext};
use crate::effects::{EffectInstance, MobEffect};
use crate::events::{EntityEvent, EntityStatus, GameEventKind, Sound};
use crate::living::{AttackerRecord, DamageRecord, Living};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageKind {
    Generic,
    MobAttack,
    PlayerAttack,
    Projectile,
    Thorns,
    Fall,
    InFire,
    OnFire,
    Lava,
    Drown,
    InWall,
    Freeze,
    OutOfWorld,
    Magic,
}

impl DamageKind {
    pub fn is_fire(self) -> bool {
        matches!(self, DamageKind::InFire | DamageKind::OnFire | DamageKind::Lava)
    }

    pub fn is_projectile(self) -> bool {
        self == DamageKind::Projectile
    }

    /// Ignores armor and shields.
    pub fn bypasses_armor(self) -> bool {
        matches!(
            self,
            DamageKind::Fall
                | DamageKind::OnFire
                | DamageKind::Drown
                | DamageKind::InWall
                | DamageKind::Freeze
                | DamageKind::OutOfWorld
                | DamageKind::Magic
                | DamageKind::Thorns
        )
    }

    /// Hurts invulnerable entities and cannot be survived by a last stand.
    pub fn bypasses_invulnerability(self) -> bool {
        self == DamageKind::OutOfWorld
    }

    /// Not reduced by the resistance effect.
    pub fn bypasses_resistance(self) -> bool {
        self == DamageKind::OutOfWorld
    }

    /// Status broadcast for a non-lethal registered hit.
    pub fn hurt_status(self) -> EntityStatus {
        match self {
            DamageKind::Thorns => EntityStatus::Thorns,
            DamageKind::Drown => EntityStatus::HurtDrown,
            DamageKind::InFire | DamageKind::OnFire | DamageKind::Lava => EntityStatus::HurtBurn,
            DamageKind::Freeze => EntityStatus::HurtFreeze,
            _ => EntityStatus::Hurt,
        }
    }
}

/// What hurt an entity.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageSource {
    pub kind: DamageKind,
    /// The entity that made contact (arrow, attacker).
    pub direct: Option<Entity>,
    /// The entity credited with the hit (the archer).
    pub causing: Option<Entity>,
    /// Explicit origin for sources without an entity, e.g. explosions.
    pub position: Option<DVec3>,
}

impl DamageSource {
    pub fn environment(kind: DamageKind) -> Self {
        Self {
            kind,
            direct: None,
            causing: None,
            position: None,
        }
    }

    pub fn mob_attack(attacker: Entity) -> Self {
        Self {
            kind: DamageKind::MobAttack,
            direct: Some(attacker),
            causing: Some(attacker),
            position: None,
        }
    }

    pub fn player_attack(attacker: Entity) -> Self {
        Self {
            kind: DamageKind::PlayerAttack,
            ..Self::mob_attack(attacker)
        }
    }

    pub fn projectile(projectile: Entity, owner: Option<Entity>) -> Self {
        Self {
            kind: DamageKind::Projectile,
            direct: Some(projectile),
            causing: owner,
            position: None,
        }
    }

    pub fn at(mut self, position: DVec3) -> Self {
        self.position = Some(position);
        self
    }
}

/// Positions of the entities behind a source, resolved by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HitGeometry {
    /// Where the hit came from; used for shield facing.
    pub source_position: Option<DVec3>,
    /// Where the credited attacker stands; used for knockback.
    pub attacker_position: Option<DVec3>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HurtOutcome {
    /// The hit was accepted.
    pub registered: bool,
    /// A shield took the hit.
    pub blocked: bool,
    /// The hit started the death transition.
    pub died: bool,
    /// Damage that reached health.
    pub dealt: f32,
}

/// Run one hit through the pipeline.
pub fn hurt(
    state: &mut EntityState,
    source: &DamageSource,
    hit: &HitGeometry,
    amount: f32,
    cx: &mut SimContext,
) -> HurtOutcome {
    let rejected = HurtOutcome::default();
    if amount.is_nan() || amount < 0.0 {
        warn!(amount, kind = ?source.kind, "rejecting invalid damage amount");
        return rejected;
    }
    let config = cx.config;
    let combat = &config.combat;
    let EntityState {
        core,
        living,
        shield,
        protection,
    } = state;
    let Some(living) = living.as_mut() else {
        return rejected;
    };
    if core.is_removed() || (core.invulnerable && !source.kind.bypasses_invulnerability()) {
        return rejected;
    }
    if living.dead || living.is_dead_or_dying() {
        return rejected;
    }
    if source.kind.is_fire() && (core.fire_immune() || living.effects.has(MobEffect::FireResistance)) {
        return rejected;
    }
    if amount == 0.0 && source.causing.is_none() {
        return rejected;
    }

    let mut amount = amount;
    let mut blocked = false;
    if amount > 0.0
        && let Some(stance) = shield.as_mut()
        && stance.is_blocking()
        && !source.kind.bypasses_armor()
        && let Some(from) = hit.source_position
    {
        let mut toward = (core.position - from).normalize_or_zero();
        toward.y = 0.0;
        if toward.dot(core.view_vector()) < 0.0 {
            if amount >= 3.0 && stance.wear(1 + amount.floor() as i32) {
                cx.sound(Sound::ShieldBreak, 0.8);
            }
            amount = 0.0;
            blocked = true;
        }
    }

    let (dealt, registered) = if living.invulnerable_time as f32 > combat.invulnerability_ticks as f32 / 2.0 {
        if amount <= living.last_hurt {
            return rejected;
        }
        let dealt = actually_hurt(core, living, source, amount - living.last_hurt, cx);
        living.last_hurt = amount;
        (dealt, false)
    } else {
        living.last_hurt = amount;
        living.invulnerable_time = combat.invulnerability_ticks;
        let dealt = actually_hurt(core, living, source, amount, cx);
        living.hurt_duration = combat.hurt_duration_ticks;
        living.hurt_time = living.hurt_duration;
        (dealt, true)
    };

    if let Some(attacker) = source.causing {
        living.last_attacker = Some(AttackerRecord {
            entity: attacker,
            stamp: cx.game_time,
        });
    }

    if registered {
        if blocked {
            cx.status(EntityStatus::ShieldBlock);
            cx.sound(Sound::ShieldBlock, 1.0);
        } else {
            cx.status(source.kind.hurt_status());
        }
        if let Some(attacker) = hit.attacker_position {
            let mut dx = attacker.x - core.position.x;
            let mut dz = attacker.z - core.position.z;
            while dx * dx + dz * dz < 1.0e-4 {
                dx = (cx.rng.random::<f64>() - cx.rng.random::<f64>()) * 0.01;
                dz = (cx.rng.random::<f64>() - cx.rng.random::<f64>()) * 0.01;
            }
            let resistance = living.attributes.value(Attribute::KnockbackResistance);
            knockback(core, resistance, combat.knockback_strength, dx, dz);
        }
    }

    let mut died = false;
    if living.is_dead_or_dying() {
        let saved = !source.kind.bypasses_invulnerability()
            && protection.as_mut().is_some_and(|p| {
                if p.charges == 0 {
                    return false;
                }
                p.charges -= 1;
                true
            });
        if saved {
            last_stand(living, cx);
        } else {
            died = die(core, living, source, cx);
        }
    } else if registered {
        cx.sound(Sound::Hurt, 1.0);
    }

    let accepted = !blocked || amount > 0.0;
    if accepted {
        living.last_damage = Some(DamageRecord {
            source: source.clone(),
            stamp: cx.game_time,
        });
    }
    HurtOutcome {
        registered: accepted,
        blocked,
        died,
        dealt,
    }
}

/// Shortcut for damage without a source entity.
pub fn hurt_by_environment(state: &mut EntityState, kind: DamageKind, amount: f32, cx: &mut SimContext) -> bool {
    hurt(
        state,
        &DamageSource::environment(kind),
        &HitGeometry::default(),
        amount,
        cx,
    )
    .registered
}

/// Mitigate and apply `amount`. Returns the damage that reached health.
fn actually_hurt(
    core: &mut EntityCore,
    living: &mut Living,
    source: &DamageSource,
    amount: f32,
    cx: &mut SimContext,
) -> f32 {
    let mut amount = amount;
    if !source.kind.bypasses_armor() {
        amount = damage_after_armor(
            amount,
            living.attributes.value(Attribute::Armor) as f32,
            living.attributes.value(Attribute::ArmorToughness) as f32,
        );
    }
    if !source.kind.bypasses_resistance()
        && let Some(effect) = living.effects.get(MobEffect::Resistance)
    {
        amount = damage_after_resistance(amount, effect.amplifier);
    }
    if amount <= 0.0 {
        return 0.0;
    }

    let buffered = amount;
    amount = (amount - living.absorption()).max(0.0);
    living.set_absorption(living.absorption() - (buffered - amount));
    if amount > 0.0 {
        living.set_health(living.health() - amount);
        cx.game_event(GameEventKind::EntityDamaged, core.position);
    }
    amount
}

/// Armor reduction: each point of armor blocks 4%, weakened by large hits
/// unless offset by toughness.
pub fn damage_after_armor(damage: f32, armor: f32, toughness: f32) -> f32 {
    let divisor = 2.0 + toughness / 4.0;
    let effective = (armor - damage / divisor).clamp(armor * 0.2, 20.0);
    damage * (1.0 - effective / 25.0)
}

/// Resistance effect reduction, 20% per level.
pub fn damage_after_resistance(damage: f32, amplifier: u8) -> f32 {
    let level = (amplifier as i32 + 1) * 5;
    let factor = (25 - level) as f32;
    (damage * factor / 25.0).max(0.0)
}

/// Push `core` away from a point `(dx, dz)` relative to it.
pub fn knockback(core: &mut EntityCore, resistance: f64, strength: f64, dx: f64, dz: f64) {
    let strength = strength * (1.0 - resistance);
    if strength <= 0.0 {
        return;
    }
    let v = core.velocity;
    let push = DVec3::new(dx, 0.0, dz).normalize_or_zero() * strength;
    let vy = if core.on_ground {
        (v.y / 2.0 + strength).min(0.4)
    } else {
        v.y
    };
    core.velocity = DVec3::new(v.x / 2.0 - push.x, vy, v.z / 2.0 - push.z);
}

fn last_stand(living: &mut Living, cx: &mut SimContext) {
    living.set_health(1.0);
    living.effects.clear();
    living
        .effects
        .add(MobEffect::FireResistance, EffectInstance::new(0, 800));
    living.set_absorption(living.absorption().max(8.0));
    cx.status(EntityStatus::TotemUsed);
    cx.sound(Sound::TotemUse, 1.0);
}

/// Death transition. Runs at most once per entity.
pub fn die(core: &mut EntityCore, living: &mut Living, source: &DamageSource, cx: &mut SimContext) -> bool {
    if core.is_removed() || living.dead {
        return false;
    }
    living.dead = true;
    let window = cx.config.combat.kill_credit_ticks;
    let killer = source.causing.or_else(|| {
        living
            .last_attacker
            .filter(|a| cx.game_time.saturating_sub(a.stamp) <= window)
            .map(|a| a.entity)
    });
    let victim = cx.entity;
    if let Some(killer) = killer.filter(|k| *k != victim)
        && let Some(score) = core.kind.living.as_ref().map(|t| t.death_score)
        && score >= 0
    {
        cx.emit(EntityEvent::KillCredited {
            killer,
            victim,
            score,
        });
    }
    cx.emit(EntityEvent::LootDropped {
        entity: victim,
        killer,
    });
    cx.status(EntityStatus::Death);
    cx.sound(Sound::Death, 1.0);
    core.set_pose(Pose::Dying);
    debug!(entity = ?victim, kind = %core.kind.key, cause = ?source.kind, "entity died");
    true
}

/// Landing damage for a fall of `distance` onto a block with `multiplier`.
pub fn cause_fall_damage(state: &mut EntityState, distance: f32, multiplier: f32, cx: &mut SimContext) -> bool {
    let immune = state
        .core
        .kind
        .living
        .as_ref()
        .is_none_or(|t| t.fall_damage_immune);
    if immune {
        return false;
    }
    let damage = ((distance - cx.config.combat.safe_fall_distance) * multiplier).ceil();
    if damage <= 0.0 {
        return false;
    }
    let sound = if damage > 4.0 { Sound::FallBig } else { Sound::FallSmall };
    cx.sound(sound, 1.0);
    hurt_by_environment(state, DamageKind::Fall, damage, cx)
}

#[cfg(test)]
#[path = "damage_tests.rs"]
mod tests;
