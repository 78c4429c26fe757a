//! Per-tick environmental effects: portal timers, burning, air supply,
//! suffocation, freezing, the death animation and falling out of the world.

use tessera_math::{Aabb, BlockPos};
use tessera_world::{FluidKind, WorldError};
use tracing::debug;

use crate::components::{EntityCore, Pose, RemovalReason};
use crate::context::{EntityState, SimContext, WorldView};
use crate::damage::{DamageKind, hurt_by_environment};
use crate::effects::MobEffect;
use crate::events::{EntityEvent, EntityStatus, Sound};

/// Ticks without air between drowning hits.
const DROWNING_INTERVAL: i32 = 20;

/// Advance the nether portal timer. Emits a transfer request once the
/// entity has stood in a portal for its type's wait time.
pub fn tick_portal(core: &mut EntityCore, view: &WorldView, cx: &mut SimContext) {
    let wait = core.kind.portal_wait_ticks;
    if core.portal.inside {
        if !core.is_passenger() {
            let elapsed = core.portal.time;
            core.portal.time += 1;
            if elapsed >= wait {
                core.portal.time = wait;
                core.portal.cooldown = core.kind.portal_cooldown_ticks;
                let destination = view.dimension.kind.nether_portal_target();
                debug!(entity = ?cx.entity, ?destination, "nether portal wait elapsed");
                let entity = cx.entity;
                cx.emit(EntityEvent::PortalTransfer {
                    entity,
                    destination,
                });
            }
        }
        core.portal.inside = false;
    } else {
        core.portal.time = (core.portal.time - 4).max(0);
    }
    if core.portal.cooldown > 0 {
        core.portal.cooldown -= 1;
    }
}

/// Burn down the fire timer, hurting non-immune entities once a second.
pub fn tick_fire(state: &mut EntityState, cx: &mut SimContext) {
    if state.core.fire_ticks <= 0 {
        return;
    }
    let interval = cx.config.environment.fire_damage_interval.max(1);
    if state.core.fire_immune() {
        state.core.fire_ticks = (state.core.fire_ticks - 4).max(0);
    } else {
        if state.core.fire_ticks % interval == 0 && !state.core.in_lava() {
            hurt_by_environment(state, DamageKind::OnFire, 1.0, cx);
        }
        state.core.fire_ticks -= 1;
    }
    state.core.frozen_ticks = 0;
}

/// Set alight and hurt by lava contact.
pub fn lava_hurt(state: &mut EntityState, cx: &mut SimContext) {
    if state.core.fire_immune() {
        return;
    }
    let env = &cx.config.environment;
    let (seconds, damage) = (env.lava_fire_seconds, env.lava_damage);
    state.core.set_seconds_on_fire(seconds);
    if hurt_by_environment(state, DamageKind::Lava, damage, cx) {
        cx.sound(Sound::Burn, 0.4);
    }
}

/// Eyes inside a suffocating block.
pub fn is_in_wall(core: &EntityCore, view: &WorldView) -> Result<bool, WorldError> {
    if core.pose == Pose::Sleeping {
        return Ok(false);
    }
    let width = core.dimensions.width as f64 * 0.8;
    let probe = Aabb::of_size(core.eye_position(), width, 1.0e-6, width);
    let lo = BlockPos::containing(probe.min);
    let hi = BlockPos::containing(probe.max);
    for x in lo.x..=hi.x {
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                let pos = BlockPos::new(x, y, z);
                let def = view.level.block_def(pos)?;
                if def.suffocating && def.shape.world_boxes(pos).iter().any(|b| b.intersects(&probe)) {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

/// Drain air while the eyes are under water, refill it otherwise.
///
/// Air never goes below zero. Once it is spent a drowning countdown runs
/// instead, hurting the entity every [`DROWNING_INTERVAL`] ticks.
pub fn tick_air(state: &mut EntityState, cx: &mut SimContext) {
    let env = &cx.config.environment;
    let (max_air, refill, damage) = (env.max_air_supply, env.air_refill_per_tick, env.drowning_damage);
    let breathes = state
        .core
        .kind
        .living
        .as_ref()
        .is_some_and(|t| t.breathes_underwater)
        || state
            .living
            .as_ref()
            .is_some_and(|l| l.effects.has(MobEffect::WaterBreathing))
        || state.core.invulnerable;

    if state.core.fluids.eyes_in(FluidKind::Water) && !breathes {
        if state.core.air > 0 {
            state.core.air -= 1;
            return;
        }
        state.core.drowning_ticks += 1;
        if state.core.drowning_ticks >= DROWNING_INTERVAL {
            state.core.drowning_ticks = 0;
            hurt_by_environment(state, DamageKind::Drown, damage, cx);
        }
        return;
    }
    state.core.drowning_ticks = 0;
    if !state.core.fluids.eyes_in(FluidKind::Water) && state.core.air < max_air {
        state.core.air = (state.core.air + refill).min(max_air);
    }
}

/// Living-only upkeep run before movement.
pub fn tick_living(state: &mut EntityState, view: &WorldView, cx: &mut SimContext) -> Result<(), WorldError> {
    let Some(alive) = state.living.as_ref().map(|l| l.is_alive()) else {
        return Ok(());
    };
    if alive && is_in_wall(&state.core, view)? {
        let damage = cx.config.environment.suffocation_damage;
        hurt_by_environment(state, DamageKind::InWall, damage, cx);
    }
    if state.living.as_ref().is_some_and(|l| l.is_alive()) {
        tick_air(state, cx);
    }

    let combat = &cx.config.combat;
    let (damage_expiry, credit_window) = (combat.damage_source_expiry_ticks, combat.kill_credit_ticks);
    let game_time = cx.game_time;
    if let Some(living) = state.living.as_mut() {
        if living.hurt_time > 0 {
            living.hurt_time -= 1;
        }
        if living.invulnerable_time > 0 {
            living.invulnerable_time -= 1;
        }
        living.expire_memory(game_time, damage_expiry, credit_window);
        for effect in living.effects.tick() {
            debug!(entity = ?cx.entity, ?effect, "effect expired");
        }
    }
    if state.living.as_ref().is_some_and(|l| l.is_dead_or_dying()) {
        tick_death(state, cx);
    }
    Ok(())
}

/// Count up the death animation and remove the entity when it finishes.
pub fn tick_death(state: &mut EntityState, cx: &mut SimContext) {
    let limit = cx.config.combat.death_animation_ticks;
    let Some(living) = state.living.as_mut() else {
        return;
    };
    living.death_time += 1;
    if living.death_time >= limit && !state.core.is_removed() {
        cx.status(EntityStatus::DeathPoof);
        state.core.set_removed(RemovalReason::Killed);
    }
}

/// Build up or thaw frost depending on powder snow contact.
pub fn tick_freezing(state: &mut EntityState, cx: &mut SimContext) {
    let Some(living) = state.living.as_ref() else {
        return;
    };
    if living.is_dead_or_dying() {
        return;
    }
    let env = &cx.config.environment;
    let (ticks_to_freeze, interval, damage) = (env.ticks_to_freeze, env.freeze_damage_interval, env.freeze_damage);
    let core = &mut state.core;
    let can_freeze = core.kind.can_freeze;
    core.frozen_ticks = if core.in_powder_snow && can_freeze {
        (core.frozen_ticks + 1).min(ticks_to_freeze)
    } else {
        (core.frozen_ticks - 2).max(0)
    };
    if interval > 0 && core.age % interval == 0 && core.is_fully_frozen(ticks_to_freeze) && can_freeze {
        hurt_by_environment(state, DamageKind::Freeze, damage, cx);
    }
}

/// Entities far below the bottom of the world are hurt until they die, or
/// simply discarded when they cannot be hurt.
pub fn check_below_world(state: &mut EntityState, view: &WorldView, cx: &mut SimContext) {
    let floor = view.level.min_y() as f64 - cx.config.physics.out_of_world_margin;
    if state.core.position.y >= floor {
        return;
    }
    if state.is_living() {
        let damage = cx.config.combat.out_of_world_damage;
        hurt_by_environment(state, DamageKind::OutOfWorld, damage, cx);
    } else if state.core.set_removed(RemovalReason::Discarded) {
        debug!(entity = ?cx.entity, y = state.core.position.y, "discarded below world");
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
