//! Moving an entity through the world and reacting to the result.

use glam::DVec3;
use tessera_math::{Axis, BlockPos, VecExt};
use tessera_world::{BlockDef, FluidKind, PortalKind, WorldError};
use tracing::{debug, warn};

use crate::collision::resolve;
use crate::components::EntityCore;
use crate::context::{EntityState, SimContext, WorldView};
use crate::damage::{self, DamageKind};
use crate::events::{EntityEvent, GameEventKind, Sound};
use crate::fluids;

/// Velocity multiplier while stuck in powder snow.
const POWDER_SNOW_STUCK: DVec3 = DVec3::new(0.9, 1.5, 0.9);
/// Drag applied vertically every tick in air.
const AIR_DRAG: f64 = 0.98;
/// Horizontal drag in air, further reduced by block friction on ground.
const AIR_FRICTION: f32 = 0.91;

/// What is driving a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoverType {
    /// The entity's own velocity.
    Own,
    /// A piston or similar block; clamped per game tick.
    Piston,
}

/// Move by `movement`, resolving collisions and running every consequence
/// of the move: flags, fall damage, blocked velocity, step markers and
/// inside-block effects.
pub fn move_entity(
    state: &mut EntityState,
    mover: MoverType,
    movement: DVec3,
    view: &WorldView,
    cx: &mut SimContext,
) -> Result<(), WorldError> {
    if !movement.is_finite() {
        warn!(entity = ?cx.entity, ?movement, "rejecting non-finite movement");
        return Ok(());
    }
    let config = cx.config;
    let mut movement = movement;
    if mover == MoverType::Piston {
        movement = limit_piston_movement(
            &mut state.core,
            movement,
            cx.game_time,
            config.physics.piston_limit,
        );
        if movement == DVec3::ZERO {
            return Ok(());
        }
    }
    if let Some(stuck) = state.core.stuck_multiplier.take() {
        movement *= stuck;
        state.core.velocity = DVec3::ZERO;
    }

    let core = &mut state.core;
    let resolution = resolve(
        view,
        &core.bounding_box,
        movement,
        core.kind.max_up_step as f64,
        core.on_ground,
        config.physics.minor_collision_degrees,
    )?;
    let actual = resolution.movement;
    if actual != DVec3::ZERO {
        core.set_pos(core.position + actual);
    }
    core.collisions = resolution.flags;
    core.on_ground = resolution.flags.vertical_below;

    let landing = on_pos(core);
    check_fall_damage(state, actual.y, landing, view, cx)?;
    if state.core.is_removed() {
        return Ok(());
    }

    let core = &mut state.core;
    let x_blocked = (movement.x - actual.x).abs() >= 1.0e-5;
    let z_blocked = (movement.z - actual.z).abs() >= 1.0e-5;
    if x_blocked || z_blocked {
        let v = core.velocity;
        core.velocity = DVec3::new(
            if x_blocked { 0.0 } else { v.x },
            v.y,
            if z_blocked { 0.0 } else { v.z },
        );
    }
    if movement.y != actual.y {
        core.velocity.y = 0.0;
    }

    if core.kind.emits_steps && !core.is_passenger() {
        emit_step_markers(core, actual, landing, view, cx, config.physics.step_distance_scale)?;
    }

    check_inside_blocks(state, view, cx)?;

    let factor = block_speed_factor(&state.core, view)? as f64;
    state.core.velocity = state.core.velocity.scale3(factor, 1.0, factor);

    update_fire_baseline(&mut state.core, view, cx)?;
    Ok(())
}

/// Clamp piston displacement so it accumulates to at most `limit` per axis
/// within one game tick. Only one axis moves at a time.
pub fn limit_piston_movement(core: &mut EntityCore, movement: DVec3, game_time: u64, limit: f64) -> DVec3 {
    if movement.length_squared() <= 1.0e-7 {
        return movement;
    }
    if game_time != core.piston_game_time {
        core.piston_deltas = DVec3::ZERO;
        core.piston_game_time = game_time;
    }
    let axis = if movement.x != 0.0 {
        Axis::X
    } else if movement.y != 0.0 {
        Axis::Y
    } else {
        Axis::Z
    };
    let accumulated = axis.choose(core.piston_deltas);
    let clamped = (accumulated + axis.choose(movement)).clamp(-limit, limit);
    let allowed = clamped - accumulated;
    core.piston_deltas = core.piston_deltas.with_axis(axis, clamped);
    if allowed.abs() <= 1.0e-5 {
        DVec3::ZERO
    } else {
        DVec3::ZERO.with_axis(axis, allowed)
    }
}

/// Block the entity is standing on.
pub fn on_pos(core: &EntityCore) -> BlockPos {
    BlockPos::containing(core.position - DVec3::new(0.0, 0.2, 0.0))
}

/// Block whose friction and speed affect horizontal movement.
pub fn block_below_affecting_movement(core: &EntityCore) -> BlockPos {
    BlockPos::containing(DVec3::new(
        core.position.x,
        core.bounding_box.min.y - 0.5000001,
        core.position.z,
    ))
}

fn check_fall_damage(
    state: &mut EntityState,
    dy: f64,
    landing: BlockPos,
    view: &WorldView,
    cx: &mut SimContext,
) -> Result<(), WorldError> {
    if state.is_living() && !state.core.in_water() && state.core.fall_distance > 0.0 {
        fluids::update_water_contact(&mut state.core, view, cx)?;
    }
    if state.core.on_ground {
        if state.core.fall_distance > 0.0 {
            let multiplier = view.level.block_def(landing)?.fall_damage_multiplier;
            let distance = state.core.fall_distance;
            damage::cause_fall_damage(state, distance, multiplier, cx);
            cx.game_event(GameEventKind::HitGround, state.core.position);
        }
        state.core.reset_fall_distance();
    } else if dy < 0.0 {
        state.core.fall_distance -= dy as f32;
    }
    Ok(())
}

fn emit_step_markers(
    core: &mut EntityCore,
    actual: DVec3,
    landing: BlockPos,
    view: &WorldView,
    cx: &mut SimContext,
    scale: f64,
) -> Result<(), WorldError> {
    let feet = view.level.block_def(BlockPos::containing(core.position))?;
    let dy = if feet.powder_snow { actual.y } else { 0.0 };
    let travelled = (actual.x * actual.x + dy * dy + actual.z * actual.z).sqrt();
    core.move_dist += (travelled * scale) as f32;

    if core.move_dist > core.next_step && !view.level.block_def(landing)?.is_air() {
        core.next_step = core.move_dist.floor() + 1.0;
        if core.in_water() {
            cx.sound(Sound::Swim, 0.35);
            cx.game_event(GameEventKind::Swim, core.position);
        } else {
            cx.sound(Sound::Step, 0.15);
            cx.game_event(GameEventKind::Step, core.position);
        }
    }
    Ok(())
}

/// Apply the effects of every block the box overlaps.
pub fn check_inside_blocks(state: &mut EntityState, view: &WorldView, cx: &mut SimContext) -> Result<(), WorldError> {
    let bounds = state.core.bounding_box;
    let lo = BlockPos::containing(bounds.min + DVec3::splat(0.001));
    let hi = BlockPos::containing(bounds.max - DVec3::splat(0.001));
    let mut end_portal_touched = false;
    for x in lo.x..=hi.x {
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                let pos = BlockPos::new(x, y, z);
                let def = view.level.block_def(pos)?;
                entity_inside(state, pos, def, view, cx, &mut end_portal_touched)?;
                if state.core.is_removed() {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

fn entity_inside(
    state: &mut EntityState,
    pos: BlockPos,
    def: &BlockDef,
    view: &WorldView,
    cx: &mut SimContext,
    end_portal_touched: &mut bool,
) -> Result<(), WorldError> {
    let env = &cx.config.environment;
    let (fire_seconds, fire_damage) = (env.fire_block_seconds, env.fire_block_damage);

    if let Some(portal) = def.portal {
        let core = &mut state.core;
        let can_travel = !core.is_passenger() && !core.is_vehicle() && core.kind.can_change_dimensions;
        match portal {
            PortalKind::Nether(_) if can_travel => {
                if core.portal.cooldown > 0 {
                    core.portal.cooldown = core.kind.portal_cooldown_ticks;
                } else {
                    core.portal.entrance = Some(pos);
                    core.portal.inside = true;
                }
            }
            PortalKind::End if can_travel && !*end_portal_touched => {
                *end_portal_touched = true;
                let destination = view.dimension.kind.end_portal_target();
                debug!(entity = ?cx.entity, ?destination, "end portal entered");
                let entity = cx.entity;
                cx.emit(EntityEvent::PortalTransfer {
                    entity,
                    destination,
                });
            }
            _ => {}
        }
    }

    if def.burning {
        let core = &mut state.core;
        if !core.fire_immune() {
            core.fire_ticks += 1;
            if core.fire_ticks == 0 {
                core.set_seconds_on_fire(fire_seconds);
            }
        }
        damage::hurt_by_environment(state, DamageKind::InFire, fire_damage, cx);
    }

    if def.powder_snow {
        let feet_in_snow = view
            .level
            .block_def(BlockPos::containing(state.core.position))?
            .powder_snow;
        let core = &mut state.core;
        if state.living.is_none() || feet_in_snow {
            core.stuck_multiplier = Some(POWDER_SNOW_STUCK);
            core.reset_fall_distance();
        }
        core.in_powder_snow = true;
    }
    Ok(())
}

/// Horizontal speed multiplier of the block at the feet, or below it.
pub fn block_speed_factor(core: &EntityCore, view: &WorldView) -> Result<f32, WorldError> {
    let feet = view.level.block_def(BlockPos::containing(core.position))?;
    let is_water = feet.fluid.is_some_and(|f| f.kind == FluidKind::Water);
    if is_water || feet.speed_factor != 1.0 {
        return Ok(feet.speed_factor);
    }
    Ok(view
        .level
        .block_def(block_below_affecting_movement(core))?
        .speed_factor)
}

/// Reset the fire timer to the immunity baseline away from fire, and put
/// out flames in water, rain or powder snow.
fn update_fire_baseline(core: &mut EntityCore, view: &WorldView, cx: &mut SimContext) -> Result<(), WorldError> {
    let (lo, hi) = core.bounding_box.deflate(1.0e-6).block_range();
    let mut touching_fire = false;
    'scan: for x in lo.x..hi.x {
        for y in lo.y..hi.y {
            for z in lo.z..hi.z {
                let def = view.level.block_def(BlockPos::new(x, y, z))?;
                if def.burning || def.fluid.is_some_and(|f| f.kind == FluidKind::Lava) {
                    touching_fire = true;
                    break 'scan;
                }
            }
        }
    }
    let doused = core.in_powder_snow || core.in_water_or_rain();
    if !touching_fire {
        if core.fire_ticks <= 0 {
            core.fire_ticks = -core.kind.fire_immune_ticks;
        }
        if core.was_on_fire && doused {
            cx.sound(Sound::Extinguish, 0.7);
        }
    }
    if core.is_on_fire() && doused {
        core.fire_ticks = -core.kind.fire_immune_ticks;
    }
    Ok(())
}

/// Move with the current velocity, then apply drag and gravity for the
/// medium the entity is in.
pub fn travel(state: &mut EntityState, view: &WorldView, cx: &mut SimContext) -> Result<(), WorldError> {
    let gravity = state.core.kind.gravity;
    let no_gravity = state.core.no_gravity;

    if state.core.in_water() {
        let velocity = state.core.velocity;
        move_entity(state, MoverType::Own, velocity, view, cx)?;
        state.core.velocity = fluids::water_drag(state.core.velocity, gravity, no_gravity);
    } else if state.core.in_lava() {
        let velocity = state.core.velocity;
        move_entity(state, MoverType::Own, velocity, view, cx)?;
        let depth = state.core.fluids.height(FluidKind::Lava);
        state.core.velocity = fluids::lava_drag(state.core.velocity, depth, gravity, no_gravity);
    } else {
        let friction = if state.core.on_ground {
            let below = block_below_affecting_movement(&state.core);
            view.level.block_def(below)?.friction * AIR_FRICTION
        } else {
            AIR_FRICTION
        };
        let friction = friction as f64;
        let velocity = state.core.velocity;
        move_entity(state, MoverType::Own, velocity, view, cx)?;
        let mut v = state.core.velocity;
        if !no_gravity {
            v.y -= gravity;
        }
        state.core.velocity = DVec3::new(v.x * friction, v.y * AIR_DRAG, v.z * friction);
    }
    Ok(())
}

#[cfg(test)]
#[path = "movement_tests.rs"]
mod tests;
