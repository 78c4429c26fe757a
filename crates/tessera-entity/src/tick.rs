//! One simulation step for one entity.

use glam::DVec3;
use tracing::trace;

use crate::context::{EntityState, SimContext, WorldView};
use crate::environment;
use crate::error::TickError;
use crate::fluids;
use crate::movement;

/// Velocity components below this are snapped to zero for living entities.
const IDLE_VELOCITY: f64 = 0.003;

/// Advance `state` by one game tick.
///
/// Works on a copy owned by the caller; on `Err` the caller discards it so
/// the entity keeps its pre-tick state.
pub fn tick_entity(state: &mut EntityState, view: &WorldView, cx: &mut SimContext) -> Result<(), TickError> {
    if state.core.is_removed() {
        return Ok(());
    }
    begin_tick(state);

    environment::tick_portal(&mut state.core, view, cx);
    environment::tick_fire(state, cx);
    fluids::update_fluids(&mut state.core, view, cx)?;
    if state.core.in_lava() {
        environment::lava_hurt(state, cx);
        state.core.fall_distance *= 0.5;
    }

    environment::tick_living(state, view, cx)?;

    if !state.core.is_removed() && !state.core.is_passenger() {
        if state.is_living() {
            snap_idle_velocity(&mut state.core.velocity);
        }
        movement::travel(state, view, cx)?;
    }
    environment::tick_freezing(state, cx);
    environment::check_below_world(state, view, cx);

    if !state.core.bounding_box.is_finite() {
        return Err(TickError::CorruptBounds(state.core.position));
    }
    trace!(entity = ?cx.entity, pos = ?state.core.position, "ticked");
    Ok(())
}

fn begin_tick(state: &mut EntityState) {
    let core = &mut state.core;
    core.age = core.age.wrapping_add(1);
    core.prev_position = core.position;
    core.prev_yaw = core.yaw;
    core.prev_pitch = core.pitch;
    core.was_on_fire = core.is_on_fire();
    core.was_in_powder_snow = core.in_powder_snow;
    core.in_powder_snow = false;
    if core.boarding_cooldown > 0 {
        core.boarding_cooldown -= 1;
    }
}

fn snap_idle_velocity(v: &mut DVec3) {
    for c in [&mut v.x, &mut v.y, &mut v.z] {
        if c.abs() < IDLE_VELOCITY {
            *c = 0.0;
        }
    }
}
