//! Fluid submersion and currents.

use glam::DVec3;
use tessera_math::{BlockPos, VecExt};
use tessera_world::{FluidKind, WorldError};

use crate::components::EntityCore;
use crate::context::{SimContext, WorldView};
use crate::events::Sound;

/// Current strength applied by water.
pub const WATER_PUSH: f64 = 0.014;
/// Current strength of lava in hot dimensions.
pub const LAVA_PUSH_ULTRAWARM: f64 = 0.007;
/// Current strength of lava elsewhere.
pub const LAVA_PUSH: f64 = 0.0023333333333333335;
/// Below this submersion depth each current is scaled by the depth.
const SHALLOW_DEPTH: f64 = 0.4;
/// Smallest push given to an entity standing still in a current.
const MIN_PUSH: f64 = 0.0045000000000000005;
/// Eye fluid is sampled this far below the eyes.
const EYE_OFFSET: f64 = 0.11111111;

/// Recompute every fluid contact of `core` and apply currents.
///
/// Returns whether the entity touches water or lava.
pub fn update_fluids(core: &mut EntityCore, view: &WorldView, cx: &mut SimContext) -> Result<bool, WorldError> {
    core.fluids.clear_heights();
    let in_water = update_water_contact(core, view, cx)?;

    let lava_push = if view.dimension.ultrawarm {
        LAVA_PUSH_ULTRAWARM
    } else {
        LAVA_PUSH
    };
    let in_lava = update_fluid_height_and_push(core, FluidKind::Lava, lava_push, view)?;

    update_eye_fluid(core, view)?;
    core.fluids.in_rain = is_in_rain(core, view)?;
    Ok(in_water || in_lava)
}

/// Water contact and current. Entering water resets the fall and puts out fire.
pub fn update_water_contact(core: &mut EntityCore, view: &WorldView, cx: &mut SimContext) -> Result<bool, WorldError> {
    let was_in_water = core.fluids.in_water;
    let in_water = update_fluid_height_and_push(core, FluidKind::Water, WATER_PUSH, view)?;
    if in_water {
        if !was_in_water && core.age > 1 {
            cx.sound(Sound::Splash, 0.2);
        }
        core.reset_fall_distance();
        core.clear_fire();
    }
    core.fluids.in_water = in_water;
    Ok(in_water)
}

/// Measure how deep `kind` reaches into the box and push along its flow.
pub fn update_fluid_height_and_push(
    core: &mut EntityCore,
    kind: FluidKind,
    scale: f64,
    view: &WorldView,
) -> Result<bool, WorldError> {
    let bounds = core.bounding_box.deflate(0.001);
    let (lo, hi) = bounds.block_range();
    let pushable = core.kind.pushed_by_fluids;
    let mut depth = 0.0_f64;
    let mut touching = false;
    let mut push = DVec3::ZERO;
    let mut currents = 0;

    for x in lo.x..hi.x {
        for y in lo.y..hi.y {
            for z in lo.z..hi.z {
                let pos = BlockPos::new(x, y, z);
                let state = view.level.fluid_state(pos)?;
                if !state.is(kind) {
                    continue;
                }
                let surface = y as f64 + state.height as f64;
                if surface < bounds.min.y {
                    continue;
                }
                touching = true;
                depth = depth.max(surface - bounds.min.y);
                if pushable {
                    let mut flow = state.flow;
                    if depth < SHALLOW_DEPTH {
                        flow *= depth;
                    }
                    push += flow;
                    currents += 1;
                }
            }
        }
    }

    if push.length() > 0.0 {
        if currents > 0 {
            push /= currents as f64;
        }
        if core.kind.normalizes_fluid_push {
            push = push.normalize();
        }
        push *= scale;
        let v = core.velocity;
        if v.x.abs() < 0.003 && v.z.abs() < 0.003 && push.length() < MIN_PUSH {
            push = push.normalize() * MIN_PUSH;
        }
        core.velocity += push;
    }
    core.fluids.set_height(kind, depth);
    Ok(touching)
}

/// Which fluid, if any, covers the eyes.
pub fn update_eye_fluid(core: &mut EntityCore, view: &WorldView) -> Result<(), WorldError> {
    core.fluids.eye_fluid = None;
    let eye = core.eye_y() - EYE_OFFSET;
    let pos = BlockPos::containing(DVec3::new(core.position.x, eye, core.position.z));
    let state = view.level.fluid_state(pos)?;
    if let Some(kind) = state.kind
        && pos.y as f64 + state.height as f64 > eye
    {
        core.fluids.eye_fluid = Some(kind);
    }
    Ok(())
}

/// Exposed to open sky while it rains.
fn is_in_rain(core: &EntityCore, view: &WorldView) -> Result<bool, WorldError> {
    if !view.raining {
        return Ok(false);
    }
    let pos = BlockPos::containing(core.position);
    Ok(view.level.surface_height(pos.x, pos.z)? <= pos.y)
}

/// Gravity and drag for one tick of travel through water.
pub fn water_drag(velocity: DVec3, gravity: f64, no_gravity: bool) -> DVec3 {
    let falling = velocity.y <= 0.0;
    let slowed = velocity.scale3(0.8, 0.8, 0.8);
    fluid_falling_adjusted(slowed, gravity, falling, no_gravity)
}

/// Gravity and drag for one tick of travel through lava.
pub fn lava_drag(velocity: DVec3, depth: f64, gravity: f64, no_gravity: bool) -> DVec3 {
    let falling = velocity.y <= 0.0;
    let mut v = if depth <= SHALLOW_DEPTH {
        fluid_falling_adjusted(velocity.scale3(0.5, 0.8, 0.5), gravity, falling, no_gravity)
    } else {
        velocity * 0.5
    };
    if !no_gravity {
        v.y -= gravity / 4.0;
    }
    v
}

fn fluid_falling_adjusted(v: DVec3, gravity: f64, falling: bool, no_gravity: bool) -> DVec3 {
    if no_gravity {
        return v;
    }
    let sink = gravity / 16.0;
    let y = if falling && (v.y - 0.005).abs() >= 0.003 && (v.y - sink).abs() < 0.003 {
        -0.003
    } else {
        v.y - sink
    };
    DVec3::new(v.x, y, v.z)
}
