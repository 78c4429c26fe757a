//! Swept box collision with step-up.
//!
//! Motion is resolved one axis at a time against every obstacle near the
//! swept volume: voxel shapes, the world border when the box is close to
//! it, and other collidable entities. Y is always resolved first; the larger
//! horizontal component goes last so that sliding along walls feels right.

use glam::DVec3;
use tessera_math::{Aabb, Axis, VecExt, collide_axis};
use tessera_world::WorldError;

use crate::components::CollisionFlags;
use crate::context::WorldView;

/// Squared length under which motion is committed without collision.
pub const MIN_MOVEMENT_SQR: f64 = 1.0e-7;

/// Tolerance for deciding whether a horizontal component was clipped.
const HORIZONTAL_TOLERANCE: f64 = 1.0e-5;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Resolution {
    /// Displacement that can actually be applied.
    pub movement: DVec3,
    pub flags: CollisionFlags,
}

/// Resolve `desired` for a box at `bounds`.
///
/// `on_ground` and `max_up_step` enable stepping up ledges no taller than
/// the step height when a horizontal axis is blocked.
pub fn resolve(
    view: &WorldView,
    bounds: &Aabb,
    desired: DVec3,
    max_up_step: f64,
    on_ground: bool,
    minor_degrees: f64,
) -> Result<Resolution, WorldError> {
    if bounds.is_degenerate() || !bounds.is_finite() || !desired.is_finite() {
        return Ok(Resolution::default());
    }
    if desired.length_squared() < MIN_MOVEMENT_SQR {
        return Ok(Resolution {
            movement: desired,
            flags: CollisionFlags::default(),
        });
    }

    let mut region = bounds.expand_towards(desired);
    if max_up_step > 0.0 {
        region = region.expand_towards(DVec3::new(0.0, max_up_step, 0.0));
    }
    let shapes = gather_shapes(view, bounds, &region)?;
    let movement = collide_with_step(bounds, desired, &shapes, max_up_step, on_ground);
    Ok(Resolution {
        movement,
        flags: classify(desired, movement, minor_degrees),
    })
}

/// Obstacles intersecting `region`.
pub fn gather_shapes(view: &WorldView, bounds: &Aabb, region: &Aabb) -> Result<Vec<Aabb>, WorldError> {
    let mut shapes: Vec<Aabb> = view
        .entity_shapes
        .iter()
        .filter(|s| s.intersects(region))
        .copied()
        .collect();
    let center = bounds.center();
    let feet = DVec3::new(center.x, bounds.min.y, center.z);
    if view.border.is_inside_close_to_border(feet, bounds) {
        shapes.extend(view.border.collision_shapes());
    }
    shapes.extend(view.level.block_collisions(region)?);
    Ok(shapes)
}

/// Axis-ordered resolution plus the step-up attempt.
pub fn collide_with_step(
    bounds: &Aabb,
    desired: DVec3,
    shapes: &[Aabb],
    max_up_step: f64,
    on_ground: bool,
) -> DVec3 {
    let resolved = collide_with_shapes(desired, bounds, shapes);
    let x_blocked = desired.x != resolved.x;
    let y_blocked = desired.y != resolved.y;
    let z_blocked = desired.z != resolved.z;
    let grounded = on_ground || (y_blocked && desired.y < 0.0);
    if max_up_step <= 0.0 || !grounded || !(x_blocked || z_blocked) {
        return resolved;
    }

    let mut best = collide_with_shapes(
        DVec3::new(desired.x, max_up_step, desired.z),
        bounds,
        shapes,
    );
    let lift = collide_with_shapes(
        DVec3::new(0.0, max_up_step, 0.0),
        &bounds.expand_towards(DVec3::new(desired.x, 0.0, desired.z)),
        shapes,
    );
    if lift.y < max_up_step {
        let across = collide_with_shapes(
            DVec3::new(desired.x, 0.0, desired.z),
            &bounds.translate(lift),
            shapes,
        ) + lift;
        if across.horizontal_distance_sqr() > best.horizontal_distance_sqr() {
            best = across;
        }
    }
    if best.horizontal_distance_sqr() > resolved.horizontal_distance_sqr() {
        let settle = collide_with_shapes(
            DVec3::new(0.0, -best.y + desired.y, 0.0),
            &bounds.translate(best),
            shapes,
        );
        return best + settle;
    }
    resolved
}

/// Clip `movement` axis by axis: Y, then the smaller horizontal component,
/// then the larger one.
pub fn collide_with_shapes(movement: DVec3, bounds: &Aabb, shapes: &[Aabb]) -> DVec3 {
    if shapes.is_empty() {
        return movement;
    }
    let mut moving = *bounds;
    let mut dx = movement.x;
    let mut dy = movement.y;
    let mut dz = movement.z;

    if dy != 0.0 {
        dy = collide_axis(Axis::Y, &moving, shapes, dy);
        if dy != 0.0 {
            moving = moving.translate(DVec3::new(0.0, dy, 0.0));
        }
    }
    let z_first = dx.abs() < dz.abs();
    if z_first && dz != 0.0 {
        dz = collide_axis(Axis::Z, &moving, shapes, dz);
        if dz != 0.0 {
            moving = moving.translate(DVec3::new(0.0, 0.0, dz));
        }
    }
    if dx != 0.0 {
        dx = collide_axis(Axis::X, &moving, shapes, dx);
        if !z_first && dx != 0.0 {
            moving = moving.translate(DVec3::new(dx, 0.0, 0.0));
        }
    }
    if !z_first && dz != 0.0 {
        dz = collide_axis(Axis::Z, &moving, shapes, dz);
    }
    DVec3::new(dx, dy, dz)
}

/// Collision flags for a resolved move.
pub fn classify(desired: DVec3, actual: DVec3, minor_degrees: f64) -> CollisionFlags {
    let x_blocked = (desired.x - actual.x).abs() >= HORIZONTAL_TOLERANCE;
    let z_blocked = (desired.z - actual.z).abs() >= HORIZONTAL_TOLERANCE;
    let horizontal = x_blocked || z_blocked;
    let vertical = desired.y != actual.y;
    CollisionFlags {
        horizontal,
        vertical,
        vertical_below: vertical && desired.y < 0.0,
        minor_horizontal: horizontal && is_minor_deflection(desired, actual, minor_degrees),
    }
}

/// The resolved horizontal direction stays within `degrees` of the desired one.
fn is_minor_deflection(desired: DVec3, actual: DVec3, degrees: f64) -> bool {
    let want = desired.horizontal_distance_sqr();
    let got = actual.horizontal_distance_sqr();
    if want < 1.0e-5 || got < 1.0e-5 {
        return false;
    }
    let cos = (desired.x * actual.x + desired.z * actual.z) / (want * got).sqrt();
    cos.clamp(-1.0, 1.0).acos() < degrees.to_radians()
}

#[cfg(test)]
#[path = "collision_tests.rs"]
mod tests;
