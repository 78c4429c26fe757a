//! Moving entities between regions through portals.

use bevy_ecs::entity::Entity;
use glam::DVec3;
use tessera_math::{Axis, BlockPos};
use tessera_world::portal::{
    self, FoundRectangle, PortalExit, build_end_platform, create_portal, find_portal_around,
};
use tessera_world::{DimensionKind, WorldError};
use tracing::{debug, info};

use crate::components::RemovalReason;
use crate::context::EntityState;
use crate::error::TransferError;
use crate::persist;
use crate::region::Region;

/// Move `id` from `src` into `dst`.
///
/// The arrival point is worked out before anything is changed; when there is
/// none (for example between two overworld regions) the entity stays where it
/// is and `Ok(None)` is returned. Otherwise the entity is re-created in `dst`
/// from its saved record, then removed from `src` without dropping loot,
/// which also severs its riding links.
pub fn transfer(src: &mut Region, dst: &mut Region, id: Entity) -> Result<Option<Entity>, TransferError> {
    let Some(state) = src.snapshot(id) else {
        return Err(TransferError::MissingEntity(id));
    };
    if state.core.is_removed() || !state.core.kind.can_change_dimensions {
        return Ok(None);
    }
    let from = src.dimension().kind;
    let to = dst.dimension().kind;
    let Some(exit) = find_exit(src, dst, &state)? else {
        debug!(entity = ?id, ?from, ?to, "no portal exit");
        return Ok(None);
    };

    let mut record = persist::save_without_id(&state);
    record.position = exit.position;
    record.velocity = exit.velocity;
    record.yaw = exit.yaw;
    record.pitch = exit.pitch;
    // Arrive first so a failed spawn leaves the original and its links intact.
    let arrived = dst.spawn_from_record(&record)?;
    if let Err(err) = src.remove(id, RemovalReason::ChangedDimension) {
        dst.forget(arrived);
        return Err(err.into());
    }

    info!(
        entity = ?id,
        arrived = ?arrived,
        kind = %record.type_key,
        ?from,
        ?to,
        position = ?exit.position,
        "entity changed dimension"
    );
    Ok(Some(arrived))
}

/// Where an entity leaving `src` for `dst` comes out, building the End
/// platform or a nether portal in `dst` when needed.
fn find_exit(src: &Region, dst: &mut Region, state: &EntityState) -> Result<Option<PortalExit>, WorldError> {
    let core = &state.core;
    let from = src.dimension().kind;
    let to = dst.dimension().kind;
    let keep_motion = |position: DVec3| PortalExit {
        position,
        velocity: core.velocity,
        yaw: core.yaw,
        pitch: core.pitch,
    };

    if to == DimensionKind::End {
        let [x, y, z] = dst.config().portal.end_spawn;
        let spawn = BlockPos::new(x, y, z);
        build_end_platform(dst.level_mut(), spawn)?;
        return Ok(Some(keep_motion(spawn.bottom_center())));
    }
    if from == DimensionKind::End && to == DimensionKind::Overworld {
        let spawn = dst.spawn_point();
        let y = dst.level().surface_height(spawn.x, spawn.z)?;
        return Ok(Some(keep_motion(BlockPos::new(spawn.x, y, spawn.z).bottom_center())));
    }
    if from != DimensionKind::Nether && to != DimensionKind::Nether {
        return Ok(None);
    }

    let portal_config = dst.config().portal.clone();
    let into_nether = to == DimensionKind::Nether;
    let scale = src.dimension().scale_to(dst.dimension());
    let target = dst
        .border()
        .clamp_to_bounds(core.position.x * scale, core.position.y, core.position.z * scale);

    let (entry_axis, relative) = entry_geometry(src, state, portal_config.max_frame_size)?;
    let radius = if into_nether {
        portal_config.nether_search_radius
    } else {
        portal_config.search_radius
    };
    let border = *dst.border();
    let dimension = dst.dimension().clone();
    let found = find_portal_around(dst.level(), &border, target, radius, portal_config.max_frame_size)?;
    let rect = match found {
        Some(rect) => rect,
        None => {
            let created = create_portal(
                dst.level_mut(),
                &border,
                &dimension,
                target,
                entry_axis,
                portal_config.create_radius,
            )?;
            match created {
                Some(rect) => rect,
                None => return Ok(None),
            }
        }
    };
    let exit_axis = portal::portal_axis(dst.level(), rect.min_corner)?.unwrap_or(Axis::X);
    let dims = core.dimensions;
    Ok(Some(portal::portal_exit(
        &rect,
        exit_axis,
        entry_axis,
        relative,
        dims.width as f64,
        dims.height as f64,
        core.velocity,
        core.yaw,
        core.pitch,
    )))
}

/// Axis of the portal the entity stepped into and its position within it.
fn entry_geometry(src: &Region, state: &EntityState, max_size: i32) -> Result<(Axis, DVec3), WorldError> {
    let fallback = (Axis::X, DVec3::new(0.5, 0.0, 0.0));
    let Some(entrance) = state.core.portal.entrance else {
        return Ok(fallback);
    };
    let Some(axis) = portal::portal_axis(src.level(), entrance)? else {
        return Ok(fallback);
    };
    let rect: FoundRectangle = portal::largest_rectangle_around(src.level(), entrance, axis, max_size)?;
    let dims = state.core.dimensions;
    let relative = portal::relative_portal_position(
        &rect,
        state.core.position,
        dims.width as f64,
        dims.height as f64,
    );
    Ok((axis, relative))
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
