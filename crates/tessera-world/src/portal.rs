//! Portal geometry: measuring frames, searching the portal index, building
//! new portals and mapping positions between two portal rectangles.

use glam::DVec3;
use tessera_math::{Axis, BlockPos, Direction};

use crate::block::{BlockId, PortalKind, ids};
use crate::border::WorldBorder;
use crate::dimension::DimensionType;
use crate::error::WorldError;
use crate::query::{BlockGetter, Level};

/// Interior of a portal: the lowest corner plus its extent along the portal
/// axis and upwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoundRectangle {
    pub min_corner: BlockPos,
    pub axis: Axis,
    pub width: i32,
    pub height: i32,
}

/// Where and how an entity leaves a portal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortalExit {
    pub position: DVec3,
    pub velocity: DVec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// Axis spanned by the nether portal block at `pos`, if any.
pub fn portal_axis<G: BlockGetter + ?Sized>(getter: &G, pos: BlockPos) -> Result<Option<Axis>, WorldError> {
    Ok(match getter.block_def(pos)?.portal {
        Some(PortalKind::Nether(axis)) => Some(axis),
        _ => None,
    })
}

/// Measure the run of `block` containing `pos` along `axis` and up, each
/// capped at `max_size`.
pub fn largest_rectangle_around<G: BlockGetter + ?Sized>(
    getter: &G,
    pos: BlockPos,
    axis: Axis,
    max_size: i32,
) -> Result<FoundRectangle, WorldError> {
    let block = getter.block(pos)?;
    let along = Direction::positive(axis);
    let same = |p: BlockPos| -> Result<bool, WorldError> { Ok(getter.block(p)? == block) };

    let mut corner = pos;
    for _ in 1..max_size {
        if !same(corner.below())? {
            break;
        }
        corner = corner.below();
    }
    for _ in 1..max_size {
        let next = corner.relative(along.opposite(), 1);
        if !same(next)? {
            break;
        }
        corner = next;
    }

    let mut width = 1;
    while width < max_size && same(corner.relative(along, width))? {
        width += 1;
    }
    let mut height = 1;
    while height < max_size && same(corner.relative(Direction::Up, height))? {
        height += 1;
    }

    Ok(FoundRectangle {
        min_corner: corner,
        axis,
        width,
        height,
    })
}

/// Closest indexed portal inside the border within `radius` of `pos`.
pub fn find_portal_around<L: Level + ?Sized>(
    level: &L,
    border: &WorldBorder,
    pos: BlockPos,
    radius: i32,
    max_size: i32,
) -> Result<Option<FoundRectangle>, WorldError> {
    let nearest = level
        .portals_within(pos, radius)?
        .into_iter()
        .filter(|p| border.contains_block(*p))
        .min_by_key(|p| (p.dist_sqr(pos), p.y));
    let Some(found) = nearest else {
        return Ok(None);
    };
    let Some(axis) = portal_axis(level, found)? else {
        tracing::warn!("portal index entry {} is not a portal block", found);
        return Ok(None);
    };
    largest_rectangle_around(level, found, axis, max_size).map(Some)
}

/// Build a 2x3 portal framed in obsidian near `pos`.
///
/// Looks for open floor within `radius`, first with clearance on both sides
/// of the portal plane and then without. Falls back to a floating platform
/// at `pos`. Returns `None` when even the fallback is outside the border or
/// the dimension is too short.
pub fn create_portal<L: Level + ?Sized>(
    level: &mut L,
    border: &WorldBorder,
    dimension: &DimensionType,
    pos: BlockPos,
    axis: Axis,
    radius: i32,
) -> Result<Option<FoundRectangle>, WorldError> {
    let along = Direction::positive(axis);
    let across = Direction::positive(if axis == Axis::X { Axis::Z } else { Axis::X });
    let top = dimension.logical_top().min(level.max_y() - 1);

    let mut base = None;
    for sides in [1, 0] {
        base = find_portal_site(level, border, pos, along, across, sides, radius, top)?;
        if base.is_some() {
            break;
        }
    }

    let base = match base {
        Some(b) => b,
        None => {
            let floor = (level.min_y() + 1).max(70);
            let ceiling = top - 9;
            if ceiling < floor {
                return Ok(None);
            }
            let b = BlockPos::new(pos.x, pos.y.clamp(floor, ceiling), pos.z);
            if !border.contains_block(b) {
                return Ok(None);
            }
            for side in -1..=1 {
                for step in 0..=1 {
                    for up in -1..=2 {
                        let cell = b.relative(along, step).relative(across, side).offset(0, up, 0);
                        let id = if up < 0 { ids::OBSIDIAN } else { ids::AIR };
                        level.set_block(cell, id)?;
                    }
                }
            }
            b
        }
    };

    let portal_block: BlockId = level.registry().nether_portal(axis);
    for step in -1..=2 {
        for up in -1..=3 {
            let cell = base.relative(along, step).offset(0, up, 0);
            let frame = step == -1 || step == 2 || up == -1 || up == 3;
            level.set_block(cell, if frame { ids::OBSIDIAN } else { portal_block })?;
        }
    }
    tracing::debug!(%base, ?axis, "built nether portal");

    Ok(Some(FoundRectangle {
        min_corner: base,
        axis,
        width: 2,
        height: 3,
    }))
}

#[allow(clippy::too_many_arguments)]
fn find_portal_site<L: Level + ?Sized>(
    level: &L,
    border: &WorldBorder,
    pos: BlockPos,
    along: Direction,
    across: Direction,
    sides: i32,
    radius: i32,
    top: i32,
) -> Result<Option<BlockPos>, WorldError> {
    let mut best: Option<(i64, BlockPos)> = None;
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            let (x, z) = (pos.x + dx, pos.z + dz);
            let column = BlockPos::new(x, 0, z);
            if !border.contains_block(column) || !border.contains_block(column.relative(along, 1)) {
                continue;
            }
            let y = level.surface_height(x, z)?;
            if y <= level.min_y() || y + 4 > top {
                continue;
            }
            let candidate = BlockPos::new(x, y, z);
            let dist = candidate.dist_sqr(pos);
            if best.is_some_and(|(d, _)| d <= dist) {
                continue;
            }
            if can_host_frame(level, candidate, along, across, sides)? {
                best = Some((dist, candidate));
            }
        }
    }
    Ok(best.map(|(_, p)| p))
}

/// Sturdy floor under and clear air inside the frame footprint.
fn can_host_frame<L: Level + ?Sized>(
    level: &L,
    base: BlockPos,
    along: Direction,
    across: Direction,
    sides: i32,
) -> Result<bool, WorldError> {
    for side in -sides..=sides {
        for step in -1..=2 {
            let column = base.relative(along, step).relative(across, side);
            if !level.block_def(column.below())?.is_sturdy() {
                return Ok(false);
            }
            for up in 0..=3 {
                if !level.block_def(column.offset(0, up, 0))?.is_air() {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

/// Entity position inside `rect` as fractions along the portal axis and up,
/// plus the raw offset through the portal plane.
pub fn relative_portal_position(rect: &FoundRectangle, position: DVec3, width: f64, height: f64) -> DVec3 {
    let corner = rect.min_corner;
    let spare_w = rect.width as f64 - width;
    let spare_h = rect.height as f64 - height;

    let along = if spare_w > 0.0 {
        let start = corner.get(rect.axis) as f64 + width / 2.0;
        ((rect.axis.choose(position) - start) / spare_w).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let up = if spare_h > 0.0 {
        ((position.y - corner.y as f64) / spare_h).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let other = if rect.axis == Axis::X { Axis::Z } else { Axis::X };
    let through = other.choose(position) - (corner.get(other) as f64 + 0.5);
    DVec3::new(along, up, through)
}

/// Exit through `exit` for an entity that entered a portal spanning
/// `entry_axis` at `relative` (see [`relative_portal_position`]).
///
/// Velocity and yaw turn by 90 degrees when the two portals face different ways.
#[allow(clippy::too_many_arguments)]
pub fn portal_exit(
    exit: &FoundRectangle,
    exit_axis: Axis,
    entry_axis: Axis,
    relative: DVec3,
    width: f64,
    height: f64,
    velocity: DVec3,
    yaw: f32,
    pitch: f32,
) -> PortalExit {
    let corner = exit.min_corner;
    let (turn, velocity) = if entry_axis == exit_axis {
        (0.0, velocity)
    } else {
        (90.0, DVec3::new(velocity.z, velocity.y, -velocity.x))
    };
    let along = width / 2.0 + (exit.width as f64 - width) * relative.x;
    let up = (exit.height as f64 - height) * relative.y;
    let through = 0.5 + relative.z;
    let position = if exit_axis == Axis::X {
        DVec3::new(corner.x as f64 + along, corner.y as f64 + up, corner.z as f64 + through)
    } else {
        DVec3::new(corner.x as f64 + through, corner.y as f64 + up, corner.z as f64 + along)
    };
    PortalExit {
        position,
        velocity,
        yaw: yaw + turn,
        pitch,
    }
}

/// Obsidian floor with three cells of air above, centred on `spawn`.
pub fn build_end_platform<L: Level + ?Sized>(level: &mut L, spawn: BlockPos) -> Result<(), WorldError> {
    for dx in -2..=2 {
        for dz in -2..=2 {
            for dy in -1..=2 {
                let id = if dy == -1 { ids::OBSIDIAN } else { ids::AIR };
                level.set_block(spawn.offset(dx, dy, dz), id)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::block::BlockRegistry;
    use crate::query::{HeightmapGetter, PortalIndex};
    use crate::storage::VoxelWorld;

    fn flat(dimension: &DimensionType, floor_y: i32) -> VoxelWorld {
        let mut w = VoxelWorld::new(Arc::new(BlockRegistry::standard()), dimension);
        w.fill(BlockPos::new(-20, floor_y, -20), BlockPos::new(20, floor_y, 20), ids::STONE)
            .unwrap();
        w
    }

    #[test]
    fn test_create_then_find_portal() {
        let dim = DimensionType::overworld();
        let mut w = flat(&dim, 63);
        let border = WorldBorder::default();
        let rect = create_portal(&mut w, &border, &dim, BlockPos::new(0, 64, 0), Axis::X, 16)
            .unwrap()
            .unwrap();
        assert_eq!(rect.min_corner.y, 64);
        assert_eq!(w.portals_within(rect.min_corner, 2).unwrap().len(), 6);

        let found = find_portal_around(&w, &border, BlockPos::new(3, 64, 3), 16, 21)
            .unwrap()
            .unwrap();
        assert_eq!(found, rect);
    }

    #[test]
    fn test_rectangle_measured_from_any_interior_cell() {
        let dim = DimensionType::overworld();
        let mut w = flat(&dim, 63);
        let border = WorldBorder::default();
        let rect = create_portal(&mut w, &border, &dim, BlockPos::new(0, 64, 0), Axis::Z, 16)
            .unwrap()
            .unwrap();
        let top = rect.min_corner.relative(Direction::South, 1).offset(0, 2, 0);
        let measured = largest_rectangle_around(&w, top, Axis::Z, 21).unwrap();
        assert_eq!(measured, rect);
    }

    #[test]
    fn test_create_portal_falls_back_to_platform_over_void() {
        let dim = DimensionType::nether();
        let mut w = VoxelWorld::new(Arc::new(BlockRegistry::standard()), &dim);
        let border = WorldBorder::default();
        let rect = create_portal(&mut w, &border, &dim, BlockPos::new(5, 40, 5), Axis::X, 4)
            .unwrap()
            .unwrap();
        assert_eq!(rect.min_corner, BlockPos::new(5, 70, 5));
        assert_eq!(w.block(BlockPos::new(5, 69, 5)).unwrap(), ids::OBSIDIAN);
    }

    #[test]
    fn test_find_portal_respects_radius() {
        let dim = DimensionType::overworld();
        let mut w = flat(&dim, 63);
        let border = WorldBorder::default();
        create_portal(&mut w, &border, &dim, BlockPos::new(0, 64, 0), Axis::X, 0).unwrap();
        let far = find_portal_around(&w, &border, BlockPos::new(200, 64, 0), 16, 21).unwrap();
        assert!(far.is_none());
    }

    #[test]
    fn test_relative_position_round_trips_same_axis() {
        let rect = FoundRectangle {
            min_corner: BlockPos::new(0, 64, 0),
            axis: Axis::X,
            width: 2,
            height: 3,
        };
        let entry = DVec3::new(1.2, 64.5, 0.7);
        let relative = relative_portal_position(&rect, entry, 0.6, 1.8);
        let exit = portal_exit(&rect, Axis::X, Axis::X, relative, 0.6, 1.8, DVec3::X, 10.0, 5.0);
        assert!((exit.position - entry).length() < 1e-9, "got {:?}", exit.position);
        assert_eq!(exit.velocity, DVec3::X);
        assert_eq!(exit.yaw, 10.0);
    }

    #[test]
    fn test_exit_rotates_between_axes() {
        let rect = FoundRectangle {
            min_corner: BlockPos::new(0, 64, 0),
            axis: Axis::Z,
            width: 2,
            height: 3,
        };
        let exit = portal_exit(
            &rect,
            Axis::Z,
            Axis::X,
            DVec3::new(0.5, 0.0, 0.0),
            0.6,
            1.8,
            DVec3::new(1.0, 0.0, 0.0),
            0.0,
            0.0,
        );
        assert_eq!(exit.yaw, 90.0);
        assert!((exit.velocity - DVec3::new(0.0, 0.0, -1.0)).length() < 1e-12);
        assert!((exit.position - DVec3::new(0.5, 64.0, 1.0)).length() < 1e-9);
    }

    #[test]
    fn test_end_platform() {
        let dim = DimensionType::end();
        let mut w = VoxelWorld::new(Arc::new(BlockRegistry::standard()), &dim);
        build_end_platform(&mut w, BlockPos::new(100, 50, 0)).unwrap();
        assert_eq!(w.block(BlockPos::new(98, 49, 2)).unwrap(), ids::OBSIDIAN);
        assert_eq!(w.surface_height(100, 0).unwrap(), 50);
    }
}
