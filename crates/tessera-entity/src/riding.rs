//! The vehicle/passenger graph.
//!
//! Links are stored on both ends: a rider's [`EntityCore::vehicle`] and the
//! vehicle's [`EntityCore::passengers`]. Every operation here leaves the two
//! sides consistent and checks that before returning.

use bevy_ecs::entity::Entity;
use bevy_ecs::world::World;
use glam::DVec3;
use tracing::{debug, error};

use crate::components::{EntityCore, Pose, Rideable};
use crate::error::RidingError;

fn core(world: &World, id: Entity) -> Result<&EntityCore, RidingError> {
    world
        .get::<EntityCore>(id)
        .ok_or(RidingError::MissingEntity(id))
}

fn core_mut(world: &mut World, id: Entity) -> Result<bevy_ecs::world::Mut<'_, EntityCore>, RidingError> {
    world
        .get_mut::<EntityCore>(id)
        .ok_or(RidingError::MissingEntity(id))
}

/// The bottom of the vehicle stack `id` sits in.
pub fn root_vehicle(world: &World, id: Entity) -> Entity {
    let mut current = id;
    while let Some(vehicle) = world.get::<EntityCore>(current).and_then(|c| c.vehicle) {
        if vehicle == id {
            break;
        }
        current = vehicle;
    }
    current
}

/// `ancestor` is `id` or somewhere below it in its vehicle chain.
fn is_in_vehicle_chain(world: &World, id: Entity, ancestor: Entity) -> bool {
    let mut current = Some(id);
    while let Some(e) = current {
        if e == ancestor {
            return true;
        }
        current = world.get::<EntityCore>(e).and_then(|c| c.vehicle);
    }
    false
}

/// Seat `rider` on `vehicle`. Returns `Ok(false)` when the ride is refused.
///
/// `force` skips the boarding cooldown and the capacity check but never the
/// structural ones: no self-riding, no cycles, no removed entities.
pub fn start_riding(world: &mut World, rider: Entity, vehicle: Entity, force: bool) -> Result<bool, RidingError> {
    let rider_core = core(world, rider)?;
    let vehicle_core = core(world, vehicle)?;
    if rider == vehicle || rider_core.vehicle == Some(vehicle) {
        return Ok(false);
    }
    if rider_core.is_removed() || vehicle_core.is_removed() {
        return Ok(false);
    }
    if is_in_vehicle_chain(world, vehicle, rider) {
        debug!(?rider, ?vehicle, "refusing ride that would form a cycle");
        return Ok(false);
    }
    if !force {
        if rider_core.boarding_cooldown > 0 {
            return Ok(false);
        }
        let capacity = world.get::<Rideable>(vehicle).map_or(0, |r| r.max_passengers);
        if vehicle_core.passengers.len() >= capacity {
            return Ok(false);
        }
    }

    if rider_core.is_passenger() {
        stop_riding(world, rider, 0)?;
    }
    {
        let mut rider_core = core_mut(world, rider)?;
        rider_core.set_pose(Pose::Standing);
        rider_core.vehicle = Some(vehicle);
    }
    core_mut(world, vehicle)?.passengers.push(rider);
    position_rider(world, rider)?;
    verify_links(world, rider)?;
    Ok(true)
}

/// Dismount `rider`, starting its boarding cooldown. `Ok(false)` when it
/// was not riding anything.
pub fn stop_riding(world: &mut World, rider: Entity, cooldown: i32) -> Result<bool, RidingError> {
    let Some(vehicle) = core_mut(world, rider)?.vehicle.take() else {
        return Ok(false);
    };
    if let Some(mut vehicle_core) = world.get_mut::<EntityCore>(vehicle) {
        vehicle_core.passengers.retain(|p| *p != rider);
    }
    core_mut(world, rider)?.boarding_cooldown = cooldown;
    verify_links(world, rider)?;
    Ok(true)
}

/// Dismount every passenger of `vehicle`. Returns how many left.
pub fn eject_passengers(world: &mut World, vehicle: Entity, cooldown: i32) -> Result<usize, RidingError> {
    let passengers = core(world, vehicle)?.passengers.clone();
    let mut ejected = 0;
    for passenger in passengers {
        if stop_riding(world, passenger, cooldown)? {
            ejected += 1;
        }
    }
    verify_links(world, vehicle)?;
    Ok(ejected)
}

/// Snap `rider` onto its vehicle's seat.
pub fn position_rider(world: &mut World, rider: Entity) -> Result<(), RidingError> {
    let Some(vehicle) = core(world, rider)?.vehicle else {
        return Ok(());
    };
    let vehicle_core = core(world, vehicle)?;
    let seat = vehicle_core.position + DVec3::new(0.0, vehicle_core.kind.seat_height(), 0.0);
    let mut rider_core = core_mut(world, rider)?;
    rider_core.set_pos(seat);
    rider_core.velocity = DVec3::ZERO;
    Ok(())
}

/// Check both directions of every link touching `id`.
pub fn verify_links(world: &World, id: Entity) -> Result<(), RidingError> {
    let entity = core(world, id)?;
    if let Some(vehicle) = entity.vehicle {
        let listed = world
            .get::<EntityCore>(vehicle)
            .is_some_and(|v| v.passengers.contains(&id));
        if !listed {
            error!(rider = ?id, ?vehicle, "vehicle does not list its rider");
            return Err(RidingError::BrokenLink { rider: id, vehicle });
        }
    }
    for &passenger in &entity.passengers {
        let linked = world
            .get::<EntityCore>(passenger)
            .is_some_and(|p| p.vehicle == Some(id));
        if !linked {
            error!(rider = ?passenger, vehicle = ?id, "passenger does not point back at vehicle");
            return Err(RidingError::BrokenLink {
                rider: passenger,
                vehicle: id,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::components::RemovalReason;
    use crate::types::EntityTypeRegistry;

    fn spawn(world: &mut World, key: &str, pos: DVec3) -> Entity {
        let kind = EntityTypeRegistry::builtin().get(key).unwrap();
        let rideable = Rideable {
            max_passengers: kind.max_passengers,
        };
        let core = EntityCore::new(Arc::clone(&kind), Uuid::nil(), pos, 300);
        world.spawn((core, rideable)).id()
    }

    fn setup() -> (World, Entity, Entity, Entity) {
        let mut world = World::new();
        let pig = spawn(&mut world, "pig", DVec3::new(0.0, 64.0, 0.0));
        let zombie = spawn(&mut world, "zombie", DVec3::new(2.0, 64.0, 0.0));
        let player = spawn(&mut world, "player", DVec3::new(4.0, 64.0, 0.0));
        (world, pig, zombie, player)
    }

    #[test]
    fn test_mount_links_both_sides() {
        let (mut world, pig, zombie, _) = setup();
        assert!(start_riding(&mut world, zombie, pig, false).unwrap());
        assert_eq!(world.get::<EntityCore>(zombie).unwrap().vehicle, Some(pig));
        assert_eq!(world.get::<EntityCore>(pig).unwrap().passengers, vec![zombie]);
        let seat = world.get::<EntityCore>(zombie).unwrap().position;
        assert!((seat.y - (64.0 + 0.9 * 0.75)).abs() < 1e-6);
    }

    #[test]
    fn test_self_and_cycle_refused() {
        let (mut world, pig, zombie, player) = setup();
        assert!(!start_riding(&mut world, pig, pig, true).unwrap());
        assert!(start_riding(&mut world, zombie, pig, true).unwrap());
        assert!(start_riding(&mut world, player, zombie, true).unwrap());
        assert!(!start_riding(&mut world, pig, player, true).unwrap());
        assert_eq!(root_vehicle(&world, player), pig);
    }

    #[test]
    fn test_capacity_and_force() {
        let (mut world, pig, zombie, player) = setup();
        assert!(start_riding(&mut world, zombie, pig, false).unwrap());
        assert!(!start_riding(&mut world, player, pig, false).unwrap());
        assert!(start_riding(&mut world, player, pig, true).unwrap());
        assert_eq!(world.get::<EntityCore>(pig).unwrap().passengers.len(), 2);
    }

    #[test]
    fn test_dismount_sets_cooldown() {
        let (mut world, pig, zombie, _) = setup();
        start_riding(&mut world, zombie, pig, false).unwrap();
        assert!(stop_riding(&mut world, zombie, 60).unwrap());
        assert!(!stop_riding(&mut world, zombie, 60).unwrap());
        let core = world.get::<EntityCore>(zombie).unwrap();
        assert_eq!(core.boarding_cooldown, 60);
        assert!(world.get::<EntityCore>(pig).unwrap().passengers.is_empty());
        assert!(!start_riding(&mut world, zombie, pig, false).unwrap());
    }

    #[test]
    fn test_switching_vehicles_unlinks_old() {
        let (mut world, pig, zombie, player) = setup();
        start_riding(&mut world, player, pig, false).unwrap();
        assert!(start_riding(&mut world, player, zombie, true).unwrap());
        assert!(world.get::<EntityCore>(pig).unwrap().passengers.is_empty());
        verify_links(&world, pig).unwrap();
        verify_links(&world, player).unwrap();
    }

    #[test]
    fn test_eject_all() {
        let (mut world, pig, zombie, player) = setup();
        start_riding(&mut world, zombie, pig, true).unwrap();
        start_riding(&mut world, player, pig, true).unwrap();
        assert_eq!(eject_passengers(&mut world, pig, 60).unwrap(), 2);
        assert!(!world.get::<EntityCore>(player).unwrap().is_passenger());
    }

    #[test]
    fn test_removed_vehicle_refused() {
        let (mut world, pig, zombie, _) = setup();
        world
            .get_mut::<EntityCore>(pig)
            .unwrap()
            .set_removed(RemovalReason::Discarded);
        assert!(!start_riding(&mut world, zombie, pig, true).unwrap());
    }

    #[test]
    fn test_one_sided_link_detected() {
        let (mut world, pig, zombie, _) = setup();
        world.get_mut::<EntityCore>(zombie).unwrap().vehicle = Some(pig);
        assert_eq!(
            verify_links(&world, zombie),
            Err(RidingError::BrokenLink {
                rider: zombie,
                vehicle: pig
            })
        );
    }

    #[test]
    fn test_missing_entity_error() {
        let (mut world, pig, _, _) = setup();
        let ghost = Entity::from_raw(999);
        assert_eq!(
            start_riding(&mut world, ghost, pig, false),
            Err(RidingError::MissingEntity(ghost))
        );
    }
}
