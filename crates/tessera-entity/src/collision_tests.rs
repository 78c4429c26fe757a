use glam::DVec3;
use tessera_math::{Aabb, BlockPos};
use tessera_world::{LevelWriter, WorldBorder, ids};

use super::*;
use crate::test_support::{Harness, flat_world};

fn player_box(feet: DVec3) -> Aabb {
    Aabb::from_feet(feet, 0.6, 1.8)
}

fn cube(x: f64, y: f64, z: f64) -> Aabb {
    Aabb::new(DVec3::new(x, y, z), DVec3::new(x + 1.0, y + 1.0, z + 1.0))
}

#[test]
fn test_rest_on_floor_just_below() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let (view, _) = h.split(&level);
    let bounds = player_box(DVec3::new(0.5, 64.05, 0.5));
    let res = resolve(&view, &bounds, DVec3::new(0.0, -0.1, 0.0), 0.6, false, 8.0).unwrap();
    assert!((res.movement.y + 0.05).abs() < 1e-9, "moved {}", res.movement.y);
    assert!(res.flags.vertical);
    assert!(res.flags.vertical_below);
    assert!(!res.flags.horizontal);
}

#[test]
fn test_free_motion_unchanged() {
    let mut h = Harness::new();
    let level = flat_world(0);
    let (view, _) = h.split(&level);
    let bounds = player_box(DVec3::new(0.5, 64.0, 0.5));
    let desired = DVec3::new(0.3, -0.2, 0.1);
    let res = resolve(&view, &bounds, desired, 0.6, false, 8.0).unwrap();
    assert_eq!(res.movement, desired);
    assert_eq!(res.flags, CollisionFlags::default());
}

#[test]
fn test_never_penetrates_solid() {
    let wall = [cube(2.0, 0.0, -1.0), cube(2.0, 1.0, -1.0), cube(2.0, 0.0, 0.0), cube(2.0, 1.0, 0.0)];
    for step in 1..40 {
        let dx = step as f64 * 0.1;
        let bounds = player_box(DVec3::new(0.5, 0.0, 0.0));
        let moved = collide_with_shapes(DVec3::new(dx, 0.0, 0.0), &bounds, &wall);
        let after = bounds.translate(moved).deflate(1.0e-7);
        assert!(wall.iter().all(|w| !after.intersects(w)), "penetrated at {dx}");
        assert!(moved.x <= dx);
    }
}

#[test]
fn test_z_resolved_first_when_larger() {
    // A block ahead on X that the box would only reach after moving along Z.
    let shapes = [cube(1.0, 0.0, 1.0)];
    let bounds = Aabb::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 1.0));
    let moved = collide_with_shapes(DVec3::new(0.5, 0.0, 1.0), &bounds, &shapes);
    // Z moves fully first, then X is blocked by the block now alongside.
    assert_eq!(moved.z, 1.0);
    assert!(moved.x.abs() < 1e-9);

    // With X dominant, X moves first and stays clear; Z then blocks.
    let moved = collide_with_shapes(DVec3::new(1.0, 0.0, 0.5), &bounds, &shapes);
    assert_eq!(moved.x, 1.0);
    assert!(moved.z.abs() < 1e-9);
}

#[test]
fn test_step_up_onto_half_block() {
    let slab = Aabb::new(DVec3::new(1.0, 0.0, -1.0), DVec3::new(3.0, 0.5, 2.0));
    let floor = Aabb::new(DVec3::new(-2.0, -1.0, -2.0), DVec3::new(4.0, 0.0, 3.0));
    let shapes = [slab, floor];
    let bounds = player_box(DVec3::new(0.6, 0.0, 0.5));
    let moved = collide_with_step(&bounds, DVec3::new(0.3, -0.08, 0.0), &shapes, 0.6, true);
    assert!((moved.x - 0.3).abs() < 1e-9);
    assert!((moved.y - 0.5).abs() < 1e-9);
}

#[test]
fn test_step_up_never_exceeds_step_height() {
    let block = cube(1.0, 0.0, 0.0);
    let floor = Aabb::new(DVec3::new(-2.0, -1.0, -2.0), DVec3::new(4.0, 0.0, 3.0));
    let shapes = [block, floor];
    let bounds = player_box(DVec3::new(0.6, 0.0, 0.5));
    let moved = collide_with_step(&bounds, DVec3::new(0.3, -0.08, 0.0), &shapes, 0.6, true);
    assert!(moved.y <= 0.6 + 1e-9);
    // A full block is too tall; horizontal travel is clipped at the face.
    assert!((moved.x - 0.1).abs() < 1e-9);
}

#[test]
fn test_step_never_reduces_horizontal_travel() {
    let floor = Aabb::new(DVec3::new(-4.0, -1.0, -4.0), DVec3::new(4.0, 0.0, 4.0));
    for height in [0.1, 0.25, 0.5, 0.6, 0.9, 1.0] {
        let ledge = Aabb::new(DVec3::new(1.0, 0.0, -1.0), DVec3::new(2.0, height, 2.0));
        let shapes = [ledge, floor];
        let bounds = player_box(DVec3::new(0.6, 0.0, 0.5));
        let desired = DVec3::new(0.3, -0.08, 0.05);
        let plain = collide_with_shapes(desired, &bounds, &shapes);
        let stepped = collide_with_step(&bounds, desired, &shapes, 0.6, true);
        assert!(stepped.horizontal_distance_sqr() >= plain.horizontal_distance_sqr() - 1e-12);
    }
}

#[test]
fn test_no_step_while_airborne() {
    let slab = Aabb::new(DVec3::new(1.0, 0.0, -1.0), DVec3::new(3.0, 0.5, 2.0));
    let bounds = player_box(DVec3::new(0.6, 0.2, 0.5));
    let moved = collide_with_step(&bounds, DVec3::new(0.3, 0.0, 0.0), &[slab], 0.6, false);
    assert_eq!(moved.y, 0.0);
    assert!((moved.x - 0.1).abs() < 1e-9);
}

#[test]
fn test_degenerate_box_yields_zero() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let (view, _) = h.split(&level);
    let flat = Aabb::new(DVec3::new(0.0, 70.0, 0.0), DVec3::new(1.0, 70.0, 1.0));
    let res = resolve(&view, &flat, DVec3::new(1.0, -1.0, 0.0), 0.6, false, 8.0).unwrap();
    assert_eq!(res.movement, DVec3::ZERO);
}

#[test]
fn test_tiny_motion_skips_collision() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let (view, _) = h.split(&level);
    let bounds = player_box(DVec3::new(0.5, 64.0, 0.5));
    let tiny = DVec3::new(1.0e-4, 0.0, 0.0);
    let res = resolve(&view, &bounds, tiny, 0.6, true, 8.0).unwrap();
    assert_eq!(res.movement, tiny);
}

#[test]
fn test_world_border_blocks_near_edge() {
    let mut h = Harness::new();
    h.border = WorldBorder::new(0.0, 0.0, 20.0);
    let level = flat_world(0);
    let (view, _) = h.split(&level);
    let bounds = player_box(DVec3::new(9.0, 10.0, 0.0));
    let res = resolve(&view, &bounds, DVec3::new(2.0, 0.0, 0.0), 0.0, false, 8.0).unwrap();
    assert!((res.movement.x - 0.7).abs() < 1e-9);
    assert!(res.flags.horizontal);
}

#[test]
fn test_entity_shapes_block_motion() {
    let mut h = Harness::new();
    h.entity_shapes = vec![Aabb::new(DVec3::new(1.5, 64.0, -1.0), DVec3::new(2.5, 64.6, 2.0))];
    let mut level = flat_world(64);
    level.set_block(BlockPos::new(5, 64, 5), ids::STONE).unwrap();
    let (view, _) = h.split(&level);
    let bounds = player_box(DVec3::new(0.5, 64.0, 0.5));
    let res = resolve(&view, &bounds, DVec3::new(1.0, 0.0, 0.0), 0.0, true, 8.0).unwrap();
    assert!((res.movement.x - 0.7).abs() < 1e-9);
}

#[test]
fn test_minor_collision_when_sliding_along_wall() {
    let desired = DVec3::new(1.0, 0.0, 0.05);
    let glancing = DVec3::new(1.0, 0.0, 0.0);
    assert!(classify(desired, glancing, 8.0).minor_horizontal);
    let head_on = DVec3::new(0.0, 0.0, 0.05);
    let flags = classify(desired, head_on, 8.0);
    assert!(flags.horizontal);
    assert!(!flags.minor_horizontal);
}
