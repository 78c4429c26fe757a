use glam::DVec3;
use tessera_math::BlockPos;
use tessera_world::{DimensionKind, FluidKind, LevelWriter, ids};

use super::*;
use crate::test_support::{Harness, attacker, flat_world, state, state_at};

fn health(s: &EntityState) -> f32 {
    s.living.as_ref().unwrap().health()
}

fn transfers(h: &Harness) -> Vec<DimensionKind> {
    h.events
        .iter()
        .filter_map(|e| match e {
            EntityEvent::PortalTransfer { destination, .. } => Some(*destination),
            _ => None,
        })
        .collect()
}

#[test]
fn test_portal_wait_then_transfer() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let mut s = state("zombie");
    let (view, mut cx) = h.split(&level);
    s.core.portal.inside = true;
    tick_portal(&mut s.core, &view, &mut cx);
    assert!(!s.core.portal.inside);
    assert_eq!(s.core.portal.time, 1);

    s.core.portal.inside = true;
    tick_portal(&mut s.core, &view, &mut cx);
    assert_eq!(s.core.portal.cooldown, s.core.kind.portal_cooldown_ticks - 1);
    assert_eq!(transfers(&h), vec![DimensionKind::Nether]);
}

#[test]
fn test_player_portal_wait_is_longer() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let mut s = state("player");
    let (view, mut cx) = h.split(&level);
    for _ in 0..80 {
        s.core.portal.inside = true;
        tick_portal(&mut s.core, &view, &mut cx);
    }
    assert!(cx.events.is_empty());
    s.core.portal.inside = true;
    tick_portal(&mut s.core, &view, &mut cx);
    assert_eq!(transfers(&h).len(), 1);
}

#[test]
fn test_portal_time_decays_outside() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let mut s = state("player");
    s.core.portal.time = 10;
    let (view, mut cx) = h.split(&level);
    tick_portal(&mut s.core, &view, &mut cx);
    assert_eq!(s.core.portal.time, 6);
    tick_portal(&mut s.core, &view, &mut cx);
    tick_portal(&mut s.core, &view, &mut cx);
    assert_eq!(s.core.portal.time, 0);
}

#[test]
fn test_passenger_portal_time_frozen() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let mut s = state("zombie");
    s.core.vehicle = Some(attacker());
    s.core.portal.inside = true;
    let (view, mut cx) = h.split(&level);
    tick_portal(&mut s.core, &view, &mut cx);
    assert_eq!(s.core.portal.time, 0);
    assert!(!s.core.portal.inside);
}

#[test]
fn test_fire_hurts_once_per_second() {
    let mut h = Harness::new();
    let mut s = state("zombie");
    s.core.fire_ticks = 20;
    s.core.frozen_ticks = 30;
    tick_fire(&mut s, &mut h.cx());
    assert_eq!(health(&s), 19.0);
    assert_eq!(s.core.fire_ticks, 19);
    assert_eq!(s.core.frozen_ticks, 0);

    let mut cx = h.cx();
    for _ in 0..18 {
        tick_fire(&mut s, &mut cx);
    }
    assert_eq!(health(&s), 19.0);
    assert_eq!(s.core.fire_ticks, 1);
}

#[test]
fn test_fire_immune_burns_out_fast() {
    let mut h = Harness::new();
    let mut s = state("blaze");
    s.core.fire_ticks = 10;
    tick_fire(&mut s, &mut h.cx());
    assert_eq!(s.core.fire_ticks, 6);
    assert_eq!(health(&s), s.living.as_ref().unwrap().max_health());
}

#[test]
fn test_lava_ignites_and_hurts() {
    let mut h = Harness::new();
    let mut s = state("zombie");
    lava_hurt(&mut s, &mut h.cx());
    assert_eq!(s.core.fire_ticks, 300);
    assert!(health(&s) < 17.0);

    let mut blaze = state("blaze");
    lava_hurt(&mut blaze, &mut h.cx());
    assert!(blaze.core.fire_ticks <= 0);
    assert_eq!(health(&blaze), blaze.living.as_ref().unwrap().max_health());
}

#[test]
fn test_in_wall_checks_eye_box() {
    let mut h = Harness::new();
    let mut level = flat_world(64);
    let s = state("player");
    {
        let (view, _) = h.split(&level);
        assert!(!is_in_wall(&s.core, &view).unwrap());
    }
    level.set_block(BlockPos::new(0, 65, 0), ids::STONE).unwrap();
    let (view, _) = h.split(&level);
    assert!(is_in_wall(&s.core, &view).unwrap());
}

#[test]
fn test_slab_does_not_suffocate() {
    let mut h = Harness::new();
    let mut level = flat_world(64);
    level.set_block(BlockPos::new(0, 65, 0), ids::STONE_SLAB).unwrap();
    let s = state_at("player", DVec3::new(0.5, 63.9, 0.5));
    let (view, _) = h.split(&level);
    assert!(!is_in_wall(&s.core, &view).unwrap());
}

#[test]
fn test_air_drains_then_drowns() {
    let mut h = Harness::new();
    let mut s = state("zombie");
    s.core.air = 3;
    s.core.fluids.eye_fluid = Some(FluidKind::Water);
    let mut cx = h.cx();
    for expected in [2, 1, 0] {
        tick_air(&mut s, &mut cx);
        assert_eq!(s.core.air, expected);
    }
    for _ in 0..19 {
        tick_air(&mut s, &mut cx);
    }
    assert_eq!(s.core.air, 0);
    assert_eq!(health(&s), 20.0);
    tick_air(&mut s, &mut cx);
    assert_eq!(health(&s), 18.0);
    assert_eq!(s.core.drowning_ticks, 0);

    // The second hit waits out a full countdown, not just the hurt window.
    s.living.as_mut().unwrap().invulnerable_time = 0;
    for _ in 0..19 {
        tick_air(&mut s, &mut cx);
    }
    assert_eq!(health(&s), 18.0);
    tick_air(&mut s, &mut cx);
    assert_eq!(health(&s), 16.0);
    assert_eq!(s.core.air, 0);
}

#[test]
fn test_surfacing_resets_drowning_countdown() {
    let mut h = Harness::new();
    let mut s = state("zombie");
    s.core.air = 0;
    s.core.fluids.eye_fluid = Some(FluidKind::Water);
    let mut cx = h.cx();
    for _ in 0..15 {
        tick_air(&mut s, &mut cx);
    }
    assert_eq!(s.core.drowning_ticks, 15);
    s.core.fluids.eye_fluid = None;
    tick_air(&mut s, &mut cx);
    assert_eq!(s.core.drowning_ticks, 0);
    assert_eq!(s.core.air, 4);
}

#[test]
fn test_air_refills_out_of_water() {
    let mut h = Harness::new();
    let mut s = state("zombie");
    s.core.air = 0;
    let mut cx = h.cx();
    tick_air(&mut s, &mut cx);
    assert_eq!(s.core.air, 4);
    s.core.air = 298;
    tick_air(&mut s, &mut cx);
    assert_eq!(s.core.air, 300);
}

#[test]
fn test_water_breathers_keep_air() {
    let mut h = Harness::new();
    let mut s = state("drowned");
    s.core.air = 10;
    s.core.fluids.eye_fluid = Some(FluidKind::Water);
    tick_air(&mut s, &mut h.cx());
    assert_eq!(s.core.air, 10);

    let mut z = state("zombie");
    z.core.air = 10;
    z.core.fluids.eye_fluid = Some(FluidKind::Water);
    z.living
        .as_mut()
        .unwrap()
        .effects
        .add(MobEffect::WaterBreathing, crate::effects::EffectInstance::new(0, 100));
    tick_air(&mut z, &mut h.cx());
    assert_eq!(z.core.air, 10);
}

#[test]
fn test_living_timers_count_down() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let mut s = state("zombie");
    {
        let living = s.living.as_mut().unwrap();
        living.hurt_time = 3;
        living.invulnerable_time = 5;
    }
    let (view, mut cx) = h.split(&level);
    tick_living(&mut s, &view, &mut cx).unwrap();
    let living = s.living.as_ref().unwrap();
    assert_eq!(living.hurt_time, 2);
    assert_eq!(living.invulnerable_time, 4);
}

#[test]
fn test_suffocation_damage_in_wall() {
    let mut h = Harness::new();
    let mut level = flat_world(64);
    level.set_block(BlockPos::new(0, 65, 0), ids::STONE).unwrap();
    let mut s = state("zombie");
    let (view, mut cx) = h.split(&level);
    tick_living(&mut s, &view, &mut cx).unwrap();
    assert_eq!(health(&s), 19.0);
}

#[test]
fn test_death_animation_removes_entity() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let mut s = state("zombie");
    s.living.as_mut().unwrap().set_health(0.0);
    let (view, mut cx) = h.split(&level);
    for _ in 0..19 {
        tick_living(&mut s, &view, &mut cx).unwrap();
    }
    assert!(!s.core.is_removed());
    tick_living(&mut s, &view, &mut cx).unwrap();
    assert_eq!(s.core.removal, Some(RemovalReason::Killed));
    assert_eq!(h.statuses(), vec![EntityStatus::DeathPoof]);
}

#[test]
fn test_powder_snow_freezes_then_hurts() {
    let mut h = Harness::new();
    let mut s = state("zombie");
    s.core.in_powder_snow = true;
    s.core.age = 1;
    let mut cx = h.cx();
    for _ in 0..200 {
        tick_freezing(&mut s, &mut cx);
    }
    assert_eq!(s.core.frozen_ticks, 140);
    assert_eq!(health(&s), 20.0);
    s.core.age = 40;
    tick_freezing(&mut s, &mut cx);
    assert_eq!(health(&s), 19.0);

    s.core.in_powder_snow = false;
    tick_freezing(&mut s, &mut cx);
    assert_eq!(s.core.frozen_ticks, 138);
}

#[test]
fn test_non_freezing_type_thaws() {
    let mut h = Harness::new();
    let mut s = state("blaze");
    s.core.in_powder_snow = true;
    s.core.frozen_ticks = 5;
    tick_freezing(&mut s, &mut h.cx());
    assert_eq!(s.core.frozen_ticks, 3);
}

#[test]
fn test_below_world_hurts_living() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let mut s = state_at("zombie", DVec3::new(0.5, -200.0, 0.5));
    let (view, mut cx) = h.split(&level);
    check_below_world(&mut s, &view, &mut cx);
    assert_eq!(health(&s), 16.0);
    assert!(!s.core.is_removed());
}

#[test]
fn test_below_world_discards_items() {
    let mut h = Harness::new();
    let level = flat_world(64);
    let mut s = state_at("item", DVec3::new(0.5, -200.0, 0.5));
    let (view, mut cx) = h.split(&level);
    check_below_world(&mut s, &view, &mut cx);
    assert_eq!(s.core.removal, Some(RemovalReason::Discarded));

    let mut above = state_at("item", DVec3::new(0.5, -100.0, 0.5));
    check_below_world(&mut above, &view, &mut cx);
    assert!(!above.core.is_removed());
}
