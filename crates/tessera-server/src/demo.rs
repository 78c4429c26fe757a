//! Small hand-built worlds and a mixed population for the headless driver.

use std::sync::Arc;

use bevy_ecs::entity::Entity;
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera_math::{Axis, BlockPos};
use tessera_world::portal::create_portal;
use tessera_world::{BlockRegistry, DimensionKind, DimensionType, VoxelWorld, WorldBorder, WorldError, ids};
use tracing::info;

use crate::error::SimulationError;
use crate::simulation::Simulation;

/// Half the side length of the demo overworld floor.
pub const OVERWORLD_RADIUS: i32 = 48;

const DEMO_KINDS: [&str; 5] = ["zombie", "pig", "player", "item", "drowned"];

/// Grass plain with a pond, a lava pit, a fire patch, powder snow and a
/// lit nether portal.
pub fn overworld(registry: Arc<BlockRegistry>) -> Result<VoxelWorld, WorldError> {
    let dimension = DimensionType::overworld();
    let mut level = VoxelWorld::new(Arc::clone(&registry), &dimension);
    let r = OVERWORLD_RADIUS;
    level.fill(BlockPos::new(-r, 60, -r), BlockPos::new(r, 62, r), ids::DIRT)?;
    level.fill(BlockPos::new(-r, 63, -r), BlockPos::new(r, 63, r), ids::GRASS_BLOCK)?;
    level.fill(BlockPos::new(-r, 59, -r), BlockPos::new(r, 59, r), ids::BEDROCK)?;

    // Pond, three deep.
    level.fill(BlockPos::new(10, 61, 10), BlockPos::new(16, 63, 16), ids::WATER)?;
    // Lava pit.
    level.fill(BlockPos::new(-16, 62, 10), BlockPos::new(-12, 63, 14), ids::LAVA)?;
    level.fill(BlockPos::new(-4, 64, 20), BlockPos::new(-2, 64, 22), ids::FIRE)?;
    level.fill(BlockPos::new(20, 64, -20), BlockPos::new(23, 65, -17), ids::POWDER_SNOW)?;
    level.fill(BlockPos::new(-20, 64, -20), BlockPos::new(-18, 64, -18), ids::HAY_BLOCK)?;

    create_portal(
        &mut level,
        &WorldBorder::default(),
        &dimension,
        BlockPos::new(0, 64, -12),
        Axis::X,
        8,
    )?;
    Ok(level)
}

/// Bedrock floor, a lava sea and a stone shelf above it.
pub fn nether(registry: Arc<BlockRegistry>) -> Result<VoxelWorld, WorldError> {
    let dimension = DimensionType::nether();
    let mut level = VoxelWorld::new(registry, &dimension);
    level.fill(BlockPos::new(-16, 0, -16), BlockPos::new(16, 0, 16), ids::BEDROCK)?;
    level.fill(BlockPos::new(-16, 31, -16), BlockPos::new(16, 31, 16), ids::STONE)?;
    level.fill(BlockPos::new(-16, 20, -16), BlockPos::new(16, 30, 16), ids::LAVA)?;
    Ok(level)
}

/// Empty end; arrivals build their own platform.
pub fn end(registry: Arc<BlockRegistry>) -> VoxelWorld {
    VoxelWorld::new(registry, &DimensionType::end())
}

/// Load the three dimensions into `sim`.
pub fn load_dimensions(sim: &mut Simulation) -> Result<(), SimulationError> {
    let registry = Arc::new(BlockRegistry::standard());
    let level = overworld(Arc::clone(&registry))?;
    sim.add_region(DimensionType::overworld(), Box::new(level))?
        .set_spawn_point(BlockPos::new(0, 64, 0));
    let level = nether(Arc::clone(&registry))?;
    sim.add_region(DimensionType::nether(), Box::new(level))?;
    sim.add_region(DimensionType::end(), Box::new(end(registry)))?;
    Ok(())
}

/// Scatter `count` entities over the overworld plain, dropped from a few
/// blocks up so they exercise falling and landing.
pub fn populate(sim: &mut Simulation, count: u32) -> Result<Vec<Entity>, SimulationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(sim.config().server.seed);
    let region = sim.try_region_mut(DimensionKind::Overworld)?;
    let span = OVERWORLD_RADIUS - 4;
    let mut spawned = Vec::with_capacity(count as usize);
    for i in 0..count {
        let kind = DEMO_KINDS[i as usize % DEMO_KINDS.len()];
        let x = rng.random_range(-span..span) as f64 + 0.5;
        let z = rng.random_range(-span..span) as f64 + 0.5;
        let y = 64.0 + rng.random_range(0.0..6.0);
        spawned.push(region.spawn(kind, DVec3::new(x, y, z))?);
    }
    info!(count, "demo population spawned");
    Ok(spawned)
}
