//! Multi-region tick driver.

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy_ecs::entity::Entity;
use tessera_config::Config;
use tessera_entity::{EntityEvent, EntityTypeRegistry, Region, TickError, transfer};
use tessera_world::{DimensionKind, DimensionType, Level};
use tracing::{debug, error, info, trace};

use crate::error::SimulationError;

/// What happened during one [`Simulation::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entity ticks that were aborted and rolled back.
    pub failed: usize,
    /// Entities that arrived in another region.
    pub transferred: usize,
    /// Events drained from all regions.
    pub events: usize,
}

/// Every loaded region plus the shared type registry and config.
pub struct Simulation {
    regions: BTreeMap<DimensionKind, Region>,
    types: Arc<EntityTypeRegistry>,
    config: Arc<Config>,
    ticks: u64,
    events: Vec<(DimensionKind, EntityEvent)>,
}

impl Simulation {
    pub fn new(config: Arc<Config>, types: Arc<EntityTypeRegistry>) -> Self {
        Self {
            regions: BTreeMap::new(),
            types,
            config,
            ticks: 0,
            events: Vec::new(),
        }
    }

    /// Load a dimension backed by `level`. Each region gets its own seed
    /// derived from the configured one.
    pub fn add_region(&mut self, dimension: DimensionType, level: Box<dyn Level>) -> Result<&mut Region, SimulationError> {
        let kind = dimension.kind;
        if self.regions.contains_key(&kind) {
            return Err(SimulationError::DuplicateRegion(kind));
        }
        let seed = self.config.server.seed.wrapping_add(kind as u64);
        let region = Region::new(
            dimension,
            level,
            Arc::clone(&self.types),
            Arc::clone(&self.config),
            seed,
        );
        info!(dimension = ?kind, seed, "region loaded");
        Ok(self.regions.entry(kind).or_insert(region))
    }

    pub fn region(&self, kind: DimensionKind) -> Option<&Region> {
        self.regions.get(&kind)
    }

    pub fn region_mut(&mut self, kind: DimensionKind) -> Option<&mut Region> {
        self.regions.get_mut(&kind)
    }

    pub fn try_region_mut(&mut self, kind: DimensionKind) -> Result<&mut Region, SimulationError> {
        self.regions
            .get_mut(&kind)
            .ok_or(SimulationError::UnknownRegion(kind))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn types(&self) -> &EntityTypeRegistry {
        &self.types
    }

    /// Completed simulation ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Entities across all regions.
    pub fn population(&mut self) -> usize {
        self.regions.values_mut().map(Region::len).sum()
    }

    /// Events collected since the last drain, tagged with their region.
    pub fn drain_events(&mut self) -> Vec<(DimensionKind, EntityEvent)> {
        std::mem::take(&mut self.events)
    }

    /// Advance every region by one tick, then carry out the portal trips
    /// the tick requested.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let mut trips = Vec::new();

        for (kind, region) in self.regions.iter_mut() {
            let failures = region.tick();
            report.failed += failures.len();
            for (id, err) in &failures {
                log_failure(*kind, region, *id, err);
            }
            for event in region.drain_events() {
                if let EntityEvent::PortalTransfer { entity, destination } = event {
                    trips.push((*kind, entity, destination));
                }
                report.events += 1;
                self.events.push((*kind, event));
            }
        }

        for (from, entity, to) in trips {
            if self.carry(from, entity, to) {
                report.transferred += 1;
            }
        }

        self.ticks += 1;
        trace!(tick = self.ticks, ?report, "simulation tick");
        report
    }

    /// Run `count` ticks, returning the summed report.
    pub fn run(&mut self, count: u64) -> TickReport {
        let mut total = TickReport::default();
        for _ in 0..count {
            let r = self.tick();
            total.failed += r.failed;
            total.transferred += r.transferred;
            total.events += r.events;
        }
        total
    }

    /// Move one entity between regions; false when it stayed put.
    fn carry(&mut self, from: DimensionKind, entity: Entity, to: DimensionKind) -> bool {
        if from == to || !self.regions.contains_key(&to) {
            debug!(?entity, ?from, ?to, "portal destination not loaded");
            return false;
        }
        let Some(mut src) = self.regions.remove(&from) else {
            return false;
        };
        let moved = match self.regions.get_mut(&to) {
            Some(dst) => match transfer(&mut src, dst, entity) {
                Ok(Some(_)) => true,
                Ok(None) => false,
                Err(err) => {
                    let (kind, position) = src
                        .core(entity)
                        .map(|c| (c.kind.key.clone(), Some(c.position)))
                        .unwrap_or_default();
                    error!(?entity, %kind, ?position, ?from, ?to, "transfer failed: {err}");
                    false
                }
            },
            None => false,
        };
        self.regions.insert(from, src);
        moved
    }
}

fn log_failure(dimension: DimensionKind, region: &Region, id: Entity, err: &TickError) {
    match region.core(id) {
        Some(core) => error!(
            entity = ?id,
            kind = %core.kind.key,
            position = ?core.position,
            ?dimension,
            "entity tick aborted: {err}"
        ),
        None => error!(entity = ?id, ?dimension, "entity tick aborted: {err}"),
    }
}
