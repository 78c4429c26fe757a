//! A region: one dimension's geometry plus the entities living in it.
//!
//! Entities are stored in a `bevy_ecs` [`World`] and simulated one at a time.
//! Every mutating operation works on an [`EntityState`] snapshot and writes
//! it back only when the operation completes, so a failed tick leaves the
//! entity exactly as it was.

use std::sync::Arc;

use bevy_ecs::bundle::Bundle;
use bevy_ecs::entity::Entity;
use bevy_ecs::query::With;
use bevy_ecs::world::{Mut, World};
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera_config::Config;
use tessera_math::{Aabb, BlockPos, wrap_degrees};
use tessera_world::{DimensionType, Level, WorldBorder};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::components::{Collidable, DeathProtection, EntityCore, RemovalReason, Rideable, ShieldStance};
use crate::context::{EntityState, SimContext, WorldView};
use crate::damage::{self, DamageSource, HitGeometry};
use crate::error::{RidingError, SpawnError, TickError};
use crate::events::{EntityEvent, GameEventKind};
use crate::living::Living;
use crate::movement::{self, MoverType};
use crate::persist::{self, EntityRecord};
use crate::riding;
use crate::tick;
use crate::types::EntityTypeRegistry;

/// Extra reach around an entity's swept box when gathering other entities
/// to collide with.
const ENTITY_SHAPE_MARGIN: f64 = 1.0;

pub struct Region {
    dimension: DimensionType,
    level: Box<dyn Level>,
    border: WorldBorder,
    world: World,
    types: Arc<EntityTypeRegistry>,
    config: Arc<Config>,
    game_time: u64,
    raining: bool,
    spawn: BlockPos,
    rng: ChaCha8Rng,
    events: Vec<EntityEvent>,
}

impl Region {
    pub fn new(
        dimension: DimensionType,
        level: Box<dyn Level>,
        types: Arc<EntityTypeRegistry>,
        config: Arc<Config>,
        seed: u64,
    ) -> Self {
        Self {
            dimension,
            level,
            border: WorldBorder::default(),
            world: World::new(),
            types,
            config,
            game_time: 0,
            raining: false,
            spawn: BlockPos::ORIGIN,
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    // -- accessors ---------------------------------------------------------

    pub fn dimension(&self) -> &DimensionType {
        &self.dimension
    }

    pub fn level(&self) -> &dyn Level {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> &mut dyn Level {
        self.level.as_mut()
    }

    pub fn border(&self) -> &WorldBorder {
        &self.border
    }

    pub fn set_border(&mut self, border: WorldBorder) {
        self.border = border;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn types(&self) -> &EntityTypeRegistry {
        &self.types
    }

    pub fn game_time(&self) -> u64 {
        self.game_time
    }

    pub fn is_raining(&self) -> bool {
        self.raining
    }

    pub fn set_raining(&mut self, raining: bool) {
        self.raining = raining;
    }

    /// Shared spawn point, used as the arrival column when leaving the End.
    pub fn spawn_point(&self) -> BlockPos {
        self.spawn
    }

    pub fn set_spawn_point(&mut self, spawn: BlockPos) {
        self.spawn = spawn;
    }

    pub fn core(&self, id: Entity) -> Option<&EntityCore> {
        self.world.get::<EntityCore>(id)
    }

    pub fn core_mut(&mut self, id: Entity) -> Option<Mut<'_, EntityCore>> {
        self.world.get_mut::<EntityCore>(id)
    }

    pub fn living(&self, id: Entity) -> Option<&Living> {
        self.world.get::<Living>(id)
    }

    pub fn living_mut(&mut self, id: Entity) -> Option<Mut<'_, Living>> {
        self.world.get_mut::<Living>(id)
    }

    pub fn contains(&self, id: Entity) -> bool {
        self.world.get::<EntityCore>(id).is_some()
    }

    /// Every entity in the region, in id order.
    pub fn entities(&mut self) -> Vec<Entity> {
        let mut query = self.world.query_filtered::<Entity, With<EntityCore>>();
        let mut ids: Vec<Entity> = query.iter(&self.world).collect();
        ids.sort();
        ids
    }

    pub fn len(&mut self) -> usize {
        self.entities().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Attach extra components, e.g. a shield or death protection.
    pub fn insert<B: Bundle>(&mut self, id: Entity, bundle: B) -> bool {
        match self.world.get_entity_mut(id) {
            Ok(mut entity) => {
                entity.insert(bundle);
                true
            }
            Err(_) => false,
        }
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<EntityEvent> {
        std::mem::take(&mut self.events)
    }

    // -- lifecycle ---------------------------------------------------------

    /// Create an entity of the registered type `key` with its feet at `position`.
    pub fn spawn(&mut self, key: &str, position: DVec3) -> Result<Entity, SpawnError> {
        let state = self.fresh_state(key, position)?;
        Ok(self.insert_state(state))
    }

    /// Spawn an entity from a saved record. Nothing is created when the
    /// record is rejected.
    pub fn spawn_from_record(&mut self, record: &EntityRecord) -> Result<Entity, SpawnError> {
        let mut state = self.fresh_state(&record.type_key, record.position)?;
        persist::load(&mut state, record)?;
        Ok(self.insert_state(state))
    }

    fn fresh_state(&mut self, key: &str, position: DVec3) -> Result<EntityState, SpawnError> {
        if !position.is_finite() {
            return Err(SpawnError::InvalidPosition(position));
        }
        let kind = self
            .types
            .get(key)
            .ok_or_else(|| SpawnError::UnknownType(key.to_string()))?;
        let uuid = uuid::Builder::from_random_bytes(self.rng.random()).into_uuid();
        let living = kind.living.as_ref().map(Living::new);
        let core = EntityCore::new(kind, uuid, position, self.config.environment.max_air_supply);
        Ok(EntityState {
            core,
            living,
            shield: None,
            protection: None,
        })
    }

    fn insert_state(&mut self, state: EntityState) -> Entity {
        let kind = Arc::clone(&state.core.kind);
        let position = state.core.position;
        let mut entity = self.world.spawn(state.core);
        if let Some(living) = state.living {
            entity.insert(living);
        }
        if let Some(shield) = state.shield {
            entity.insert(shield);
        }
        if let Some(protection) = state.protection {
            entity.insert(protection);
        }
        if kind.max_passengers > 0 {
            entity.insert(Rideable {
                max_passengers: kind.max_passengers,
            });
        }
        if kind.collidable {
            entity.insert(Collidable);
        }
        let id = entity.id();
        debug!(entity = ?id, kind = %kind.key, ?position, "spawned");
        id
    }

    /// Persistent record of `id`.
    pub fn save(&self, id: Entity) -> Option<EntityRecord> {
        self.snapshot(id).map(|state| persist::save_without_id(&state))
    }

    /// Mark `id` removed and finalize it right away. Returns `false` when it
    /// does not exist or was already removed.
    pub fn remove(&mut self, id: Entity, reason: RemovalReason) -> Result<bool, RidingError> {
        let Some(mut core) = self.world.get_mut::<EntityCore>(id) else {
            return Ok(false);
        };
        if !core.set_removed(reason) {
            return Ok(false);
        }
        self.finalize_removal(id)?;
        Ok(true)
    }

    /// Despawn `id` without severing links or announcing it. Only for undoing
    /// an arrival that never became visible.
    pub(crate) fn forget(&mut self, id: Entity) {
        self.world.despawn(id);
    }

    /// Sever links, announce and despawn an entity whose removal is set.
    fn finalize_removal(&mut self, id: Entity) -> Result<(), RidingError> {
        let Some(reason) = self.core(id).and_then(|c| c.removal) else {
            return Ok(());
        };
        let cooldown = self.config.physics.boarding_cooldown_ticks;
        riding::eject_passengers(&mut self.world, id, cooldown)?;
        riding::stop_riding(&mut self.world, id, cooldown)?;
        self.events.push(EntityEvent::Removed { entity: id, reason });
        self.world.despawn(id);
        debug!(entity = ?id, ?reason, "entity removed");
        Ok(())
    }

    // -- snapshots ---------------------------------------------------------

    /// Owned copy of `id`'s simulated components.
    pub fn snapshot(&self, id: Entity) -> Option<EntityState> {
        let core = self.world.get::<EntityCore>(id)?.clone();
        Some(EntityState {
            core,
            living: self.world.get::<Living>(id).cloned(),
            shield: self.world.get::<ShieldStance>(id).copied(),
            protection: self.world.get::<DeathProtection>(id).copied(),
        })
    }

    /// Write a snapshot back.
    pub fn commit(&mut self, id: Entity, state: EntityState) -> Result<(), TickError> {
        let Ok(mut entity) = self.world.get_entity_mut(id) else {
            return Err(TickError::MissingEntity(id));
        };
        entity.insert(state.core);
        if let Some(living) = state.living {
            entity.insert(living);
        }
        match state.shield {
            Some(shield) => {
                entity.insert(shield);
            }
            None => {
                entity.remove::<ShieldStance>();
            }
        }
        match state.protection {
            Some(protection) => {
                entity.insert(protection);
            }
            None => {
                entity.remove::<DeathProtection>();
            }
        }
        Ok(())
    }

    /// Boxes of collidable entities near `area`, excluding `id` and anything
    /// sharing its vehicle stack.
    fn collidable_boxes(&mut self, id: Entity, area: &Aabb) -> Vec<Aabb> {
        let root = riding::root_vehicle(&self.world, id);
        let mut query = self
            .world
            .query_filtered::<(Entity, &EntityCore), With<Collidable>>();
        query
            .iter(&self.world)
            .filter(|(other, core)| {
                *other != id
                    && !core.is_removed()
                    && core.bounding_box.intersects(area)
                    && riding::root_vehicle(&self.world, *other) != root
            })
            .map(|(_, core)| core.bounding_box)
            .collect()
    }

    /// Run `f` against a snapshot of `id` with a view of this region. The
    /// snapshot is committed and the emitted events published only when `f`
    /// succeeds.
    fn with_entity<T, E>(
        &mut self,
        id: Entity,
        f: impl FnOnce(&mut EntityState, &WorldView, &mut SimContext) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<TickError> + From<RidingError>,
    {
        let Some(mut state) = self.snapshot(id) else {
            return Err(TickError::MissingEntity(id).into());
        };
        let area = state
            .core
            .bounding_box
            .expand_towards(state.core.velocity)
            .inflate_all(ENTITY_SHAPE_MARGIN);
        let shapes = self.collidable_boxes(id, &area);
        let mut events = Vec::new();
        let result = {
            let view = WorldView {
                level: self.level.as_ref(),
                border: &self.border,
                dimension: &self.dimension,
                raining: self.raining,
                entity_shapes: &shapes,
            };
            let mut cx = SimContext {
                entity: id,
                config: &self.config,
                game_time: self.game_time,
                rng: &mut self.rng,
                events: &mut events,
            };
            f(&mut state, &view, &mut cx)
        };
        let value = result?;
        self.commit(id, state)?;
        self.publish(events);
        self.finalize_removal(id)?;
        Ok(value)
    }

    /// Apply cross-entity consequences of events, then queue them.
    fn publish(&mut self, events: Vec<EntityEvent>) {
        for event in &events {
            if let EntityEvent::KillCredited { killer, score, .. } = *event
                && let Some(mut living) = self.world.get_mut::<Living>(killer)
            {
                living.kill_score += score;
            }
        }
        self.events.extend(events);
    }

    // -- simulation --------------------------------------------------------

    /// Advance one entity by a tick. On error the entity keeps its previous
    /// state and nothing it emitted is published.
    pub fn tick_entity(&mut self, id: Entity) -> Result<(), TickError> {
        self.with_entity(id, |state, view, cx| tick::tick_entity(state, view, cx))
    }

    /// Advance every entity by one tick: vehicles first, each followed by
    /// its passengers. Failures are collected, not fatal.
    pub fn tick(&mut self) -> Vec<(Entity, TickError)> {
        let mut failures = Vec::new();
        let mut roots = {
            let mut query = self.world.query::<(Entity, &EntityCore)>();
            query
                .iter(&self.world)
                .filter(|(_, core)| !core.is_passenger())
                .map(|(id, _)| id)
                .collect::<Vec<_>>()
        };
        roots.sort();

        for root in roots {
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                if !self.contains(id) {
                    continue;
                }
                if id != root
                    && let Err(err) = riding::position_rider(&mut self.world, id)
                {
                    failures.push((id, err.into()));
                    continue;
                }
                // Riders ejected by the vehicle's removal still get their tick.
                let passengers = self.core(id).map(|c| c.passengers.clone()).unwrap_or_default();
                if let Err(err) = self.tick_entity(id) {
                    failures.push((id, err));
                }
                stack.extend(passengers.into_iter().rev());
            }
        }
        self.game_time += 1;
        failures
    }

    /// Hit `id` with `amount` of damage from `source`. Returns whether the
    /// hit was accepted.
    pub fn apply_damage(&mut self, id: Entity, source: &DamageSource, amount: f32) -> bool {
        let direct_position = source.direct.and_then(|e| self.core(e)).map(|c| c.position);
        let causing_position = source.causing.and_then(|e| self.core(e)).map(|c| c.position);
        let hit = HitGeometry {
            source_position: source.position.or(direct_position),
            attacker_position: causing_position.or(direct_position),
        };
        let outcome = self.with_entity(id, |state, _view, cx| {
            Ok::<_, TickError>(damage::hurt(state, source, &hit, amount, cx))
        });
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(entity = ?id, %err, "damage not applied");
                return false;
            }
        };

        if outcome.blocked
            && !source.kind.is_projectile()
            && let Some(attacker) = source.direct
        {
            self.shield_knockback(id, attacker);
        }
        outcome.registered
    }

    /// Push a melee attacker away from the shield that stopped it.
    fn shield_knockback(&mut self, victim: Entity, attacker: Entity) {
        let Some(victim_pos) = self.core(victim).map(|c| c.position) else {
            return;
        };
        let resistance = match self.living(attacker) {
            Some(living) => living
                .attributes
                .value(crate::attributes::Attribute::KnockbackResistance),
            None => return,
        };
        let strength = self.config.combat.shield_knockback;
        if let Some(mut core) = self.core_mut(attacker) {
            let (dx, dz) = (victim_pos.x - core.position.x, victim_pos.z - core.position.z);
            damage::knockback(&mut core, resistance, strength, dx, dz);
        }
    }

    /// Move `id` instantly. Non-finite targets are rejected.
    pub fn teleport_to(&mut self, id: Entity, position: DVec3) -> bool {
        if !position.is_finite() {
            warn!(entity = ?id, ?position, "rejecting non-finite teleport");
            return false;
        }
        let passengers = {
            let Some(mut core) = self.core_mut(id) else {
                return false;
            };
            core.set_pos(position);
            core.prev_position = position;
            core.passengers.clone()
        };
        for passenger in passengers {
            if let Err(err) = riding::position_rider(&mut self.world, passenger) {
                warn!(entity = ?passenger, %err, "could not reposition passenger");
            }
        }
        self.events.push(EntityEvent::PathStop { entity: id });
        self.events.push(EntityEvent::GameEvent {
            entity: id,
            kind: GameEventKind::Teleport,
            position,
        });
        true
    }

    /// Set look angles. Non-finite angles are rejected and the old ones kept.
    pub fn set_rotation(&mut self, id: Entity, yaw: f32, pitch: f32) -> bool {
        if !yaw.is_finite() || !pitch.is_finite() {
            warn!(entity = ?id, yaw, pitch, "rejecting non-finite rotation");
            return false;
        }
        let Some(mut core) = self.core_mut(id) else {
            return false;
        };
        core.yaw = wrap_degrees(yaw);
        core.pitch = pitch.clamp(-90.0, 90.0);
        true
    }

    /// Piston-style displacement, clamped per game tick.
    pub fn push(&mut self, id: Entity, movement: DVec3) -> Result<(), TickError> {
        self.with_entity(id, |state, view, cx| {
            movement::move_entity(state, MoverType::Piston, movement, view, cx).map_err(TickError::from)
        })
    }

    // -- riding ------------------------------------------------------------

    pub fn start_riding(&mut self, rider: Entity, vehicle: Entity, force: bool) -> Result<bool, RidingError> {
        riding::start_riding(&mut self.world, rider, vehicle, force)
    }

    pub fn stop_riding(&mut self, rider: Entity) -> Result<bool, RidingError> {
        let cooldown = self.config.physics.boarding_cooldown_ticks;
        riding::stop_riding(&mut self.world, rider, cooldown)
    }

    pub fn eject_passengers(&mut self, vehicle: Entity) -> Result<usize, RidingError> {
        let cooldown = self.config.physics.boarding_cooldown_ticks;
        riding::eject_passengers(&mut self.world, vehicle, cooldown)
    }

    pub fn root_vehicle(&self, id: Entity) -> Entity {
        riding::root_vehicle(&self.world, id)
    }

    /// Stable id of `id`, if it exists.
    pub fn uuid(&self, id: Entity) -> Option<Uuid> {
        self.core(id).map(|c| c.uuid)
    }
}

#[cfg(test)]
#[path = "region_tests.rs"]
mod tests;
