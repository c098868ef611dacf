//! # Sim Region
//!
//! A bounded working set of entities copied out of world storage for one
//! frame. Lifecycle:
//!
//! 1. [`SimRegion::begin`] pulls in every spatial entity near the origin and
//!    marks its stored record as simming
//! 2. the frame mutates entities through [`EntityHandle`]s
//! 3. [`SimRegion::end`] writes everything back and consumes the region
//!
//! ## Memory
//!
//! The entity table, pull-in positions and storage-index table are charged
//! to a [`FrameArena`]. The region borrows the arena, so the arena cannot be
//! reset while any region or handle lookup through it is still possible.
//!
//! ## Bounds
//!
//! Entities inside the *updatable* bounds get full updates. The *total*
//! bounds pad those by the distance an entity could travel in one step, so
//! nothing can cross into the updatable bounds unseen.

mod reference;

use std::marker::PhantomData;

use strata_core::{EntityHandle, FrameArena, StorageIndex, StorageIndexTable};
use strata_shared::{Rect3, V3, INVALID_P};

use crate::config::PhysicsConfig;
use crate::entity::{entity_overlaps_rectangle, EntityFlags, SimEntity};
use crate::error::{SimError, SimResult};
use crate::state::WorldState;
use crate::world::{self, ChunkCoord, EntityStorage, StoredEntity, WorldPosition};

/// Counters reported by [`SimRegion::end`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EndSimStats {
    /// Entities written back to storage.
    pub committed: usize,
    /// Entities whose chunk changed.
    pub relocated: usize,
    /// True if the camera followed a committed entity.
    pub camera_updated: bool,
}

/// Working set of entities for one frame.
#[derive(Debug)]
pub struct SimRegion<'a> {
    origin: WorldPosition,
    bounds: Rect3,
    updatable_bounds: Rect3,
    chunk_dim: V3,
    physics: PhysicsConfig,
    max_entity_count: usize,
    max_entity_radius: f32,
    max_entity_velocity: f32,
    entities: Vec<SimEntity>,
    /// Sim position of each entity at pull-in.
    loaded_p: Vec<V3>,
    hash: StorageIndexTable<EntityHandle>,
    _arena: PhantomData<&'a FrameArena>,
}

impl<'a> SimRegion<'a> {
    /// Creates a region around `origin` and pulls in every spatial entity
    /// whose box overlaps the padded `bounds`.
    ///
    /// # Arguments
    ///
    /// * `arena` - Scratch memory for this frame
    /// * `state` - World storage to pull from
    /// * `origin` - World anchor of sim space
    /// * `bounds` - Requested updatable volume, relative to `origin`
    /// * `dt` - Step the region will be simulated for
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration, arena exhaustion, a full region, or
    /// an entity that is already simming. No stored record is left marked as
    /// simming on failure.
    pub fn begin(
        arena: &'a FrameArena,
        state: &mut WorldState,
        origin: WorldPosition,
        bounds: Rect3,
        dt: f32,
    ) -> SimResult<Self> {
        state.config.validate()?;
        let region_config = state.config.region;
        let radius = region_config.max_entity_radius;
        let safety_margin = radius + dt * region_config.max_entity_velocity;

        let updatable_bounds = bounds.add_radius(V3::splat(radius));
        let total_bounds = updatable_bounds.add_radius(V3::new(
            safety_margin,
            safety_margin,
            region_config.update_safety_margin_z,
        ));

        let mut region = Self {
            origin,
            bounds: total_bounds,
            updatable_bounds,
            chunk_dim: state.world.chunk_dim(),
            physics: state.config.physics,
            max_entity_count: region_config.max_entity_count,
            max_entity_radius: radius,
            max_entity_velocity: region_config.max_entity_velocity,
            entities: arena.alloc_with_capacity(region_config.max_entity_count)?,
            loaded_p: arena.alloc_with_capacity(region_config.max_entity_count)?,
            hash: StorageIndexTable::in_arena(arena, region_config.hash_table_size)?,
            _arena: PhantomData,
        };

        if let Err(err) = region.pull_in(state) {
            region.release(&mut state.entities);
            return Err(err);
        }

        tracing::debug!(
            entities = region.entities.len(),
            updatable = region.updatable_handles().count(),
            arena_used = arena.used(),
            "Sim region begun"
        );
        Ok(region)
    }

    fn pull_in(&mut self, state: &mut WorldState) -> SimResult<()> {
        let min = state.world.map_into_chunk_space(self.origin, self.bounds.min);
        let max = state.world.map_into_chunk_space(self.origin, self.bounds.max);

        for chunk_z in min.chunk_z..=max.chunk_z {
            for chunk_y in min.chunk_y..=max.chunk_y {
                for chunk_x in min.chunk_x..=max.chunk_x {
                    let coord = ChunkCoord::new(chunk_x, chunk_y, chunk_z);
                    for index in state.world.query_chunk_entities(coord) {
                        let Some(stored) = state.entities.get(index) else {
                            continue;
                        };
                        if !stored.sim.is_spatial() {
                            continue;
                        }
                        let sim_p = world::subtract(self.chunk_dim, &stored.p, &self.origin);
                        if entity_overlaps_rectangle(sim_p, stored.sim.dim, self.bounds) {
                            self.add_entity_to(&mut state.entities, index, Some(sim_p))?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Clears the simming flag of everything pulled in so far.
    fn release(&self, storage: &mut EntityStorage) {
        for entity in &self.entities {
            if let Some(stored) = storage.get_mut(entity.storage_index) {
                stored.sim.flags.remove(EntityFlags::SIMMING);
            }
        }
    }

    /// Copies a stored entity into the region, or returns its existing handle.
    ///
    /// With `sim_p` the entity is placed there; otherwise its stored world
    /// position is projected into sim space. Any entity it references is
    /// pulled in as well.
    ///
    /// # Errors
    ///
    /// - [`SimError::RegionFull`] if the region is at capacity
    /// - [`SimError::AlreadySimming`] if another region holds the entity
    /// - [`SimError::UnknownEntity`] for an index with no stored record
    pub fn add_entity(
        &mut self,
        state: &mut WorldState,
        index: StorageIndex,
        sim_p: Option<V3>,
    ) -> SimResult<EntityHandle> {
        self.add_entity_to(&mut state.entities, index, sim_p)
    }

    pub(crate) fn add_entity_to(
        &mut self,
        storage: &mut EntityStorage,
        index: StorageIndex,
        sim_p: Option<V3>,
    ) -> SimResult<EntityHandle> {
        if let Some(handle) = self.hash.get(index) {
            return Ok(handle);
        }
        if self.entities.len() >= self.max_entity_count {
            tracing::warn!(%index, capacity = self.max_entity_count, "Sim region full");
            return Err(SimError::RegionFull {
                capacity: self.max_entity_count,
            });
        }

        let stored = storage.require_mut(index)?;
        if stored.sim.is_set(EntityFlags::SIMMING) {
            tracing::warn!(%index, "Entity pulled into a second sim region");
            return Err(SimError::AlreadySimming(index));
        }

        #[allow(clippy::cast_possible_truncation)]
        let handle = EntityHandle::new(self.entities.len() as u32);
        self.hash.insert(index, handle)?;

        let mut entity = stored.sim;
        stored.sim.flags.insert(EntityFlags::SIMMING);

        entity.storage_index = index;
        entity.p = match sim_p {
            Some(p) => p,
            None => self.sim_space_p(stored),
        };
        entity.updatable = entity.is_spatial()
            && entity_overlaps_rectangle(entity.p, entity.dim, self.updatable_bounds);

        self.entities.push(entity);
        self.loaded_p.push(entity.p);
        tracing::trace!(
            %index,
            handle = handle.get(),
            updatable = entity.updatable,
            "Entity added"
        );

        let sword = self.load_reference(storage, entity.sword)?;
        self.entities[handle.index()].sword = sword;

        Ok(handle)
    }

    fn sim_space_p(&self, stored: &StoredEntity) -> V3 {
        if stored.sim.is_spatial() && stored.p.is_valid() {
            world::subtract(self.chunk_dim, &stored.p, &self.origin)
        } else {
            INVALID_P
        }
    }

    /// Writes every entity back to storage and consumes the region.
    ///
    /// Nothing is committed unless every entity's stored record is still
    /// marked as simming. On failure the region's simming marks are cleared,
    /// so the stored entities can be pulled into a new region.
    ///
    /// # Errors
    ///
    /// - [`SimError::NotSimming`] if a stored record lost its simming mark
    /// - [`SimError::UnknownEntity`] if a stored record disappeared
    pub fn end(self, state: &mut WorldState) -> SimResult<EndSimStats> {
        if let Err(err) = self.check_commit(&state.entities) {
            self.release(&mut state.entities);
            return Err(err);
        }

        let mut stats = EndSimStats::default();
        for (entity, loaded_p) in self.entities.iter().zip(&self.loaded_p) {
            let index = entity.storage_index;
            let stored = state.entities.require_mut(index)?;
            let old_p = stored.p;

            stored.sim = *entity;
            stored.sim.flags.remove(EntityFlags::SIMMING);
            stored.sim.sword = self.store_reference(entity.sword);

            let new_p = if !entity.is_spatial() {
                WorldPosition::null()
            } else if entity.p == *loaded_p && old_p.is_valid() {
                old_p
            } else {
                state.world.map_into_chunk_space(self.origin, entity.p)
            };
            state.world.change_entity_location(index, stored, new_p);

            if old_p.is_valid() != new_p.is_valid()
                || (new_p.is_valid() && old_p.chunk() != new_p.chunk())
            {
                stats.relocated += 1;
            }
            if index == state.camera.following {
                let mut camera_p = new_p;
                if camera_p.is_valid() {
                    camera_p.offset.z = state.camera.position.offset.z;
                    state.camera.position = camera_p;
                    stats.camera_updated = true;
                }
            }
            stats.committed += 1;
        }

        tracing::debug!(
            committed = stats.committed,
            relocated = stats.relocated,
            "Sim region ended"
        );
        Ok(stats)
    }

    fn check_commit(&self, storage: &EntityStorage) -> SimResult<()> {
        for entity in &self.entities {
            let stored = storage.require(entity.storage_index)?;
            if !stored.sim.is_set(EntityFlags::SIMMING) {
                tracing::warn!(
                    index = %entity.storage_index,
                    "Committing entity that is not simming"
                );
                return Err(SimError::NotSimming(entity.storage_index));
            }
        }
        Ok(())
    }

    /// Entity behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidHandle`] if the handle is out of range.
    #[inline]
    pub fn entity(&self, handle: EntityHandle) -> SimResult<&SimEntity> {
        self.entities
            .get(handle.index())
            .ok_or(SimError::InvalidHandle(handle.get()))
    }

    /// Mutable entity behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidHandle`] if the handle is out of range.
    #[inline]
    pub fn entity_mut(&mut self, handle: EntityHandle) -> SimResult<&mut SimEntity> {
        self.entities
            .get_mut(handle.index())
            .ok_or(SimError::InvalidHandle(handle.get()))
    }

    /// All live entities, in handle order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[SimEntity] {
        &self.entities
    }

    /// Handles of all live entities.
    #[allow(clippy::cast_possible_truncation)]
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> {
        (0..self.entities.len() as u32).map(EntityHandle::new)
    }

    /// Handles of entities inside the updatable bounds.
    pub fn updatable_handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.handles().filter(|handle| self.entities[handle.index()].updatable)
    }

    /// Handle of the entity with storage index `index`, if it is in the region.
    #[inline]
    #[must_use]
    pub fn handle_of(&self, index: StorageIndex) -> Option<EntityHandle> {
        self.hash.get(index)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Total bounds, relative to the origin.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Rect3 {
        self.bounds
    }

    /// Updatable bounds, relative to the origin.
    #[inline]
    #[must_use]
    pub const fn updatable_bounds(&self) -> Rect3 {
        self.updatable_bounds
    }

    /// World anchor of sim space.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> WorldPosition {
        self.origin
    }

    /// Largest entity half-extent the bounds were padded for.
    #[inline]
    #[must_use]
    pub const fn max_entity_radius(&self) -> f32 {
        self.max_entity_radius
    }

    /// Velocity cap the bounds were padded for.
    #[inline]
    #[must_use]
    pub const fn max_entity_velocity(&self) -> f32 {
        self.max_entity_velocity
    }

    /// Movement constants for this region.
    #[inline]
    #[must_use]
    pub const fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Size of one world chunk in meters.
    #[inline]
    #[must_use]
    pub const fn chunk_dim(&self) -> V3 {
        self.chunk_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::entity::EntityType;

    fn small_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.region.max_entity_count = 4;
        config.region.hash_table_size = 8;
        config.region.arena_bytes = 64 * 1024;
        config
    }

    fn wall_at(state: &mut WorldState, offset: V3) -> StorageIndex {
        let p = state.position_near_camera(offset);
        state
            .add_stored_entity(SimEntity::new(EntityType::Wall, V3::splat(1.0)), Some(p))
            .unwrap()
    }

    fn bounds() -> Rect3 {
        Rect3::center_dim(V3::ZERO, V3::new(10.0, 10.0, 3.0))
    }

    #[test]
    fn test_begin_pulls_in_nearby_only() {
        let mut state = WorldState::new(small_config());
        let near = wall_at(&mut state, V3::new(2.0, 0.0, 0.0));
        let far = wall_at(&mut state, V3::new(500.0, 0.0, 0.0));
        let arena = FrameArena::new(64 * 1024);

        let region = SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), 0.1)
            .unwrap();
        assert_eq!(region.entity_count(), 1);
        let handle = region.handle_of(near).unwrap();
        assert!(region.entity(handle).unwrap().updatable);
        assert!(region.handle_of(far).is_none());
        assert!(state.entities.get(near).unwrap().sim.is_set(EntityFlags::SIMMING));

        region.end(&mut state).unwrap();
        assert!(!state.entities.get(near).unwrap().sim.is_set(EntityFlags::SIMMING));
    }

    #[test]
    fn test_total_bounds_padding() {
        let mut state = WorldState::new(SimConfig::default());
        let radius = state.config.region.max_entity_radius;
        let velocity = state.config.region.max_entity_velocity;
        let arena = FrameArena::new(4 * 1024 * 1024);

        let region =
            SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), 0.5).unwrap();
        let updatable = region.updatable_bounds();
        let total = region.bounds();
        assert!((updatable.max.x - (5.0 + radius)).abs() < 1e-5);
        assert!((total.max.x - (5.0 + 2.0 * radius + 0.5 * velocity)).abs() < 1e-4);
        assert!((total.max.z - (1.5 + radius + 1.0)).abs() < 1e-5);
        region.end(&mut state).unwrap();
    }

    #[test]
    fn test_region_full_rolls_back() {
        let mut state = WorldState::new(small_config());
        for i in 0..5u8 {
            wall_at(&mut state, V3::new(f32::from(i), 0.0, 0.0));
        }
        let arena = FrameArena::new(64 * 1024);

        let err = SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), 0.1)
            .unwrap_err();
        assert_eq!(err, SimError::RegionFull { capacity: 4 });
        assert!(state
            .entities
            .iter()
            .all(|(_, stored)| !stored.sim.is_set(EntityFlags::SIMMING)));
    }

    #[test]
    fn test_arena_exhaustion_is_typed() {
        let mut state = WorldState::new(small_config());
        let arena = FrameArena::new(16);
        let err = SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), 0.1)
            .unwrap_err();
        assert!(matches!(err, SimError::Core(_)));
    }

    #[test]
    fn test_invalid_config_is_typed() {
        let mut config = small_config();
        config.region.hash_table_size = 100;
        let mut state = WorldState::new(config);
        let arena = FrameArena::new(64 * 1024);

        let err = SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), 0.1)
            .unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn test_failed_end_releases_entities() {
        let mut state = WorldState::new(small_config());
        let a = wall_at(&mut state, V3::ZERO);
        let b = wall_at(&mut state, V3::new(2.0, 0.0, 0.0));
        let mut arena = FrameArena::new(64 * 1024);

        let region = SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), 0.1)
            .unwrap();
        state.entities.require_mut(b).unwrap().sim.flags.remove(EntityFlags::SIMMING);
        assert_eq!(region.end(&mut state), Err(SimError::NotSimming(b)));
        assert!(!state.entities.get(a).unwrap().sim.is_set(EntityFlags::SIMMING));
        arena.reset();

        let region = SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), 0.1)
            .unwrap();
        assert_eq!(region.entity_count(), 2);
        assert_eq!(region.end(&mut state).unwrap().committed, 2);
    }

    #[test]
    fn test_invalid_handle() {
        let mut state = WorldState::new(small_config());
        let arena = FrameArena::new(64 * 1024);
        let region =
            SimRegion::begin(&arena, &mut state, WorldPosition::ORIGIN, bounds(), 0.1).unwrap();
        assert_eq!(
            region.entity(EntityHandle::new(3)).err(),
            Some(SimError::InvalidHandle(3))
        );
        region.end(&mut state).unwrap();
    }
}
