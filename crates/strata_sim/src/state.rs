//! # World State
//!
//! Everything that outlives a frame: chunk partition, stored entities,
//! collision rules and the camera. Sim regions borrow it during pull-in and
//! commit; the movement engine only ever sees the rule table.

use strata_core::StorageIndex;
use strata_shared::V3;

use crate::config::SimConfig;
use crate::entity::SimEntity;
use crate::error::SimResult;
use crate::rules::CollisionRuleTable;
use crate::world::{EntityStorage, StoredEntity, World, WorldPosition};

/// Camera tracking state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Current camera position.
    pub position: WorldPosition,
    /// Entity the camera follows, or null.
    pub following: StorageIndex,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: WorldPosition::ORIGIN,
            following: StorageIndex::NULL,
        }
    }
}

/// Persistent state of one game session.
#[derive(Clone, Debug)]
pub struct WorldState {
    /// Tuning the state was built with.
    pub config: SimConfig,
    /// Chunk partition.
    pub world: World,
    /// Stored entity records.
    pub entities: EntityStorage,
    /// Pairwise collision overrides.
    pub collision_rules: CollisionRuleTable,
    /// Camera tracking.
    pub camera: Camera,
}

impl WorldState {
    /// Creates an empty world sized by `config`.
    ///
    /// The configuration is checked again by every [`crate::SimRegion::begin`].
    ///
    /// # Panics
    ///
    /// Panics if the configured chunk dimensions are not positive.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let world = World::new(config.world.chunk_dim_in_meters());
        let entities = EntityStorage::new(config.world.max_stored_entities);
        Self {
            config,
            world,
            entities,
            collision_rules: CollisionRuleTable::new(),
            camera: Camera::default(),
        }
    }

    /// Stores a new entity. A `None` position creates it non-spatial.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::StorageFull`] if storage is at capacity.
    pub fn add_stored_entity(
        &mut self,
        template: SimEntity,
        p: Option<WorldPosition>,
    ) -> SimResult<StorageIndex> {
        let index = self.entities.add(StoredEntity::new(template))?;
        let stored = self.entities.require_mut(index)?;
        self.world
            .change_entity_location(index, stored, p.unwrap_or_else(WorldPosition::null));
        Ok(index)
    }

    /// Position `offset` meters away from the camera.
    #[must_use]
    pub fn position_near_camera(&self, offset: V3) -> WorldPosition {
        self.world.map_into_chunk_space(self.camera.position, offset)
    }
}
