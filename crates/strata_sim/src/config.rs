//! # Simulation Configuration
//!
//! Tuning for the sim region, the world partition, the movement engine and
//! the session's entity behaviours. Loaded once at startup from TOML; every
//! key is optional and falls back to the compiled-in default.
//!
//! ```toml
//! [region]
//! max_entity_count = 4096
//! hash_table_size = 8192
//!
//! [physics]
//! collision_iterations = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_shared::constants::{
    COLLISION_ITERATIONS, GRAVITY, MAX_ENTITY_COUNT, MAX_ENTITY_RADIUS, MAX_ENTITY_VELOCITY,
    SIM_HASH_SIZE, T_EPSILON, UNLIMITED_DISTANCE, UPDATE_SAFETY_MARGIN_Z,
};
use strata_shared::{Rect3, V3};

use crate::error::{SimError, SimResult};

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Sim region sizing.
    pub region: RegionConfig,
    /// World chunk partition.
    pub world: WorldConfig,
    /// Movement engine constants.
    pub physics: PhysicsConfig,
    /// Camera-relative simulation bounds.
    pub camera: CameraConfig,
    /// Per-type entity behaviour used by the session.
    pub behavior: BehaviorConfig,
}

/// Sim region sizing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Entity cap of one region.
    pub max_entity_count: usize,
    /// Slots in the storage-index table (power of two, above the entity cap).
    pub hash_table_size: usize,
    /// Largest half-extent any entity may have.
    pub max_entity_radius: f32,
    /// Velocity cap enforced by the movement engine.
    pub max_entity_velocity: f32,
    /// Vertical padding of the total bounds.
    pub update_safety_margin_z: f32,
    /// Byte budget of the frame arena.
    pub arena_bytes: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            max_entity_count: MAX_ENTITY_COUNT,
            hash_table_size: SIM_HASH_SIZE,
            max_entity_radius: MAX_ENTITY_RADIUS,
            max_entity_velocity: MAX_ENTITY_VELOCITY,
            update_safety_margin_z: UPDATE_SAFETY_MARGIN_Z,
            arena_bytes: 4 * 1024 * 1024,
        }
    }
}

/// World chunk partition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Horizontal size of one tile.
    pub tile_side_in_meters: f32,
    /// Vertical size of one tile.
    pub tile_depth_in_meters: f32,
    /// Tiles along each horizontal side of a chunk.
    pub tiles_per_chunk: u32,
    /// Capacity of persistent entity storage.
    pub max_stored_entities: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_side_in_meters: 1.4,
            tile_depth_in_meters: 3.0,
            tiles_per_chunk: 16,
            max_stored_entities: 100_000,
        }
    }
}

impl WorldConfig {
    /// Size of one chunk in meters. Chunks are one tile deep.
    #[must_use]
    pub fn chunk_dim_in_meters(&self) -> V3 {
        #[allow(clippy::cast_precision_loss)]
        let side = self.tiles_per_chunk as f32 * self.tile_side_in_meters;
        V3::new(side, side, self.tile_depth_in_meters)
    }
}

/// Movement engine constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration.
    pub gravity: f32,
    /// Swept-collision passes per move.
    pub collision_iterations: u32,
    /// Time-of-impact backoff.
    pub t_epsilon: f32,
    /// Travel budget of entities without a distance limit.
    pub unlimited_distance: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            collision_iterations: COLLISION_ITERATIONS,
            t_epsilon: T_EPSILON,
            unlimited_distance: UNLIMITED_DISTANCE,
        }
    }
}

/// Camera-relative simulation bounds, in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Tiles covered along X, Y and Z.
    pub tile_span: [u32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            tile_span: [17 * 3, 9 * 3, 1],
        }
    }
}

impl CameraConfig {
    /// Bounds around the camera that the session simulates each frame.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self, world: &WorldConfig) -> Rect3 {
        let [x, y, z] = self.tile_span;
        Rect3::center_dim(
            V3::ZERO,
            V3::new(x as f32, y as f32, z as f32) * world.tile_side_in_meters,
        )
    }
}

/// Per-type entity behaviour used by the session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Acceleration scale of heroes.
    pub hero_speed: f32,
    /// Linear drag of heroes.
    pub hero_drag: f32,
    /// Acceleration scale of familiars.
    pub familiar_speed: f32,
    /// Linear drag of familiars.
    pub familiar_drag: f32,
    /// Familiars only follow heroes closer than this.
    pub familiar_follow_radius: f32,
    /// Familiars stop accelerating inside this distance.
    pub familiar_min_distance: f32,
    /// Speed added to a thrown sword.
    pub sword_throw_speed: f32,
    /// Travel budget of a thrown sword.
    pub sword_distance_limit: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            hero_speed: 50.0,
            hero_drag: 8.0,
            familiar_speed: 50.0,
            familiar_drag: 8.0,
            familiar_follow_radius: 10.0,
            familiar_min_distance: 3.0,
            sword_throw_speed: 5.0,
            sword_distance_limit: 5.0,
        }
    }
}

impl SimConfig {
    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks the invariants the simulation relies on.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] naming the first violated invariant.
    pub fn validate(&self) -> SimResult<()> {
        let region = &self.region;
        if region.max_entity_count == 0 {
            return Err(SimError::Config("region.max_entity_count must be > 0".into()));
        }
        if !region.hash_table_size.is_power_of_two() {
            return Err(SimError::Config(
                "region.hash_table_size must be a power of two".into(),
            ));
        }
        if region.hash_table_size <= region.max_entity_count {
            return Err(SimError::Config(
                "region.hash_table_size must exceed region.max_entity_count".into(),
            ));
        }
        if region.max_entity_radius <= 0.0 || region.max_entity_velocity <= 0.0 {
            return Err(SimError::Config(
                "region.max_entity_radius and region.max_entity_velocity must be positive".into(),
            ));
        }
        if self.world.tiles_per_chunk == 0
            || self.world.tile_side_in_meters <= 0.0
            || self.world.tile_depth_in_meters <= 0.0
        {
            return Err(SimError::Config("world dimensions must be positive".into()));
        }
        if self.physics.collision_iterations == 0 {
            return Err(SimError::Config(
                "physics.collision_iterations must be > 0".into(),
            ));
        }
        Ok(())
    }
}
