//! # Simulation Constants
//!
//! Defaults for the sim region and the movement engine.
//!
//! **NOTE:** These are the compiled-in defaults. A `SimConfig` loaded from
//! TOML overrides every one of them at runtime.

use crate::math::V3;

// =============================================================================
// SIM REGION SIZING
// =============================================================================

/// Maximum number of entities one sim region can hold.
pub const MAX_ENTITY_COUNT: usize = 4096;

/// Slots in the region's storage-index table.
///
/// Kept at twice the entity cap so the table can never fill up.
pub const SIM_HASH_SIZE: usize = 8192;

/// Largest half-extent any entity may have (meters).
pub const MAX_ENTITY_RADIUS: f32 = 5.0;

/// Velocity cap of the movement engine (meters per second).
pub const MAX_ENTITY_VELOCITY: f32 = 30.0;

/// Vertical padding between the updatable and the total region bounds.
pub const UPDATE_SAFETY_MARGIN_Z: f32 = 1.0;

// =============================================================================
// MOVEMENT
// =============================================================================

/// Downward acceleration applied to every moving entity (m/s²).
pub const GRAVITY: f32 = 9.8;

/// Maximum swept-collision passes per move.
pub const COLLISION_ITERATIONS: u32 = 4;

/// Time-of-impact backoff that keeps a mover off the wall it hit.
pub const T_EPSILON: f32 = 0.001;

/// Travel budget used when an entity has no distance limit (meters).
pub const UNLIMITED_DISTANCE: f32 = 10_000.0;

/// Sentinel position of non-spatial entities.
pub const INVALID_P: V3 = V3::new(100_000.0, 100_000.0, 100_000.0);
