//! # Simulation Error Types
//!
//! Two classes of failure exist and both are reported as [`SimError`]:
//! - capacity violations (region or table full, arena exhausted)
//! - state-invariant violations (double pull-in, commit of an entity that
//!   is not being simulated, moving a non-spatial entity)
//!
//! Neither is expected in a correctly sized game; they indicate a defect in
//! the caller's bounds or world density, or a pull-in/commit bug.

use strata_core::{CoreError, StorageIndex};
use thiserror::Error;

/// Errors that can occur while building, simulating or committing a region.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The region already holds its maximum number of entities.
    #[error("sim region full: capacity {capacity}")]
    RegionFull {
        /// Entity cap of the region.
        capacity: usize,
    },

    /// Persistent entity storage holds its maximum number of entities.
    #[error("entity storage full: capacity {capacity}")]
    StorageFull {
        /// Entity cap of the storage.
        capacity: usize,
    },

    /// Arena or storage-index table failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The stored entity is already copied into some sim region.
    #[error("entity {0} is already being simulated")]
    AlreadySimming(StorageIndex),

    /// The stored entity was committed without being pulled in.
    #[error("entity {0} is not marked as being simulated")]
    NotSimming(StorageIndex),

    /// Only spatial entities can move.
    #[error("entity {0} is non-spatial and cannot move")]
    NonspatialMove(StorageIndex),

    /// No stored entity exists for the index.
    #[error("no stored entity {0}")]
    UnknownEntity(StorageIndex),

    /// The handle does not name an entity of this region.
    #[error("handle {0} is not part of this sim region")]
    InvalidHandle(u32),

    /// Configuration could not be read or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
