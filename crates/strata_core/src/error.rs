//! # Core Error Types
//!
//! Capacity and identity failures raised by the core containers.

use thiserror::Error;

/// Errors raised by the arena and the storage-index table.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// The frame arena cannot satisfy an allocation.
    #[error("frame arena exhausted: requested {requested} bytes, {remaining} remaining")]
    ArenaExhausted {
        /// Bytes requested (including alignment padding).
        requested: usize,
        /// Bytes still free in the arena.
        remaining: usize,
    },

    /// Storage index 0 was used as a lookup key.
    #[error("storage index 0 is reserved and cannot be looked up")]
    NullStorageIndex,

    /// A table was requested with a capacity that is not a power of two.
    #[error("storage index table capacity {capacity} is not a power of two")]
    InvalidCapacity {
        /// Requested number of slots.
        capacity: usize,
    },

    /// Every slot of the table is bound to some other identity.
    #[error("storage index table full: capacity {capacity}")]
    TableFull {
        /// Number of slots in the table.
        capacity: usize,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
