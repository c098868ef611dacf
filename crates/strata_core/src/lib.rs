//! # STRATA Core
//!
//! Low-level building blocks shared by every sim region:
//! - Stable storage identities and per-frame entity handles
//! - A bump arena that bounds the memory of one simulated frame
//! - An open-addressed table mapping storage identities to handles
//!
//! ## Architecture Rules
//!
//! 1. **No heap growth during simulation** - Tables and entity arrays are sized up front
//! 2. **Handles, not pointers** - Entities are addressed by index into the region that owns them
//! 3. **Typed failures** - Capacity exhaustion is reported, never silently ignored
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::{FrameArena, StorageIndex, StorageIndexTable};
//!
//! let arena = FrameArena::new(4 * 1024 * 1024);
//! let mut table: StorageIndexTable<u32> = StorageIndexTable::with_capacity(8192);
//! table.insert(StorageIndex::new(7), 0)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod ids;
pub mod memory;
pub mod table;

pub use error::{CoreError, CoreResult};
pub use ids::{EntityHandle, StorageIndex};
pub use memory::FrameArena;
pub use table::{SlotId, StorageIndexTable};
