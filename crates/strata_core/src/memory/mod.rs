//! # Memory Management
//!
//! Scratch memory for the simulation of a single frame.
//!
//! ## Design Philosophy
//!
//! Every sim region is carved out of a [`FrameArena`]. The frame driver
//! resets the arena once the region has been committed, which releases the
//! whole working set at once:
//! - No per-entity allocation or free
//! - A hard, visible memory budget per frame
//! - Region lifetime tied to the arena borrow

mod arena;

pub use arena::FrameArena;
