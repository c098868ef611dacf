//! # STRATA Shared
//!
//! Math primitives and constants used by the core and the simulation.
//!
//! ## CRITICAL RULE
//!
//! This crate must stay free of simulation state. Anything that owns
//! entities belongs in `strata_sim`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{
    COLLISION_ITERATIONS, GRAVITY, INVALID_P, MAX_ENTITY_COUNT, MAX_ENTITY_RADIUS,
    MAX_ENTITY_VELOCITY, SIM_HASH_SIZE, T_EPSILON, UNLIMITED_DISTANCE, UPDATE_SAFETY_MARGIN_Z,
};
pub use math::{lerp, Rect3, V3};
