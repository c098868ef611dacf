//! # STRATA Sim
//!
//! Per-frame entity simulation over a persistent chunked world.
//!
//! ## Frame Flow
//!
//! ```text
//! ┌──────────────┐  begin   ┌──────────────────┐  end   ┌──────────────┐
//! │  WorldState  │─────────>│    SimRegion     │───────>│  WorldState  │
//! │              │          │                  │        │              │
//! │ • World      │          │ • entity table   │        │ • relocated  │
//! │ • Storage    │          │ • index -> handle│        │ • camera     │
//! │ • Rules      │<────────>│ • move_entity    │        │   updated    │
//! └──────────────┘  rules   └──────────────────┘        └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - `world`: chunk partition and stored entity records
//! - `region`: pull-in, reference resolution and commit
//! - `movement` / `collision`: swept Minkowski collision, stair overlap
//! - `rules`: per-session collision overrides
//! - `session`: frame driver and entity behaviour
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_sim::{GameSession, HeroInput, SimConfig};
//!
//! let mut session = GameSession::new(SimConfig::default())?;
//! let hero = session.add_hero(session.position(V3::ZERO))?;
//! let report = session.update(1.0 / 60.0, &[HeroInput { hero, ..Default::default() }])?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod movement;
pub mod region;
pub mod rules;
pub mod session;
pub mod state;
pub mod world;

pub use config::SimConfig;
pub use entity::{EntityFlags, EntityReference, EntityType, Facing, MoveSpec, SimEntity};
pub use error::{SimError, SimResult};
pub use movement::{move_entity, MoveOutcome};
pub use region::{EndSimStats, SimRegion};
pub use rules::CollisionRuleTable;
pub use session::{FrameReport, GameSession, HeroInput};
pub use state::{Camera, WorldState};
pub use world::{ChunkCoord, EntityStorage, StoredEntity, World, WorldPosition};
