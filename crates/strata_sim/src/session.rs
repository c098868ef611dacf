//! # Game Session
//!
//! Frame driver around one [`WorldState`]. Each [`GameSession::update`]:
//!
//! 1. begins a region around the camera
//! 2. runs per-type behaviour for every updatable entity
//! 3. ends the region and resets the frame arena
//!
//! The region is always ended, even when a behaviour step fails, so stored
//! records never stay marked as simming.

use std::path::Path;

use strata_core::{EntityHandle, FrameArena, StorageIndex};
use strata_shared::V3;

use crate::config::{BehaviorConfig, SimConfig};
use crate::entity::{EntityReference, EntityType, MoveSpec, SimEntity};
use crate::error::SimResult;
use crate::movement::{move_entity, MoveOutcome};
use crate::region::{EndSimStats, SimRegion};
use crate::rules::CollisionRuleTable;
use crate::state::WorldState;
use crate::world::WorldPosition;

/// Controller input for one hero for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeroInput {
    /// Hero this input drives.
    pub hero: StorageIndex,
    /// Desired acceleration; capped at unit length.
    pub acceleration: V3,
    /// Throw the sword in this direction, if it is not already out.
    pub throw: Option<V3>,
}

/// Summary of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Entities in the region.
    pub simulated: usize,
    /// Entities inside the updatable bounds.
    pub updatable: usize,
    /// Entities moved by the movement engine.
    pub moved: usize,
    /// Contacts reported by the movement engine.
    pub collisions: u32,
    /// Swords that ran out of range and were put away.
    pub swords_returned: usize,
    /// Commit counters.
    pub end: EndSimStats,
}

/// A running game: world state plus the scratch memory for its frames.
#[derive(Debug)]
pub struct GameSession {
    state: WorldState,
    arena: FrameArena,
}

impl GameSession {
    /// Creates an empty session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::Config`] if the configuration is invalid.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let arena = FrameArena::new(config.region.arena_bytes);
        tracing::info!(
            arena_bytes = config.region.arena_bytes,
            max_entity_count = config.region.max_entity_count,
            "Game session created"
        );
        Ok(Self {
            state: WorldState::new(config),
            arena,
        })
    }

    /// Creates a session from a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::Config`] if the file is unreadable or invalid.
    pub fn from_config_file(path: impl AsRef<Path>) -> SimResult<Self> {
        Self::new(SimConfig::load(path)?)
    }

    /// Persistent world state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> &WorldState {
        &self.state
    }

    /// Mutable persistent world state.
    #[inline]
    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// Frame arena, for inspecting usage between frames.
    #[inline]
    #[must_use]
    pub const fn arena(&self) -> &FrameArena {
        &self.arena
    }

    /// Position `offset` meters from the camera.
    #[must_use]
    pub fn position(&self, offset: V3) -> WorldPosition {
        self.state.position_near_camera(offset)
    }

    /// Adds a one-tile wall.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::StorageFull`] if storage is at capacity.
    pub fn add_wall(&mut self, p: WorldPosition) -> SimResult<StorageIndex> {
        let world = self.state.config.world;
        let dim = V3::new(
            world.tile_side_in_meters,
            world.tile_side_in_meters,
            world.tile_depth_in_meters,
        );
        self.state.add_stored_entity(SimEntity::new(EntityType::Wall, dim), Some(p))
    }

    /// Adds a stairwell one tile wide and two tiles long (rising along Y).
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::StorageFull`] if storage is at capacity.
    pub fn add_stairwell(&mut self, p: WorldPosition) -> SimResult<StorageIndex> {
        let world = self.state.config.world;
        let dim = V3::new(
            world.tile_side_in_meters,
            2.0 * world.tile_side_in_meters,
            world.tile_depth_in_meters,
        );
        self.state.add_stored_entity(SimEntity::new(EntityType::Stairwell, dim), Some(p))
    }

    /// Adds a hero with a sheathed sword. The camera follows the first hero.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::StorageFull`] if storage is at capacity.
    pub fn add_hero(&mut self, p: WorldPosition) -> SimResult<StorageIndex> {
        let sword = self.state.add_stored_entity(
            SimEntity::new(EntityType::Sword, V3::new(1.0, 0.5, 0.1)),
            None,
        )?;

        let mut hero = SimEntity::new(EntityType::Hero, V3::new(1.0, 0.5, 1.2));
        hero.hit_point_max = 3;
        hero.sword = EntityReference::Unresolved(sword);
        let index = self.state.add_stored_entity(hero, Some(p))?;

        if self.state.camera.following.is_null() {
            self.state.camera.following = index;
            self.state.camera.position = p;
        }
        Ok(index)
    }

    /// Adds a monster with three hit points.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::StorageFull`] if storage is at capacity.
    pub fn add_monster(&mut self, p: WorldPosition) -> SimResult<StorageIndex> {
        let mut monster = SimEntity::new(EntityType::Monster, V3::new(1.0, 0.5, 0.5));
        monster.hit_point_max = 3;
        self.state.add_stored_entity(monster, Some(p))
    }

    /// Adds a familiar.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::StorageFull`] if storage is at capacity.
    pub fn add_familiar(&mut self, p: WorldPosition) -> SimResult<StorageIndex> {
        self.state.add_stored_entity(
            SimEntity::new(EntityType::Familiar, V3::new(1.0, 0.5, 0.5)),
            Some(p),
        )
    }

    /// Simulates one frame of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Propagates region and movement errors. The region is still committed
    /// and the arena reset before the error is returned.
    pub fn update(&mut self, dt: f32, inputs: &[HeroInput]) -> SimResult<FrameReport> {
        let result = self.run_frame(dt, inputs);
        self.arena.reset();
        result
    }

    fn run_frame(&mut self, dt: f32, inputs: &[HeroInput]) -> SimResult<FrameReport> {
        let bounds = self.state.config.camera.bounds(&self.state.config.world);
        let origin = self.state.camera.position;

        let mut region = SimRegion::begin(&self.arena, &mut self.state, origin, bounds, dt)?;
        let behavior = self.state.config.behavior;
        let simulated = simulate(
            &mut region,
            &mut self.state.collision_rules,
            &behavior,
            dt,
            inputs,
        );
        let ended = region.end(&mut self.state);

        let mut report = simulated?;
        report.end = ended?;
        tracing::trace!(
            simulated = report.simulated,
            moved = report.moved,
            collisions = report.collisions,
            "Frame simulated"
        );
        Ok(report)
    }
}

fn simulate(
    region: &mut SimRegion<'_>,
    rules: &mut CollisionRuleTable,
    behavior: &BehaviorConfig,
    dt: f32,
    inputs: &[HeroInput],
) -> SimResult<FrameReport> {
    let mut report = FrameReport {
        simulated: region.entity_count(),
        updatable: region.updatable_handles().count(),
        ..FrameReport::default()
    };

    #[allow(clippy::cast_possible_truncation)]
    let count = region.entity_count() as u32;
    for raw in 0..count {
        let handle = EntityHandle::new(raw);
        let entity = *region.entity(handle)?;
        if !entity.updatable {
            continue;
        }

        let step = match entity.entity_type {
            EntityType::Hero => {
                let input = inputs
                    .iter()
                    .find(|input| input.hero == entity.storage_index)
                    .copied()
                    .unwrap_or_default();
                if let Some(direction) = input.throw {
                    throw_sword(region, rules, behavior, handle, direction)?;
                }
                let spec = MoveSpec {
                    normalize_acceleration: true,
                    speed: behavior.hero_speed,
                    drag: behavior.hero_drag,
                };
                Some((spec, input.acceleration))
            }
            EntityType::Sword if entity.is_spatial() => {
                let spec = MoveSpec {
                    normalize_acceleration: false,
                    speed: 0.0,
                    drag: 0.0,
                };
                Some((spec, V3::ZERO))
            }
            EntityType::Familiar => {
                let spec = MoveSpec {
                    normalize_acceleration: true,
                    speed: behavior.familiar_speed,
                    drag: behavior.familiar_drag,
                };
                Some((spec, familiar_acceleration(region, behavior, &entity)))
            }
            _ => None,
        };

        let Some((spec, ddp)) = step else {
            continue;
        };
        let outcome = move_entity(region, rules, handle, dt, &spec, ddp)?;
        report.moved += 1;
        report.collisions += outcome.hits;

        if entity.entity_type == EntityType::Sword && outcome.distance_exhausted {
            put_away_sword(region, rules, handle, &outcome)?;
            report.swords_returned += 1;
        }
    }
    Ok(report)
}

/// Launches the hero's sword if it is sheathed.
fn throw_sword(
    region: &mut SimRegion<'_>,
    rules: &mut CollisionRuleTable,
    behavior: &BehaviorConfig,
    hero: EntityHandle,
    direction: V3,
) -> SimResult<()> {
    let hero_entity = *region.entity(hero)?;
    let Some(sword_handle) = hero_entity.sword.handle() else {
        return Ok(());
    };
    let sword = region.entity_mut(sword_handle)?;
    if sword.is_spatial() {
        return Ok(());
    }

    sword.make_spatial(
        hero_entity.p,
        hero_entity.d_p + behavior.sword_throw_speed * direction,
    );
    sword.distance_limit = behavior.sword_distance_limit;
    // Thrown this frame, so it still needs its move.
    sword.updatable = true;
    rules.add(sword.storage_index, hero_entity.storage_index, false);
    tracing::debug!(
        sword = %sword.storage_index,
        hero = %hero_entity.storage_index,
        "Sword thrown"
    );
    Ok(())
}

fn put_away_sword(
    region: &mut SimRegion<'_>,
    rules: &mut CollisionRuleTable,
    handle: EntityHandle,
    outcome: &MoveOutcome,
) -> SimResult<()> {
    let sword = region.entity_mut(handle)?;
    rules.clear_rules_for(sword.storage_index);
    sword.make_nonspatial();
    sword.d_p = V3::ZERO;
    sword.distance_limit = 0.0;
    tracing::debug!(sword = %sword.storage_index, hits = outcome.hits, "Sword returned");
    Ok(())
}

/// Pull toward the closest hero inside the follow radius.
fn familiar_acceleration(
    region: &SimRegion<'_>,
    behavior: &BehaviorConfig,
    familiar: &SimEntity,
) -> V3 {
    let mut closest: Option<(f32, V3)> = None;
    let radius_sq = behavior.familiar_follow_radius * behavior.familiar_follow_radius;
    for other in region.entities() {
        if other.entity_type != EntityType::Hero || !other.is_spatial() {
            continue;
        }
        let d_sq = (other.p - familiar.p).length_squared();
        let closer = match closest {
            Some((best, _)) => d_sq < best,
            None => true,
        };
        if d_sq < radius_sq && closer {
            closest = Some((d_sq, other.p));
        }
    }

    let min_distance_sq = behavior.familiar_min_distance * behavior.familiar_min_distance;
    match closest {
        Some((d_sq, hero_p)) if d_sq > min_distance_sq => {
            (hero_p - familiar.p) * (1.0 / d_sq.sqrt())
        }
        _ => V3::ZERO,
    }
}
