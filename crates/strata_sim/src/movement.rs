//! # Movement Engine
//!
//! Integrates one entity over one step and resolves its path against every
//! other entity of the region:
//!
//! 1. Acceleration: optional unit cap, speed scale, linear drag, gravity
//! 2. Semi-implicit Euler integration; velocity and step length are capped
//!    at the region limit so a mover never outruns the region padding
//! 3. Up to `collision_iterations` swept passes; each pass stops at the
//!    earliest wall and slides along it if the contact blocks
//! 4. Overlap pass against stairwells to find the ground height
//! 5. Facing update

use strata_core::EntityHandle;
use strata_shared::V3;

use crate::collision::{can_collide, can_overlap, handle_collision, handle_overlap, sweep};
use crate::entity::{Facing, MoveSpec};
use crate::error::{SimError, SimResult};
use crate::region::SimRegion;
use crate::rules::CollisionRuleTable;

/// What happened during one [`move_entity`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveOutcome {
    /// Collision passes that moved the entity.
    pub iterations: u32,
    /// Contacts found, blocking or not.
    pub hits: u32,
    /// Entity hit by the last contact.
    pub last_hit: Option<EntityHandle>,
    /// True if the entity ended on the ground.
    pub grounded: bool,
    /// True if a distance-limited entity used up its travel budget.
    pub distance_exhausted: bool,
    /// True if the velocity or step-length cap had to be applied.
    pub velocity_clamped: bool,
}

/// Caps `ddp` at unit length, keeping its direction.
#[inline]
#[must_use]
pub fn normalize_acceleration(ddp: V3) -> V3 {
    let length_squared = ddp.length_squared();
    if length_squared > 1.0 {
        ddp * (1.0 / length_squared.sqrt())
    } else {
        ddp
    }
}

/// Moves one entity of `region` through a step of `dt` seconds.
///
/// # Arguments
///
/// * `region` - Region holding the mover and everything it can hit
/// * `rules` - Session collision rules, updated by contacts
/// * `handle` - The mover
/// * `dt` - Step length in seconds
/// * `spec` - Acceleration shaping
/// * `ddp` - Desired acceleration
///
/// # Errors
///
/// - [`SimError::InvalidHandle`] if `handle` is not part of the region
/// - [`SimError::NonspatialMove`] if the mover is non-spatial
pub fn move_entity(
    region: &mut SimRegion<'_>,
    rules: &mut CollisionRuleTable,
    handle: EntityHandle,
    dt: f32,
    spec: &MoveSpec,
    ddp: V3,
) -> SimResult<MoveOutcome> {
    let physics = *region.physics();
    let max_velocity = region.max_entity_velocity();
    let mut mover = *region.entity(handle)?;
    if !mover.is_spatial() {
        tracing::warn!(index = %mover.storage_index, "Tried to move a non-spatial entity");
        return Err(SimError::NonspatialMove(mover.storage_index));
    }

    let mut outcome = MoveOutcome::default();

    let mut ddp = if spec.normalize_acceleration {
        normalize_acceleration(ddp)
    } else {
        ddp
    };
    ddp *= spec.speed;
    ddp += -spec.drag * mover.d_p;
    ddp += V3::new(0.0, 0.0, -physics.gravity);

    let mut player_delta = 0.5 * ddp * (dt * dt) + mover.d_p * dt;
    mover.d_p = ddp * dt + mover.d_p;

    let speed = mover.d_p.length();
    if speed > max_velocity {
        tracing::debug!(
            index = %mover.storage_index,
            speed,
            max_velocity,
            "Velocity clamped"
        );
        mover.d_p *= max_velocity / speed;
        outcome.velocity_clamped = true;
    }

    let max_step = max_velocity * dt;
    let step = player_delta.length();
    if step > max_step {
        player_delta *= max_step / step;
        outcome.velocity_clamped = true;
    }

    let limited = mover.distance_limit != 0.0;
    let mut distance_remaining = if limited {
        mover.distance_limit
    } else {
        physics.unlimited_distance
    };

    for _ in 0..physics.collision_iterations {
        let delta_length = player_delta.length();
        if delta_length <= 0.0 {
            break;
        }
        outcome.iterations += 1;

        let mut t_min = 1.0f32;
        let cut_by_distance = delta_length > distance_remaining;
        if cut_by_distance {
            t_min = distance_remaining / delta_length;
        }

        let mut wall_normal = V3::ZERO;
        let mut hit = None;
        let desired_p = mover.p + player_delta;

        for (i, other) in region.entities().iter().enumerate() {
            if i == handle.index() || !can_collide(rules, &mover, other) {
                continue;
            }
            if let Some((t, normal)) = sweep(
                mover.p,
                mover.dim,
                other.p,
                other.dim,
                player_delta,
                t_min,
                physics.t_epsilon,
            ) {
                t_min = t;
                wall_normal = normal;
                #[allow(clippy::cast_possible_truncation)]
                let other_handle = EntityHandle::new(i as u32);
                hit = Some(other_handle);
            }
        }

        mover.p += t_min * player_delta;
        if cut_by_distance && hit.is_none() {
            distance_remaining = 0.0;
        } else {
            distance_remaining -= t_min * delta_length;
        }

        let Some(hit_handle) = hit else {
            break;
        };
        outcome.hits += 1;
        outcome.last_hit = Some(hit_handle);

        player_delta = desired_p - mover.p;
        let stops = handle_collision(rules, &mut mover, region.entity_mut(hit_handle)?);
        if stops {
            player_delta -= player_delta.dot(wall_normal) * wall_normal;
            mover.d_p -= mover.d_p.dot(wall_normal) * wall_normal;
        }
    }

    let mut ground = 0.0f32;
    let mover_rect = mover.rect();
    for (i, other) in region.entities().iter().enumerate() {
        if i != handle.index()
            && can_overlap(&mover, other)
            && mover_rect.intersects(other.rect())
        {
            ground = handle_overlap(&mover, other, ground);
        }
    }

    if mover.p.z <= ground {
        mover.p.z = ground;
        mover.d_p.z = 0.0;
        outcome.grounded = true;
    }

    if limited {
        mover.distance_limit = distance_remaining.max(0.0);
        outcome.distance_exhausted = mover.distance_limit == 0.0;
    }

    mover.facing = Facing::from_velocity(mover.d_p, mover.facing);

    *region.entity_mut(handle)? = mover;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_caps_length() {
        let ddp = normalize_acceleration(V3::new(3.0, 4.0, 0.0));
        assert!((ddp.length() - 1.0).abs() < 1e-6);
        assert!(ddp.cross(V3::new(3.0, 4.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_normalize_keeps_short_vectors() {
        let ddp = V3::new(0.3, -0.4, 0.0);
        assert_eq!(normalize_acceleration(ddp), ddp);
    }
}
