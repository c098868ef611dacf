//! # Collision Predicates
//!
//! Pairwise rules consulted by the movement engine:
//! - [`can_collide`] / [`handle_collision`] for blocking contacts
//! - [`can_overlap`] / [`handle_overlap`] for area effects (stairwells)
//! - [`test_wall`] / [`sweep`] for the swept Minkowski box test

use strata_shared::{lerp, Rect3, V3};

use crate::entity::{EntityType, SimEntity};
use crate::rules::CollisionRuleTable;

/// One axis-aligned wall of a Minkowski box, seen from the mover.
///
/// Coordinates are "across" (`x`, the wall's normal axis) and "along" (`y`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallTest {
    /// Wall position on the normal axis.
    pub wall_x: f32,
    /// Mover position relative to the box center, normal axis.
    pub rel_x: f32,
    /// Mover position relative to the box center, along the wall.
    pub rel_y: f32,
    /// Planned displacement, normal axis.
    pub delta_x: f32,
    /// Planned displacement, along the wall.
    pub delta_y: f32,
    /// Wall extent start.
    pub min_y: f32,
    /// Wall extent end.
    pub max_y: f32,
}

/// Time of impact against one wall, if earlier than `t_min`.
///
/// The returned time is backed off by `t_epsilon` (never below 0) so the
/// mover stops short of the wall.
#[must_use]
pub fn test_wall(wall: &WallTest, t_min: f32, t_epsilon: f32) -> Option<f32> {
    if wall.delta_x == 0.0 {
        return None;
    }
    let t_result = (wall.wall_x - wall.rel_x) / wall.delta_x;
    let y = wall.rel_y + t_result * wall.delta_y;
    if t_result >= 0.0 && t_min > t_result && y >= wall.min_y && y <= wall.max_y {
        Some((t_result - t_epsilon).max(0.0))
    } else {
        None
    }
}

/// Earliest hit of a mover sweeping `delta` against a box, if before `t_min`.
///
/// Returns the backed-off time and the outward wall normal.
#[must_use]
pub fn sweep(
    mover_p: V3,
    mover_dim: V3,
    other_p: V3,
    other_dim: V3,
    delta: V3,
    t_min: f32,
    t_epsilon: f32,
) -> Option<(f32, V3)> {
    let half = (mover_dim + other_dim) * 0.5;
    let min_corner = -half;
    let max_corner = half;
    let rel = mover_p - other_p;

    let walls = [
        (
            WallTest {
                wall_x: min_corner.x,
                rel_x: rel.x,
                rel_y: rel.y,
                delta_x: delta.x,
                delta_y: delta.y,
                min_y: min_corner.y,
                max_y: max_corner.y,
            },
            V3::new(-1.0, 0.0, 0.0),
        ),
        (
            WallTest {
                wall_x: max_corner.x,
                rel_x: rel.x,
                rel_y: rel.y,
                delta_x: delta.x,
                delta_y: delta.y,
                min_y: min_corner.y,
                max_y: max_corner.y,
            },
            V3::new(1.0, 0.0, 0.0),
        ),
        (
            WallTest {
                wall_x: min_corner.y,
                rel_x: rel.y,
                rel_y: rel.x,
                delta_x: delta.y,
                delta_y: delta.x,
                min_y: min_corner.x,
                max_y: max_corner.x,
            },
            V3::new(0.0, -1.0, 0.0),
        ),
        (
            WallTest {
                wall_x: max_corner.y,
                rel_x: rel.y,
                rel_y: rel.x,
                delta_x: delta.y,
                delta_y: delta.x,
                min_y: min_corner.x,
                max_y: max_corner.x,
            },
            V3::new(0.0, 1.0, 0.0),
        ),
    ];

    let mut best = None;
    let mut t = t_min;
    for (wall, normal) in &walls {
        if let Some(hit_t) = test_wall(wall, t, t_epsilon) {
            t = hit_t;
            best = Some((hit_t, *normal));
        }
    }
    best
}

/// True if `a` and `b` may block each other.
///
/// Self pairs, non-spatial entities and stairwells never collide; any other
/// pair collides unless the rule table says otherwise.
#[must_use]
pub fn can_collide(rules: &CollisionRuleTable, a: &SimEntity, b: &SimEntity) -> bool {
    if a.storage_index == b.storage_index {
        return false;
    }
    if !a.is_spatial() || !b.is_spatial() {
        return false;
    }
    if a.entity_type == EntityType::Stairwell || b.entity_type == EntityType::Stairwell {
        return false;
    }
    rules
        .lookup(a.storage_index, b.storage_index)
        .unwrap_or(true)
}

/// Applies the effects of `mover` hitting `hit`.
///
/// Returns true if the mover is stopped by the contact. A sword passes
/// through and never touches the same entity twice; a monster struck by a
/// sword loses a hit point.
pub fn handle_collision(
    rules: &mut CollisionRuleTable,
    mover: &mut SimEntity,
    hit: &mut SimEntity,
) -> bool {
    let stops = if mover.entity_type == EntityType::Sword {
        rules.add(mover.storage_index, hit.storage_index, false);
        false
    } else if hit.entity_type == EntityType::Sword {
        rules.add(hit.storage_index, mover.storage_index, false);
        false
    } else {
        true
    };

    let (low, high) = if mover.entity_type <= hit.entity_type {
        (mover, hit)
    } else {
        (hit, mover)
    };
    if low.entity_type == EntityType::Monster && high.entity_type == EntityType::Sword {
        low.hit_point_max = low.hit_point_max.saturating_sub(1);
        tracing::trace!(
            monster = %low.storage_index,
            hit_points = low.hit_point_max,
            "Monster struck"
        );
    }

    stops
}

/// True if `mover` can be affected by standing in `region`.
#[must_use]
pub fn can_overlap(mover: &SimEntity, region: &SimEntity) -> bool {
    mover.storage_index != region.storage_index
        && region.is_spatial()
        && region.entity_type == EntityType::Stairwell
}

/// Ground height under `mover` after overlapping `region`.
///
/// A stairwell ramps from its bottom to its top along Y. Other kinds leave
/// `ground` unchanged.
#[must_use]
pub fn handle_overlap(mover: &SimEntity, region: &SimEntity, ground: f32) -> f32 {
    if region.entity_type != EntityType::Stairwell {
        return ground;
    }
    let rect = Rect3::center_dim(region.p, region.dim);
    let bary = rect.barycentric(mover.p).clamp01();
    lerp(rect.min.z, bary.y, rect.max.z)
}
