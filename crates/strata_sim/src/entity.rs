//! # Entity Record
//!
//! Plain data describing one simulation-capable entity. The same record is
//! embedded in persistent storage and copied into a sim region for a frame.

use strata_core::{EntityHandle, StorageIndex};
use strata_shared::{Rect3, V3, INVALID_P};

/// Kind of entity. The ordering is used to canonicalise collision pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EntityType {
    /// Unused slot.
    #[default]
    Null,
    /// Player-controlled actor.
    Hero,
    /// Static blocker.
    Wall,
    /// Companion that drifts toward nearby heroes.
    Familiar,
    /// Hostile actor with hit points.
    Monster,
    /// Weapon thrown by a hero.
    Sword,
    /// Ramp between floors; overlapped, never collided with.
    Stairwell,
}

/// Entity flag bitset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityFlags(u32);

impl EntityFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Entity has no position and takes no part in spatial tests.
    pub const NONSPATIAL: Self = Self(1 << 1);
    /// Stored record currently has a copy inside a sim region.
    pub const SIMMING: Self = Self(1 << 30);

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Checks if every bit of `flag` is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0
    }

    /// Sets the bits of `flag`.
    #[inline]
    pub fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }

    /// Clears the bits of `flag`.
    #[inline]
    pub fn remove(&mut self, flag: Self) {
        self.0 &= !flag.0;
    }
}

/// Reference from one entity to another.
///
/// Stored records always hold the `Unresolved` form; inside a sim region the
/// reference is `Resolved` to a handle of that region. The region converts
/// between the two at pull-in and commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityReference {
    /// Stable identity of the referenced entity (null for none).
    Unresolved(StorageIndex),
    /// Handle into the sim region that is currently alive.
    Resolved(EntityHandle),
}

impl Default for EntityReference {
    fn default() -> Self {
        Self::Unresolved(StorageIndex::NULL)
    }
}

impl EntityReference {
    /// A reference to nothing.
    pub const NONE: Self = Self::Unresolved(StorageIndex::NULL);

    /// Checks if the reference points nowhere.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::Unresolved(index) if index.is_null())
    }

    /// Returns the handle if resolved.
    #[inline]
    #[must_use]
    pub const fn handle(self) -> Option<EntityHandle> {
        match self {
            Self::Resolved(handle) => Some(handle),
            Self::Unresolved(_) => None,
        }
    }
}

/// Cardinal facing derived from the dominant axis of velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Facing {
    /// +X
    #[default]
    East = 0,
    /// +Y
    North = 1,
    /// -X
    West = 2,
    /// -Y
    South = 3,
}

impl Facing {
    /// Facing for a velocity, or `current` if there is no horizontal motion.
    #[must_use]
    pub fn from_velocity(d_p: V3, current: Self) -> Self {
        if d_p.x == 0.0 && d_p.y == 0.0 {
            current
        } else if d_p.x.abs() > d_p.y.abs() {
            if d_p.x > 0.0 {
                Self::East
            } else {
                Self::West
            }
        } else if d_p.y > 0.0 {
            Self::North
        } else {
            Self::South
        }
    }
}

/// Simulation state of one entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimEntity {
    /// Stable identity (null until the entity is stored).
    pub storage_index: StorageIndex,
    /// True if inside the region's updatable bounds this frame.
    pub updatable: bool,
    /// Kind of entity.
    pub entity_type: EntityType,
    /// Spatial and bookkeeping flags.
    pub flags: EntityFlags,
    /// Position relative to the region origin.
    pub p: V3,
    /// Velocity.
    pub d_p: V3,
    /// Remaining travel budget; 0 means unlimited.
    pub distance_limit: f32,
    /// Bounding box dimensions.
    pub dim: V3,
    /// Cardinal facing.
    pub facing: Facing,
    /// Hit points left.
    pub hit_point_max: u32,
    /// Held weapon.
    pub sword: EntityReference,
}

impl Default for SimEntity {
    fn default() -> Self {
        Self {
            storage_index: StorageIndex::NULL,
            updatable: false,
            entity_type: EntityType::Null,
            flags: EntityFlags::NONE,
            p: V3::ZERO,
            d_p: V3::ZERO,
            distance_limit: 0.0,
            dim: V3::ZERO,
            facing: Facing::East,
            hit_point_max: 0,
            sword: EntityReference::NONE,
        }
    }
}

impl SimEntity {
    /// Creates a spatial entity of the given kind and size at the origin.
    #[must_use]
    pub fn new(entity_type: EntityType, dim: V3) -> Self {
        Self {
            entity_type,
            dim,
            ..Self::default()
        }
    }

    /// Checks a flag.
    #[inline]
    #[must_use]
    pub const fn is_set(&self, flag: EntityFlags) -> bool {
        self.flags.has(flag)
    }

    /// Returns true if the entity takes part in spatial tests.
    #[inline]
    #[must_use]
    pub const fn is_spatial(&self) -> bool {
        !self.flags.has(EntityFlags::NONSPATIAL)
    }

    /// Removes the entity from space, parking it at [`INVALID_P`].
    pub fn make_nonspatial(&mut self) {
        self.flags.insert(EntityFlags::NONSPATIAL);
        self.p = INVALID_P;
    }

    /// Places the entity back into space.
    pub fn make_spatial(&mut self, p: V3, d_p: V3) {
        self.flags.remove(EntityFlags::NONSPATIAL);
        self.p = p;
        self.d_p = d_p;
    }

    /// Bounding box in sim space.
    #[inline]
    #[must_use]
    pub fn rect(&self) -> Rect3 {
        Rect3::center_dim(self.p, self.dim)
    }
}

/// Movement parameters for one call of the movement engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveSpec {
    /// Cap the input acceleration at unit length before scaling.
    pub normalize_acceleration: bool,
    /// Scale applied to the input acceleration.
    pub speed: f32,
    /// Linear drag coefficient.
    pub drag: f32,
}

impl Default for MoveSpec {
    fn default() -> Self {
        Self {
            normalize_acceleration: false,
            speed: 1.0,
            drag: 0.0,
        }
    }
}

/// True if a box of `dim` centred at `p` overlaps `rect`.
#[inline]
#[must_use]
pub fn entity_overlaps_rectangle(p: V3, dim: V3, rect: Rect3) -> bool {
    rect.add_radius(dim * 0.5).contains(p)
}
