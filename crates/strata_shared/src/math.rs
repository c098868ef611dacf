//! Vector and rectangle math used by the simulation.
//!
//! These are the canonical representations for positions, velocities and
//! bounding volumes in sim space (meters, relative to a region origin).

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 3D Vector - position, velocity, acceleration, dimensions
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct V3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component (up)
    pub z: f32,
}

impl V3 {
    /// Creates a new V3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Creates a V3 with every component set to `v`
    #[must_use]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Component-wise product
    #[must_use]
    pub fn hadamard(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Clamps every component into `[0, 1]`
    #[must_use]
    pub fn clamp01(self) -> Self {
        Self::new(
            self.x.clamp(0.0, 1.0),
            self.y.clamp(0.0, 1.0),
            self.z.clamp(0.0, 1.0),
        )
    }
}

/// Linear interpolation from `a` (t = 0) to `b` (t = 1).
#[must_use]
pub fn lerp(a: f32, t: f32, b: f32) -> f32 {
    (1.0 - t) * a + t * b
}

impl std::ops::Add for V3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for V3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Neg for V3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::Mul<f32> for V3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Mul<V3> for f32 {
    type Output = V3;
    fn mul(self, rhs: V3) -> V3 {
        rhs * self
    }
}

impl std::ops::AddAssign for V3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for V3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::ops::MulAssign<f32> for V3 {
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

/// Axis-aligned box given by its minimum and maximum corners.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rect3 {
    /// Minimum corner
    pub min: V3,
    /// Maximum corner
    pub max: V3,
}

impl Rect3 {
    /// Creates a rectangle from its corners
    #[must_use]
    pub const fn new(min: V3, max: V3) -> Self {
        Self { min, max }
    }

    /// Creates a rectangle from its minimum corner and dimensions
    #[must_use]
    pub fn min_dim(min: V3, dim: V3) -> Self {
        Self::new(min, min + dim)
    }

    /// Creates a rectangle from a center and half-dimensions
    #[must_use]
    pub fn center_half_dim(center: V3, half_dim: V3) -> Self {
        Self::new(center - half_dim, center + half_dim)
    }

    /// Creates a rectangle from a center and full dimensions
    #[must_use]
    pub fn center_dim(center: V3, dim: V3) -> Self {
        Self::center_half_dim(center, dim * 0.5)
    }

    /// Grows the rectangle by `radius` on every side of each axis
    #[must_use]
    pub fn add_radius(self, radius: V3) -> Self {
        Self::new(self.min - radius, self.max + radius)
    }

    /// Center point
    #[must_use]
    pub fn center(self) -> V3 {
        (self.min + self.max) * 0.5
    }

    /// Full dimensions
    #[must_use]
    pub fn dim(self) -> V3 {
        self.max - self.min
    }

    /// Half-open containment test: `min <= p < max` on every axis
    #[must_use]
    pub fn contains(self, p: V3) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x < self.max.x
            && p.y < self.max.y
            && p.z < self.max.z
    }

    /// Overlap test; rectangles that only touch do not intersect
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        !(other.max.x <= self.min.x
            || other.min.x >= self.max.x
            || other.max.y <= self.min.y
            || other.min.y >= self.max.y
            || other.max.z <= self.min.z
            || other.min.z >= self.max.z)
    }

    /// Position of `p` inside the rectangle, 0 at `min` and 1 at `max` per axis.
    ///
    /// A degenerate axis maps to 0.
    #[must_use]
    pub fn barycentric(self, p: V3) -> V3 {
        let dim = self.dim();
        let axis = |value: f32, min: f32, extent: f32| {
            if extent == 0.0 {
                0.0
            } else {
                (value - min) / extent
            }
        };
        V3::new(
            axis(p.x, self.min.x, dim.x),
            axis(p.y, self.min.y, dim.y),
            axis(p.z, self.min.z, dim.z),
        )
    }
}
