//! 3D point type.

use super::Vec3;
use num_traits::Float;
use std::ops::{Add, Sub};

/// A 3D location.
///
/// Generic over floating-point types (`f32` or `f64`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3<F> {
    pub x: F,
    pub y: F,
    pub z: F,
}

impl<F: Float> Point3<F> {
    /// Creates a new point.
    #[inline]
    pub fn new(x: F, y: F, z: F) -> Self {
        Self { x, y, z }
    }

    /// The origin (0, 0, 0).
    #[inline]
    pub fn origin() -> Self {
        Self::new(F::zero(), F::zero(), F::zero())
    }

    #[inline]
    pub fn distance_squared(self, other: Self) -> F {
        (other - self).magnitude_squared()
    }

    #[inline]
    pub fn distance(self, other: Self) -> F {
        self.distance_squared(other).sqrt()
    }

    /// Linearly interpolates between `self` and `other`.
    ///
    /// When `t = 0`, returns `self`. When `t = 1`, returns `other`.
    #[inline]
    pub fn lerp(self, other: Self, t: F) -> Self {
        self + (other - self) * t
    }

    /// Returns the midpoint between `self` and `other`.
    #[inline]
    pub fn midpoint(self, other: Self) -> Self {
        let half = F::one() / (F::one() + F::one());
        self.lerp(other, half)
    }

    /// Converts this point to the vector from the origin.
    #[inline]
    pub fn to_vec(self) -> Vec3<F> {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Componentwise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Componentwise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Returns true when all coordinates are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Returns true when every coordinate differs from `other` by at most `tolerance`.
    #[inline]
    pub fn near(self, other: Self, tolerance: F) -> bool {
        self.to_vec().near(other.to_vec(), tolerance)
    }
}

// Point - Point = Vec3
impl<F: Float> Sub for Point3<F> {
    type Output = Vec3<F>;

    #[inline]
    fn sub(self, other: Self) -> Vec3<F> {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

// Point + Vec3 = Point
impl<F: Float> Add<Vec3<F>> for Point3<F> {
    type Output = Self;

    #[inline]
    fn add(self, v: Vec3<F>) -> Self {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

// Point - Vec3 = Point
impl<F: Float> Sub<Vec3<F>> for Point3<F> {
    type Output = Self;

    #[inline]
    fn sub(self, v: Vec3<F>) -> Self {
        Self::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl<F: Float> Default for Point3<F> {
    fn default() -> Self {
        Self::origin()
    }
}

impl<F: Float> From<Vec3<F>> for Point3<F> {
    fn from(v: Vec3<F>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl<F: Float> From<[F; 3]> for Point3<F> {
    fn from([x, y, z]: [F; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl<F: Float> From<(F, F, F)> for Point3<F> {
    fn from((x, y, z): (F, F, F)) -> Self {
        Self::new(x, y, z)
    }
}
