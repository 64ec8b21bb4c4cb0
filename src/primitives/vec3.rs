//! 3D vector type for directions, offsets and curve derivatives.

use num_traits::Float;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// A 3D vector representing a direction, an offset or a derivative.
///
/// Generic over floating-point types (`f32` or `f64`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3<F> {
    pub x: F,
    pub y: F,
    pub z: F,
}

impl<F: Float> Vec3<F> {
    /// Creates a new vector.
    #[inline]
    pub fn new(x: F, y: F, z: F) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector.
    #[inline]
    pub fn zero() -> Self {
        Self::new(F::zero(), F::zero(), F::zero())
    }

    /// Unit vector along the X axis.
    #[inline]
    pub fn unit_x() -> Self {
        Self::new(F::one(), F::zero(), F::zero())
    }

    /// Unit vector along the Y axis.
    #[inline]
    pub fn unit_y() -> Self {
        Self::new(F::zero(), F::one(), F::zero())
    }

    /// Unit vector along the Z axis.
    #[inline]
    pub fn unit_z() -> Self {
        Self::new(F::zero(), F::zero(), F::one())
    }

    #[inline]
    pub fn dot(self, other: Self) -> F {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Right-handed cross product.
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    #[inline]
    pub fn magnitude_squared(self) -> F {
        self.dot(self)
    }

    #[inline]
    pub fn magnitude(self) -> F {
        self.magnitude_squared().sqrt()
    }

    /// Returns the unit vector in the same direction.
    ///
    /// Returns `None` if the magnitude does not exceed `tolerance`.
    #[inline]
    pub fn normalize_with_tolerance(self, tolerance: F) -> Option<Self> {
        let mag = self.magnitude();
        if mag > tolerance && mag.is_finite() {
            Some(self / mag)
        } else {
            None
        }
    }

    /// Returns the unit vector in the same direction, or `None` for a
    /// (numerically) zero vector.
    #[inline]
    pub fn normalize(self) -> Option<Self> {
        self.normalize_with_tolerance(F::epsilon())
    }

    /// Component of `self` orthogonal to the unit vector `axis`.
    #[inline]
    pub fn reject_from(self, axis: Self) -> Self {
        self - axis * self.dot(axis)
    }

    /// Returns the world axis least aligned with `self`.
    ///
    /// Used as a stable "up" reference when building a frame around a direction.
    pub fn least_aligned_axis(self) -> Self {
        let ax = self.x.abs();
        let ay = self.y.abs();
        let az = self.z.abs();
        if ax <= ay && ax <= az {
            Self::unit_x()
        } else if ay <= az {
            Self::unit_y()
        } else {
            Self::unit_z()
        }
    }

    /// Returns true when every component differs from `other` by at most `tolerance`.
    #[inline]
    pub fn near(self, other: Self, tolerance: F) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl<F: Float> Add for Vec3<F> {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl<F: Float> AddAssign for Vec3<F> {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl<F: Float> Sub for Vec3<F> {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl<F: Float> Mul<F> for Vec3<F> {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: F) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl<F: Float> Div<F> for Vec3<F> {
    type Output = Self;

    #[inline]
    fn div(self, scalar: F) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl<F: Float> Neg for Vec3<F> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl<F: Float> Default for Vec3<F> {
    fn default() -> Self {
        Self::zero()
    }
}
