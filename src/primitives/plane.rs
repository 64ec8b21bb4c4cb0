//! Oriented planes (local coordinate frames).

use super::{Point3, Vec3};
use num_traits::Float;

/// A plane with an origin and a right-handed orthonormal frame.
///
/// `z_axis` is the plane normal and always equals `x_axis × y_axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane<F> {
    pub origin: Point3<F>,
    pub x_axis: Vec3<F>,
    pub y_axis: Vec3<F>,
    pub z_axis: Vec3<F>,
}

impl<F: Float> Plane<F> {
    /// The world XY plane.
    pub fn world_xy() -> Self {
        Self {
            origin: Point3::origin(),
            x_axis: Vec3::unit_x(),
            y_axis: Vec3::unit_y(),
            z_axis: Vec3::unit_z(),
        }
    }

    /// Builds a plane from an origin and two directions.
    ///
    /// `x_dir` fixes the x axis; `y_dir` only needs to be non-parallel to it.
    /// The y axis is `y_dir` made orthogonal to `x_dir`. Returns `None` when
    /// either direction is shorter than `tolerance` or they are parallel.
    pub fn from_frame(origin: Point3<F>, x_dir: Vec3<F>, y_dir: Vec3<F>, tolerance: F) -> Option<Self> {
        let x_axis = x_dir.normalize_with_tolerance(tolerance)?;
        let y_axis = y_dir.reject_from(x_axis).normalize_with_tolerance(tolerance)?;
        let z_axis = x_axis.cross(y_axis);
        Some(Self {
            origin,
            x_axis,
            y_axis,
            z_axis,
        })
    }

    /// Returns the point at local coordinates `(u, v)`.
    #[inline]
    pub fn point_at(&self, u: F, v: F) -> Point3<F> {
        self.origin + self.x_axis * u + self.y_axis * v
    }

    /// Checks that the axes are unit length, mutually orthogonal and right-handed.
    pub fn is_orthonormal(&self, tolerance: F) -> bool {
        let one = F::one();
        (self.x_axis.magnitude() - one).abs() <= tolerance
            && (self.y_axis.magnitude() - one).abs() <= tolerance
            && (self.z_axis.magnitude() - one).abs() <= tolerance
            && self.x_axis.dot(self.y_axis).abs() <= tolerance
            && self.y_axis.dot(self.z_axis).abs() <= tolerance
            && self.z_axis.dot(self.x_axis).abs() <= tolerance
            && self.x_axis.cross(self.y_axis).near(self.z_axis, tolerance)
    }
}

impl<F: Float> Default for Plane<F> {
    fn default() -> Self {
        Self::world_xy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_world_xy_is_orthonormal() {
        assert!(Plane::<f64>::world_xy().is_orthonormal(1e-12));
    }

    #[test]
    fn test_from_frame_orthogonalizes() {
        let plane = Plane::from_frame(
            Point3::new(1.0_f64, 2.0, 3.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            1e-12,
        )
        .unwrap();

        assert!(plane.is_orthonormal(1e-12));
        assert_relative_eq!(plane.y_axis.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.z_axis.z, 1.0, epsilon = 1e-12);

        let p = plane.point_at(1.0, 1.0);
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_frame_rejects_parallel_directions() {
        let plane = Plane::from_frame(
            Point3::origin(),
            Vec3::new(1.0_f64, 0.0, 0.0),
            Vec3::new(-3.0, 0.0, 0.0),
            1e-12,
        );
        assert!(plane.is_none());
    }
}
