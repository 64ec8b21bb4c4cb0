//! Weighted control points and the polygon they form.

use crate::error::{NurbsError, Result};
use crate::primitives::{Point3, Vec3};
use crate::tolerance::to_f64;
use num_traits::Float;

/// A control point: a location plus a positive weight.
///
/// A weight of 1 everywhere gives a non-rational (plain B-spline) curve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlPoint<F> {
    pub location: Point3<F>,
    pub weight: F,
}

impl<F: Float> ControlPoint<F> {
    #[inline]
    pub fn new(location: Point3<F>, weight: F) -> Self {
        Self { location, weight }
    }

    /// A control point with unit weight.
    #[inline]
    pub fn unweighted(location: Point3<F>) -> Self {
        Self::new(location, F::one())
    }

    /// Homogeneous form `(w*x, w*y, w*z)` and `w`.
    #[inline]
    pub(crate) fn homogeneous(self) -> (Vec3<F>, F) {
        (self.location.to_vec() * self.weight, self.weight)
    }

    /// Projects a homogeneous point back to a location.
    #[inline]
    pub(crate) fn from_homogeneous(point: Vec3<F>, weight: F) -> Self {
        Self::new(Point3::from(point / weight), weight)
    }
}

impl<F: Float> From<Point3<F>> for ControlPoint<F> {
    fn from(location: Point3<F>) -> Self {
        Self::unweighted(location)
    }
}

/// The ordered control points of a curve.
///
/// The first point pairs with the low end of the knot domain. The number of
/// points is fixed; points can be replaced in place but not inserted or
/// removed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ControlPointPolygon<F> {
    points: Vec<ControlPoint<F>>,
}

fn check_point<F: Float>(index: usize, point: &ControlPoint<F>) -> Result<()> {
    if !point.location.is_finite() {
        return Err(NurbsError::NonFinitePoint { index });
    }
    if !(point.weight > F::zero() && point.weight.is_finite()) {
        return Err(NurbsError::InvalidWeight {
            index,
            weight: to_f64(point.weight),
        });
    }
    Ok(())
}

impl<F: Float> ControlPointPolygon<F> {
    /// Creates a polygon from weighted control points.
    ///
    /// # Errors
    ///
    /// - [`NurbsError::NonFinitePoint`] for NaN or infinite coordinates
    /// - [`NurbsError::InvalidWeight`] for weights that are not positive and finite
    pub fn new(points: Vec<ControlPoint<F>>) -> Result<Self> {
        for (index, point) in points.iter().enumerate() {
            check_point(index, point)?;
        }
        Ok(Self { points })
    }

    /// Creates a polygon with unit weights.
    pub fn from_points<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = Point3<F>>,
    {
        Self::new(points.into_iter().map(ControlPoint::unweighted).collect())
    }

    /// Creates a polygon from `(location, weight)` pairs.
    pub fn from_weighted<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Point3<F>, F)>,
    {
        Self::new(
            points
                .into_iter()
                .map(|(location, weight)| ControlPoint::new(location, weight))
                .collect(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[ControlPoint<F>] {
        &self.points
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ControlPoint<F>> {
        self.points.iter()
    }

    /// Returns the control point at `index`.
    pub fn get(&self, index: usize) -> Result<ControlPoint<F>> {
        self.points
            .get(index)
            .copied()
            .ok_or(NurbsError::IndexOutOfRange {
                index,
                len: self.points.len(),
            })
    }

    /// Replaces the control point at `index`.
    ///
    /// # Errors
    ///
    /// [`NurbsError::IndexOutOfRange`] outside `[0, len)`, or the validation
    /// errors of [`new`](Self::new). The polygon is unchanged on error.
    pub fn set(&mut self, index: usize, location: Point3<F>, weight: F) -> Result<()> {
        let len = self.points.len();
        let point = ControlPoint::new(location, weight);
        let slot = self
            .points
            .get_mut(index)
            .ok_or(NurbsError::IndexOutOfRange { index, len })?;
        check_point(index, &point)?;
        *slot = point;
        Ok(())
    }

    /// Returns a copy of the control points in order.
    pub fn to_sequence(&self) -> Vec<ControlPoint<F>> {
        self.points.clone()
    }

    /// Sum of the distances between consecutive control point locations.
    pub fn length(&self) -> F {
        self.points
            .windows(2)
            .fold(F::zero(), |acc, pair| {
                acc + pair[0].location.distance(pair[1].location)
            })
    }

    /// Axis-aligned bounding box of the control point locations.
    ///
    /// The curve lies inside it (convex hull property). Returns `None` for an
    /// empty polygon.
    pub fn bounds(&self) -> Option<(Point3<F>, Point3<F>)> {
        let first = self.points.first()?.location;
        Some(
            self.points[1..]
                .iter()
                .fold((first, first), |(min, max), p| {
                    (min.min(p.location), max.max(p.location))
                }),
        )
    }

    /// True when any weight differs from 1.
    pub fn is_rational(&self) -> bool {
        self.points.iter().any(|p| p.weight != F::one())
    }

    /// True when the last `count` points repeat the first `count`, as the
    /// wrapped points of a periodic curve do.
    pub fn is_wrapped(&self, count: usize) -> bool {
        if count == 0 || count > self.points.len() / 2 {
            return false;
        }
        let tail = &self.points[self.points.len() - count..];
        self.points[..count] == *tail
    }

    /// True when every weight equals the first one.
    pub fn has_uniform_weights(&self) -> bool {
        match self.points.first() {
            Some(first) => self.points.iter().all(|p| p.weight == first.weight),
            None => true,
        }
    }

    /// Multiplies every weight by `factor`.
    ///
    /// Uniform weight scaling leaves a NURBS curve unchanged.
    ///
    /// # Errors
    ///
    /// [`NurbsError::InvalidWeight`] if a scaled weight is not positive and
    /// finite. The polygon is unchanged on error.
    pub fn scale_weights(&mut self, factor: F) -> Result<()> {
        for (index, point) in self.points.iter().enumerate() {
            let scaled = ControlPoint::new(point.location, point.weight * factor);
            check_point(index, &scaled)?;
        }
        for point in &mut self.points {
            point.weight = point.weight * factor;
        }
        Ok(())
    }

    /// Sets every weight to exactly 1.
    pub(crate) fn clear_weights(&mut self) {
        for point in &mut self.points {
            point.weight = F::one();
        }
    }

    /// Returns the polygon in reverse order.
    pub fn reversed(&self) -> Self {
        Self {
            points: self.points.iter().rev().copied().collect(),
        }
    }

    /// Homogeneous coordinates of every control point.
    pub(crate) fn homogeneous(&self) -> Vec<(Vec3<F>, F)> {
        self.points.iter().map(|p| p.homogeneous()).collect()
    }

    /// Rebuilds a polygon from homogeneous coordinates.
    pub(crate) fn from_homogeneous(points: &[(Vec3<F>, F)]) -> Self {
        Self {
            points: points
                .iter()
                .map(|&(point, weight)| ControlPoint::from_homogeneous(point, weight))
                .collect(),
        }
    }

    /// Returns true when both polygons have the same length and every pair of
    /// points agrees within `tolerance` in location and weight.
    pub fn is_duplicate(&self, other: &Self, tolerance: F) -> bool {
        self.points.len() == other.points.len()
            && self.points.iter().zip(&other.points).all(|(a, b)| {
                a.location.near(b.location, tolerance) && (a.weight - b.weight).abs() <= tolerance
            })
    }
}

impl<F: Float> TryFrom<Vec<Point3<F>>> for ControlPointPolygon<F> {
    type Error = NurbsError;

    fn try_from(points: Vec<Point3<F>>) -> Result<Self> {
        Self::from_points(points)
    }
}

impl<'a, F> IntoIterator for &'a ControlPointPolygon<F> {
    type Item = &'a ControlPoint<F>;
    type IntoIter = std::slice::Iter<'a, ControlPoint<F>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
