//! The curve type: construction, evaluation and queries.

use super::basis::{basis_in_span, check_derivative_order, derivatives_in_span};
use super::{ControlPoint, ControlPointPolygon, EvaluationSide, KnotVector};
use crate::error::{NurbsError, Result};
use crate::primitives::{Interval, Plane, Point3, Vec3};
use crate::tolerance::{binomial_table, from_f64, to_f64, Tolerance};
use log::debug;
use num_traits::Float;

/// Polyline subdivision depth bounds per knot span.
const MIN_SUBDIVISION_DEPTH: usize = 2;
const MAX_SUBDIVISION_DEPTH: usize = 24;

/// Which end of a curve a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveEnd {
    Start,
    End,
    Both,
}

/// A NURBS curve in three dimensions.
///
/// Combines a degree, a [`KnotVector`] and a [`ControlPointPolygon`] such that
/// `knots.len() == control_points.len() + degree + 1`. Evaluation is exact
/// within floating-point precision for rational curves: conics such as circle
/// arcs are represented without approximation.
///
/// # Example
///
/// ```
/// use knotwork::nurbs::{ControlPointPolygon, KnotVector, NurbsCurve};
/// use knotwork::Point3;
///
/// // Quarter unit circle.
/// let w = std::f64::consts::FRAC_1_SQRT_2;
/// let polygon = ControlPointPolygon::from_weighted(vec![
///     (Point3::new(1.0, 0.0, 0.0), 1.0),
///     (Point3::new(1.0, 1.0, 0.0), w),
///     (Point3::new(0.0, 1.0, 0.0), 1.0),
/// ])
/// .unwrap();
/// let knots = KnotVector::new(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0], 2).unwrap();
/// let arc = NurbsCurve::new(knots, polygon, 2).unwrap();
///
/// let p = arc.point_at(0.5).unwrap();
/// assert!((p.to_vec().magnitude() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NurbsCurve<F> {
    pub(super) degree: usize,
    pub(super) knots: KnotVector<F>,
    pub(super) control_points: ControlPointPolygon<F>,
}

fn check_point_count(points: usize, degree: usize) -> Result<()> {
    if degree == 0 {
        return Err(NurbsError::ZeroDegree);
    }
    if points <= degree {
        return Err(NurbsError::TooFewControlPoints { points, degree });
    }
    Ok(())
}

impl<F: Float> NurbsCurve<F> {
    /// Creates a curve from an explicit knot vector, control polygon and degree.
    ///
    /// # Errors
    ///
    /// - [`NurbsError::ZeroDegree`] for `degree == 0`
    /// - [`NurbsError::DegreeMismatch`] if the knot vector serves another degree
    /// - [`NurbsError::TooFewControlPoints`] if there are not more points than `degree`
    /// - [`NurbsError::KnotCountMismatch`] unless `knots == points + degree + 1`
    ///
    /// A periodic knot vector only makes a periodic curve when the last
    /// `degree` control points repeat the first ones. Otherwise the curve is
    /// an open, unclamped one.
    pub fn new(
        knots: KnotVector<F>,
        control_points: ControlPointPolygon<F>,
        degree: usize,
    ) -> Result<Self> {
        check_point_count(control_points.len(), degree)?;
        if knots.degree() != degree {
            return Err(NurbsError::DegreeMismatch {
                knots: knots.degree(),
                curve: degree,
            });
        }
        let expected = control_points.len() + degree + 1;
        if knots.len() != expected {
            return Err(NurbsError::KnotCountMismatch {
                knots: knots.len(),
                expected,
                points: control_points.len(),
                degree,
            });
        }

        let knots = if knots.is_periodic() && !control_points.is_wrapped(degree) {
            debug!("periodic knots without wrapped control points, curve is open");
            knots.into_non_periodic()
        } else {
            knots
        };

        debug!(
            "nurbs curve: {} control points, degree {}, rational: {}",
            control_points.len(),
            degree,
            control_points.is_rational()
        );
        Ok(Self {
            degree,
            knots,
            control_points,
        })
    }

    /// Creates a clamped curve with uniform knots and unit weights.
    ///
    /// The curve starts at the first point and ends at the last one. Accepts
    /// anything convertible into [`Point3`], so `[f64; 3]` arrays work too.
    ///
    /// # Errors
    ///
    /// [`NurbsError::ZeroDegree`], [`NurbsError::TooFewControlPoints`] when
    /// `points.len() <= degree`, or a point validation error.
    pub fn create_from_points<I, P>(points: I, degree: usize) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point3<F>>,
    {
        let points: Vec<Point3<F>> = points.into_iter().map(Into::into).collect();
        check_point_count(points.len(), degree)?;

        let control_points = ControlPointPolygon::from_points(points)?;
        let knots = KnotVector::clamped_uniform(control_points.len(), degree)?;
        debug!(
            "clamped uniform curve from {} points",
            control_points.len()
        );
        Self::new(knots, control_points, degree)
    }

    /// Creates a clamped or a periodic uniform curve through the given points.
    ///
    /// The periodic curve treats `points` as distinct vertices of a closed
    /// polygon: the first `degree` points are repeated at the end and the
    /// knots are uniform and unclamped, giving a closed curve that is
    /// `degree - 1` times continuously differentiable at the seam.
    pub fn create<I, P>(is_periodic: bool, degree: usize, points: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point3<F>>,
    {
        if !is_periodic {
            return Self::create_from_points(points, degree);
        }

        let mut points: Vec<Point3<F>> = points.into_iter().map(Into::into).collect();
        check_point_count(points.len(), degree)?;
        let distinct = points.len();
        points.extend_from_within(..degree);

        let control_points = ControlPointPolygon::from_points(points)?;
        let knots = KnotVector::periodic_uniform(control_points.len(), degree)?;
        debug!("periodic uniform curve from {} points", distinct);
        Self::new(knots, control_points, degree)
    }

    /// Creates the curve controlled by a point list.
    ///
    /// A list whose last point repeats the first gives a periodic curve over
    /// the distinct points, provided more than `degree` of them remain.
    /// Anything else gives a clamped curve. The degree is never lowered.
    pub fn create_control_point_curve<I, P>(points: I, degree: usize) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point3<F>>,
    {
        Self::create_control_point_curve_with_tolerance(points, degree, Tolerance::default())
    }

    /// Like [`create_control_point_curve`](Self::create_control_point_curve)
    /// with an explicit tolerance for the closure test.
    pub fn create_control_point_curve_with_tolerance<I, P>(
        points: I,
        degree: usize,
        tolerance: Tolerance<F>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point3<F>>,
    {
        let mut points: Vec<Point3<F>> = points.into_iter().map(Into::into).collect();
        let closed = points.len() > degree + 1
            && points[0].near(points[points.len() - 1], tolerance.zero);

        if closed {
            points.pop();
            Self::create(true, degree, points)
        } else {
            Self::create_from_points(points, degree)
        }
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Order of the curve (`degree + 1`).
    #[inline]
    pub fn order(&self) -> usize {
        self.degree + 1
    }

    #[inline]
    pub fn knots(&self) -> &KnotVector<F> {
        &self.knots
    }

    #[inline]
    pub fn control_points(&self) -> &ControlPointPolygon<F> {
        &self.control_points
    }

    /// The parameter domain.
    #[inline]
    pub fn domain(&self) -> Interval<F> {
        self.knots.domain()
    }

    /// True when any control point weight differs from 1.
    #[inline]
    pub fn is_rational(&self) -> bool {
        self.control_points.is_rational()
    }

    /// True for curves with periodic uniform knots whose last `degree`
    /// control points repeat the first ones.
    ///
    /// Knot insertion, splitting and degree elevation produce non-periodic
    /// curves.
    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.knots.is_periodic()
    }

    /// True when the knots are clamped at the given end(s).
    pub fn is_clamped(&self, end: CurveEnd) -> bool {
        match end {
            CurveEnd::Start => self.knots.is_clamped_start(),
            CurveEnd::End => self.knots.is_clamped_end(),
            CurveEnd::Both => self.knots.is_clamped_start() && self.knots.is_clamped_end(),
        }
    }

    /// True when the start and end points coincide within the default zero tolerance.
    pub fn is_closed(&self) -> bool {
        self.is_closed_with_tolerance(Tolerance::default())
    }

    pub fn is_closed_with_tolerance(&self, tolerance: Tolerance<F>) -> bool {
        self.point_at_start()
            .near(self.point_at_end(), tolerance.zero)
    }

    /// Evaluates the curve at `t`.
    ///
    /// # Errors
    ///
    /// [`NurbsError::ParameterOutOfDomain`] outside the closed domain. There
    /// is no slack at the bounds.
    pub fn point_at(&self, t: F) -> Result<Point3<F>> {
        let span = self.knots.span_index(t)?;
        if let Some(point) = self.clamped_endpoint(t) {
            return Ok(point);
        }
        Ok(self.point_in_span(span, t))
    }

    /// Evaluates the curve at `t`, continuing the first or last polynomial
    /// piece outside the domain.
    pub fn point_at_extrapolated(&self, t: F) -> Point3<F> {
        if let Some(point) = self.clamped_endpoint(t) {
            return point;
        }
        let span = self.knots.span_index_extrapolated(t);
        self.point_in_span(span, t)
    }

    pub fn point_at_start(&self) -> Point3<F> {
        self.point_at_extrapolated(self.domain().start)
    }

    pub fn point_at_end(&self) -> Point3<F> {
        self.point_at_extrapolated(self.domain().end)
    }

    /// Clamped curves interpolate their end control points exactly.
    fn clamped_endpoint(&self, t: F) -> Option<Point3<F>> {
        let domain = self.domain();
        let points = self.control_points.as_slice();
        if t == domain.start && self.knots.is_clamped_start() {
            points.first().map(|p| p.location)
        } else if t == domain.end && self.knots.is_clamped_end() {
            points.last().map(|p| p.location)
        } else {
            None
        }
    }

    fn point_in_span(&self, span: usize, t: F) -> Point3<F> {
        let p = self.degree;
        let values = basis_in_span(self.knots.as_slice(), span, p, t);
        let points = &self.control_points.as_slice()[span - p..=span];

        let (sum, weight) = values.iter().zip(points).fold(
            (Vec3::zero(), F::zero()),
            |(sum, weight), (&n, point)| {
                let (hp, w) = point.homogeneous();
                (sum + hp * n, weight + w * n)
            },
        );
        Point3::from(sum / weight)
    }

    /// Returns the position and the first `order` derivatives at `t`.
    ///
    /// Element `k` of the result is the `k`-th derivative; element 0 is the
    /// position as a vector from the origin. Derivatives above the degree of a
    /// non-rational curve are zero.
    ///
    /// # Errors
    ///
    /// - [`NurbsError::ParameterOutOfDomain`] outside the closed domain
    /// - [`NurbsError::DerivativeOrderTooHigh`] above
    ///   [`MAX_DERIVATIVE_ORDER`](super::MAX_DERIVATIVE_ORDER)
    pub fn derivative_at(&self, t: F, order: usize) -> Result<Vec<Vec3<F>>> {
        self.derivative_at_side(t, order, EvaluationSide::Default)
    }

    /// Like [`derivative_at`](Self::derivative_at), choosing the polynomial
    /// piece on the given side of an interior knot.
    pub fn derivative_at_side(
        &self,
        t: F,
        order: usize,
        side: EvaluationSide,
    ) -> Result<Vec<Vec3<F>>> {
        check_derivative_order(order)?;
        let span = self.knots.span_index_from_side(t, side)?;
        Ok(self.derivatives_from_span(span, t, order))
    }

    /// Rational derivatives by the quotient rule on homogeneous coordinates:
    /// `C(k) = (A(k) - sum_{i=1..k} C(k,i) w(i) C(k-i)) / w`.
    fn derivatives_from_span(&self, span: usize, t: F, order: usize) -> Vec<Vec3<F>> {
        let p = self.degree;
        let basis = derivatives_in_span(self.knots.as_slice(), span, p, t, order);
        let points = &self.control_points.as_slice()[span - p..=span];

        let (numerators, weights): (Vec<Vec3<F>>, Vec<F>) = basis
            .iter()
            .map(|row| {
                row.iter().zip(points).fold(
                    (Vec3::zero(), F::zero()),
                    |(sum, weight), (&n, point)| {
                        let (hp, w) = point.homogeneous();
                        (sum + hp * n, weight + w * n)
                    },
                )
            })
            .unzip();

        let binomial = binomial_table::<F>(order);
        let mut ders: Vec<Vec3<F>> = Vec::with_capacity(order + 1);
        for k in 0..=order {
            let mut v = numerators[k];
            for i in 1..=k {
                v = v - ders[k - i] * (binomial[k][i] * weights[i]);
            }
            ders.push(v / weights[0]);
        }
        ders
    }

    /// Unit tangent at `t`.
    ///
    /// # Errors
    ///
    /// [`NurbsError::ZeroTangent`] where the first derivative vanishes, or
    /// [`NurbsError::ParameterOutOfDomain`].
    pub fn tangent_at(&self, t: F) -> Result<Vec3<F>> {
        let ders = self.derivative_at(t, 1)?;
        ders[1]
            .normalize_with_tolerance(Tolerance::<F>::default().zero)
            .ok_or(NurbsError::ZeroTangent {
                parameter: to_f64(t),
            })
    }

    /// Curvature vector at `t`: points to the centre of curvature, its length
    /// is the curvature.
    pub fn curvature_at(&self, t: F) -> Result<Vec3<F>> {
        let ders = self.derivative_at(t, 2)?;
        let tolerance = Tolerance::<F>::default();
        curvature_vector(ders[1], ders[2], tolerance.zero).ok_or(NurbsError::ZeroTangent {
            parameter: to_f64(t),
        })
    }

    /// Returns the Frenet frame at `t`, or `None` where the tangent vanishes
    /// or `t` is outside the domain.
    ///
    /// The x axis is the unit tangent and the y axis the principal normal.
    /// Where the curvature vanishes the y axis is a fixed perpendicular of
    /// the tangent instead.
    pub fn frame_at(&self, t: F) -> Option<Plane<F>> {
        self.try_frame_at(t).ok()
    }

    pub fn frame_at_with_tolerance(&self, t: F, tolerance: Tolerance<F>) -> Option<Plane<F>> {
        self.try_frame_at_with_tolerance(t, tolerance).ok()
    }

    /// Like [`frame_at`](Self::frame_at), reporting why no frame exists.
    pub fn try_frame_at(&self, t: F) -> Result<Plane<F>> {
        self.try_frame_at_with_tolerance(t, Tolerance::default())
    }

    pub fn try_frame_at_with_tolerance(&self, t: F, tolerance: Tolerance<F>) -> Result<Plane<F>> {
        let ders = self.derivative_at(t, 2)?;
        let zero_tangent = || NurbsError::ZeroTangent {
            parameter: to_f64(t),
        };

        let x_axis = ders[1]
            .normalize_with_tolerance(tolerance.zero)
            .ok_or_else(zero_tangent)?;
        let normal = curvature_vector(ders[1], ders[2], tolerance.zero)
            .filter(|k| k.magnitude() > tolerance.zero)
            .unwrap_or_else(|| x_axis.least_aligned_axis().reject_from(x_axis));

        Plane::from_frame(Point3::from(ders[0]), x_axis, normal, tolerance.zero)
            .ok_or_else(zero_tangent)
    }

    /// Maps a parameter in `[0, 1]` onto the domain.
    ///
    /// Returns `None` only for a degenerate domain.
    pub fn curve_parameter_from_nurbs_form_parameter(&self, s: F) -> Option<F> {
        let domain = self.domain();
        if domain.is_degenerate(F::zero()) {
            return None;
        }
        Some(domain.parameter_at(s))
    }

    /// Maps a domain parameter onto `[0, 1]`.
    pub fn nurbs_form_parameter_from_curve_parameter(&self, t: F) -> Option<F> {
        self.domain().normalized_parameter_at(t)
    }

    /// Affinely reparametrizes the curve onto `[start, end]`. The shape is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// [`NurbsError::DegenerateDomain`] unless `start < end`.
    pub fn set_domain(&mut self, start: F, end: F) -> Result<()> {
        self.knots = self.knots.reparameterized(Interval::new(start, end))?;
        Ok(())
    }

    /// The same curve traversed in the opposite direction, on the same domain.
    pub fn reversed(&self) -> Self {
        Self {
            degree: self.degree,
            knots: self.knots.reversed(),
            control_points: self.control_points.reversed(),
        }
    }

    /// Replaces a control point.
    ///
    /// On a periodic curve the wrapped copy of the point moves with it, so the
    /// curve stays closed.
    pub fn set_control_point(&mut self, index: usize, location: Point3<F>, weight: F) -> Result<()> {
        self.control_points.set(index, location, weight)?;

        if self.is_periodic() {
            let distinct = self.control_points.len() - self.degree;
            let twin = if index < self.degree {
                Some(index + distinct)
            } else if index >= distinct {
                Some(index - distinct)
            } else {
                None
            };
            if let Some(twin) = twin {
                self.control_points.set(twin, location, weight)?;
            }
        }
        Ok(())
    }

    /// Returns the control point at `index`.
    pub fn control_point(&self, index: usize) -> Result<ControlPoint<F>> {
        self.control_points.get(index)
    }

    /// Multiplies every weight by `factor`; the shape does not change.
    pub fn scale_weights(&mut self, factor: F) -> Result<()> {
        self.control_points.scale_weights(factor)
    }

    /// Drops the weights when they are all equal, which leaves the shape
    /// unchanged. Returns true when the curve is non-rational afterwards.
    pub fn make_non_rational(&mut self) -> bool {
        if !self.control_points.has_uniform_weights() {
            return false;
        }
        self.control_points.clear_weights();
        true
    }

    /// Length of the control polygon, an upper bound of the curve length.
    pub fn control_polygon_length(&self) -> F {
        self.control_points.length()
    }

    /// Axis-aligned box around the control points; contains the curve.
    pub fn control_bounds(&self) -> Option<(Point3<F>, Point3<F>)> {
        self.control_points.bounds()
    }

    pub fn greville_abscissae(&self) -> Vec<F> {
        self.knots.greville_abscissae()
    }

    /// Number of non-empty knot spans in the domain.
    pub fn span_count(&self) -> usize {
        self.knots.span_count()
    }

    pub fn span_domain(&self, index: usize) -> Result<Interval<F>> {
        self.knots.span_domain(index)
    }

    /// Approximates the curve with a polyline whose chords deviate from the
    /// curve by at most `tolerance` at their midpoints.
    ///
    /// Every knot span is subdivided on its own, so the polyline passes
    /// through the curve points at all knots. Tolerances below the default
    /// zero tolerance are raised to it.
    ///
    /// # Errors
    ///
    /// [`NurbsError::InvalidTolerance`] unless `tolerance` is positive.
    pub fn to_polyline(&self, tolerance: F) -> Result<Vec<Point3<F>>> {
        if !(tolerance > F::zero()) {
            return Err(NurbsError::InvalidTolerance {
                tolerance: to_f64(tolerance),
            });
        }
        let tolerance = tolerance.max(Tolerance::<F>::default().zero);

        let mut points = vec![self.point_at_start()];
        for span in self.knots.spans() {
            self.subdivide_recursive(span.start, span.end, tolerance, 0, &mut points);
        }
        Ok(points)
    }

    fn subdivide_recursive(
        &self,
        t0: F,
        t1: F,
        tolerance: F,
        depth: usize,
        points: &mut Vec<Point3<F>>,
    ) {
        let t_mid = (t0 + t1) / from_f64(2.0);

        let p0 = self.point_at_extrapolated(t0);
        let p1 = self.point_at_extrapolated(t1);
        let p_mid = self.point_at_extrapolated(t_mid);
        let deviation = p_mid.distance(p0.midpoint(p1));

        let flat = depth >= MIN_SUBDIVISION_DEPTH && deviation <= tolerance;
        if flat || depth >= MAX_SUBDIVISION_DEPTH {
            points.push(p1);
        } else {
            self.subdivide_recursive(t0, t_mid, tolerance, depth + 1, points);
            self.subdivide_recursive(t_mid, t1, tolerance, depth + 1, points);
        }
    }

    /// Approximate arc length from [`to_polyline`](Self::to_polyline).
    pub fn length(&self, tolerance: F) -> Result<F> {
        Ok(self
            .to_polyline(tolerance)?
            .windows(2)
            .fold(F::zero(), |acc, pair| acc + pair[0].distance(pair[1])))
    }

    /// True when both curves have the same degree and their knots, control
    /// point locations and weights agree within `tolerance`.
    pub fn is_duplicate(&self, other: &Self, tolerance: F) -> bool {
        self.degree == other.degree
            && self.knots.is_duplicate(&other.knots, tolerance)
            && self
                .control_points
                .is_duplicate(&other.control_points, tolerance)
    }
}

/// `(d2 - (d2·T)T) / |d1|²` with `T` the unit tangent, or `None` when the
/// tangent vanishes.
fn curvature_vector<F: Float>(d1: Vec3<F>, d2: Vec3<F>, zero: F) -> Option<Vec3<F>> {
    let tangent = d1.normalize_with_tolerance(zero)?;
    Some(d2.reject_from(tangent) / d1.magnitude_squared())
}
