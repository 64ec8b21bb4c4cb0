//! Knot insertion, splitting, trimming and degree elevation.
//!
//! All of them work on homogeneous control points `(w*x, w*y, w*z, w)`, so
//! rational curves keep their exact shape.

use super::{ControlPointPolygon, CurveEnd, KnotVector, NurbsCurve};
use crate::error::{NurbsError, Result};
use crate::primitives::Vec3;
use crate::tolerance::{binomial_table, to_f64, Tolerance};
use log::{debug, trace};
use num_traits::Float;
use std::cmp::Ordering;

impl<F: Float> NurbsCurve<F> {
    /// Inserts `t` until its multiplicity reaches `multiplicity`, returning the
    /// refined curve. The shape and domain do not change.
    ///
    /// A `t` within the knot tolerance of an existing knot is snapped onto it.
    /// If the knot already has the requested multiplicity the curve is
    /// returned as is.
    ///
    /// # Errors
    ///
    /// - [`NurbsError::InvalidMultiplicity`] unless `1 <= multiplicity <= degree`
    /// - [`NurbsError::NotInterior`] unless `t` lies strictly inside the domain
    pub fn insert_knot(&self, t: F, multiplicity: usize) -> Result<Self> {
        self.insert_knot_with_tolerance(t, multiplicity, Tolerance::default())
    }

    pub fn insert_knot_with_tolerance(
        &self,
        t: F,
        multiplicity: usize,
        tolerance: Tolerance<F>,
    ) -> Result<Self> {
        if multiplicity == 0 || multiplicity > self.degree {
            return Err(NurbsError::InvalidMultiplicity {
                requested: multiplicity,
                max: self.degree,
            });
        }

        let t = self.interior_parameter(t, tolerance)?;
        let existing = self.knots.multiplicity_at(t);
        if existing >= multiplicity {
            return Ok(self.clone());
        }

        debug!(
            "inserting knot {} {} time(s), existing multiplicity {}",
            to_f64(t),
            multiplicity - existing,
            existing
        );
        self.refined(t, multiplicity - existing)
    }

    /// Splits the curve at `t` into the pieces before and after it.
    ///
    /// Returns `None` when `t` is at or beyond either end of the domain,
    /// within the knot tolerance. The curve itself is unchanged.
    pub fn split(&self, t: F) -> Option<(Self, Self)> {
        self.try_split(t).ok()
    }

    pub fn split_with_tolerance(&self, t: F, tolerance: Tolerance<F>) -> Option<(Self, Self)> {
        self.try_split_with_tolerance(t, tolerance).ok()
    }

    /// Like [`split`](Self::split), reporting why the curve cannot be split.
    pub fn try_split(&self, t: F) -> Result<(Self, Self)> {
        self.try_split_with_tolerance(t, Tolerance::default())
    }

    /// Splits by raising the multiplicity of `t` to `degree + 1`.
    ///
    /// The left piece keeps the control points before the full-multiplicity
    /// knot run, the right piece the ones from it on. Both are clamped at the
    /// cut. Together they have `len + degree + 1 - m` control points, where
    /// `m` is the multiplicity `t` had before.
    pub fn try_split_with_tolerance(&self, t: F, tolerance: Tolerance<F>) -> Result<(Self, Self)> {
        let t = self.interior_parameter(t, tolerance)?;
        let p = self.degree;
        let existing = self.knots.multiplicity_at(t);

        let refined = if existing <= p {
            self.refined(t, p + 1 - existing)?
        } else {
            self.clone()
        };

        let cut = refined.knots.as_slice().partition_point(|&u| u < t);
        let left = refined.piece(0, cut + p + 1)?;
        let right = refined.piece(cut, refined.knots.len())?;

        debug!(
            "split at {}: {} + {} control points",
            to_f64(t),
            left.control_points.len(),
            right.control_points.len()
        );
        Ok((left, right))
    }

    /// Splits the curve at every parameter strictly inside the domain.
    ///
    /// Parameters are snapped onto nearby knots and sorted. Ones within the
    /// knot tolerance of a domain end or of each other are ignored, so
    /// without any interior parameter the result is the curve itself.
    pub fn split_many<I>(&self, parameters: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = F>,
    {
        self.split_many_with_tolerance(parameters, Tolerance::default())
    }

    pub fn split_many_with_tolerance<I>(
        &self,
        parameters: I,
        tolerance: Tolerance<F>,
    ) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = F>,
    {
        let eps = tolerance.knot_for(self.domain().length());
        let mut cuts: Vec<F> = parameters
            .into_iter()
            .filter_map(|t| self.interior_parameter(t, tolerance).ok())
            .collect();
        cuts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        cuts.dedup_by(|next, kept| *next - *kept <= eps);

        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut rest = self.clone();
        for t in cuts {
            match rest.try_split_with_tolerance(t, tolerance) {
                Ok((left, right)) => {
                    pieces.push(left);
                    rest = right;
                }
                // Snapping the previous cut can leave `t` at the new start.
                Err(NurbsError::NotInterior { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        pieces.push(rest);

        debug!("split into {} pieces", pieces.len());
        Ok(pieces)
    }

    /// The part of the curve over `[t0, t1]`, clamped at both ends.
    ///
    /// Ends within the knot tolerance of a knot snap onto it. Trimming to the
    /// whole domain clamps an unclamped curve.
    ///
    /// # Errors
    ///
    /// - [`NurbsError::ParameterOutOfDomain`] if `t0` or `t1` is outside the domain
    /// - [`NurbsError::DegenerateDomain`] unless `t1` exceeds `t0` by more
    ///   than twice the knot tolerance
    pub fn trim(&self, t0: F, t1: F) -> Result<Self> {
        self.trim_with_tolerance(t0, t1, Tolerance::default())
    }

    pub fn trim_with_tolerance(&self, t0: F, t1: F, tolerance: Tolerance<F>) -> Result<Self> {
        self.knots.check_domain(t0)?;
        self.knots.check_domain(t1)?;

        let domain = self.domain();
        let eps = tolerance.knot_for(domain.length());
        if !(t1 - t0 > eps + eps) {
            return Err(NurbsError::DegenerateDomain {
                start: to_f64(t0),
                end: to_f64(t1),
            });
        }

        let mut curve = self.clamped()?;
        if t1 < domain.end - eps {
            curve = curve.try_split_with_tolerance(t1, tolerance)?.0;
        }
        if t0 > domain.start + eps {
            curve = curve.try_split_with_tolerance(t0, tolerance)?.1;
        }

        debug!(
            "trimmed to [{}, {}]",
            to_f64(curve.domain().start),
            to_f64(curve.domain().end)
        );
        Ok(curve)
    }

    /// True when the curve is clamped and every interior knot has
    /// multiplicity `degree` or more, so each span is a Bézier segment.
    pub fn has_bezier_spans(&self) -> bool {
        let domain = self.domain();
        self.is_clamped(CurveEnd::Both)
            && self
                .knots
                .as_slice()
                .iter()
                .filter(|&&u| u > domain.start && u < domain.end)
                .all(|&u| self.knots.multiplicity_at(u) >= self.degree)
    }

    /// The same curve with clamped ends and every interior knot raised to
    /// multiplicity `degree`.
    pub fn make_piecewise_bezier(&self) -> Result<Self> {
        let p = self.degree;
        let mut curve = self.clamped()?;
        let domain = curve.domain();

        let mut interior: Vec<F> = curve
            .knots
            .as_slice()
            .iter()
            .copied()
            .filter(|&u| u > domain.start && u < domain.end)
            .collect();
        interior.dedup();

        for u in interior {
            let existing = curve.knots.multiplicity_at(u);
            if existing < p {
                curve = curve.refined(u, p - existing)?;
            }
        }
        Ok(curve)
    }

    /// Raises the degree to `degree` without changing the shape.
    ///
    /// The result is piecewise Bézier: clamped, with every interior knot at
    /// multiplicity `degree`, or `degree + 1` where the curve was already
    /// discontinuous.
    ///
    /// # Errors
    ///
    /// [`NurbsError::DegreeDecrease`] if `degree` is below the current degree.
    pub fn increase_degree(&self, degree: usize) -> Result<Self> {
        let p = self.degree;
        if degree < p {
            return Err(NurbsError::DegreeDecrease {
                degree: p,
                requested: degree,
            });
        }
        if degree == p {
            return Ok(self.clone());
        }

        let r = degree - p;
        let bezier = self.make_piecewise_bezier()?;
        let knots = bezier.knots.as_slice();
        let points = bezier.control_points.homogeneous();
        let n = points.len();

        // coefficients[i][j]: share of Bézier point j in elevated point i.
        let binomial = binomial_table::<F>(degree);
        let coefficients: Vec<Vec<F>> = (0..=degree)
            .map(|i| {
                (0..=p)
                    .map(|j| {
                        if j <= i && i - j <= r {
                            binomial[p][j] * binomial[r][i - j] / binomial[degree][i]
                        } else {
                            F::zero()
                        }
                    })
                    .collect()
            })
            .collect();

        let mut new_knots = vec![knots[p]; degree + 1];
        let mut new_points: Vec<(Vec3<F>, F)> = Vec::with_capacity(n + (n / p + 1) * r);
        for k in p..n {
            if knots[k] == knots[k + 1] {
                continue;
            }
            let segment = &points[k - p..=k];
            let elevated = coefficients.iter().map(|row| {
                row.iter().zip(segment).fold(
                    (Vec3::zero(), F::zero()),
                    |(sum, weight), (&c, &(hp, w))| (sum + hp * c, weight + w * c),
                )
            });

            if new_points.is_empty() {
                new_points.extend(elevated);
                continue;
            }

            let multiplicity = bezier.knots.multiplicity_at(knots[k]);
            new_knots.extend(std::iter::repeat(knots[k]).take(multiplicity + r));
            if multiplicity > p {
                new_points.extend(elevated);
            } else {
                // Continuous join: the first point repeats the previous last.
                new_points.extend(elevated.skip(1));
            }
        }
        new_knots.extend(std::iter::repeat(knots[n]).take(degree + 1));

        debug!(
            "degree {} -> {}: {} -> {} control points",
            p,
            degree,
            self.control_points.len(),
            new_points.len()
        );
        Ok(Self {
            degree,
            knots: KnotVector::from_parts(new_knots, degree, false)?,
            control_points: ControlPointPolygon::from_homogeneous(&new_points),
        })
    }

    /// The same curve with both ends clamped.
    fn clamped(&self) -> Result<Self> {
        let p = self.degree;
        let domain = self.domain();
        let mut curve = self.clone();

        if !curve.knots.is_clamped_start() {
            let existing = curve.knots.multiplicity_at(domain.start);
            if existing <= p {
                curve = curve.refined(domain.start, p + 1 - existing)?;
            }
            let first = curve.knots.as_slice().partition_point(|&u| u < domain.start);
            curve = curve.piece(first, curve.knots.len())?;
        }

        if !curve.knots.is_clamped_end() {
            let existing = curve.knots.multiplicity_at(domain.end);
            if existing <= p {
                curve = curve.refined(domain.end, p + 1 - existing)?;
            }
            let last = curve.knots.as_slice().partition_point(|&u| u <= domain.end);
            curve = curve.piece(0, last)?;
        }

        Ok(curve)
    }

    /// The curve over `knots[first..last]` and the control points they carry.
    fn piece(&self, first: usize, last: usize) -> Result<Self> {
        let p = self.degree;
        let knots = self.knots.as_slice();
        let points = self.control_points.as_slice();
        Ok(Self {
            degree: p,
            knots: KnotVector::from_parts(knots[first..last].to_vec(), p, false)?,
            control_points: ControlPointPolygon::new(points[first..last - p - 1].to_vec())?,
        })
    }

    /// Checks that `t` is strictly inside the domain and snaps it onto a
    /// knot closer than the knot tolerance.
    fn interior_parameter(&self, t: F, tolerance: Tolerance<F>) -> Result<F> {
        let domain = self.domain();
        let eps = tolerance.knot_for(domain.length());

        if !(t > domain.start + eps && t < domain.end - eps) {
            return Err(NurbsError::NotInterior {
                parameter: to_f64(t),
                start: to_f64(domain.start),
                end: to_f64(domain.end),
            });
        }

        Ok(self
            .knots
            .as_slice()
            .iter()
            .copied()
            .find(|&k| (k - t).abs() <= eps)
            .unwrap_or(t))
    }

    /// Boehm's algorithm, applied `times` times at a parameter in the
    /// closed domain.
    fn refined(&self, t: F, times: usize) -> Result<Self> {
        let p = self.degree;
        let mut knots = self.knots.to_sequence();
        let mut points = self.control_points.homogeneous();

        for _ in 0..times {
            // Span [knots[k], knots[k + 1]) containing t, or the last span
            // ending at t at the domain end. Either way p <= k <= n - 1.
            let end = knots[points.len()];
            let k = if t < end {
                knots.partition_point(|&u| u <= t) - 1
            } else {
                knots.partition_point(|&u| u < t) - 1
            };
            trace!("knot insertion in span {}", k);

            let mut next: Vec<(Vec3<F>, F)> = Vec::with_capacity(points.len() + 1);
            for i in 0..=points.len() {
                let point = if i + p <= k {
                    points[i]
                } else if i > k {
                    points[i - 1]
                } else {
                    let alpha = (t - knots[i]) / (knots[i + p] - knots[i]);
                    let beta = F::one() - alpha;
                    let (a, wa) = points[i - 1];
                    let (b, wb) = points[i];
                    (a * beta + b * alpha, wa * beta + wb * alpha)
                };
                next.push(point);
            }

            knots.insert(k + 1, t);
            points = next;
        }

        Ok(Self {
            degree: p,
            knots: KnotVector::from_parts(knots, p, false)?,
            control_points: ControlPointPolygon::from_homogeneous(&points),
        })
    }
}
