//! Knot vectors: span lookup, multiplicities and uniform constructions.

use super::EvaluationSide;
use crate::error::{NurbsError, Result};
use crate::primitives::Interval;
use crate::tolerance::{from_usize, to_f64};
use num_traits::Float;

/// A non-decreasing knot sequence together with the degree it serves.
///
/// The vector stores every knot, including the first and last one that do not
/// affect evaluation, so `len() == control_point_count() + degree() + 1`. The
/// curve domain is `[knots[degree], knots[control_point_count]]`.
///
/// Instances are validated on construction and never change afterwards;
/// knot insertion produces a new vector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KnotVector<F> {
    knots: Vec<F>,
    degree: usize,
    periodic: bool,
}

impl<F: Float> KnotVector<F> {
    /// Creates a knot vector from explicit values.
    ///
    /// # Errors
    ///
    /// - [`NurbsError::NonFiniteKnot`] if a knot is NaN or infinite
    /// - [`NurbsError::NonMonotonicKnots`] if the sequence decreases
    /// - [`NurbsError::TooFewControlPoints`] if fewer than `2 * (degree + 1)` knots are given
    /// - [`NurbsError::InvalidMultiplicity`] if a knot repeats more than `degree + 1` times
    /// - [`NurbsError::EmptyDomain`] if `knots[degree] == knots[len - degree - 1]`
    pub fn new(knots: Vec<F>, degree: usize) -> Result<Self> {
        Self::validated(knots, degree, false)
    }

    /// Builds a clamped uniform knot vector on `[0, 1]`.
    ///
    /// The first and last `degree + 1` knots are 0 and 1; interior knots are
    /// evenly spaced.
    ///
    /// # Example
    ///
    /// ```
    /// use knotwork::nurbs::KnotVector;
    ///
    /// let knots = KnotVector::<f64>::clamped_uniform(5, 3).unwrap();
    /// assert_eq!(knots.to_sequence(), vec![0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0]);
    /// ```
    ///
    /// # Errors
    ///
    /// [`NurbsError::TooFewControlPoints`] if `control_point_count <= degree`.
    pub fn clamped_uniform(control_point_count: usize, degree: usize) -> Result<Self> {
        if control_point_count <= degree {
            return Err(NurbsError::TooFewControlPoints {
                points: control_point_count,
                degree,
            });
        }

        let spans = control_point_count - degree;
        let mut knots = Vec::with_capacity(control_point_count + degree + 1);
        knots.extend(std::iter::repeat(F::zero()).take(degree));
        for i in 0..=spans {
            knots.push(if i == spans {
                F::one()
            } else {
                from_usize::<F>(i) / from_usize(spans)
            });
        }
        knots.extend(std::iter::repeat(F::one()).take(degree));

        Self::validated(knots, degree, false)
    }

    /// Builds an unclamped uniform knot vector for a periodic curve on `[0, 1]`.
    ///
    /// `control_point_count` counts the wrapped control points, i.e. the
    /// distinct points plus `degree` repeats of the first ones.
    ///
    /// # Errors
    ///
    /// [`NurbsError::TooFewControlPoints`] unless more than `degree` distinct
    /// points remain (`control_point_count > 2 * degree`).
    pub fn periodic_uniform(control_point_count: usize, degree: usize) -> Result<Self> {
        let too_few = degree
            .checked_mul(2)
            .map_or(true, |min| control_point_count <= min);
        if too_few {
            return Err(NurbsError::TooFewControlPoints {
                points: control_point_count.saturating_sub(degree),
                degree,
            });
        }

        let spans = from_usize::<F>(control_point_count - degree);
        let offset = from_usize::<F>(degree);
        let knots = (0..control_point_count + degree + 1)
            .map(|i| (from_usize::<F>(i) - offset) / spans)
            .collect();

        Self::validated(knots, degree, true)
    }

    fn validated(knots: Vec<F>, degree: usize, periodic: bool) -> Result<Self> {
        if let Some(index) = knots.iter().position(|k| !k.is_finite()) {
            return Err(NurbsError::NonFiniteKnot { index });
        }
        if let Some(index) = (1..knots.len()).find(|&i| knots[i] < knots[i - 1]) {
            return Err(NurbsError::NonMonotonicKnots { index });
        }
        let too_few = degree
            .checked_add(1)
            .and_then(|order| order.checked_mul(2))
            .map_or(true, |min| knots.len() < min);
        if too_few {
            return Err(NurbsError::TooFewControlPoints {
                points: knots.len().saturating_sub(degree.saturating_add(1)),
                degree,
            });
        }

        let vector = Self {
            knots,
            degree,
            periodic,
        };

        let max = degree + 1;
        if let Some(requested) = vector.runs().map(|(_, len)| len).find(|&len| len > max) {
            return Err(NurbsError::InvalidMultiplicity { requested, max });
        }
        if !vector.domain().is_increasing() {
            return Err(NurbsError::EmptyDomain);
        }

        Ok(vector)
    }

    /// Iterates over `(first_index, length)` of each run of equal knots.
    fn runs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let mut start = 0;
        std::iter::from_fn(move || {
            if start >= self.knots.len() {
                return None;
            }
            let value = self.knots[start];
            let len = self.knots[start..]
                .iter()
                .take_while(|&&k| k == value)
                .count();
            let run = (start, len);
            start += len;
            Some(run)
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Order of the spline (`degree + 1`).
    #[inline]
    pub fn order(&self) -> usize {
        self.degree + 1
    }

    /// True for vectors built by [`periodic_uniform`](Self::periodic_uniform).
    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Number of control points this vector parametrizes.
    #[inline]
    pub fn control_point_count(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    #[inline]
    pub fn as_slice(&self) -> &[F] {
        &self.knots
    }

    /// Returns a copy of the knot values in order.
    pub fn to_sequence(&self) -> Vec<F> {
        self.knots.clone()
    }

    /// Returns the knot at `index`.
    pub fn knot(&self, index: usize) -> Result<F> {
        self.knots
            .get(index)
            .copied()
            .ok_or(NurbsError::IndexOutOfRange {
                index,
                len: self.knots.len(),
            })
    }

    /// The parameter domain `[knots[degree], knots[control_point_count]]`.
    #[inline]
    pub fn domain(&self) -> Interval<F> {
        Interval::new(
            self.knots[self.degree],
            self.knots[self.control_point_count()],
        )
    }

    /// Returns true when `t` lies in the closed domain.
    #[inline]
    pub fn contains(&self, t: F) -> bool {
        self.domain().contains(t)
    }

    /// Number of knots exactly equal to `t`.
    pub fn multiplicity_at(&self, t: F) -> usize {
        self.knots.iter().filter(|&&k| k == t).count()
    }

    /// Multiplicity of the knot stored at `index`.
    pub fn multiplicity(&self, index: usize) -> Result<usize> {
        let value = self.knot(index)?;
        Ok(self.multiplicity_at(value))
    }

    /// Returns true when the first `degree + 1` knots coincide.
    pub fn is_clamped_start(&self) -> bool {
        let first = self.knots[0];
        self.knots[..=self.degree].iter().all(|&k| k == first)
    }

    /// Returns true when the last `degree + 1` knots coincide.
    pub fn is_clamped_end(&self) -> bool {
        let last = self.knots[self.knots.len() - 1];
        self.knots[self.knots.len() - self.degree - 1..]
            .iter()
            .all(|&k| k == last)
    }

    /// Finds the span `i` with `knots[i] <= t < knots[i + 1]`.
    ///
    /// The domain end maps to the last non-empty span.
    ///
    /// # Errors
    ///
    /// [`NurbsError::ParameterOutOfDomain`] if `t` lies outside the closed domain.
    pub fn span_index(&self, t: F) -> Result<usize> {
        self.check_domain(t)?;
        Ok(self.find_span(t))
    }

    /// Like [`span_index`](Self::span_index), choosing the span on the given
    /// side when `t` sits exactly on an interior knot.
    pub fn span_index_from_side(&self, t: F, side: EvaluationSide) -> Result<usize> {
        let mut span = self.span_index(t)?;
        if side == EvaluationSide::Below && t > self.domain().start {
            while span > self.degree && self.knots[span] >= t {
                span -= 1;
            }
        }
        Ok(span)
    }

    /// Span lookup with explicit extrapolation: parameters before the domain
    /// use the first span, parameters after it use the last one.
    pub fn span_index_extrapolated(&self, t: F) -> usize {
        let domain = self.domain();
        if t < domain.start {
            self.find_span(domain.start)
        } else {
            self.find_span(t)
        }
    }

    pub(crate) fn check_domain(&self, t: F) -> Result<()> {
        let domain = self.domain();
        if domain.contains(t) {
            Ok(())
        } else {
            Err(NurbsError::ParameterOutOfDomain {
                parameter: to_f64(t),
                start: to_f64(domain.start),
                end: to_f64(domain.end),
            })
        }
    }

    /// Binary search for the span; `t` past the domain end maps to the last span.
    fn find_span(&self, t: F) -> usize {
        let n = self.control_point_count();
        let p = self.degree;

        if t >= self.knots[n] {
            let mut span = n - 1;
            while span > p && self.knots[span] == self.knots[span + 1] {
                span -= 1;
            }
            return span;
        }

        let mut low = p;
        let mut high = n;
        while low < high {
            let mid = (low + high) / 2;
            if t < self.knots[mid] {
                high = mid;
            } else {
                low = mid + 1;
            }
        }

        low.max(p + 1) - 1
    }

    /// The distinct non-empty spans inside the domain, in order.
    pub fn spans(&self) -> Vec<Interval<F>> {
        let n = self.control_point_count();
        (self.degree..n)
            .filter(|&i| self.knots[i] < self.knots[i + 1])
            .map(|i| Interval::new(self.knots[i], self.knots[i + 1]))
            .collect()
    }

    /// Number of non-empty spans in the domain.
    pub fn span_count(&self) -> usize {
        self.spans().len()
    }

    /// Returns the `index`-th non-empty span.
    pub fn span_domain(&self, index: usize) -> Result<Interval<F>> {
        let spans = self.spans();
        spans
            .get(index)
            .copied()
            .ok_or(NurbsError::IndexOutOfRange {
                index,
                len: spans.len(),
            })
    }

    /// Greville abscissae: the average of the `degree` knots that follow each
    /// control point's first knot.
    pub fn greville_abscissae(&self) -> Vec<F> {
        let p = self.degree;
        (0..self.control_point_count())
            .map(|i| {
                if p == 0 {
                    (self.knots[i] + self.knots[i + 1]) / (F::one() + F::one())
                } else {
                    let sum = self.knots[i + 1..=i + p]
                        .iter()
                        .fold(F::zero(), |acc, &k| acc + k);
                    sum / from_usize(p)
                }
            })
            .collect()
    }

    /// Affinely maps the knots so the domain becomes `domain`.
    ///
    /// # Errors
    ///
    /// [`NurbsError::DegenerateDomain`] unless `domain.start < domain.end`.
    pub fn reparameterized(&self, domain: Interval<F>) -> Result<Self> {
        if !domain.is_increasing() || !domain.length().is_finite() {
            return Err(NurbsError::DegenerateDomain {
                start: to_f64(domain.start),
                end: to_f64(domain.end),
            });
        }
        let current = self.domain();
        let scale = domain.length() / current.length();
        let knots = self
            .knots
            .iter()
            .map(|&k| {
                if k == current.start {
                    domain.start
                } else if k == current.end {
                    domain.end
                } else {
                    domain.start + (k - current.start) * scale
                }
            })
            .collect();
        Self::validated(knots, self.degree, self.periodic)
    }

    /// Mirrors the knots inside the domain, for a curve traversed backwards.
    pub fn reversed(&self) -> Self {
        let domain = self.domain();
        let sum = domain.start + domain.end;
        let knots = self.knots.iter().rev().map(|&k| sum - k).collect();
        Self {
            knots,
            degree: self.degree,
            periodic: self.periodic,
        }
    }

    /// Returns true when both vectors have the same degree and knots within
    /// `tolerance` of each other.
    pub fn is_duplicate(&self, other: &Self, tolerance: F) -> bool {
        self.degree == other.degree
            && self.knots.len() == other.knots.len()
            && self
                .knots
                .iter()
                .zip(&other.knots)
                .all(|(&a, &b)| (a - b).abs() <= tolerance)
    }

    /// The same knots without the periodic flag.
    pub(crate) fn into_non_periodic(self) -> Self {
        Self {
            periodic: false,
            ..self
        }
    }

    /// Builds a vector from knots produced by refinement or splitting.
    pub(crate) fn from_parts(knots: Vec<F>, degree: usize, periodic: bool) -> Result<Self> {
        Self::validated(knots, degree, periodic)
    }
}
