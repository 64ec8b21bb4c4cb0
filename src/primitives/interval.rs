//! Closed parameter intervals.

use num_traits::Float;

/// A closed interval `[start, end]` on the real line.
///
/// Used for curve domains and knot spans. An interval whose `start` and `end`
/// coincide is *degenerate*; an interval with `start > end` is *decreasing*.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<F> {
    pub start: F,
    pub end: F,
}

impl<F: Float> Interval<F> {
    #[inline]
    pub fn new(start: F, end: F) -> Self {
        Self { start, end }
    }

    /// The unit interval `[0, 1]`.
    #[inline]
    pub fn unit() -> Self {
        Self::new(F::zero(), F::one())
    }

    /// Signed length `end - start`.
    #[inline]
    pub fn length(self) -> F {
        self.end - self.start
    }

    #[inline]
    pub fn mid(self) -> F {
        (self.start + self.end) / (F::one() + F::one())
    }

    #[inline]
    pub fn min(self) -> F {
        self.start.min(self.end)
    }

    #[inline]
    pub fn max(self) -> F {
        self.start.max(self.end)
    }

    /// Returns true when the interval has (numerically) zero length.
    #[inline]
    pub fn is_degenerate(self, tolerance: F) -> bool {
        !(self.length().abs() > tolerance) || !self.length().is_finite()
    }

    #[inline]
    pub fn is_increasing(self) -> bool {
        self.start < self.end
    }

    /// Returns true when `t` lies in the closed interval.
    #[inline]
    pub fn contains(self, t: F) -> bool {
        t >= self.min() && t <= self.max()
    }

    /// Maps the normalized parameter `s` to `start + s * (end - start)`.
    #[inline]
    pub fn parameter_at(self, s: F) -> F {
        if s == F::zero() {
            self.start
        } else if s == F::one() {
            self.end
        } else {
            self.start + s * self.length()
        }
    }

    /// Inverse of [`parameter_at`](Self::parameter_at).
    ///
    /// Returns `None` for a degenerate interval.
    #[inline]
    pub fn normalized_parameter_at(self, t: F) -> Option<F> {
        if self.is_degenerate(F::zero()) {
            return None;
        }
        if t == self.start {
            Some(F::zero())
        } else if t == self.end {
            Some(F::one())
        } else {
            Some((t - self.start) / self.length())
        }
    }

    /// Returns the interval with its endpoints swapped.
    #[inline]
    pub fn swapped(self) -> Self {
        Self::new(self.end, self.start)
    }
}

impl<F: Float> From<(F, F)> for Interval<F> {
    fn from((start, end): (F, F)) -> Self {
        Self::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parameter_mapping_round_trip() {
        let domain = Interval::new(2.0_f64, 6.0);
        assert_eq!(domain.parameter_at(0.0), 2.0);
        assert_eq!(domain.parameter_at(1.0), 6.0);
        assert_relative_eq!(domain.parameter_at(0.25), 3.0);
        assert_relative_eq!(domain.normalized_parameter_at(3.0).unwrap(), 0.25);
        assert_eq!(domain.normalized_parameter_at(6.0), Some(1.0));
    }

    #[test]
    fn test_degenerate_interval_has_no_normalized_parameter() {
        let point = Interval::new(1.0_f64, 1.0);
        assert!(point.is_degenerate(0.0));
        assert!(point.normalized_parameter_at(1.0).is_none());
    }

    #[test]
    fn test_contains_is_closed() {
        let domain = Interval::new(0.0_f64, 1.0);
        assert!(domain.contains(0.0));
        assert!(domain.contains(1.0));
        assert!(!domain.contains(-1e-300));
        assert!(!domain.contains(1.0 + f64::EPSILON));
        assert!(domain.swapped().contains(0.5));
    }

    #[test]
    fn test_mid_and_length() {
        let domain: Interval<f64> = (1.0, 3.0).into();
        assert_eq!(domain.mid(), 2.0);
        assert_eq!(domain.length(), 2.0);
        assert_eq!(domain.swapped().length(), -2.0);
    }
}
