//! Explicit numeric tolerances.
//!
//! Nothing in this crate reads a hidden epsilon: operations that compare
//! floating-point values against zero or snap parameters to knots take a
//! [`Tolerance`] value. The plain variants of those operations use
//! [`Tolerance::default`]; the `*_with_tolerance` variants accept a caller's
//! choice.

use num_traits::Float;

/// Absolute zero tolerance used by the default configuration.
///
/// Vectors shorter than this are treated as zero (e.g. a vanishing tangent).
pub const DEFAULT_ZERO_TOLERANCE: f64 = 2.328_306_436_538_696_3e-10;

/// Relative knot tolerance used by the default configuration.
///
/// Multiplied by the domain length; parameters closer than that to a knot
/// are snapped onto it before insertion or splitting.
pub const DEFAULT_KNOT_TOLERANCE: f64 = 1.0e-12;

/// Tolerances for degeneracy tests and knot snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance<F> {
    /// Absolute threshold below which a length counts as zero.
    pub zero: F,
    /// Relative threshold (fraction of the domain length) for knot snapping.
    pub knot: F,
}

impl<F: Float> Tolerance<F> {
    pub fn new(zero: F, knot: F) -> Self {
        Self { zero, knot }
    }

    /// Absolute knot tolerance for a domain of the given length.
    #[inline]
    pub fn knot_for(&self, domain_length: F) -> F {
        self.knot * domain_length.abs().max(F::one())
    }
}

impl<F: Float> Default for Tolerance<F> {
    fn default() -> Self {
        // f32 cannot resolve the f64 defaults; never go below a few ulps.
        let floor = F::epsilon() * from_f64(16.0);
        Self {
            zero: from_f64::<F>(DEFAULT_ZERO_TOLERANCE).max(floor),
            knot: from_f64::<F>(DEFAULT_KNOT_TOLERANCE).max(floor),
        }
    }
}

/// Converts an `f64` constant into `F`.
///
/// Every `Float` type can represent (possibly rounded) finite `f64` values,
/// so this only falls back to NaN for types that reject the conversion.
#[inline]
pub(crate) fn from_f64<F: Float>(value: f64) -> F {
    F::from(value).unwrap_or_else(F::nan)
}

/// Converts an index or count into `F`.
#[inline]
pub(crate) fn from_usize<F: Float>(value: usize) -> F {
    F::from(value).unwrap_or_else(F::nan)
}

/// Converts `F` to `f64` for error reporting.
#[inline]
pub(crate) fn to_f64<F: Float>(value: F) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Returns `1 / delta`, or zero when `delta` is exactly zero.
///
/// Encodes the `0/0 := 0` convention of the basis recurrences: a zero-width
/// knot interval contributes nothing.
#[inline]
pub(crate) fn inv_or_zero<F: Float>(delta: F) -> F {
    if delta == F::zero() {
        F::zero()
    } else {
        F::one() / delta
    }
}

/// Binomial coefficients `C(n, k)` for `k in 0..=n`, row by row up to `n`.
pub(crate) fn binomial_table<F: Float>(n: usize) -> Vec<Vec<F>> {
    let mut rows: Vec<Vec<F>> = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let mut row = vec![F::one(); i + 1];
        for k in 1..i {
            row[k] = rows[i - 1][k - 1] + rows[i - 1][k];
        }
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_f64() {
        let tol: Tolerance<f64> = Tolerance::default();
        assert_eq!(tol.zero, DEFAULT_ZERO_TOLERANCE);
        assert_eq!(tol.knot, DEFAULT_KNOT_TOLERANCE);
    }

    #[test]
    fn test_default_f32_is_resolvable() {
        let tol: Tolerance<f32> = Tolerance::default();
        assert!(1.0_f32 + tol.knot > 1.0);
        assert!(tol.zero >= f32::EPSILON);
    }

    #[test]
    fn test_knot_for_scales_with_long_domains() {
        let tol = Tolerance::new(1e-10_f64, 1e-12);
        assert_eq!(tol.knot_for(0.5), 1e-12);
        approx::assert_relative_eq!(tol.knot_for(100.0), 1e-10, max_relative = 1e-12);
    }

    #[test]
    fn test_inv_or_zero() {
        assert_eq!(inv_or_zero(0.0_f64), 0.0);
        assert_eq!(inv_or_zero(4.0_f64), 0.25);
    }

    #[test]
    fn test_binomial_table() {
        let table: Vec<Vec<f64>> = binomial_table(4);
        assert_eq!(table[0], vec![1.0]);
        assert_eq!(table[2], vec![1.0, 2.0, 1.0]);
        assert_eq!(table[4], vec![1.0, 4.0, 6.0, 4.0, 1.0]);
    }
}
