//! B-spline basis functions and their derivatives.
//!
//! At any parameter `t` only `degree + 1` basis functions are non-zero: those
//! attached to control points `span - degree ..= span`, where `span` is the
//! knot span containing `t`. The functions here compute exactly those, using
//! the triangular Cox-de Boor recurrence. Division by a zero-width knot
//! interval is treated as `0/0 := 0`.
//!
//! # Example
//!
//! ```
//! use knotwork::nurbs::{basis, KnotVector};
//!
//! let knots = KnotVector::<f64>::clamped_uniform(5, 3).unwrap();
//! let basis = basis::evaluate_basis(&knots, 3, 0.25).unwrap();
//!
//! let sum: f64 = basis.values.iter().sum();
//! assert!((sum - 1.0).abs() < 1e-12);
//! ```

use super::KnotVector;
use crate::error::{NurbsError, Result};
use crate::tolerance::{from_usize, inv_or_zero};
use num_traits::Float;

/// Highest derivative order the evaluators accept.
pub const MAX_DERIVATIVE_ORDER: usize = 64;

/// Non-zero basis function values at one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Basis<F> {
    /// Knot span containing the parameter.
    pub span: usize,
    /// `values[j]` is `N(span - degree + j, degree)` at the parameter.
    pub values: Vec<F>,
}

impl<F: Float> Basis<F> {
    /// Index of the first control point the values apply to.
    #[inline]
    pub fn first_index(&self) -> usize {
        self.span + 1 - self.values.len()
    }
}

/// Non-zero basis function values and derivatives at one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisDerivatives<F> {
    /// Knot span containing the parameter.
    pub span: usize,
    /// `ders[k][j]` is the `k`-th derivative of `N(span - degree + j, degree)`.
    ///
    /// Rows for `k > degree` are present and all zero.
    pub ders: Vec<Vec<F>>,
}

impl<F: Float> BasisDerivatives<F> {
    /// Index of the first control point the values apply to.
    #[inline]
    pub fn first_index(&self) -> usize {
        self.span + 1 - self.ders[0].len()
    }
}

fn check_degree<F: Float>(knots: &KnotVector<F>, degree: usize) -> Result<()> {
    if degree != knots.degree() {
        return Err(NurbsError::DegreeMismatch {
            knots: knots.degree(),
            curve: degree,
        });
    }
    Ok(())
}

pub(crate) fn check_derivative_order(order: usize) -> Result<()> {
    if order > MAX_DERIVATIVE_ORDER {
        return Err(NurbsError::DerivativeOrderTooHigh {
            order,
            max: MAX_DERIVATIVE_ORDER,
        });
    }
    Ok(())
}

/// Evaluates the `degree + 1` non-zero basis functions at `t`.
///
/// # Errors
///
/// - [`NurbsError::ParameterOutOfDomain`] if `t` is outside the knot domain
/// - [`NurbsError::DegreeMismatch`] if `degree` differs from the knot vector's
pub fn evaluate_basis<F: Float>(knots: &KnotVector<F>, degree: usize, t: F) -> Result<Basis<F>> {
    check_degree(knots, degree)?;
    let span = knots.span_index(t)?;
    Ok(Basis {
        span,
        values: basis_in_span(knots.as_slice(), span, degree, t),
    })
}

/// Evaluates the non-zero basis functions and their derivatives up to
/// `max_order` at `t`.
///
/// # Errors
///
/// Same as [`evaluate_basis`], plus [`NurbsError::DerivativeOrderTooHigh`]
/// when `max_order` exceeds [`MAX_DERIVATIVE_ORDER`].
pub fn evaluate_basis_derivatives<F: Float>(
    knots: &KnotVector<F>,
    degree: usize,
    t: F,
    max_order: usize,
) -> Result<BasisDerivatives<F>> {
    check_degree(knots, degree)?;
    check_derivative_order(max_order)?;
    let span = knots.span_index(t)?;
    Ok(BasisDerivatives {
        span,
        ders: derivatives_in_span(knots.as_slice(), span, degree, t, max_order),
    })
}

/// Basis values in a known span. No domain check: a parameter outside the
/// span evaluates the span's polynomial pieces (extrapolation).
pub(crate) fn basis_in_span<F: Float>(knots: &[F], span: usize, degree: usize, t: F) -> Vec<F> {
    let mut values = vec![F::zero(); degree + 1];
    let mut left = vec![F::zero(); degree + 1];
    let mut right = vec![F::zero(); degree + 1];

    values[0] = F::one();
    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = F::zero();
        for r in 0..j {
            let temp = values[r] * inv_or_zero(right[r + 1] + left[j - r]);
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }

    values
}

/// Basis values and derivatives in a known span.
///
/// Builds the triangular table of basis values and knot differences, then
/// differentiates it `max_order` times.
pub(crate) fn derivatives_in_span<F: Float>(
    knots: &[F],
    span: usize,
    degree: usize,
    t: F,
    max_order: usize,
) -> Vec<Vec<F>> {
    let p = degree;
    let mut ders = vec![vec![F::zero(); p + 1]; max_order + 1];

    // ndu[j][r] (r < j): knot differences; ndu[r][j] (r <= j): basis values.
    let mut ndu = vec![vec![F::zero(); p + 1]; p + 1];
    let mut left = vec![F::zero(); p + 1];
    let mut right = vec![F::zero(); p + 1];

    ndu[0][0] = F::one();
    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = F::zero();
        for r in 0..j {
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ndu[r][j - 1] * inv_or_zero(ndu[j][r]);
            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    for j in 0..=p {
        ders[0][j] = ndu[j][p];
    }

    let n = max_order.min(p);
    let mut a = vec![vec![F::zero(); p + 1]; 2];
    let pi = p as isize;

    for r in 0..=p {
        let ri = r as isize;
        let (mut s1, mut s2) = (0usize, 1usize);
        a[0][0] = F::one();

        for k in 1..=n {
            let ki = k as isize;
            let rk = ri - ki;
            let pk = pi - ki;
            let mut d = F::zero();

            if r >= k {
                let rk = rk as usize;
                let pk = pk as usize;
                a[s2][0] = a[s1][0] * inv_or_zero(ndu[pk + 1][rk]);
                d = a[s2][0] * ndu[rk][pk];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if ri - 1 <= pk { k - 1 } else { p - r };

            for j in j1..=j2 {
                let col = (rk + j as isize) as usize;
                let pk = pk as usize;
                a[s2][j] = (a[s1][j] - a[s1][j - 1]) * inv_or_zero(ndu[pk + 1][col]);
                d = d + a[s2][j] * ndu[col][pk];
            }

            if ri <= pk {
                let pk = pk as usize;
                a[s2][k] = -a[s1][k - 1] * inv_or_zero(ndu[pk + 1][r]);
                d = d + a[s2][k] * ndu[r][pk];
            }

            ders[k][r] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Scale by p! / (p - k)!.
    let mut factor = from_usize::<F>(p);
    for k in 1..=n {
        for value in ders[k].iter_mut() {
            *value = *value * factor;
        }
        factor = factor * from_usize(p - k);
    }

    ders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_relative_eq;

    fn sample_parameters(count: usize) -> impl Iterator<Item = f64> {
        (0..=count).map(move |i| i as f64 / count as f64)
    }

    #[test]
    fn test_partition_of_unity() {
        let knots = KnotVector::new(
            vec![0.0, 0.0, 0.0, 0.0, 0.1, 0.45, 0.45, 0.7, 1.0, 1.0, 1.0, 1.0],
            3,
        )
        .unwrap();

        for t in sample_parameters(97) {
            let basis = evaluate_basis(&knots, 3, t).unwrap();
            assert_eq!(basis.values.len(), 4);
            let sum: f64 = basis.values.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
            assert!(basis.values.iter().all(|&v| v >= -1e-15));
        }
    }

    #[test]
    fn test_linear_basis() {
        let knots = KnotVector::new(vec![0.0, 0.0, 1.0, 2.0, 2.0], 1).unwrap();
        let basis = evaluate_basis(&knots, 1, 0.25).unwrap();
        assert_eq!(basis.span, 1);
        assert_eq!(basis.first_index(), 0);
        assert_relative_eq!(basis.values[0], 0.75);
        assert_relative_eq!(basis.values[1], 0.25);
    }

    #[test]
    fn test_quadratic_bezier_basis_matches_bernstein() {
        let knots = KnotVector::new(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0], 2).unwrap();
        let t = 0.3;
        let ders = evaluate_basis_derivatives(&knots, 2, t, 2).unwrap();

        let mt = 1.0 - t;
        assert_relative_eq!(ders.ders[0][0], mt * mt, epsilon = 1e-14);
        assert_relative_eq!(ders.ders[0][1], 2.0 * mt * t, epsilon = 1e-14);
        assert_relative_eq!(ders.ders[0][2], t * t, epsilon = 1e-14);

        assert_relative_eq!(ders.ders[1][0], -2.0 * mt, epsilon = 1e-14);
        assert_relative_eq!(ders.ders[1][1], 2.0 - 4.0 * t, epsilon = 1e-14);
        assert_relative_eq!(ders.ders[1][2], 2.0 * t, epsilon = 1e-14);

        assert_relative_eq!(ders.ders[2][0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(ders.ders[2][1], -4.0, epsilon = 1e-12);
        assert_relative_eq!(ders.ders[2][2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_derivatives_beyond_degree_are_zero_rows() {
        let knots = KnotVector::<f64>::clamped_uniform(5, 2).unwrap();
        let ders = evaluate_basis_derivatives(&knots, 2, 0.4, 5).unwrap();
        assert_eq!(ders.ders.len(), 6);
        for row in &ders.ders[3..] {
            assert_eq!(row.len(), 3);
            assert!(row.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_derivative_rows_sum_to_zero() {
        let knots = KnotVector::<f64>::clamped_uniform(8, 3).unwrap();
        for t in sample_parameters(41) {
            let ders = evaluate_basis_derivatives(&knots, 3, t, 3).unwrap();
            for row in &ders.ders[1..] {
                let sum: f64 = row.iter().sum();
                assert_relative_eq!(sum, 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_first_derivative_matches_finite_difference() {
        let knots = KnotVector::new(
            vec![0.0, 0.0, 0.0, 0.0, 0.3, 0.5, 0.8, 1.0, 1.0, 1.0, 1.0],
            3,
        )
        .unwrap();
        let h = 1e-6;
        for &t in &[0.1, 0.4, 0.65, 0.9] {
            let ders = evaluate_basis_derivatives(&knots, 3, t, 1).unwrap();
            let plus = evaluate_basis(&knots, 3, t + h).unwrap();
            let minus = evaluate_basis(&knots, 3, t - h).unwrap();
            assert_eq!(plus.span, ders.span);
            assert_eq!(minus.span, ders.span);
            for j in 0..4 {
                let fd = (plus.values[j] - minus.values[j]) / (2.0 * h);
                assert_relative_eq!(ders.ders[1][j], fd, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_zero_order_derivatives_match_values() {
        let knots = KnotVector::<f64>::clamped_uniform(6, 3).unwrap();
        let values = evaluate_basis(&knots, 3, 0.42).unwrap();
        let ders = evaluate_basis_derivatives(&knots, 3, 0.42, 0).unwrap();
        assert_eq!(ders.ders.len(), 1);
        for j in 0..4 {
            assert_relative_eq!(values.values[j], ders.ders[0][j], epsilon = 1e-15);
        }
    }

    #[test]
    fn test_out_of_domain() {
        let knots = KnotVector::<f64>::clamped_uniform(5, 3).unwrap();
        let err = evaluate_basis(&knots, 3, 1.5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfDomain);
        let err = evaluate_basis_derivatives(&knots, 3, -0.5, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfDomain);
    }

    #[test]
    fn test_derivative_order_limit() {
        let knots = KnotVector::<f64>::clamped_uniform(5, 3).unwrap();
        let err = evaluate_basis_derivatives(&knots, 3, 0.5, usize::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let ders = evaluate_basis_derivatives(&knots, 3, 0.5, MAX_DERIVATIVE_ORDER).unwrap();
        assert_eq!(ders.ders.len(), MAX_DERIVATIVE_ORDER + 1);
    }

    #[test]
    fn test_degree_mismatch() {
        let knots = KnotVector::<f64>::clamped_uniform(5, 3).unwrap();
        let err = evaluate_basis(&knots, 2, 0.5).unwrap_err();
        assert_eq!(err, NurbsError::DegreeMismatch { knots: 3, curve: 2 });
    }

    #[test]
    fn test_endpoint_basis_is_interpolating() {
        let knots = KnotVector::<f64>::clamped_uniform(5, 3).unwrap();
        let start = evaluate_basis(&knots, 3, 0.0).unwrap();
        assert_eq!(start.values, vec![1.0, 0.0, 0.0, 0.0]);
        let end = evaluate_basis(&knots, 3, 1.0).unwrap();
        assert_eq!(end.first_index(), 1);
        assert_relative_eq!(end.values[3], 1.0);
    }
}
