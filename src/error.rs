//! Error types for NURBS construction and evaluation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NurbsError>;

/// Broad classification of a [`NurbsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed construction input.
    InvalidArgument,
    /// Evaluation parameter outside the curve domain.
    OutOfDomain,
    /// Control point or knot index past the end.
    IndexOutOfRange,
    /// Zero-length tangent or zero-length domain.
    Degenerate,
}

/// Errors that can occur while building or evaluating knot vectors and curves.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NurbsError {
    /// A curve needs degree 1 or higher.
    #[error("degree must be at least 1")]
    ZeroDegree,

    /// Fewer control points than the degree allows.
    #[error("{points} control points cannot carry a degree {degree} curve (need at least {})", .degree + 1)]
    TooFewControlPoints {
        /// Number of control points supplied.
        points: usize,
        /// Requested degree.
        degree: usize,
    },

    /// Knot vector length does not satisfy `knots == points + degree + 1`.
    #[error("knot vector has {knots} knots, expected {expected} for {points} control points of degree {degree}")]
    KnotCountMismatch {
        knots: usize,
        expected: usize,
        points: usize,
        degree: usize,
    },

    /// Knot vector decreases at `index`.
    #[error("knot vector must be non-decreasing: knot {index} is smaller than knot {}", .index - 1)]
    NonMonotonicKnots {
        /// Index of the first knot smaller than its predecessor.
        index: usize,
    },

    /// A knot is NaN or infinite.
    #[error("knot {index} is not finite")]
    NonFiniteKnot { index: usize },

    /// `knots[degree] == knots[len - degree - 1]`.
    #[error("knot vector domain is empty")]
    EmptyDomain,

    /// Knot vector and curve disagree on the degree.
    #[error("knot vector has degree {knots}, curve requested degree {curve}")]
    DegreeMismatch { knots: usize, curve: usize },

    /// Weight is zero, negative, or not finite.
    #[error("control point {index} has invalid weight {weight}: weights must be positive and finite")]
    InvalidWeight { index: usize, weight: f64 },

    /// Control point location is NaN or infinite.
    #[error("control point {index} is not finite")]
    NonFinitePoint { index: usize },

    /// Knot multiplicity request cannot be honoured.
    #[error("cannot raise knot multiplicity to {requested}: the maximum is {max}")]
    InvalidMultiplicity { requested: usize, max: usize },

    /// Parameter outside the closed domain.
    #[error("parameter {parameter} is outside the domain [{start}, {end}]")]
    ParameterOutOfDomain { parameter: f64, start: f64, end: f64 },

    /// Parameter at or beyond a domain end where an interior one is required.
    #[error("parameter {parameter} is not strictly inside the domain ({start}, {end})")]
    NotInterior { parameter: f64, start: f64, end: f64 },

    /// Index past the end of a control polygon or knot vector.
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// First derivative vanishes, so no tangent direction exists.
    #[error("tangent vanishes at parameter {parameter}")]
    ZeroTangent { parameter: f64 },

    /// Zero-length parameter interval.
    #[error("domain [{start}, {end}] has zero length")]
    DegenerateDomain { start: f64, end: f64 },

    /// Approximation tolerance is zero, negative or NaN.
    #[error("tolerance {tolerance} must be positive")]
    InvalidTolerance { tolerance: f64 },

    /// More derivatives requested than evaluation supports.
    #[error("derivative order {order} exceeds the maximum of {max}")]
    DerivativeOrderTooHigh { order: usize, max: usize },

    /// Degree elevation asked for a lower degree.
    #[error("cannot lower the degree from {degree} to {requested}")]
    DegreeDecrease { degree: usize, requested: usize },
}

impl NurbsError {
    /// Returns the broad classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NurbsError::ZeroDegree
            | NurbsError::TooFewControlPoints { .. }
            | NurbsError::KnotCountMismatch { .. }
            | NurbsError::NonMonotonicKnots { .. }
            | NurbsError::NonFiniteKnot { .. }
            | NurbsError::EmptyDomain
            | NurbsError::DegreeMismatch { .. }
            | NurbsError::InvalidWeight { .. }
            | NurbsError::NonFinitePoint { .. }
            | NurbsError::InvalidMultiplicity { .. }
            | NurbsError::InvalidTolerance { .. }
            | NurbsError::DerivativeOrderTooHigh { .. }
            | NurbsError::DegreeDecrease { .. } => ErrorKind::InvalidArgument,
            NurbsError::ParameterOutOfDomain { .. } | NurbsError::NotInterior { .. } => {
                ErrorKind::OutOfDomain
            }
            NurbsError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            NurbsError::ZeroTangent { .. } | NurbsError::DegenerateDomain { .. } => {
                ErrorKind::Degenerate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_invariant() {
        let err = NurbsError::TooFewControlPoints {
            points: 3,
            degree: 3,
        };
        assert_eq!(
            err.to_string(),
            "3 control points cannot carry a degree 3 curve (need at least 4)"
        );

        let err = NurbsError::ParameterOutOfDomain {
            parameter: 1.5,
            start: 0.0,
            end: 1.0,
        };
        assert_eq!(
            err.to_string(),
            "parameter 1.5 is outside the domain [0, 1]"
        );

        let err = NurbsError::NonMonotonicKnots { index: 4 };
        assert!(err.to_string().contains("knot 4 is smaller than knot 3"));

        let err = NurbsError::DerivativeOrderTooHigh { order: 100, max: 64 };
        assert_eq!(
            err.to_string(),
            "derivative order 100 exceeds the maximum of 64"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(NurbsError::ZeroDegree.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            NurbsError::IndexOutOfRange { index: 5, len: 5 }.kind(),
            ErrorKind::IndexOutOfRange
        );
        assert_eq!(
            NurbsError::NotInterior {
                parameter: 0.0,
                start: 0.0,
                end: 1.0
            }
            .kind(),
            ErrorKind::OutOfDomain
        );
        assert_eq!(
            NurbsError::ZeroTangent { parameter: 0.0 }.kind(),
            ErrorKind::Degenerate
        );
        assert_eq!(
            NurbsError::ParameterOutOfDomain {
                parameter: 2.0,
                start: 0.0,
                end: 1.0
            }
            .kind(),
            ErrorKind::OutOfDomain
        );
    }
}
