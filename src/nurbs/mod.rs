//! Non-uniform rational B-spline curves in three dimensions.
//!
//! A curve is assembled from three validated parts:
//!
//! - [`KnotVector`]: the parametrization and continuity structure
//! - [`ControlPointPolygon`]: weighted control points giving the shape
//! - the degree
//!
//! The basis functions tying them together live in [`basis`].
//!
//! # Example
//!
//! ```
//! use knotwork::nurbs::NurbsCurve;
//! use knotwork::Point3;
//!
//! let curve = NurbsCurve::<f64>::create_from_points(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.0),
//!         Point3::new(2.0, 0.0, 0.0),
//!         Point3::new(3.0, -1.0, 0.0),
//!         Point3::new(4.0, 0.0, 0.0),
//!     ],
//!     3,
//! )
//! .unwrap();
//!
//! assert_eq!(curve.point_at(0.0).unwrap(), Point3::new(0.0, 0.0, 0.0));
//! assert_eq!(curve.point_at(1.0).unwrap(), Point3::new(4.0, 0.0, 0.0));
//!
//! let (left, right) = curve.split(0.5).unwrap();
//! assert_eq!(left.control_points().len() + right.control_points().len(), 5 + 3);
//! ```

pub mod basis;
mod control_polygon;
mod curve;
mod knot_vector;
#[cfg(feature = "rayon")]
mod parallel;
mod refine;

pub use basis::{
    evaluate_basis, evaluate_basis_derivatives, Basis, BasisDerivatives, MAX_DERIVATIVE_ORDER,
};
pub use control_polygon::{ControlPoint, ControlPointPolygon};
pub use curve::{CurveEnd, NurbsCurve};
pub use knot_vector::KnotVector;

/// Which neighbouring span to evaluate in when a parameter sits exactly on an
/// interior knot.
///
/// Only matters where the curve is not smooth enough for the requested
/// derivative: positions agree from both sides, derivatives may jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvaluationSide {
    /// The span starting at the knot (the span ending at it for the domain end).
    #[default]
    Default,
    /// The span ending at the knot.
    Below,
    /// The span starting at the knot.
    Above,
}
