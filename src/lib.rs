//! knotwork - NURBS curves in three dimensions
//!
//! Knot vectors, weighted control polygons and B-spline basis functions, put
//! together as a rational curve with exact evaluation, derivatives, frames
//! and splitting. Everything is generic over the float type.

pub mod error;
pub mod nurbs;
pub mod primitives;
pub mod tolerance;

pub use error::{ErrorKind, NurbsError, Result};
pub use nurbs::{
    ControlPoint, ControlPointPolygon, CurveEnd, EvaluationSide, KnotVector, NurbsCurve,
};
pub use primitives::{Interval, Plane, Point3, Vec3};
pub use tolerance::Tolerance;
