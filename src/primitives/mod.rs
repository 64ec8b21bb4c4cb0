//! Floating-point geometric primitives.

mod interval;
mod plane;
mod point3;
mod vec3;

pub use interval::Interval;
pub use plane::Plane;
pub use point3::Point3;
pub use vec3::Vec3;
