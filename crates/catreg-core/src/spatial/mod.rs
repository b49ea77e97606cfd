//! Spatial types for representing points, vectors and bounding volumes.
//!
//! All coordinates are double precision. The point and vector types are plain
//! nalgebra aliases so every nalgebra operation is available on them.

pub mod bounds;

pub use bounds::BoundingBox;

use nalgebra::{Matrix3 as NaMatrix3, Matrix4 as NaMatrix4, Point3 as NaPoint3, Vector3 as NaVector3};

pub type Point3 = NaPoint3<f64>;
pub type Vector3 = NaVector3<f64>;
pub type Matrix3 = NaMatrix3<f64>;
pub type Matrix4 = NaMatrix4<f64>;

/// Arithmetic mean of a set of points, or `None` for an empty set.
pub fn centroid(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3 = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}
