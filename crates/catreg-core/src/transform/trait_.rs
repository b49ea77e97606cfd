//! Transform trait for spatial coordinate transformations.
//!
//! This module defines the core Transform trait that all spatial transforms must implement.

use crate::spatial::Point3;

/// Transform trait for spatial coordinate transformations.
///
/// Maps points from one physical space to another. Implementors only need
/// `transform_point`; batch application has a default.
pub trait Transform: Send + Sync {
    /// Map a single point.
    fn transform_point(&self, point: &Point3) -> Point3;

    /// Map a batch of points into a new buffer.
    fn transform_points(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|p| self.transform_point(p)).collect()
    }

    /// Get the inverse transform (if available).
    ///
    /// Not all transforms are easily invertible, so this returns an Option.
    fn inverse_transform(&self) -> Option<Box<dyn Transform>> {
        None
    }
}
