//! Spatial indices for closest-point queries.
//!
//! Both indices are built once over a fixed surface and then only read, so a
//! shared reference can serve queries from many threads at once.

pub mod bvh;
pub mod kdtree;

pub use bvh::TriangleBvh;
pub use kdtree::PointKdTree;

use crate::spatial::Point3;

/// Result of a closest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    /// Closest location on the indexed geometry.
    pub point: Point3,
    /// Squared distance from the query to `point`.
    pub distance_squared: f64,
    /// Triangle index (BVH) or point index (k-d tree) in the source mesh.
    pub primitive: usize,
}

impl ClosestPoint {
    pub fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }
}

/// Closest-point lookup over an immutable set of primitives.
pub trait ClosestPointIndex: Send + Sync {
    /// Closest indexed location to `query`, `None` if the index is empty.
    fn closest_point(&self, query: &Point3) -> Option<ClosestPoint>;

    /// Number of indexed primitives.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
