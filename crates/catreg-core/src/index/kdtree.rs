//! k-d tree over mesh points for point-to-point queries.
//!
//! The tree is built once from a slice and never mutated, so the immutable
//! kiddo variant is used. It accepts any number of points sharing a
//! coordinate, which planar patches and axis-aligned rings produce.

use kiddo::{ImmutableKdTree, SquaredEuclidean};

use super::{ClosestPoint, ClosestPointIndex};
use crate::spatial::Point3;

/// Nearest-vertex index backed by a kiddo k-d tree.
pub struct PointKdTree {
    /// `None` for an empty point set.
    tree: Option<ImmutableKdTree<f64, 3>>,
    points: Vec<Point3>,
}

impl PointKdTree {
    /// Build a k-d tree from a point set. Item `i` is `points[i]`.
    pub fn build(points: &[Point3]) -> Self {
        let entries: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
        let tree = (!entries.is_empty()).then(|| ImmutableKdTree::new_from_slice(&entries));
        Self {
            tree,
            points: points.to_vec(),
        }
    }
}

impl std::fmt::Debug for PointKdTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointKdTree")
            .field("points", &self.points.len())
            .finish()
    }
}

impl ClosestPointIndex for PointKdTree {
    fn closest_point(&self, query: &Point3) -> Option<ClosestPoint> {
        let tree = self.tree.as_ref()?;
        let nearest = tree.nearest_one::<SquaredEuclidean>(&[query.x, query.y, query.z]);
        let primitive = nearest.item as usize;
        Some(ClosestPoint {
            point: self.points[primitive],
            distance_squared: nearest.distance,
            primitive,
        })
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}
