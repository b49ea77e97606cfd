//! Closest-point correspondence search.

use catreg_core::{ClosestPoint, ClosestPointIndex, Point3};
use rayon::prelude::*;

/// Paired points for one ICP iteration.
#[derive(Debug, Clone, Default)]
pub struct Correspondences {
    /// Moving points (already transformed) that found a partner.
    pub source: Vec<Point3>,
    /// Closest fixed location for each entry of `source`.
    pub target: Vec<Point3>,
    /// Mean squared distance over the accepted pairs.
    pub mse: f64,
    /// Pairs dropped by the distance limit.
    pub rejected: usize,
}

impl Correspondences {
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Fraction of query points that were paired.
    pub fn fitness(&self) -> f64 {
        let total = self.source.len() + self.rejected;
        if total == 0 {
            0.0
        } else {
            self.source.len() as f64 / total as f64
        }
    }
}

/// Closest indexed location for every point, in input order.
pub fn closest_points(index: &dyn ClosestPointIndex, points: &[Point3], parallel: bool) -> Vec<Option<ClosestPoint>> {
    if parallel {
        points.par_iter().map(|p| index.closest_point(p)).collect()
    } else {
        points.iter().map(|p| index.closest_point(p)).collect()
    }
}

/// Pair every point with its closest indexed location.
///
/// Pairs farther apart than `max_distance` are rejected. Accumulation runs in
/// input order, so the result does not depend on `parallel`.
pub fn find_correspondences(
    index: &dyn ClosestPointIndex,
    points: &[Point3],
    max_distance: Option<f64>,
    parallel: bool,
) -> Correspondences {
    let limit = max_distance.map(|d| d * d).unwrap_or(f64::INFINITY);
    let hits = closest_points(index, points, parallel);

    let mut result = Correspondences {
        source: Vec::with_capacity(points.len()),
        target: Vec::with_capacity(points.len()),
        ..Default::default()
    };
    let mut sum = 0.0;
    for (p, hit) in points.iter().zip(hits) {
        match hit {
            Some(hit) if hit.distance_squared <= limit => {
                result.source.push(*p);
                result.target.push(hit.point);
                sum += hit.distance_squared;
            }
            _ => result.rejected += 1,
        }
    }
    if !result.is_empty() {
        result.mse = sum / result.len() as f64;
    }
    result
}
