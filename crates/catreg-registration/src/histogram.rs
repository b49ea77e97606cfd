//! Directed surface distance histogram.
//!
//! Every point of the compare surface is mapped by the registration
//! transform and measured against the closest point on the reference
//! surface. The distances are summarized as an equal-width histogram over
//! `[0, max]` together with the directed Hausdorff statistics.

use catreg_core::{SurfaceMesh, Transform, TriangleBvh};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, Result};
use crate::icp::correspondence::closest_points;
use crate::validation;

/// One histogram bin. `frequency` counts distances in `[lower, upper)`; the
/// last bin also includes `upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub frequency: u64,
}

/// Distance histogram with summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceHistogram {
    pub bins: Vec<HistogramBin>,
    /// Number of measured compare points.
    pub sample_count: usize,
    pub mean_distance: f64,
    /// Mean over compare points of the distance to the reference.
    pub average_hausdorff: f64,
    /// Maximum over compare points of the distance to the reference.
    pub maximum_hausdorff: f64,
}

impl DistanceHistogram {
    /// Bin `distances` into `bin_count` equal-width bins over `[0, max]`.
    ///
    /// When every distance is zero all bins have zero width and every sample
    /// lands in the first one.
    pub fn from_distances(distances: &[f64], bin_count: usize) -> Result<Self> {
        validation::validate_bin_count(bin_count)?;
        if distances.is_empty() {
            return Err(RegistrationError::degenerate_input("no distances to bin"));
        }

        let max = distances.iter().copied().fold(0.0, f64::max);
        let mean = distances.iter().sum::<f64>() / distances.len() as f64;
        let width = max / bin_count as f64;

        let mut bins: Vec<HistogramBin> = (0..bin_count)
            .map(|i| HistogramBin {
                lower: width * i as f64,
                upper: if i + 1 == bin_count { max } else { width * (i + 1) as f64 },
                frequency: 0,
            })
            .collect();

        for &d in distances {
            let bin = if width > 0.0 {
                ((d / width) as usize).min(bin_count - 1)
            } else {
                0
            };
            bins[bin].frequency += 1;
        }

        Ok(Self {
            bins,
            sample_count: distances.len(),
            mean_distance: mean,
            average_hausdorff: mean,
            maximum_hausdorff: max,
        })
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Sum of all bin frequencies. Always equals `sample_count`.
    pub fn total_frequency(&self) -> u64 {
        self.bins.iter().map(|b| b.frequency).sum()
    }

    pub fn bin_width(&self) -> f64 {
        self.bins.first().map(|b| b.upper - b.lower).unwrap_or(0.0)
    }
}

/// Computes directed distances from a compare surface to a reference surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceHistogramAnalyzer {
    pub bin_count: usize,
    pub parallel: bool,
}

impl Default for DistanceHistogramAnalyzer {
    fn default() -> Self {
        Self {
            bin_count: 100,
            parallel: true,
        }
    }
}

impl DistanceHistogramAnalyzer {
    pub fn new(bin_count: usize) -> Self {
        Self {
            bin_count,
            ..Self::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Distance from each transformed compare point to the reference surface,
    /// in compare point order.
    pub fn distances<T: Transform + ?Sized>(
        &self,
        reference: &SurfaceMesh,
        compare: &SurfaceMesh,
        transform: &T,
    ) -> Result<Vec<f64>> {
        validation::validate_mesh(compare, "Compare", false)?;
        validation::validate_mesh(reference, "Reference", true)?;

        let moved = if self.parallel {
            compare
                .points()
                .par_iter()
                .map(|p| transform.transform_point(p))
                .collect::<Vec<_>>()
        } else {
            transform.transform_points(compare.points())
        };

        let index = TriangleBvh::build(reference);
        closest_points(&index, &moved, self.parallel)
            .into_iter()
            .map(|hit| {
                hit.map(|h| h.distance()).ok_or_else(|| {
                    RegistrationError::degenerate_input("reference surface answered no distance query")
                })
            })
            .collect()
    }

    /// Histogram of the directed distances compare → reference.
    ///
    /// # Errors
    /// - `InvalidParameter` when `bin_count` is 0
    /// - `DegenerateInput` when `compare` has no points or `reference` has no triangles
    pub fn analyze<T: Transform + ?Sized>(
        &self,
        reference: &SurfaceMesh,
        compare: &SurfaceMesh,
        transform: &T,
    ) -> Result<DistanceHistogram> {
        validation::validate_bin_count(self.bin_count)?;
        let distances = self.distances(reference, compare, transform)?;
        let histogram = DistanceHistogram::from_distances(&distances, self.bin_count)?;
        tracing::debug!(
            "Distance histogram: {} samples, {} bins, mean {:.6}, max {:.6}",
            histogram.sample_count,
            histogram.num_bins(),
            histogram.mean_distance,
            histogram.maximum_hausdorff
        );
        Ok(histogram)
    }

    /// Mean directed distance compare → reference, without binning.
    pub fn mean_distance<T: Transform + ?Sized>(
        &self,
        reference: &SurfaceMesh,
        compare: &SurfaceMesh,
        transform: &T,
    ) -> Result<f64> {
        let distances = self.distances(reference, compare, transform)?;
        Ok(distances.iter().sum::<f64>() / distances.len() as f64)
    }
}

/// Histogram with default parallelism. See [`DistanceHistogramAnalyzer::analyze`].
pub fn analyze<T: Transform + ?Sized>(
    reference: &SurfaceMesh,
    compare: &SurfaceMesh,
    transform: &T,
    bin_count: usize,
) -> Result<DistanceHistogram> {
    DistanceHistogramAnalyzer::new(bin_count).analyze(reference, compare, transform)
}

/// Mean distance of the transformed `compare` points to `reference`.
pub fn mean_distance<T: Transform + ?Sized>(
    reference: &SurfaceMesh,
    compare: &SurfaceMesh,
    transform: &T,
) -> Result<f64> {
    DistanceHistogramAnalyzer::default().mean_distance(reference, compare, transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catreg_core::{Point3, RigidTransform, Vector3};

    fn square() -> SurfaceMesh {
        SurfaceMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_binning() {
        let h = DistanceHistogram::from_distances(&[0.0, 0.1, 0.5, 0.99, 1.0], 4).unwrap();
        assert_eq!(h.num_bins(), 4);
        assert!((h.bin_width() - 0.25).abs() < 1e-12);
        let counts: Vec<u64> = h.bins.iter().map(|b| b.frequency).collect();
        assert_eq!(counts, vec![2, 0, 1, 2]);
        assert_eq!(h.bins[3].upper, 1.0);
        assert_eq!(h.maximum_hausdorff, 1.0);
        assert!((h.mean_distance - 0.518).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_distances() {
        let h = DistanceHistogram::from_distances(&[0.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(h.bins[0].frequency, 3);
        assert_eq!(h.bin_width(), 0.0);
        assert_eq!(h.total_frequency(), 3);
    }

    #[test]
    fn test_lifted_square() {
        let lifted = square().transformed(&RigidTransform::from_translation(Vector3::new(0.0, 0.0, 2.0)));
        let h = analyze(&square(), &lifted, &RigidTransform::identity(), 10).unwrap();
        assert_eq!(h.sample_count, 4);
        assert!((h.mean_distance - 2.0).abs() < 1e-12);
        assert_eq!(h.bins[9].frequency, 4);

        let back = RigidTransform::from_translation(Vector3::new(0.0, 0.0, -2.0));
        assert!(mean_distance(&square(), &lifted, &back).unwrap() < 1e-12);
    }

    #[test]
    fn test_errors() {
        let cloud = SurfaceMesh::from_points(vec![Point3::origin()]);
        let identity = RigidTransform::identity();

        assert!(matches!(
            analyze(&cloud, &square(), &identity, 10),
            Err(RegistrationError::DegenerateInput(_))
        ));
        assert!(matches!(
            analyze(&square(), &SurfaceMesh::empty(), &identity, 10),
            Err(RegistrationError::DegenerateInput(_))
        ));
        assert!(matches!(
            analyze(&square(), &square(), &identity, 0),
            Err(RegistrationError::InvalidParameter(_))
        ));
    }
}
