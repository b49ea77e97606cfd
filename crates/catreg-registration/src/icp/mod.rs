//! Iterative closest point (ICP) rigid registration.
//!
//! Each iteration pairs every transformed moving point with its closest
//! location on the fixed surface, fits the best rigid increment to the pairs
//! in closed form and composes it into the running estimate. The loop stops
//! when the mean squared distance stops decreasing, the iteration cap is
//! reached or the time budget runs out.

pub mod correspondence;
pub mod solver;

pub use correspondence::{find_correspondences, Correspondences};
pub use solver::{fit_rigid, RigidFit};

use std::time::{Duration, Instant};

use catreg_core::{ClosestPointIndex, PointKdTree, RigidTransform, SurfaceMesh, Transform, TriangleBvh};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{RegistrationWarning, Result};
use crate::progress::ProgressTracker;
use crate::validation::{self, ConvergenceChecker};

/// How moving points are paired with the fixed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrespondenceMetric {
    /// Closest point on any fixed triangle.
    #[default]
    PointToSurface,
    /// Closest fixed vertex.
    PointToPoint,
}

/// Trust level of a registration result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Confidence {
    #[default]
    Full,
    /// At least one iteration could only fit a translation.
    Reduced,
}

/// ICP configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcpConfig {
    /// Iteration cap.
    pub max_iterations: usize,
    /// Stop once an iteration lowers the MSE by less than this.
    pub convergence_threshold: f64,
    pub metric: CorrespondenceMetric,
    /// Optional wall-clock budget for the whole run.
    pub max_duration: Option<Duration>,
    /// Query correspondences on the rayon pool.
    pub parallel: bool,
    /// Fit a uniform scale along with the rigid motion.
    pub estimate_scale: bool,
    /// Pairs farther apart than this are ignored.
    pub max_correspondence_distance: Option<f64>,
}

impl Default for IcpConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            convergence_threshold: 1e-10,
            metric: CorrespondenceMetric::PointToSurface,
            max_duration: None,
            parallel: true,
            estimate_scale: false,
            max_correspondence_distance: None,
        }
    }
}

impl IcpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_metric(mut self, metric: CorrespondenceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_max_duration(mut self, budget: Duration) -> Self {
        self.max_duration = Some(budget);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_scale_estimation(mut self, estimate_scale: bool) -> Self {
        self.estimate_scale = estimate_scale;
        self
    }

    pub fn with_max_correspondence_distance(mut self, distance: f64) -> Self {
        self.max_correspondence_distance = Some(distance);
        self
    }

    /// Check every field, failing with `InvalidParameter`.
    pub fn validate(&self) -> Result<()> {
        validation::validate_iterations(self.max_iterations)?;
        validation::validate_threshold(self.convergence_threshold)?;
        validation::validate_time_budget(self.max_duration)?;
        validation::validate_correspondence_distance(self.max_correspondence_distance)
    }
}

/// Outcome of an ICP run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcpResult {
    /// Transform mapping moving coordinates into fixed coordinates.
    pub transform: RigidTransform,
    /// Iterations run.
    pub iterations: usize,
    /// Mean squared correspondence distance at `transform`.
    pub mse: f64,
    /// Entry 0 is the MSE at the initial transform, entry `i` the MSE after iteration `i`.
    pub mse_history: Vec<f64>,
    pub converged: bool,
    pub confidence: Confidence,
    /// Fraction of moving points paired at `transform`.
    pub fitness: f64,
    pub warnings: Vec<RegistrationWarning>,
}

impl IcpResult {
    /// Root mean squared correspondence distance.
    pub fn rmse(&self) -> f64 {
        self.mse.sqrt()
    }
}

/// ICP registration engine.
#[derive(Debug, Clone, Default)]
pub struct IcpRegistration {
    config: IcpConfig,
    progress: ProgressTracker,
}

impl IcpRegistration {
    pub fn new(config: IcpConfig) -> Self {
        Self {
            config,
            progress: ProgressTracker::new(),
        }
    }

    /// Report every iteration to `tracker`.
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress = tracker;
        self
    }

    pub fn config(&self) -> &IcpConfig {
        &self.config
    }

    /// Find the transform that moves `moving` onto `fixed`.
    ///
    /// Starts from `initial` when given, identity otherwise. The returned
    /// transform is the lowest-MSE estimate seen during the run.
    ///
    /// # Errors
    /// - `InvalidParameter` for an invalid configuration
    /// - `DegenerateInput` when either mesh has no points, or the fixed mesh
    ///   has no triangles under point-to-surface matching
    /// - `NumericalInstability` on non-finite coordinates or a failed fit
    pub fn register(
        &self,
        moving: &SurfaceMesh,
        fixed: &SurfaceMesh,
        initial: Option<&RigidTransform>,
    ) -> Result<IcpResult> {
        let result = self.register_inner(moving, fixed, initial);
        if let Err(err) = &result {
            self.progress.error(&err.to_string());
        }
        result
    }

    fn register_inner(
        &self,
        moving: &SurfaceMesh,
        fixed: &SurfaceMesh,
        initial: Option<&RigidTransform>,
    ) -> Result<IcpResult> {
        let config = &self.config;
        config.validate()?;
        validation::validate_mesh(moving, "Moving", false)?;
        validation::validate_mesh(
            fixed,
            "Fixed",
            config.metric == CorrespondenceMetric::PointToSurface,
        )?;

        tracing::info!(
            "ICP started: {} moving points, {} fixed points, {} fixed triangles, {:?}",
            moving.num_points(),
            fixed.num_points(),
            fixed.num_triangles(),
            config.metric
        );

        let index: Box<dyn ClosestPointIndex> = match config.metric {
            CorrespondenceMetric::PointToSurface => Box::new(TriangleBvh::build(fixed)),
            CorrespondenceMetric::PointToPoint => Box::new(PointKdTree::build(fixed.points())),
        };
        let checker = ConvergenceChecker::new(config.convergence_threshold, 1).with_min_mse(0.0);
        let start = Instant::now();

        let evaluate = |transform: &RigidTransform| {
            let moved = if config.parallel {
                moving
                    .points()
                    .par_iter()
                    .map(|p| transform.transform_point(p))
                    .collect::<Vec<_>>()
            } else {
                transform.transform_points(moving.points())
            };
            find_correspondences(
                index.as_ref(),
                &moved,
                config.max_correspondence_distance,
                config.parallel,
            )
        };

        let mut current = initial.copied().unwrap_or_default();
        let mut pairs = evaluate(&current);
        let mut warnings = Vec::new();
        let mut confidence = Confidence::Full;

        if pairs.is_empty() {
            tracing::warn!("No correspondences at the initial transform");
            warnings.push(RegistrationWarning::NoCorrespondences { iteration: 0 });
            return Ok(IcpResult {
                transform: current,
                iterations: 0,
                mse: f64::INFINITY,
                mse_history: Vec::new(),
                converged: false,
                confidence,
                fitness: 0.0,
                warnings,
            });
        }

        let mut mse_history = vec![pairs.mse];
        let mut best = (current, pairs.mse, pairs.fitness());
        let mut iterations = 0;
        let mut converged = checker.check_convergence(&mse_history);
        let mut interrupted = false;

        self.progress.start();
        while !converged && iterations < config.max_iterations {
            if let Some(budget) = config.max_duration {
                let elapsed = start.elapsed();
                if elapsed >= budget {
                    tracing::warn!("ICP time budget of {:?} exhausted after {} iterations", budget, iterations);
                    warnings.push(RegistrationWarning::TimeBudgetExhausted { iterations, elapsed });
                    interrupted = true;
                    break;
                }
            }

            let fit = fit_rigid(&pairs.source, &pairs.target, config.estimate_scale)?;
            if fit.translation_only && confidence == Confidence::Full {
                tracing::warn!(
                    "Only {} usable correspondences, fitting translation only",
                    pairs.len()
                );
                confidence = Confidence::Reduced;
                warnings.push(RegistrationWarning::ReducedConfidence {
                    correspondences: pairs.len(),
                });
            }

            iterations += 1;
            let candidate = current.then(&fit.transform);
            let next = evaluate(&candidate);
            if next.is_empty() {
                tracing::warn!("No correspondences at iteration {}, keeping previous transform", iterations);
                warnings.push(RegistrationWarning::NoCorrespondences { iteration: iterations });
                interrupted = true;
                break;
            }
            current = candidate;
            pairs = next;

            mse_history.push(pairs.mse);
            if pairs.mse < best.1 {
                best = (current, pairs.mse, pairs.fitness());
            }
            tracing::debug!(
                "ICP iteration {}: mse {:.6e}, {} pairs, {} rejected",
                iterations,
                pairs.mse,
                pairs.len(),
                pairs.rejected
            );
            self.progress.update_with_metrics(
                iterations,
                Some(config.max_iterations),
                pairs.mse,
                &[
                    ("fitness", pairs.fitness()),
                    ("correspondences", pairs.len() as f64),
                    ("rejected", pairs.rejected as f64),
                ],
            );

            converged = checker.check_convergence(&mse_history);
        }

        if !converged && !interrupted {
            let last_improvement = checker.last_improvement(&mse_history).unwrap_or(0.0);
            tracing::warn!(
                "ICP did not converge after {} iterations (last improvement {:.3e})",
                iterations,
                last_improvement
            );
            warnings.push(RegistrationWarning::ConvergenceWarning {
                iterations,
                last_improvement,
            });
        }

        let (transform, mse, fitness) = best;
        self.progress.complete(iterations, mse);
        tracing::info!(
            "ICP finished: {} iterations, converged: {}, rmse {:.6}, rotation {:.4} rad, translation {:?}",
            iterations,
            converged,
            mse.sqrt(),
            transform.rotation_angle(),
            transform.translation().as_slice()
        );

        Ok(IcpResult {
            transform,
            iterations,
            mse,
            mse_history,
            converged,
            confidence,
            fitness,
            warnings,
        })
    }
}

/// Register with the default configuration.
pub fn register(moving: &SurfaceMesh, fixed: &SurfaceMesh) -> Result<IcpResult> {
    IcpRegistration::default().register(moving, fixed, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistrationError;
    use catreg_core::{Point3, Vector3};

    fn tetra() -> SurfaceMesh {
        SurfaceMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_self_registration_is_identity() {
        let mesh = tetra();
        let result = register(&mesh, &mesh).unwrap();
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert!(result.transform.is_identity(1e-12));
        assert_eq!(result.mse, 0.0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_moving_mesh() {
        let err = register(&SurfaceMesh::empty(), &tetra()).unwrap_err();
        assert!(matches!(err, RegistrationError::DegenerateInput(_)));
    }

    #[test]
    fn test_point_cloud_fixed_needs_point_to_point() {
        let cloud = SurfaceMesh::from_points(tetra().points().to_vec());
        let moved = tetra().transformed(&RigidTransform::from_translation(Vector3::new(0.1, 0.0, 0.0)));

        let err = register(&moved, &cloud).unwrap_err();
        assert!(matches!(err, RegistrationError::DegenerateInput(_)));

        let engine = IcpRegistration::new(IcpConfig::new().with_metric(CorrespondenceMetric::PointToPoint));
        let result = engine.register(&moved, &cloud, None).unwrap();
        assert!(result.converged);
        assert!((result.transform.translation() - Vector3::new(-0.1, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_invalid_config() {
        let engine = IcpRegistration::new(IcpConfig::new().with_max_iterations(0));
        let err = engine.register(&tetra(), &tetra(), None).unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidParameter(_)));
    }

    #[test]
    fn test_single_point_is_reduced_confidence() {
        let moving = SurfaceMesh::from_points(vec![Point3::new(0.5, 0.5, 2.0)]);
        let engine = IcpRegistration::new(IcpConfig::new().with_max_iterations(5));
        let result = engine.register(&moving, &tetra(), None).unwrap();

        assert_eq!(result.confidence, Confidence::Reduced);
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, RegistrationWarning::ReducedConfidence { correspondences: 1 })));
        assert!(result.mse < 1e-20);
    }

    #[test]
    fn test_all_pairs_rejected() {
        let far = tetra().transformed(&RigidTransform::from_translation(Vector3::new(100.0, 0.0, 0.0)));
        let engine = IcpRegistration::new(IcpConfig::new().with_max_correspondence_distance(1.0));
        let result = engine.register(&far, &tetra(), None).unwrap();

        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.warnings, vec![RegistrationWarning::NoCorrespondences { iteration: 0 }]);
    }
}
