//! Validation utilities for registration operations.
//!
//! This module provides parameter checks, input geometry checks and the
//! convergence test used by the ICP loop.

use std::time::Duration;

use catreg_core::{Point3, SurfaceMesh};

use crate::error::{RegistrationError, Result};

const MAX_ITERATIONS: usize = 1_000_000;
const MAX_BINS: usize = 1 << 20;

/// Validate iteration count.
pub fn validate_iterations(iterations: usize) -> Result<()> {
    if iterations == 0 {
        return Err(RegistrationError::invalid_parameter(
            "Iterations must be positive",
        ));
    }

    if iterations > MAX_ITERATIONS {
        return Err(RegistrationError::invalid_parameter(format!(
            "Iterations too large: {}",
            iterations
        )));
    }

    Ok(())
}

/// Validate the number of histogram bins.
pub fn validate_bin_count(bin_count: usize) -> Result<()> {
    if bin_count == 0 {
        return Err(RegistrationError::invalid_parameter(
            "Number of bins must be at least 1, got 0",
        ));
    }

    if bin_count > MAX_BINS {
        return Err(RegistrationError::invalid_parameter(format!(
            "Number of bins too large: {}",
            bin_count
        )));
    }

    Ok(())
}

/// Validate the convergence threshold on the MSE decrease.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(RegistrationError::invalid_parameter(format!(
            "Convergence threshold must be finite and non-negative, got {}",
            threshold
        )));
    }
    Ok(())
}

/// Validate an optional wall-clock budget.
pub fn validate_time_budget(budget: Option<Duration>) -> Result<()> {
    match budget {
        Some(d) if d.is_zero() => Err(RegistrationError::invalid_parameter(
            "Time budget must be positive",
        )),
        _ => Ok(()),
    }
}

/// Validate an optional correspondence rejection distance.
pub fn validate_correspondence_distance(distance: Option<f64>) -> Result<()> {
    match distance {
        Some(d) if !d.is_finite() || d <= 0.0 => Err(RegistrationError::invalid_parameter(
            format!("Maximum correspondence distance must be positive, got {}", d),
        )),
        _ => Ok(()),
    }
}

/// Validate that every point coordinate is finite.
pub fn validate_finite(points: &[Point3], what: &str) -> Result<()> {
    if let Some(i) = points.iter().position(|p| !p.iter().all(|v| v.is_finite())) {
        return Err(RegistrationError::numerical_instability(format!(
            "{} point {} has a non-finite coordinate",
            what, i
        )));
    }
    Ok(())
}

/// Validate that `mesh` has points (and triangles when `needs_triangles`).
pub fn validate_mesh(mesh: &SurfaceMesh, what: &str, needs_triangles: bool) -> Result<()> {
    if mesh.num_points() == 0 {
        return Err(RegistrationError::degenerate_input(format!(
            "{} mesh has no points",
            what
        )));
    }
    if needs_triangles && mesh.num_triangles() == 0 {
        return Err(RegistrationError::degenerate_input(format!(
            "{} mesh has no triangles",
            what
        )));
    }
    validate_finite(mesh.points(), what)
}

/// Check for convergence based on MSE history.
#[derive(Debug, Clone)]
pub struct ConvergenceChecker {
    /// MSE decrease below which an iteration counts as stalled.
    pub min_improvement: f64,
    /// Number of consecutive stalled iterations required.
    pub patience: usize,
    /// MSE at or below which the run is converged outright.
    pub min_mse: Option<f64>,
}

impl Default for ConvergenceChecker {
    fn default() -> Self {
        Self {
            min_improvement: 1e-9,
            patience: 1,
            min_mse: None,
        }
    }
}

impl ConvergenceChecker {
    /// Create a new convergence checker.
    pub fn new(min_improvement: f64, patience: usize) -> Self {
        Self {
            min_improvement,
            patience: patience.max(1),
            min_mse: None,
        }
    }

    /// Set minimum MSE threshold.
    pub fn with_min_mse(mut self, min_mse: f64) -> Self {
        self.min_mse = Some(min_mse);
        self
    }

    /// Decrease between the last two samples, `None` with fewer than two.
    pub fn last_improvement(&self, mse_history: &[f64]) -> Option<f64> {
        match mse_history {
            [.., previous, current] => Some(previous - current),
            _ => None,
        }
    }

    /// Check if converged based on MSE history.
    ///
    /// Converged when each of the last `patience` iterations decreased the MSE
    /// by less than `min_improvement`. An increase counts as stalled.
    pub fn check_convergence(&self, mse_history: &[f64]) -> bool {
        let Some(&current) = mse_history.last() else {
            return false;
        };

        if let Some(min_mse) = self.min_mse {
            if current <= min_mse {
                return true;
            }
        }

        // Need at least patience + 1 samples
        if mse_history.len() < self.patience + 1 {
            return false;
        }

        mse_history[mse_history.len() - self.patience - 1..]
            .windows(2)
            .all(|w| w[0] - w[1] < self.min_improvement)
    }
}
