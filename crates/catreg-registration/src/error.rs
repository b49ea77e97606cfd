//! Error types for registration operations.
//!
//! Fatal failures are [`RegistrationError`] values. Conditions that still
//! produce a usable transform are reported as [`RegistrationWarning`] values
//! carried inside the result.

use std::time::Duration;

use catreg_core::MeshError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for registration operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// The two catheter sets hold a different number of catheters.
    #[error(
        "Number of reconstructed catheters ({reconstructed}) does not match number of segmented catheters ({segmented})"
    )]
    InputCardinalityMismatch {
        reconstructed: usize,
        segmented: usize,
    },

    /// Input geometry cannot support the requested computation.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Invalid configuration value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical instability detected.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Error while building or combining meshes.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create a degenerate input error.
    pub fn degenerate_input(msg: impl Into<String>) -> Self {
        Self::DegenerateInput(msg.into())
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }
}

/// Non-fatal condition raised during registration.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegistrationWarning {
    /// Iteration cap reached before the MSE settled.
    #[error("Did not converge after {iterations} iterations (last MSE improvement {last_improvement:.3e})")]
    ConvergenceWarning {
        iterations: usize,
        last_improvement: f64,
    },

    /// Wall-clock budget ran out.
    #[error("Time budget exhausted after {iterations} iterations ({elapsed:?})")]
    TimeBudgetExhausted { iterations: usize, elapsed: Duration },

    /// Correspondences did not determine a rotation; only translation was fitted.
    #[error("Only {correspondences} usable correspondences, rotation not estimated")]
    ReducedConfidence { correspondences: usize },

    /// Every correspondence was rejected by the distance limit.
    #[error("No correspondences within the distance limit at iteration {iteration}")]
    NoCorrespondences { iteration: usize },
}
