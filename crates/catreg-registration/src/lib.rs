//! Rigid registration of catheter surfaces.
//!
//! - [`icp`]: iterative closest point registration between two surfaces
//! - [`histogram`]: directed distance histogram after alignment
//! - [`pipeline`]: the reconstructed-to-segmented catheter workflow

pub mod error;
pub mod histogram;
pub mod icp;
pub mod pipeline;
pub mod progress;
pub mod validation;

pub use error::{RegistrationError, RegistrationWarning, Result};
pub use histogram::{analyze, mean_distance, DistanceHistogram, DistanceHistogramAnalyzer, HistogramBin};
pub use icp::{Confidence, CorrespondenceMetric, IcpConfig, IcpRegistration, IcpResult};
pub use pipeline::{CatheterRegistration, CatheterRegistrationReport, PipelineConfig};
pub use progress::{ConsoleProgressCallback, HistoryCallback, ProgressCallback, ProgressInfo, ProgressTracker};
pub use validation::ConvergenceChecker;
