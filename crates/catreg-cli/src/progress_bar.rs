//! Terminal progress bar for registration iterations.

use anyhow::Result;
use catreg_registration::{ProgressCallback, ProgressInfo};
use indicatif::{ProgressBar, ProgressStyle};

/// Shows ICP iterations on an indicatif bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(max_iterations: usize) -> Result<Self> {
        let bar = ProgressBar::new(max_iterations as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.iteration as u64);
        let fitness = info
            .metrics
            .iter()
            .find(|(name, _)| name == "fitness")
            .map(|&(_, value)| value);
        let message = match fitness {
            Some(fitness) => format!("rmse {:.5} fitness {:.3}", info.mse.sqrt(), fitness),
            None => format!("rmse {:.5}", info.mse.sqrt()),
        };
        self.bar.set_message(message);
    }

    fn on_complete(&self, info: &ProgressInfo) {
        self.bar.finish_with_message(format!(
            "done after {} iterations, rmse {:.5}",
            info.iteration,
            info.mse.sqrt()
        ));
    }

    fn on_error(&self, error: &str) {
        self.bar.abandon_with_message(error.to_string());
    }
}
