//! Shared "fit pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! case file -> estimation -> forward projection over twice the observed horizon
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::Path;

use tracing::info;

use crate::data::load_region_cases;
use crate::domain::{Estimate, FitResult, Trajectory};
use crate::error::{AppError, ModelError};
use crate::fit::{EstimatorOptions, estimate};
use crate::math::{IntegratorOptions, integrate};

/// Projection horizon as a multiple of the observed length.
pub const PROJECTION_FACTOR: usize = 2;

/// All computed outputs of a single `sir fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub region: String,
    pub observed: Vec<f64>,
    pub estimate: Estimate,
    pub projection: Trajectory,
}

impl RunOutput {
    /// Day index for each observation.
    pub fn observed_t(&self) -> Vec<f64> {
        (0..self.observed.len()).map(|d| d as f64).collect()
    }
}

/// Execute the full pipeline for `region` from the case file at `path`.
pub fn run_fit(path: &Path, region: &str, opts: &EstimatorOptions) -> Result<RunOutput, AppError> {
    let observed = load_region_cases(path, region)?;
    run_fit_with_cases(region, observed, opts)
}

/// Execute the pipeline with an already-loaded series.
pub fn run_fit_with_cases(
    region: &str,
    observed: Vec<f64>,
    opts: &EstimatorOptions,
) -> Result<RunOutput, AppError> {
    let estimate = estimate(&observed, opts).map_err(|err| match err {
        ModelError::NoDataFound { .. } => ModelError::NoDataFound {
            region: region.to_string(),
        },
        other => other,
    })?;

    let tmax = PROJECTION_FACTOR * observed.len();
    let projection = project(&estimate.fit, tmax, &opts.integrator)?;
    info!(region, tmax, "forward projection done");

    Ok(RunOutput {
        region: region.to_string(),
        observed,
        estimate,
        projection,
    })
}

/// Simulate the fitted model from day 0 over `tmax` days.
pub fn project(fit: &FitResult, tmax: usize, opts: &IntegratorOptions) -> Result<Trajectory, ModelError> {
    integrate(fit.initial_state(), fit.rates(), tmax, opts)
}
