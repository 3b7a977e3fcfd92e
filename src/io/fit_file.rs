//! Read/write fit JSON files.
//!
//! Fit JSON is the "portable" representation of a completed run:
//! - fitted parameters and diagnostics
//! - the observed series the fit was made against
//! - the projected trajectory for quick plotting
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::app::pipeline::RunOutput;
use crate::domain::{FitFile, ObservedSeries};
use crate::error::AppError;

/// Build the portable representation of `run`.
pub fn fit_file_from_run(run: &RunOutput) -> FitFile {
    FitFile {
        tool: "sir".to_string(),
        region: run.region.clone(),
        generated: Utc::now(),
        fit: run.estimate.fit,
        diagnostics: run.estimate.diagnostics,
        observed: ObservedSeries {
            t: run.observed_t(),
            cases: run.observed.clone(),
        },
        trajectory: run.projection.clone(),
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fit: &FitFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(1, format!("Failed to create fit JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, fit)
        .map_err(|e| AppError::new(1, format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(1, format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let fit: FitFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(1, format!("Invalid fit JSON: {e}")))?;
    if fit.observed.t.len() != fit.observed.cases.len() {
        return Err(AppError::new(1, "Invalid fit JSON: observed t and cases differ in length."));
    }
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Compartments, Estimate, FitDiagnostics, FitResult, Trajectory};

    fn sample_run() -> RunOutput {
        let mut projection = Trajectory::default();
        projection.push(0.0, Compartments::new(1000.0, 3.0, 0.0));
        projection.push(1.0, Compartments::new(998.0, 4.0, 1.0));
        RunOutput {
            region: "demo".to_string(),
            observed: vec![3.0],
            estimate: Estimate {
                fit: FitResult {
                    beta: 0.5,
                    gamma: 0.2,
                    s: 1000.0,
                    i0: 3.0,
                    r0: 0.0,
                },
                diagnostics: FitDiagnostics {
                    deviation: 0.25,
                    iterations: 120,
                },
            },
            projection,
        }
    }

    #[test]
    fn saved_fit_reads_back() {
        let fit = fit_file_from_run(&sample_run());
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("fit.json");
        write_fit_json(&path, &fit).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"I0\""));

        let back = read_fit_json(&path).unwrap();
        assert_eq!(back, fit);
        assert_eq!(back.observed.t, vec![0.0]);
    }

    #[test]
    fn garbage_is_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("fit.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(read_fit_json(&path).unwrap_err().exit_code(), 1);
    }
}
