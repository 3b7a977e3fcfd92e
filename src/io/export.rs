//! Export a projected trajectory to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use crate::domain::Trajectory;
use crate::error::AppError;

/// Write `t,S,I,R,cases` rows for every sample of `trajectory`.
pub fn write_trajectory_csv(path: &Path, trajectory: &Trajectory) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(1, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(["t", "S", "I", "R", "cases"])
        .map_err(|e| AppError::new(1, format!("Failed to write export CSV header: {e}")))?;

    for idx in 0..trajectory.len() {
        let Some(state) = trajectory.state(idx) else {
            break;
        };
        writer
            .write_record([
                format!("{}", trajectory.t[idx]),
                format!("{:.6}", state.s),
                format!("{:.6}", state.i),
                format!("{:.6}", state.r),
                format!("{:.6}", state.i + state.r),
            ])
            .map_err(|e| AppError::new(1, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(1, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
