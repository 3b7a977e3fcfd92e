//! Reporting utilities: per-day residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::Trajectory;
use crate::error::AppError;

/// Observed vs. modelled cumulative cases on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayResidual {
    pub day: usize,
    pub observed: f64,
    pub predicted: f64,
    /// `observed - predicted`.
    pub residual: f64,
}

/// Compare `observed` against `I + R` of `trajectory` day by day.
///
/// The trajectory may be longer than the observations (forward projection);
/// it must not be shorter.
pub fn compute_residuals(observed: &[f64], trajectory: &Trajectory) -> Result<Vec<DayResidual>, AppError> {
    if trajectory.len() < observed.len() {
        return Err(AppError::new(
            4,
            format!(
                "Trajectory has {} samples but {} observations were given.",
                trajectory.len(),
                observed.len()
            ),
        ));
    }

    let predicted = trajectory.cases();
    let mut out = Vec::with_capacity(observed.len());
    for (day, (&obs, &pred)) in observed.iter().zip(&predicted).enumerate() {
        if !pred.is_finite() {
            return Err(AppError::new(4, "Non-finite model prediction during residual computation."));
        }
        out.push(DayResidual {
            day,
            observed: obs,
            predicted: pred,
            residual: obs - pred,
        });
    }
    Ok(out)
}
