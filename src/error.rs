//! Error types.
//!
//! Two layers:
//!
//! - [`ModelError`]: failures of the estimation core (data, optimizer, numerics)
//! - [`AppError`]: what the binary reports, carrying the process exit code

/// Error type for the estimation core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Returned when a region has no observations (or the series is empty).
    #[error("found 0 datapoints for region '{region}'")]
    NoDataFound {
        /// Region that was requested.
        region: String,
    },

    /// Returned when the minimizer exhausts its budget without converging.
    #[error("optimization did not converge within {iterations} iterations")]
    OptimizationFailure {
        /// Iterations spent before giving up.
        iterations: u64,
    },

    /// Returned when the model collapses numerically (zero population,
    /// non-finite derivatives, integrator step underflow).
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// Returned for malformed inputs that are not a numerical problem.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ModelError {
    pub fn degenerate(message: impl Into<String>) -> Self {
        ModelError::NumericalDegeneracy(message.into())
    }

    /// Exit code reported by the `sir` binary for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ModelError::InvalidInput(_) => 1,
            ModelError::OptimizationFailure { .. } => 2,
            ModelError::NoDataFound { .. } => 3,
            ModelError::NumericalDegeneracy(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        let message = match &err {
            ModelError::OptimizationFailure { .. } | ModelError::NoDataFound { .. } => {
                format!("{err}, terminating")
            }
            _ => err.to_string(),
        };
        AppError::new(err.exit_code(), message)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
