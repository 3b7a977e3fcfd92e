//! Objective function: distance between modelled and observed case counts.
//!
//! For trial `(β, γ, S)` and fixed `(I0, R0)` we integrate the SIR system over
//! `len(C)` days and score
//!
//! ```text
//! ‖ (I(t) + R(t)) − C(t) ‖₂      t = 0..len(C)−1
//! ```

use tracing::trace;

use crate::domain::{Compartments, SirParams};
use crate::error::ModelError;
use crate::math::{IntegratorOptions, integrate};

/// Euclidean norm of the residual between predicted `I + R` and `observed`.
pub fn deviation(
    params: SirParams,
    i0: f64,
    r0: f64,
    observed: &[f64],
    opts: &IntegratorOptions,
) -> Result<f64, ModelError> {
    let initial = Compartments::new(params.s, i0, r0);
    let traj = integrate(initial, params.rates(), observed.len(), opts)?;

    let sse: f64 = traj
        .cases()
        .iter()
        .zip(observed)
        .map(|(pred, obs)| (pred - obs).powi(2))
        .sum();

    let dev = sse.sqrt();
    if dev.is_finite() {
        Ok(dev)
    } else {
        Err(ModelError::degenerate("non-finite deviation"))
    }
}

/// The fixed part of the fitting problem: observations plus `I0`, `R0`.
#[derive(Debug, Clone)]
pub struct CaseObjective {
    observed: Vec<f64>,
    i0: f64,
    r0: f64,
    integrator: IntegratorOptions,
}

impl CaseObjective {
    pub fn new(observed: Vec<f64>, i0: f64, r0: f64, integrator: IntegratorOptions) -> Self {
        Self {
            observed,
            i0,
            r0,
            integrator,
        }
    }

    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// Strict evaluation: errors propagate.
    pub fn evaluate(&self, params: SirParams) -> Result<f64, ModelError> {
        deviation(params, self.i0, self.r0, &self.observed, &self.integrator)
    }

    /// Evaluation for use inside a minimizer.
    ///
    /// Inadmissible trial points (non-positive or non-finite parameters) and
    /// points whose integration degenerates score `+∞`, so a simplex moves
    /// away from them. Never returns NaN.
    pub fn cost(&self, params: SirParams) -> f64 {
        if !params.is_admissible() {
            trace!(?params, "inadmissible trial point");
            return f64::INFINITY;
        }
        match self.evaluate(params) {
            Ok(dev) => dev,
            Err(err) => {
                trace!(?params, %err, "trial point rejected");
                f64::INFINITY
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Rates;

    fn synthetic(params: SirParams, i0: f64, days: usize) -> Vec<f64> {
        integrate(
            Compartments::new(params.s, i0, 0.0),
            Rates {
                beta: params.beta,
                gamma: params.gamma,
            },
            days,
            &IntegratorOptions::default(),
        )
        .unwrap()
        .cases()
    }

    const TRUE: SirParams = SirParams {
        beta: 0.4,
        gamma: 0.1,
        s: 10_000.0,
    };

    #[test]
    fn exact_match_scores_zero() {
        let observed = synthetic(TRUE, 5.0, 30);
        let dev = deviation(TRUE, 5.0, 0.0, &observed, &IntegratorOptions::default()).unwrap();
        assert_eq!(dev, 0.0);
    }

    #[test]
    fn mismatch_scores_positive() {
        let observed = synthetic(TRUE, 5.0, 30);
        let other = SirParams { beta: 0.45, ..TRUE };
        let dev = deviation(other, 5.0, 0.0, &observed, &IntegratorOptions::default()).unwrap();
        assert!(dev > 0.0);
    }

    #[test]
    fn constant_offset_gives_expected_norm() {
        // Zero transmission and recovery keep I + R at I0, so the residual
        // against a constant series is the offset times sqrt(n).
        let params = SirParams {
            beta: 0.0,
            gamma: 0.0,
            s: 100.0,
        };
        let observed = vec![13.0; 4];
        let dev = deviation(params, 10.0, 0.0, &observed, &IntegratorOptions::default()).unwrap();
        assert!((dev - 6.0).abs() < 1e-9);
    }

    #[test]
    fn cost_penalizes_inadmissible_points() {
        let objective = CaseObjective::new(vec![1.0, 2.0], 1.0, 0.0, IntegratorOptions::default());
        let bad = SirParams { s: -5.0, ..TRUE };
        assert_eq!(objective.cost(bad), f64::INFINITY);
        assert!(objective.cost(TRUE).is_finite());
    }

    #[test]
    fn degenerate_population_is_an_error_when_strict() {
        let params = SirParams {
            beta: 0.3,
            gamma: 0.1,
            s: 0.0,
        };
        let err = deviation(params, 0.0, 0.0, &[0.0, 0.0], &IntegratorOptions::default())
            .unwrap_err();
        assert!(matches!(err, ModelError::NumericalDegeneracy(_)));
    }
}
