//! SIR rate equations.
//!
//! ```text
//! N  = S + I + R
//! dS = -β·I·S/N
//! dI =  β·I·S/N − γ·I
//! dR =  γ·I
//! ```
//!
//! The total `N` is conserved by construction (the three derivatives sum to 0).

use nalgebra::Vector3;

use crate::domain::Rates;
use crate::error::ModelError;

/// Evaluate `(dS, dI, dR)` at `state = (S, I, R)`.
///
/// Returns `NumericalDegeneracy` when the population is zero or non-finite,
/// or when the derivative itself is not finite.
pub fn sir_rates(state: &Vector3<f64>, rates: Rates) -> Result<Vector3<f64>, ModelError> {
    let (s, i, r) = (state[0], state[1], state[2]);
    let n = s + i + r;
    if !n.is_finite() {
        return Err(ModelError::degenerate(format!(
            "non-finite population (S={s}, I={i}, R={r})"
        )));
    }
    if n == 0.0 {
        return Err(ModelError::degenerate("total population is zero"));
    }

    let infection = rates.beta * i * s / n;
    let recovery = rates.gamma * i;
    let d = Vector3::new(-infection, infection - recovery, recovery);

    if d.iter().all(|v| v.is_finite()) {
        Ok(d)
    } else {
        Err(ModelError::degenerate("non-finite SIR derivative"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RATES: Rates = Rates { beta: 0.5, gamma: 0.2 };

    #[test]
    fn derivative_matches_rate_law() {
        let d = sir_rates(&Vector3::new(900.0, 100.0, 0.0), RATES).unwrap();
        // β·I·S/N = 0.5 · 100 · 900 / 1000 = 45
        assert_relative_eq!(d[0], -45.0);
        assert_relative_eq!(d[1], 45.0 - 20.0);
        assert_relative_eq!(d[2], 20.0);
    }

    #[test]
    fn derivatives_sum_to_zero() {
        let d = sir_rates(&Vector3::new(1234.5, 67.8, 9.1), RATES).unwrap();
        assert!((d[0] + d[1] + d[2]).abs() < 1e-12);
    }

    #[test]
    fn zero_infected_is_stationary() {
        let d = sir_rates(&Vector3::new(1000.0, 0.0, 10.0), RATES).unwrap();
        assert_eq!(d, Vector3::zeros());
    }

    #[test]
    fn zero_population_is_degenerate() {
        let err = sir_rates(&Vector3::zeros(), RATES).unwrap_err();
        assert!(matches!(err, ModelError::NumericalDegeneracy(_)));
    }

    #[test]
    fn nan_state_is_degenerate() {
        let err = sir_rates(&Vector3::new(f64::NAN, 1.0, 0.0), RATES).unwrap_err();
        assert!(matches!(err, ModelError::NumericalDegeneracy(_)));
    }
}
