//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during estimation
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Compartment sizes at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Compartments {
    /// Susceptible.
    pub s: f64,
    /// Infected.
    pub i: f64,
    /// Recovered or removed.
    pub r: f64,
}

impl Compartments {
    pub fn new(s: f64, i: f64, r: f64) -> Self {
        Self { s, i, r }
    }

    /// Total population `N = S + I + R`.
    pub fn total(&self) -> f64 {
        self.s + self.i + self.r
    }

    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.s, self.i, self.r)
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Flow rates of the SIR model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    /// Transmission rate (S -> I).
    pub beta: f64,
    /// Recovery rate (I -> R).
    pub gamma: f64,
}

/// The three quantities the estimator searches over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SirParams {
    pub beta: f64,
    pub gamma: f64,
    /// Initial susceptible pool.
    pub s: f64,
}

impl SirParams {
    pub fn rates(&self) -> Rates {
        Rates {
            beta: self.beta,
            gamma: self.gamma,
        }
    }

    /// All parameters finite and strictly positive.
    pub fn is_admissible(&self) -> bool {
        [self.beta, self.gamma, self.s]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Starting point for the optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialGuess {
    pub beta: f64,
    pub gamma: f64,
    pub s: f64,
    pub i0: f64,
    pub r0: f64,
}

impl InitialGuess {
    pub fn params(&self) -> SirParams {
        SirParams {
            beta: self.beta,
            gamma: self.gamma,
            s: self.s,
        }
    }
}

/// Full parameter set needed to reproduce a fitted trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub beta: f64,
    pub gamma: f64,
    #[serde(rename = "S")]
    pub s: f64,
    #[serde(rename = "I0")]
    pub i0: f64,
    #[serde(rename = "R0")]
    pub r0: f64,
}

impl FitResult {
    pub fn params(&self) -> SirParams {
        SirParams {
            beta: self.beta,
            gamma: self.gamma,
            s: self.s,
        }
    }

    pub fn rates(&self) -> Rates {
        self.params().rates()
    }

    /// State at t = 0.
    pub fn initial_state(&self) -> Compartments {
        Compartments::new(self.s, self.i0, self.r0)
    }

    /// Basic reproduction number `beta / gamma`.
    pub fn r_naught(&self) -> f64 {
        self.beta / self.gamma
    }
}

/// How the estimator got to its result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Euclidean norm of `(I + R) - C` at the fitted parameters.
    pub deviation: f64,
    /// Minimizer iterations.
    pub iterations: u64,
}

/// Estimator output: parameters plus diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub fit: FitResult,
    pub diagnostics: FitDiagnostics,
}

/// Compartment values sampled on the integer day grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub s: Vec<f64>,
    pub i: Vec<f64>,
    pub r: Vec<f64>,
}

impl Trajectory {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            t: Vec::with_capacity(n),
            s: Vec::with_capacity(n),
            i: Vec::with_capacity(n),
            r: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, t: f64, state: Compartments) {
        self.t.push(t);
        self.s.push(state.s);
        self.i.push(state.i);
        self.r.push(state.r);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn state(&self, idx: usize) -> Option<Compartments> {
        Some(Compartments::new(
            *self.s.get(idx)?,
            *self.i.get(idx)?,
            *self.r.get(idx)?,
        ))
    }

    /// Model analogue of cumulative confirmed cases: `I(t) + R(t)`.
    pub fn cases(&self) -> Vec<f64> {
        self.i.iter().zip(&self.r).map(|(i, r)| i + r).collect()
    }
}

/// Resolved settings for one `sir fit` run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub region: String,
    pub data_path: PathBuf,
    pub max_iters: u64,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_trajectory: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
    pub debug: bool,
}

/// Observed case series as stored in a fit file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedSeries {
    pub t: Vec<f64>,
    pub cases: Vec<f64>,
}

/// Portable JSON representation of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub region: String,
    pub generated: chrono::DateTime<chrono::Utc>,
    pub fit: FitResult,
    pub diagnostics: FitDiagnostics,
    pub observed: ObservedSeries,
    pub trajectory: Trajectory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cases_sum_infected_and_recovered() {
        let mut traj = Trajectory::with_capacity(2);
        traj.push(0.0, Compartments::new(90.0, 10.0, 0.0));
        traj.push(1.0, Compartments::new(80.0, 15.0, 5.0));
        assert_eq!(traj.cases(), vec![10.0, 20.0]);
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.state(1), Some(Compartments::new(80.0, 15.0, 5.0)));
        assert_eq!(traj.state(2), None);
    }

    #[test]
    fn fit_result_serializes_with_short_keys() {
        let fit = FitResult {
            beta: 0.4,
            gamma: 0.1,
            s: 1e4,
            i0: 5.0,
            r0: 0.0,
        };
        let json = serde_json::to_value(fit).unwrap();
        assert_eq!(json["S"], 1e4);
        assert_eq!(json["I0"], 5.0);
        assert!((fit.r_naught() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn admissibility_rejects_non_positive() {
        let ok = SirParams { beta: 0.1, gamma: 0.1, s: 1.0 };
        assert!(ok.is_admissible());
        assert!(!SirParams { s: 0.0, ..ok }.is_admissible());
        assert!(!SirParams { beta: f64::NAN, ..ok }.is_admissible());
    }
}
