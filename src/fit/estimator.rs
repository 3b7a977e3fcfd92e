//! Parameter estimation driver.
//!
//! Responsibilities:
//!
//! - validate the observed series (empty -> `NoDataFound`)
//! - build the initial guess and the fixed objective
//! - run a [`Minimizer`] over `(β, γ, S)` holding `I0`, `R0` fixed
//! - accept only a declared convergence; anything else is `OptimizationFailure`
//!
//! The default minimizer is argmin's Nelder-Mead simplex run in log-space
//! `(ln β, ln γ, ln S)`, restarted from every [`start_points`] entry by
//! [`MultiStart`]. Positivity is built in and the population scale no longer
//! dwarfs the rates in the simplex.

use argmin::core::{CostFunction, Error, Executor, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{Estimate, FitDiagnostics, FitResult, SirParams};
use crate::error::ModelError;
use crate::fit::guess::{initial_guess, start_points};
use crate::fit::objective::CaseObjective;
use crate::math::IntegratorOptions;

/// Settings for one estimation run.
#[derive(Debug, Clone)]
pub struct EstimatorOptions {
    /// Iteration budget for the minimizer.
    pub max_iters: u64,
    /// Integrator tolerances used by every objective evaluation.
    pub integrator: IntegratorOptions,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            max_iters: 20_000,
            integrator: IntegratorOptions::default(),
        }
    }
}

/// Best point found by a minimizer that declared convergence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    pub params: SirParams,
    pub cost: f64,
    pub iterations: u64,
}

/// A derivative-free minimization strategy over `(β, γ, S)`.
///
/// Implementations must return `OptimizationFailure` when they stop for any
/// reason other than their own convergence criterion.
pub trait Minimizer {
    fn minimize(
        &self,
        objective: &CaseObjective,
        start: SirParams,
        max_iters: u64,
    ) -> Result<Minimum, ModelError>;
}

/// Nelder-Mead simplex (argmin) in log-parameter space.
#[derive(Debug, Clone)]
pub struct NelderMeadMinimizer {
    /// Converged when the sample standard deviation of the simplex costs
    /// drops below this value.
    pub sd_tolerance: f64,
    /// Offset (in log units) of each extra simplex vertex from the start.
    pub simplex_step: f64,
}

impl Default for NelderMeadMinimizer {
    fn default() -> Self {
        Self {
            sd_tolerance: 1e-6,
            simplex_step: 0.5,
        }
    }
}

impl NelderMeadMinimizer {
    fn initial_simplex(&self, start: SirParams) -> Vec<Vec<f64>> {
        let x0 = to_log(start);
        let mut vertices = vec![x0.clone()];
        for i in 0..x0.len() {
            let mut vertex = x0.clone();
            vertex[i] += self.simplex_step;
            vertices.push(vertex);
        }
        vertices
    }
}

impl Minimizer for NelderMeadMinimizer {
    fn minimize(
        &self,
        objective: &CaseObjective,
        start: SirParams,
        max_iters: u64,
    ) -> Result<Minimum, ModelError> {
        let solver = NelderMead::new(self.initial_simplex(start))
            .with_sd_tolerance(self.sd_tolerance)
            .map_err(|e| ModelError::InvalidInput(format!("Failed to set sd_tolerance: {e}")))?;

        debug!(
            max_iters,
            sd_tolerance = self.sd_tolerance,
            simplex_step = self.simplex_step,
            "running Nelder-Mead"
        );

        let problem = LogSpaceProblem {
            objective: objective.clone(),
        };
        let result = Executor::new(problem, solver)
            .configure(|state| state.max_iters(max_iters))
            .run()
            .map_err(|e| ModelError::degenerate(format!("Optimization failed: {e}")))?;

        let state = result.state();
        let iterations = state.iter;

        let converged = matches!(
            state.termination_status,
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
        );
        if !converged {
            debug!(status = ?state.termination_status, "minimizer stopped without converging");
            return Err(ModelError::OptimizationFailure { iterations });
        }

        let best = state
            .best_param
            .as_ref()
            .ok_or(ModelError::OptimizationFailure { iterations })?;

        Ok(Minimum {
            params: from_log(best),
            cost: state.best_cost,
            iterations,
        })
    }
}

/// Runs `inner` from the given start and from each peak-scaled start, and
/// keeps the converged minimum with the lowest cost.
///
/// Starts run in parallel; ties go to the earlier start, so the result does
/// not depend on scheduling. Fails with the first start's error only when no
/// start converges.
#[derive(Debug, Clone, Default)]
pub struct MultiStart<M> {
    pub inner: M,
}

impl<M: Minimizer + Sync> Minimizer for MultiStart<M> {
    fn minimize(
        &self,
        objective: &CaseObjective,
        start: SirParams,
        max_iters: u64,
    ) -> Result<Minimum, ModelError> {
        let peak = objective.observed().iter().copied().fold(0.0, f64::max);
        let starts = start_points(start, peak);

        let runs: Vec<Result<Minimum, ModelError>> = starts
            .par_iter()
            .map(|&p| self.inner.minimize(objective, p, max_iters))
            .collect();

        let mut best: Option<Minimum> = None;
        let mut first_err: Option<ModelError> = None;
        for (index, run) in runs.into_iter().enumerate() {
            match run {
                Ok(m) => {
                    debug!(index, cost = m.cost, iterations = m.iterations, "start converged");
                    if best.is_none_or(|b| m.cost < b.cost) {
                        best = Some(m);
                    }
                }
                Err(err) => {
                    debug!(index, %err, "start failed");
                    first_err.get_or_insert(err);
                }
            }
        }

        best.ok_or_else(|| first_err.unwrap_or(ModelError::OptimizationFailure { iterations: 0 }))
    }
}

/// Adapter exposing the objective to argmin over `(ln β, ln γ, ln S)`.
struct LogSpaceProblem {
    objective: CaseObjective,
}

impl CostFunction for LogSpaceProblem {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.objective.cost(from_log(param)))
    }
}

fn to_log(p: SirParams) -> Vec<f64> {
    vec![p.beta.ln(), p.gamma.ln(), p.s.ln()]
}

fn from_log(x: &[f64]) -> SirParams {
    SirParams {
        beta: x[0].exp(),
        gamma: x[1].exp(),
        s: x[2].exp(),
    }
}

/// Estimate `(β, γ, S)` with multi-start Nelder-Mead.
pub fn estimate(observed: &[f64], opts: &EstimatorOptions) -> Result<Estimate, ModelError> {
    estimate_with(observed, opts, &MultiStart::<NelderMeadMinimizer>::default())
}

/// Estimate `(β, γ, S)` with an explicit minimization strategy.
pub fn estimate_with<M: Minimizer>(
    observed: &[f64],
    opts: &EstimatorOptions,
    minimizer: &M,
) -> Result<Estimate, ModelError> {
    let Some(&first) = observed.first() else {
        return Err(ModelError::NoDataFound {
            region: "<empty series>".to_string(),
        });
    };
    if observed.iter().any(|c| !c.is_finite()) {
        return Err(ModelError::degenerate("observed series contains non-finite values"));
    }

    let guess = initial_guess(first);
    let objective = CaseObjective::new(observed.to_vec(), guess.i0, guess.r0, opts.integrator);

    info!(
        n = observed.len(),
        i0 = guess.i0,
        "estimating SIR parameters"
    );

    let minimum = minimizer.minimize(&objective, guess.params(), opts.max_iters)?;

    // Re-score strictly: a converged point must integrate cleanly.
    let deviation = objective.evaluate(minimum.params)?;

    let fit = FitResult {
        beta: minimum.params.beta,
        gamma: minimum.params.gamma,
        s: minimum.params.s,
        i0: guess.i0,
        r0: guess.r0,
    };

    info!(
        beta = fit.beta,
        gamma = fit.gamma,
        s = fit.s,
        deviation,
        iterations = minimum.iterations,
        "fit converged"
    );

    Ok(Estimate {
        fit,
        diagnostics: FitDiagnostics {
            deviation,
            iterations: minimum.iterations,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Compartments, Rates};
    use crate::math::integrate;
    use approx::assert_relative_eq;

    fn synthetic_cases() -> Vec<f64> {
        integrate(
            Compartments::new(10_000.0, 5.0, 0.0),
            Rates {
                beta: 0.4,
                gamma: 0.1,
            },
            30,
            &IntegratorOptions::default(),
        )
        .unwrap()
        .cases()
    }

    #[test]
    fn empty_series_is_no_data() {
        struct Unreachable;
        impl Minimizer for Unreachable {
            fn minimize(&self, _: &CaseObjective, _: SirParams, _: u64) -> Result<Minimum, ModelError> {
                panic!("optimizer must not run on empty input");
            }
        }

        let err = estimate_with(&[], &EstimatorOptions::default(), &Unreachable).unwrap_err();
        assert!(matches!(err, ModelError::NoDataFound { .. }));
    }

    #[test]
    fn non_finite_series_is_degenerate() {
        let err = estimate(&[1.0, f64::NAN], &EstimatorOptions::default()).unwrap_err();
        assert!(matches!(err, ModelError::NumericalDegeneracy(_)));
    }

    #[test]
    fn recovers_known_parameters_from_noise_free_series() {
        let observed = synthetic_cases();
        let est = estimate(&observed, &EstimatorOptions::default()).unwrap();
        assert_relative_eq!(est.fit.beta, 0.4, max_relative = 0.05);
        assert_relative_eq!(est.fit.gamma, 0.1, max_relative = 0.05);
        assert_relative_eq!(est.fit.s, 10_000.0, max_relative = 0.05);
        assert_eq!(est.fit.i0, 5.0);
        assert_eq!(est.fit.r0, 0.0);
        assert!(est.diagnostics.deviation < 0.01 * observed[observed.len() - 1]);
    }

    #[test]
    fn recovers_slower_epidemic_in_larger_population() {
        let observed = integrate(
            Compartments::new(1e6, 10.0, 0.0),
            Rates {
                beta: 0.3,
                gamma: 0.15,
            },
            60,
            &IntegratorOptions::default(),
        )
        .unwrap()
        .cases();

        let est = estimate(&observed, &EstimatorOptions::default()).unwrap();
        assert_relative_eq!(est.fit.beta, 0.3, max_relative = 0.05);
        assert_relative_eq!(est.fit.gamma, 0.15, max_relative = 0.05);
        assert!(est.diagnostics.deviation < 0.01 * observed[observed.len() - 1]);
    }

    #[test]
    fn multi_start_never_scores_worse_than_fixed_guess() {
        let observed = synthetic_cases();
        let opts = EstimatorOptions::default();
        let multi = estimate(&observed, &opts).unwrap();
        if let Ok(single) = estimate_with(&observed, &opts, &NelderMeadMinimizer::default()) {
            assert!(multi.diagnostics.deviation <= single.diagnostics.deviation);
        }
    }

    #[test]
    fn multi_start_keeps_lowest_converged_cost() {
        use std::sync::Mutex;

        // Converges only from the peak-scaled starts, cost falling with beta.
        struct Recording(Mutex<Vec<SirParams>>);
        impl Minimizer for Recording {
            fn minimize(&self, _: &CaseObjective, start: SirParams, _: u64) -> Result<Minimum, ModelError> {
                self.0.lock().unwrap().push(start);
                if start.beta >= 10.0 {
                    return Err(ModelError::OptimizationFailure { iterations: 7 });
                }
                Ok(Minimum {
                    params: start,
                    cost: start.beta,
                    iterations: 1,
                })
            }
        }

        let objective = CaseObjective::new(vec![5.0, 50.0], 5.0, 0.0, IntegratorOptions::default());
        let strategy = MultiStart {
            inner: Recording(Mutex::new(Vec::new())),
        };
        let best = strategy.minimize(&objective, initial_guess(5.0).params(), 100).unwrap();

        assert_eq!(strategy.inner.0.lock().unwrap().len(), 6);
        assert_eq!(best.params.beta, 0.1);
        assert_eq!(best.params.s, 500.0);
    }

    #[test]
    fn tiny_budget_fails_instead_of_returning_partial_result() {
        let opts = EstimatorOptions {
            max_iters: 3,
            ..EstimatorOptions::default()
        };
        let err = estimate(&synthetic_cases(), &opts).unwrap_err();
        assert!(matches!(err, ModelError::OptimizationFailure { .. }));
    }

    #[test]
    fn no_converged_start_reports_first_failure() {
        struct Never;
        impl Minimizer for Never {
            fn minimize(&self, _: &CaseObjective, start: SirParams, _: u64) -> Result<Minimum, ModelError> {
                Err(ModelError::OptimizationFailure {
                    iterations: start.beta as u64,
                })
            }
        }

        let objective = CaseObjective::new(vec![5.0], 5.0, 0.0, IntegratorOptions::default());
        let err = MultiStart { inner: Never }
            .minimize(&objective, initial_guess(5.0).params(), 10)
            .unwrap_err();
        assert!(matches!(err, ModelError::OptimizationFailure { iterations: 10 }));
    }

    #[test]
    fn strategy_result_is_passed_through() {
        struct Fixed;
        impl Minimizer for Fixed {
            fn minimize(&self, _: &CaseObjective, _: SirParams, _: u64) -> Result<Minimum, ModelError> {
                Ok(Minimum {
                    params: SirParams {
                        beta: 0.4,
                        gamma: 0.1,
                        s: 10_000.0,
                    },
                    cost: 0.0,
                    iterations: 1,
                })
            }
        }

        let est = estimate_with(&synthetic_cases(), &EstimatorOptions::default(), &Fixed).unwrap();
        assert_eq!(est.fit.beta, 0.4);
        assert_eq!(est.diagnostics.deviation, 0.0);
        assert_eq!(est.diagnostics.iterations, 1);
    }

    #[test]
    fn log_space_round_trips_parameters() {
        let p = SirParams {
            beta: 0.25,
            gamma: 0.05,
            s: 1e6,
        };
        let back = from_log(&to_log(p));
        assert_relative_eq!(back.beta, p.beta, max_relative = 1e-12);
        assert_relative_eq!(back.s, p.s, max_relative = 1e-12);
    }
}
