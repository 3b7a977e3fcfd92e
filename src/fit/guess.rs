//! Starting points for the estimator.
//!
//! The optimizer is derivative-free and sensitive to scale. The fixed guess
//! starts from large rates and a susceptible pool that dominates the first
//! observed count. On its own that point sits where `S/N ≈ 1`, the objective
//! is flat in `S`, and the simplex drifts off into the pure-exponential limit.
//! [`start_points`] adds starts whose susceptible pool is measured in units of
//! the observed peak, so at least one simplex begins where `S` is identifiable.

use crate::domain::{InitialGuess, SirParams};

/// Starting transmission rate.
pub const BETA_GUESS: f64 = 10.0;
/// Starting recovery rate.
pub const GAMMA_GUESS: f64 = 10.0;
/// Population scale the susceptible guess is taken from.
pub const POPULATION_SCALE: f64 = 1e9;

/// `(β, γ)` pairs tried with the peak-scaled susceptible pool.
pub const RATE_STARTS: [(f64, f64); 5] = [(1.0, 1.0), (1.0, 0.5), (0.5, 0.5), (0.1, 0.1), (1.0, 0.1)];
/// Peak-scaled starts put `S` at this multiple of the largest observed count.
pub const PEAK_MULTIPLE: f64 = 10.0;

/// Initial guess derived from the first observed case count.
///
/// `I0` is the first count, `R0` is zero, and `S` is the population scale
/// minus the infected so the pool never starts at exactly zero.
pub fn initial_guess(first_case_count: f64) -> InitialGuess {
    InitialGuess {
        beta: BETA_GUESS,
        gamma: GAMMA_GUESS,
        s: POPULATION_SCALE - first_case_count,
        i0: first_case_count,
        r0: 0.0,
    }
}

/// Every start the estimator tries: `guess` first, then one point per
/// [`RATE_STARTS`] pair with `S = PEAK_MULTIPLE × peak`.
///
/// A non-positive or non-finite `peak` is treated as one case.
pub fn start_points(guess: SirParams, peak: f64) -> Vec<SirParams> {
    let peak = if peak.is_finite() && peak >= 1.0 { peak } else { 1.0 };
    let s = PEAK_MULTIPLE * peak;

    std::iter::once(guess)
        .chain(RATE_STARTS.iter().map(|&(beta, gamma)| SirParams { beta, gamma, s }))
        .collect()
}
