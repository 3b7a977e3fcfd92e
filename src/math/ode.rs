//! Adaptive Dormand–Prince 5(4) integrator for the SIR system.
//!
//! The solver advances with an embedded error estimate and a classic step-size
//! controller. Trajectories are requested on the integer day grid
//! `0, 1, …, tmax−1`; steps are clipped so each grid point is landed on
//! exactly, so sampled values carry no interpolation error.
//!
//! Implementation choices:
//! - FSAL: the last stage of an accepted step is the first stage of the next.
//! - The initial step depends only on the initial state, never on `tmax`, so a
//!   longer horizon reproduces the samples of a shorter one bit-for-bit.
//! - Any degenerate model evaluation, step underflow, or exhausted step budget
//!   is reported as `NumericalDegeneracy` instead of producing NaNs.

use nalgebra::Vector3;

use crate::domain::{Compartments, Rates, Trajectory};
use crate::error::ModelError;
use crate::models::sir_rates;

// Dormand–Prince tableau. The SIR system is autonomous, so the stage
// times (c_i) never enter the computation.
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights (also row 7 of the tableau).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between 5th- and 4th-order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const ERROR_EXPONENT: f64 = -1.0 / 5.0;
const LANDING_STRETCH: f64 = 1.01;

/// Tolerances and budget for one integration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorOptions {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
    /// Upper bound on attempted steps (accepted + rejected).
    pub max_steps: usize,
}

impl Default for IntegratorOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-6,
            max_steps: 100_000,
        }
    }
}

/// Integrate the SIR system from `initial` and sample at `t = 0..tmax`.
///
/// The returned trajectory has exactly `tmax` samples; `tmax == 0` yields an
/// empty trajectory.
pub fn integrate(
    initial: Compartments,
    rates: Rates,
    tmax: usize,
    opts: &IntegratorOptions,
) -> Result<Trajectory, ModelError> {
    let mut traj = Trajectory::with_capacity(tmax);
    if tmax == 0 {
        return Ok(traj);
    }

    let mut y = initial.to_vector();
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::degenerate("non-finite initial state"));
    }
    traj.push(0.0, initial);
    if tmax == 1 {
        return Ok(traj);
    }

    let f = |y: &Vector3<f64>| sir_rates(y, rates);

    let mut t = 0.0_f64;
    let mut k1 = f(&y)?;
    let mut h = initial_step(&y, &k1, opts);
    let mut steps = 0usize;

    for day in 1..tmax {
        let target = day as f64;

        while t < target {
            steps += 1;
            if steps > opts.max_steps {
                return Err(ModelError::degenerate(format!(
                    "integrator exceeded {} steps before t={target}",
                    opts.max_steps
                )));
            }

            // Clip to the grid point but remember the controller's proposal.
            // Steps within 1% of the remaining distance are stretched so no
            // sliver step is left before the grid point.
            let remaining = target - t;
            let landing = h * LANDING_STRETCH >= remaining;
            let h_step = if landing { remaining } else { h };
            if h_step <= f64::EPSILON * t.abs().max(1.0) {
                return Err(ModelError::degenerate(format!("step size underflow at t={t}")));
            }

            let (y_new, k7, err) = dopri_step(&f, &y, &k1, h_step, opts)?;

            if err <= 1.0 {
                t = if landing { target } else { t + h_step };
                y = y_new;
                k1 = k7;
                let factor = if err == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err.powf(ERROR_EXPONENT)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                // A clipped landing step says nothing about larger steps.
                if !landing || h_step * factor < h {
                    h = h_step * factor;
                }
            } else {
                let factor = (SAFETY * err.powf(ERROR_EXPONENT)).clamp(MIN_FACTOR, 1.0);
                h = h_step * factor;
            }
        }

        traj.push(target, Compartments::from_vector(&y));
    }

    Ok(traj)
}

/// One Dormand–Prince step: returns the 5th-order solution, the FSAL stage,
/// and the scaled RMS error norm (accept when `<= 1`).
fn dopri_step<F>(
    f: &F,
    y: &Vector3<f64>,
    k1: &Vector3<f64>,
    h: f64,
    opts: &IntegratorOptions,
) -> Result<(Vector3<f64>, Vector3<f64>, f64), ModelError>
where
    F: Fn(&Vector3<f64>) -> Result<Vector3<f64>, ModelError>,
{
    let k2 = f(&(y + k1 * (h * A21)))?;
    let k3 = f(&(y + (k1 * A31 + k2 * A32) * h))?;
    let k4 = f(&(y + (k1 * A41 + k2 * A42 + k3 * A43) * h))?;
    let k5 = f(&(y + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h))?;
    let k6 = f(&(y + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h))?;

    let y_new = y + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h;
    let k7 = f(&y_new)?;

    let err_vec = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;

    let mut sum = 0.0;
    for idx in 0..3 {
        let scale = opts.atol + opts.rtol * y[idx].abs().max(y_new[idx].abs());
        let e = err_vec[idx] / scale;
        sum += e * e;
    }
    let err = (sum / 3.0).sqrt();

    if !err.is_finite() {
        return Err(ModelError::degenerate("non-finite integration error estimate"));
    }

    Ok((y_new, k7, err))
}

/// Starting step from the scale of the state and its derivative.
fn initial_step(y: &Vector3<f64>, dy: &Vector3<f64>, opts: &IntegratorOptions) -> f64 {
    let mut d0 = 0.0;
    let mut d1 = 0.0;
    for idx in 0..3 {
        let scale = opts.atol + opts.rtol * y[idx].abs();
        d0 += (y[idx] / scale).powi(2);
        d1 += (dy[idx] / scale).powi(2);
    }
    let d0 = (d0 / 3.0).sqrt();
    let d1 = (d1 / 3.0).sqrt();

    let h = if d0 < 1e-5 || d1 < 1e-5 { 1e-2 } else { 0.01 * d0 / d1 };
    h.clamp(1e-6, 1.0)
}
