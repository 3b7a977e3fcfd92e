//! Synthetic case series generated from the SIR model itself.
//!
//! Used by `sir synth` to produce a case file with known parameters, and by
//! tests that check parameter recovery. Noise is multiplicative and
//! log-normal; the noisy series is made cumulative again (running maximum)
//! and rounded to whole cases so it looks like reported data.

use std::fs::File;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{Compartments, Rates};
use crate::error::AppError;
use crate::math::{IntegratorOptions, integrate};

/// Settings for one synthetic series.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub days: usize,
    pub beta: f64,
    pub gamma: f64,
    pub s: f64,
    pub i0: f64,
    /// Log-scale noise standard deviation (0 = noise-free, unrounded).
    pub noise: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            days: 30,
            beta: 0.4,
            gamma: 0.1,
            s: 10_000.0,
            i0: 5.0,
            noise: 0.0,
            seed: 42,
        }
    }
}

/// Generate the `I + R` series for `config`.
pub fn generate_cases(config: &SyntheticConfig) -> Result<Vec<f64>, AppError> {
    if config.days == 0 {
        return Err(AppError::new(1, "Synthetic series needs at least one day."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(1, "Noise level must be finite and >= 0."));
    }

    let traj = integrate(
        Compartments::new(config.s, config.i0, 0.0),
        Rates {
            beta: config.beta,
            gamma: config.gamma,
        },
        config.days,
        &IntegratorOptions::default(),
    )?;
    let clean = traj.cases();

    if config.noise == 0.0 {
        return Ok(clean);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(1, format!("Noise distribution error: {e}")))?;

    let mut running = 0.0_f64;
    let noisy = clean
        .iter()
        .map(|&c| {
            let z: f64 = normal.sample(&mut rng);
            running = running.max((c * z.exp()).round());
            running
        })
        .collect();

    Ok(noisy)
}

/// Write `cases` for `region` in the loader's semicolon format.
pub fn write_case_file(path: &Path, region: &str, cases: &[f64]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(1, format!("Failed to create case file '{}': {e}", path.display())))?;
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);

    writer
        .write_record(["region", "day", "cases"])
        .map_err(|e| AppError::new(1, format!("Failed to write case file header: {e}")))?;
    for (day, value) in cases.iter().enumerate() {
        writer
            .write_record([region.to_string(), day.to_string(), value.to_string()])
            .map_err(|e| AppError::new(1, format!("Failed to write case file row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(1, format!("Failed to flush case file: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cases::load_region_cases;

    #[test]
    fn noise_free_series_starts_at_i0() {
        let cases = generate_cases(&SyntheticConfig::default()).unwrap();
        assert_eq!(cases.len(), 30);
        assert_eq!(cases[0], 5.0);
        assert!(cases.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn noisy_series_is_cumulative_and_reproducible() {
        let config = SyntheticConfig {
            noise: 0.1,
            seed: 7,
            ..SyntheticConfig::default()
        };
        let a = generate_cases(&config).unwrap();
        let b = generate_cases(&config).unwrap();
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[1] >= w[0]));
        assert!(a.iter().all(|v| v.fract() == 0.0));
    }

    #[test]
    fn zero_days_is_rejected() {
        let config = SyntheticConfig {
            days: 0,
            ..SyntheticConfig::default()
        };
        assert_eq!(generate_cases(&config).unwrap_err().exit_code(), 1);
    }

    #[test]
    fn written_file_loads_back() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("cases.csv");
        let cases = vec![5.0, 7.0, 12.0];
        write_case_file(&path, "demo", &cases).unwrap();

        let loaded = load_region_cases(&path, "demo").unwrap();
        assert_eq!(loaded, cases);
    }
}
