//! Debug bundle writer for inspecting a fit and the objective around it.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use rayon::prelude::*;

use crate::app::pipeline::RunOutput;
use crate::domain::SirParams;
use crate::error::AppError;
use crate::fit::{CaseObjective, EstimatorOptions};

/// Multipliers applied to the fitted beta and gamma for the surface scan.
pub const SURFACE_MULTIPLIERS: [f64; 7] = [0.5, 0.75, 0.9, 1.0, 1.1, 1.25, 1.5];

/// One objective evaluation on the scan grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub beta_mult: f64,
    pub gamma_mult: f64,
    /// Deviation at the scaled rates; `+∞` when inadmissible or degenerate.
    pub cost: f64,
}

/// Evaluate the objective on the `(beta, gamma)` multiplier grid, `S` held
/// at its fitted value. Row-major in beta, same order as the multipliers.
pub fn cost_surface(run: &RunOutput, opts: &EstimatorOptions) -> Vec<SurfacePoint> {
    let fit = run.estimate.fit;
    let objective = CaseObjective::new(run.observed.clone(), fit.i0, fit.r0, opts.integrator);

    let grid: Vec<(f64, f64)> = SURFACE_MULTIPLIERS
        .iter()
        .flat_map(|&b| SURFACE_MULTIPLIERS.iter().map(move |&g| (b, g)))
        .collect();

    // Each point is an independent integration (parallel).
    grid.par_iter()
        .map(|&(beta_mult, gamma_mult)| SurfacePoint {
            beta_mult,
            gamma_mult,
            cost: objective.cost(SirParams {
                beta: fit.beta * beta_mult,
                gamma: fit.gamma * gamma_mult,
                s: fit.s,
            }),
        })
        .collect()
}

/// Write a bundle under `./debug/` and return its path.
pub fn write_debug_bundle(run: &RunOutput, opts: &EstimatorOptions) -> Result<PathBuf, AppError> {
    write_debug_bundle_in(Path::new("debug"), run, opts)
}

/// Write a bundle under `dir` and return its path.
pub fn write_debug_bundle_in(dir: &Path, run: &RunOutput, opts: &EstimatorOptions) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(1, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("sir_debug_{}_{ts}.md", file_safe(&run.region)));
    let mut file = File::create(&path)
        .map_err(|e| AppError::new(1, format!("Failed to create debug file: {e}")))?;

    write_bundle(&mut file, run, opts).map_err(|e| AppError::new(1, format!("Failed to write debug: {e}")))?;
    Ok(path)
}

fn write_bundle(out: &mut impl Write, run: &RunOutput, opts: &EstimatorOptions) -> std::io::Result<()> {
    let fit = &run.estimate.fit;
    let diag = &run.estimate.diagnostics;

    writeln!(out, "# sir debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- region: {}", run.region)?;
    writeln!(out, "- observations: {}", run.observed.len())?;
    writeln!(out, "- max_iters: {}", opts.max_iters)?;
    writeln!(
        out,
        "- integrator: rtol={:e}, atol={:e}, max_steps={}",
        opts.integrator.rtol, opts.integrator.atol, opts.integrator.max_steps
    )?;

    writeln!(out, "\n## Fit")?;
    writeln!(out, "| beta | gamma | S | I0 | R0 | R0 (beta/gamma) | deviation | iterations |")?;
    writeln!(out, "| - | - | - | - | - | - | - | - |")?;
    writeln!(
        out,
        "| {:.6} | {:.6} | {:.1} | {} | {} | {:.4} | {:.4} | {} |",
        fit.beta,
        fit.gamma,
        fit.s,
        fit.i0,
        fit.r0,
        fit.r_naught(),
        diag.deviation,
        diag.iterations
    )?;

    writeln!(out, "\n## Observed vs model")?;
    writeln!(out, "| day | observed | S | I | R | I+R |")?;
    writeln!(out, "| - | - | - | - | - | - |")?;
    for (day, &obs) in run.observed.iter().enumerate() {
        let Some(state) = run.projection.state(day) else {
            break;
        };
        writeln!(
            out,
            "| {day} | {obs:.0} | {:.1} | {:.1} | {:.1} | {:.1} |",
            state.s,
            state.i,
            state.r,
            state.i + state.r
        )?;
    }

    writeln!(out, "\n## Objective surface (rows: beta x, columns: gamma x)")?;
    let header: Vec<String> = SURFACE_MULTIPLIERS.iter().map(|g| format!("{g:.2}")).collect();
    writeln!(out, "| beta \\ gamma | {} |", header.join(" | "))?;
    writeln!(out, "| - |{}", " - |".repeat(SURFACE_MULTIPLIERS.len()))?;
    let surface = cost_surface(run, opts);
    for row in surface.chunks(SURFACE_MULTIPLIERS.len()) {
        let Some(first) = row.first() else {
            continue;
        };
        let cells: Vec<String> = row.iter().map(|p| fmt_cost(p.cost)).collect();
        writeln!(out, "| {:.2} | {} |", first.beta_mult, cells.join(" | "))?;
    }

    Ok(())
}

fn fmt_cost(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4e}")
    } else {
        "inf".to_string()
    }
}

fn file_safe(region: &str) -> String {
    region
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}
