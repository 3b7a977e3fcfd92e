//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the estimation code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::FitResult;
use crate::report::DayResidual;

/// Format the run summary: data, fitted parameters, fit quality.
pub fn format_run_summary(run: &RunOutput) -> String {
    let fit = &run.estimate.fit;
    let diag = &run.estimate.diagnostics;
    let last = run.observed.last().copied().unwrap_or(0.0);

    let mut out = String::new();
    out.push_str("=== sir - SIR parameter estimate ===\n");
    out.push_str(&format!("Region: {}\n", run.region));
    out.push_str(&format!(
        "Data: n={} days | cases=[{:.0}, {:.0}]\n",
        run.observed.len(),
        run.observed.first().copied().unwrap_or(0.0),
        last
    ));
    out.push('\n');
    out.push_str(&format_fit(fit));
    out.push_str(&format!("\nR0 (beta/gamma): {:.4}\n", fit.r_naught()));
    out.push_str(&format!(
        "Deviation ||(I+R) - C||: {:.4} | iterations: {}\n",
        diag.deviation, diag.iterations
    ));

    if let (Some(peak_day), Some(peak)) = (peak_day(&run.projection.i), run.projection.i.iter().copied().reduce(f64::max)) {
        out.push_str(&format!(
            "Projection: {} days | peak infected {:.0} on day {}\n",
            run.projection.len(),
            peak,
            peak_day
        ));
    }

    out
}

/// The fitted parameter set, one `key: value` per line.
pub fn format_fit(fit: &FitResult) -> String {
    format!(
        "{{   'beta': {},\n    'gamma': {},\n    'S': {},\n    'I0': {},\n    'R0': {}}}\n",
        fit.beta, fit.gamma, fit.s, fit.i0, fit.r0
    )
}

/// Format the largest absolute daily residuals.
pub fn format_residual_table(residuals: &[DayResidual], top_n: usize) -> String {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.residual
            .abs()
            .partial_cmp(&a.residual.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = String::new();
    out.push_str("Largest daily residuals (observed - predicted):\n");
    out.push_str(&format!("{:>5} {:>12} {:>12} {:>12}\n", "day", "observed", "predicted", "residual"));
    for r in sorted.iter().take(top_n) {
        out.push_str(&format!(
            "{:>5} {:>12.0} {:>12.1} {:>12.1}\n",
            r.day, r.observed, r.predicted, r.residual
        ));
    }
    out
}

fn peak_day(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_block_lists_all_parameters() {
        let fit = FitResult {
            beta: 0.5,
            gamma: 0.25,
            s: 1000.0,
            i0: 3.0,
            r0: 0.0,
        };
        let txt = format_fit(&fit);
        let expected = concat!(
            "{   'beta': 0.5,\n",
            "    'gamma': 0.25,\n",
            "    'S': 1000,\n",
            "    'I0': 3,\n",
            "    'R0': 0}\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn residual_table_orders_by_magnitude() {
        let rows = vec![
            DayResidual { day: 0, observed: 5.0, predicted: 5.0, residual: 0.0 },
            DayResidual { day: 1, observed: 9.0, predicted: 12.0, residual: -3.0 },
            DayResidual { day: 2, observed: 20.0, predicted: 19.0, residual: 1.0 },
        ];
        let txt = format_residual_table(&rows, 2);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].trim_start().starts_with('1'));
        assert!(lines[3].trim_start().starts_with('2'));
    }

    #[test]
    fn peak_day_finds_maximum() {
        assert_eq!(peak_day(&[1.0, 4.0, 2.0]), Some(1));
        assert_eq!(peak_day(&[]), None);
    }
}
