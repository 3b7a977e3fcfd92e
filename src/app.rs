//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the case file and runs the estimator
//! - prints reports/plots
//! - writes optional exports and the debug bundle

use clap::Parser;
use clap::error::ErrorKind;
use tracing::info;

use crate::cli::{Cli, Command, FitArgs, PlotArgs, SynthArgs, TuiArgs};
use crate::data::{SyntheticConfig, generate_cases, write_case_file};
use crate::domain::RunConfig;
use crate::error::AppError;
use crate::fit::EstimatorOptions;
use crate::plot::{AsciiPlot, PlotSink};

pub mod pipeline;

/// Number of residual rows shown under the summary.
const RESIDUAL_ROWS: usize = 5;

/// Entry point for the `sir` binary.
pub fn run() -> Result<(), AppError> {
    run_with_args(std::env::args().collect())
}

/// Same as [`run`] with an explicit argv (first element is the program name).
pub fn run_with_args(argv: Vec<String>) -> Result<(), AppError> {
    // `.env` only provides defaults; a missing file is normal.
    let _ = dotenvy::dotenv();

    // We want `sir` and `sir -r italy` to behave like `sir fit ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(argv);
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return Ok(());
        }
        // Clap's own exit code (2) would collide with "did not converge".
        Err(err) => return Err(AppError::new(1, err.to_string().trim_end())),
    };

    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Tui(args) => handle_tui(args),
        Command::Plot(args) => handle_plot(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let opts = EstimatorOptions {
        max_iters: config.max_iters,
        ..EstimatorOptions::default()
    };
    let run = pipeline::run_fit(&config.data_path, &config.region, &opts)?;

    println!("{}", crate::report::format_run_summary(&run));
    let residuals = crate::report::compute_residuals(&run.observed, &run.projection)?;
    println!("{}", crate::report::format_residual_table(&residuals, RESIDUAL_ROWS));

    if config.plot {
        let sink = AsciiPlot::new(config.plot_width, config.plot_height);
        for panel in sink.compartments(&run.projection) {
            println!("{panel}");
        }
        println!(
            "{}",
            sink.goodness_of_fit(&run.projection, &run.observed_t(), &run.observed)
        );
    }

    // Optional exports.
    if let Some(path) = &config.export_trajectory {
        crate::io::write_trajectory_csv(path, &run.projection)?;
        info!(path = %path.display(), "trajectory exported");
    }
    if let Some(path) = &config.export_fit {
        crate::io::write_fit_json(path, &crate::io::fit_file_from_run(&run))?;
        info!(path = %path.display(), "fit exported");
    }
    if config.debug {
        let path = crate::debug::write_debug_bundle(&run, &opts)?;
        eprintln!("Debug bundle written to {}", path.display());
    }

    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let fit = crate::io::read_fit_json(&args.fit)?;

    println!("Region: {} | generated {}", fit.region, fit.generated.to_rfc3339());
    println!("{}", crate::report::format_fit(&fit.fit));

    let sink = AsciiPlot::new(args.width, args.height);
    for panel in sink.compartments(&fit.trajectory) {
        println!("{panel}");
    }
    println!(
        "{}",
        sink.goodness_of_fit(&fit.trajectory, &fit.observed.t, &fit.observed.cases)
    );
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = SyntheticConfig {
        days: args.days,
        beta: args.beta,
        gamma: args.gamma,
        s: args.s,
        i0: args.i0,
        noise: args.noise,
        seed: args.seed,
    };
    let cases = generate_cases(&config)?;
    write_case_file(&args.out, &args.region, &cases)?;

    println!(
        "Wrote {} days for region '{}' to {}",
        cases.len(),
        args.region,
        args.out.display()
    );
    Ok(())
}

pub fn run_config_from_args(args: &FitArgs) -> RunConfig {
    RunConfig {
        region: args.source.region.clone(),
        data_path: args.source.data.clone(),
        max_iters: args.source.max_iters,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_trajectory: args.export_trajectory.clone(),
        export_fit: args.export_fit.clone(),
        debug: args.debug,
    }
}

/// Rewrite argv so `sir` defaults to `sir fit`.
///
/// Rules:
/// - `sir`                      -> `sir fit`
/// - `sir -r italy ...`         -> `sir fit -r italy ...`
/// - `sir --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "tui" | "plot" | "synth");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "fit flags".
    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_becomes_fit() {
        assert_eq!(rewrite_args(args(&["sir"])), args(&["sir", "fit"]));
        assert_eq!(
            rewrite_args(args(&["sir", "-r", "italy"])),
            args(&["sir", "fit", "-r", "italy"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(args(&["sir", "--help"])), args(&["sir", "--help"]));
        assert_eq!(
            rewrite_args(args(&["sir", "synth", "--out", "x"])),
            args(&["sir", "synth", "--out", "x"])
        );
    }

    #[test]
    fn invalid_arguments_exit_with_one() {
        let err = run_with_args(args(&["sir", "fit", "--max-iters", "many"])).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn missing_data_file_exits_with_one() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let missing = dir.path().join("absent.csv");
        let err = run_with_args(args(&[
            "sir",
            "fit",
            "--no-plot",
            "--data",
            missing.to_str().unwrap(),
        ]))
        .unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn config_follows_flags() {
        let cli = Cli::try_parse_from(["sir", "fit", "--no-plot", "--debug", "--width", "60"]).unwrap();
        let Command::Fit(fit) = cli.command else {
            panic!("expected fit");
        };
        let config = run_config_from_args(&fit);
        assert!(!config.plot);
        assert!(config.debug);
        assert_eq!(config.plot_width, 60);
    }
}
