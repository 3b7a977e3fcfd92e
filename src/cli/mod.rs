//! Command-line parsing for the SIR parameter estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::DEFAULT_DATA_FILE;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sir",
    version,
    about = "Fit an SIR epidemic model to cumulative case counts"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate beta, gamma and S for a region, print the fit and plot it.
    Fit(FitArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying fit pipeline as `sir fit`, but renders the
    /// compartment and goodness-of-fit charts in a terminal UI using Ratatui.
    Tui(TuiArgs),
    /// Plot a previously exported fit JSON.
    Plot(PlotArgs),
    /// Write a synthetic case file with known parameters.
    Synth(SynthArgs),
}

/// Case data source shared by `fit` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Region whose rows are selected from the case file (exact match).
    #[arg(short = 'r', long, default_value = "china")]
    pub region: String,

    /// Semicolon-delimited case file.
    #[arg(long, env = "SIR_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    /// Iteration cap for the optimizer.
    #[arg(long, default_value_t = 20_000)]
    pub max_iters: u64,
}

/// Options for `sir fit`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub source: DataArgs,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the projected trajectory (t, S, I, R) to CSV.
    #[arg(long = "export-trajectory", value_name = "CSV")]
    pub export_trajectory: Option<PathBuf>,

    /// Export fit, diagnostics, observations and trajectory to JSON.
    #[arg(long = "export-fit", value_name = "JSON")]
    pub export_fit: Option<PathBuf>,

    /// Write a debug bundle (objective surface around the fit) under `debug/`.
    #[arg(long)]
    pub debug: bool,
}

/// Options for `sir tui`.
#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub source: DataArgs,
}

/// Options for plotting a saved fit.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Fit JSON file produced by `sir fit --export-fit`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for `sir synth`.
#[derive(Debug, Args)]
pub struct SynthArgs {
    /// Region name written into every row.
    #[arg(long, default_value = "synthetic")]
    pub region: String,

    /// Number of days to generate.
    #[arg(long, default_value_t = 30)]
    pub days: usize,

    #[arg(long, default_value_t = 0.4)]
    pub beta: f64,

    #[arg(long, default_value_t = 0.1)]
    pub gamma: f64,

    /// Initial susceptible population.
    #[arg(long, default_value_t = 10_000.0)]
    pub s: f64,

    /// Initial infected count.
    #[arg(long, default_value_t = 5.0)]
    pub i0: f64,

    /// Log-scale noise standard deviation (0 = exact model output).
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output case file.
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,
}
