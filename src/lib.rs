//! `sir-fit` library crate.
//!
//! The binary (`sir`) is a thin wrapper around this library so that:
//!
//! - the estimation core is testable without spawning processes
//! - presentation (report, ASCII plots, TUI, exports) stays swappable
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
