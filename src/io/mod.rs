//! File I/O for run results.
//!
//! - `export`: projected trajectory as CSV (spreadsheet-friendly)
//! - `fit_file`: portable fit JSON, re-read by `sir plot`

pub mod export;
pub mod fit_file;

pub use export::*;
pub use fit_file::*;
