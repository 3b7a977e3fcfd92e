//! Data sources.
//!
//! - observed case counts from the semicolon-delimited case file (`cases`)
//! - model-generated series with known parameters (`synthetic`)

pub mod cases;
pub mod synthetic;

pub use cases::*;
pub use synthetic::*;
