//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - compartment state and rate parameters (`Compartments`, `Rates`, `SirParams`)
//! - estimator inputs/outputs (`InitialGuess`, `FitResult`, `Estimate`)
//! - sampled trajectories (`Trajectory`) and run configuration (`RunConfig`)

pub mod types;

pub use types::*;
