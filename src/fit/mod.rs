//! Parameter estimation.
//!
//! Responsibilities:
//!
//! - starting point for the optimizer (`guess`)
//! - the scalar objective comparing modelled and observed cases (`objective`)
//! - the minimizer strategy and the estimation driver (`estimator`)

pub mod estimator;
pub mod guess;
pub mod objective;

pub use estimator::*;
pub use guess::*;
pub use objective::*;
