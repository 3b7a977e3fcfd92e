//! Numerical routines: ODE integration.

pub mod ode;

pub use ode::*;
