//! Compartmental model definitions.
//!
//! Models are implemented as small, pure functions so that integration and
//! estimation code can stay generic.

pub mod sir;

pub use sir::*;
