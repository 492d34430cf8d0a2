//! # lib-types
//!
//! Core type definitions shared by the IBIS parsing crates.
//!
//! - Physical units with compile-time safety (volts, amps, degrees Celsius)
//! - Process corners and per-corner storage

pub mod units;
pub mod corner;

pub use units::*;
pub use corner::*;
