//! obdx CLI: library crate behind the `obdx` binary.
//!
//! Exposes argument parsing, settings loading, logging setup and the
//! role runner so integration tests can drive them with mock endpoints.

pub mod cli;
pub mod logging;
pub mod run;
pub mod settings;
