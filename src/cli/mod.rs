//! Command-line interface for parsec-ci
//!
//! - `args`: clap argument definitions
//! - `run`: entry point, configuration, and error output

pub mod args;
mod run;

pub use args::Cli;
pub use run::run;
