//! Command line interface module
//!
//! Argument parsing with clap and the [`Runner`] that wires arguments, the
//! config file and the library together for the `inspect` and `override`
//! subcommands.

pub mod args;
pub mod runner;

pub use args::{Args, Command};
pub use runner::Runner;
