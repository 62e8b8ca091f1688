//! Override document generation
//!
//! Takes the images found by [`crate::detect::Detector`], picks a target
//! registry for each (explicit mapping first, then the configured default),
//! renames the repository with a [`PathStrategy`] and writes the result into a
//! fresh values tree at the same path, keeping the original shape.

pub mod format;
pub mod generator;
pub mod strategy;

pub use format::{OutputFormat, helm_set_lines, render};
pub use generator::{OverrideFailure, OverrideFile, OverrideGenerator, Relocation};
pub use strategy::{Flat, PathStrategy, PrefixSourceRegistry, strategy_from_name};
