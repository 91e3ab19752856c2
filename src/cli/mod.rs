//! Command-line interface for Coffer

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
