//! Command line interface

pub mod actions;
pub mod commands;
pub mod completions;

pub use commands::{Cli, Cmd};
