//! Command generation and execution

pub mod builder;
pub mod command;
pub mod executor;
