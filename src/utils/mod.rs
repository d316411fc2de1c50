//! Shared helpers

pub mod env;
pub mod logging;
pub mod paths;
pub mod system;
