//! virtbuilder - VM definitions to virt-builder/virsh/virt-install commands
//!
//! Reads a YAML definition of a VM, validates it, and turns it into the
//! commands that build its disk image, upload it to a libvirt storage pool
//! and install the domain.

pub mod cli;
pub mod config;
pub mod utils;
pub mod vm;

// Re-export commonly used types
pub use cli::commands::Cli;
pub use config::{Definition, ValidationError};
pub use vm::builder::{CommandBuilder, Stage};
pub use vm::command::{JoinMode, ShellCommand};

/// Library error type
pub type Result<T> = anyhow::Result<T>;
