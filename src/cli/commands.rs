//! CLI command definitions

use crate::vm::builder::Stage;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// virtbuilder CLI
#[derive(Parser, Debug)]
#[command(
    name = "virtbuilder",
    version,
    about = "Build and install libvirt VMs from a YAML definition"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory the image is written to and commands run in
    #[arg(long, global = true, env = "VIRTBUILDER_WORKDIR", default_value = ".")]
    pub workdir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Build the image, upload it to the pool and install the VM
    Create {
        /// YAML (or .json) VM definition
        definition: PathBuf,

        /// Run a single stage instead of the whole pipeline
        #[arg(long, value_enum)]
        stage: Option<Stage>,

        /// Print the commands without running them
        #[arg(long)]
        preview: bool,

        /// Do not ask for confirmation before each command
        #[arg(long)]
        no_interactive: bool,
    },

    /// Destroy the VM and delete its storage
    Remove {
        definition: PathBuf,

        /// Print the commands without running them
        #[arg(long)]
        preview: bool,

        /// Do not ask for confirmation before each command
        #[arg(long)]
        no_interactive: bool,
    },

    /// Check a definition file against the schema
    Validate {
        definition: PathBuf,

        /// Also print the definition with defaults filled in
        #[arg(long)]
        dump: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate man page
    ManPage,
}
