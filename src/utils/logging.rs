//! Logger initialization

use crate::Result;
use anyhow::anyhow;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log to stderr so stdout carries only generated commands.
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logger: {}", e))
}
