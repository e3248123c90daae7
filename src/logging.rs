//! Logging setup shared by consumers of this crate.
//!
//! Embedding applications call [`init_logging`] once at startup; the crate
//! itself only emits `tracing` events.

use tracing_subscriber::EnvFilter;

use crate::Result;
use crate::error::DbProbeError;

/// Initializes structured logging based on verbosity level.
///
/// A `RUST_LOG` environment filter, when set, takes precedence over the
/// verbosity flags.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
///
/// # Errors
/// Returns a configuration error if a global subscriber is already set.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| {
            DbProbeError::configuration(format!("failed to initialize logging: {e}"))
        })?;

    Ok(())
}
