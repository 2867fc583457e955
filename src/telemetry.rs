//! Structured logging setup.
//!
//! Logs go to stderr; stdout carries command output only.

use crate::error::{EconomyError, Result};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Keeps the log subscriber installed for the current thread while alive.
///
/// Tasks spawned through the engine carry the subscriber with them, so no
/// process-wide logger is ever registered.
#[must_use = "logging stops when the guard is dropped"]
pub struct Telemetry {
    _guard: DefaultGuard,
}

/// Installs a formatted subscriber filtered by `filter` (`RUST_LOG` syntax).
pub fn init(filter: &str) -> Result<Telemetry> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| EconomyError::ValidationError(format!("invalid log filter '{filter}': {e}")))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    Ok(Telemetry {
        _guard: tracing::subscriber::set_default(subscriber),
    })
}
