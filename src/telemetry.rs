//! Logging setup.
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them install a subscriber once at startup with [`init_tracing`].
//! The filter comes from `RUST_LOG` and defaults to `info`.

use crate::error::{Result, StreamError};
use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing() -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .try_init()
    .map_err(|e| StreamError::Config(format!("failed to install tracing subscriber: {e}")))
}
