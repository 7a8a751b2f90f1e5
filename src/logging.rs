// ============================================================================
// Logging
// tracing-subscriber setup for binaries and demos
// ============================================================================

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "order_book=info";

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// Returns an error if a global subscriber is already set.
pub fn init() -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .map_err(|err| err.to_string())
}
