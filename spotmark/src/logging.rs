//! Logging initialization for embedders.
//!
//! The engine emits structured `tracing` events and never installs a
//! subscriber on its own. Embedders that do not bring their own subscriber
//! can call [`init_logging`] once at startup for console output filtered
//! through `RUST_LOG`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs a console `tracing` subscriber.
///
/// The filter comes from `RUST_LOG`, defaulting to `info` when unset or
/// unparseable.
///
/// # Errors
///
/// Returns an error message when a global subscriber is already set.
pub fn init_logging() -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // Only this test touches the global dispatcher, so the first call
        // must succeed and the second must report it is already set.
        assert!(init_logging().is_ok());
        assert!(init_logging().is_err());
    }
}
