//! Tracing subscriber initialisation: structured JSON logs to stdout.

use common::ServiceError;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level when set.
///
/// # Errors
///
/// Returns [`ServiceError::Configuration`] if a subscriber has already been
/// installed for this process.
pub fn init(log_level: &str) -> Result<(), ServiceError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| {
            ServiceError::Configuration(format!("failed to initialise tracing subscriber: {e}"))
        })
}
