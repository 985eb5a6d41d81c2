//! Configuration loading and validation for the relay service.
//!
//! All values are read from environment variables once at startup. The process
//! exits with a clear error message if any required variable is missing or
//! invalid; nothing is mutated after construction.

use common::ServiceError;
use serde::Deserialize;

/// Validated relay service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the upstream API the session authenticates against.
    /// **Required.**
    pub api_base_url: String,

    /// OAuth-style client id for the session. **Required.**
    pub api_client_id: String,

    /// OAuth-style client secret for the session. **Required.**
    pub api_client_secret: String,

    /// TCP port the HTTP listener binds (env `PORT`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether the telemetry sink is active; when false it degrades to a no-op.
    #[serde(default = "default_telemetry_enabled")]
    pub telemetry_enabled: bool,

    /// Capacity of the telemetry event buffer; events beyond it are dropped.
    #[serde(default = "default_telemetry_buffer")]
    pub telemetry_buffer: usize,

    /// Upper bound (seconds) on the engine close during shutdown. `0` disables
    /// the bound, restoring unbounded-close behavior.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    3000
}
fn default_telemetry_enabled() -> bool {
    true
}
fn default_telemetry_buffer() -> usize {
    256
}
fn default_shutdown_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if any required variable is
    /// absent or cannot be parsed.
    pub fn from_env() -> Result<Self, ServiceError> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .map_err(|e| {
                ServiceError::Configuration(format!("failed to read environment: {e}"))
            })?;

        let c: Config = cfg.try_deserialize().map_err(|e| {
            ServiceError::Configuration(format!("failed to deserialise configuration: {e}"))
        })?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<(), ServiceError> {
        ensure_non_empty(&self.api_base_url, "API_BASE_URL")?;
        ensure_non_empty(&self.api_client_id, "API_CLIENT_ID")?;
        ensure_non_empty(&self.api_client_secret, "API_CLIENT_SECRET")?;

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ServiceError::Configuration(
                "API_BASE_URL must be an http(s) URL".into(),
            ));
        }
        if self.port == 0 {
            return Err(ServiceError::Configuration(
                "PORT must be a non-zero TCP port".into(),
            ));
        }
        if self.telemetry_buffer == 0 {
            return Err(ServiceError::Configuration(
                "TELEMETRY_BUFFER must be > 0".into(),
            ));
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Configuration(format!(
            "{name} is required and must not be empty"
        )));
    }
    Ok(())
}
