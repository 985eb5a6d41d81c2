//! Externally-authenticated API session context.
//!
//! The session owns the credential tuple {base URL, client id, client secret}.
//! It is validated once at construction, shared by `Arc` for the life of the
//! process, and never mutated afterwards.

use common::ServiceError;

use crate::config::Config;

/// Credential tuple used by the engine to authenticate against the upstream API.
pub struct Session {
    api_base_url: String,
    api_client_id: String,
    api_client_secret: String,
}

impl Session {
    /// Construct a session from the startup configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if any member of the credential
    /// tuple is empty or the base URL is not an http(s) URL. There is no lazy
    /// validation: a session that constructs is usable for the whole process
    /// lifetime.
    pub fn new(cfg: &Config) -> Result<Self, ServiceError> {
        let session = Self {
            api_base_url: cfg.api_base_url.trim().trim_end_matches('/').to_owned(),
            api_client_id: cfg.api_client_id.clone(),
            api_client_secret: cfg.api_client_secret.clone(),
        };
        session.validate()?;
        Ok(session)
    }

    /// Validate the credential tuple, returning a descriptive error on the
    /// first failure.
    fn validate(&self) -> Result<(), ServiceError> {
        if self.api_base_url.is_empty() {
            return Err(ServiceError::Configuration(
                "session requires a non-empty API base URL".into(),
            ));
        }
        if !self.api_base_url.starts_with("http://")
            && !self.api_base_url.starts_with("https://")
        {
            return Err(ServiceError::Configuration(format!(
                "session base URL must be http(s), got: {}",
                self.api_base_url
            )));
        }
        if self.api_client_id.trim().is_empty() {
            return Err(ServiceError::Configuration(
                "session requires a non-empty client id".into(),
            ));
        }
        if self.api_client_secret.trim().is_empty() {
            return Err(ServiceError::Configuration(
                "session requires a non-empty client secret".into(),
            ));
        }
        Ok(())
    }

    /// Normalised base URL (no trailing slash).
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Client id presented to the upstream API.
    pub fn api_client_id(&self) -> &str {
        &self.api_client_id
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret — not even in debug builds.
        f.debug_struct("Session")
            .field("api_base_url", &self.api_base_url)
            .field("api_client_id", &self.api_client_id)
            .field("api_client_secret", &"[REDACTED]")
            .finish()
    }
}
