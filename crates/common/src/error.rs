//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Every failure in the process maps to exactly one variant before it is
/// logged, so the exit code and HTTP status of any error are decided here and
/// nowhere else:
/// - [`ServiceError::Configuration`] → startup fatal, exit 1
/// - [`ServiceError::Bind`] → startup fatal, exit 1
/// - [`ServiceError::Request`] → scoped to one request, HTTP 400
/// - [`ServiceError::Unavailable`] → scoped to one request, HTTP 503
/// - [`ServiceError::Shutdown`] → close-sequence fatal, exit 1
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Startup configuration is missing or malformed.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The listener could not bind its TCP port.
    #[error("failed to bind listener on port {port}: {source}")]
    Bind {
        /// Port the bind was attempted on.
        port: u16,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// A single request was malformed — unknown method or invalid params.
    #[error("bad request: {0}")]
    Request(String),

    /// The engine is not ready to serve — before connect or while closing.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The close sequence failed; reported once, then the process exits 1.
    #[error("shutdown failure: {0}")]
    Shutdown(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    ///
    /// Fatal variants never reach a response path in practice; they map to
    /// 500 so a bug that routes one outward is still a well-formed reply.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::Request(_) => 400,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Configuration(_)
            | ServiceError::Bind { .. }
            | ServiceError::Shutdown(_) => 500,
        }
    }

    /// Short machine-readable code used in wire error bodies.
    pub fn wire_code(&self) -> &'static str {
        match self {
            ServiceError::Request(_) => "bad_request",
            ServiceError::Unavailable(_) => "service_unavailable",
            ServiceError::Configuration(_)
            | ServiceError::Bind { .. }
            | ServiceError::Shutdown(_) => "internal_error",
        }
    }

    /// Whether this error must terminate the process.
    ///
    /// Request-scoped errors are recovered inside the transport; everything
    /// else exits with status 1.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ServiceError::Request(_) | ServiceError::Unavailable(_)
        )
    }
}
