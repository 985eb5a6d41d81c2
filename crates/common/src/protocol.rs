//! Request and response types exchanged between the transport and the engine.
//!
//! All envelopes are JSON. The shape is deliberately minimal: a method name,
//! free-form params, and an optional caller correlation id that is echoed back
//! untouched. The service is stateless — nothing in these types identifies a
//! session or a prior request.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    /// Name of the operation to invoke (e.g. `"ping"`, `"server/info"`).
    pub method: String,

    /// Operation parameters; interpretation is up to the method.
    #[serde(default)]
    pub params: serde_json::Value,

    /// Optional caller-chosen correlation id, echoed back in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// Successful response body for `POST /message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Method-specific result value.
    pub result: serde_json::Value,

    /// Correlation id copied from the request, if one was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"`, `"starting"`, or `"closing"`.
    pub status: String,
    /// Current lifecycle phase: `"running"`, `"closing"`, or `"closed"`.
    pub phase: String,
}
