//! Axum request handlers for all transport endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use common::protocol::{ErrorResponse, HealthResponse, MessageRequest};
use common::ServiceError;

use crate::lifecycle::Phase;
use super::state::AppState;

/// `POST /message` — dispatch one protocol request to the engine.
///
/// Each request is handled independently; a failure here is mapped to this
/// response only and never reaches the process level.
pub async fn message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Response {
    match state.engine.handle(req) {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => {
            warn!(error = %e, "request failed");
            error_response(&e)
        }
    }
}

/// `GET /health` — liveness and readiness check.
///
/// Returns `200 OK` while the process is running and the engine is attached.
/// Returns `503 Service Unavailable` before connect (`starting`) and for the
/// whole shutdown sequence (`closing`).
pub async fn health(State(state): State<AppState>) -> Response {
    let phase = state.lifecycle.phase();
    let (status_code, status_str) = match (phase, state.engine.is_ready()) {
        (Phase::Running, true) => (StatusCode::OK, "ok"),
        (Phase::Running, false) => (StatusCode::SERVICE_UNAVAILABLE, "starting"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "closing"),
    };

    let body = HealthResponse {
        status: status_str.into(),
        phase: phase.as_str().into(),
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

/// Map a [`ServiceError`] to its wire representation.
fn error_response(e: &ServiceError) -> Response {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse::new(e.wire_code(), e.to_string());
    (status, Json(body)).into_response()
}
