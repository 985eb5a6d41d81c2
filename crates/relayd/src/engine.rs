//! The protocol engine: the request/response core behind the transport.
//!
//! The engine is bound to a name/version identity at construction, attached to
//! the transport exactly once via [`Engine::connect`], and torn down exactly
//! once via [`Engine::close`] by the shutdown sequence. Request handling is
//! stateless: every call to [`Engine::handle`] is independent and safe to run
//! concurrently with any other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;

use common::protocol::{MessageRequest, MessageResponse};
use common::ServiceError;

use crate::session::Session;
use crate::telemetry::sink::TelemetryEvent;
use crate::telemetry::Telemetry;

/// Name/version identity the engine reports for itself.
#[derive(Debug, Clone)]
pub struct EngineIdentity {
    pub name: &'static str,
    pub version: &'static str,
}

impl EngineIdentity {
    /// Identity taken from the crate package metadata.
    pub fn from_package() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Stateless protocol server.
///
/// Shared via `Arc` between the transport (which only calls
/// [`handle`](Self::handle)) and the shutdown sequence (the only caller of
/// [`close`](Self::close)).
#[derive(Debug)]
pub struct Engine {
    identity: EngineIdentity,
    session: Arc<Session>,
    telemetry: Arc<Telemetry>,
    ready: AtomicBool,
}

impl Engine {
    /// Build an engine over an authenticated session and a telemetry sink.
    ///
    /// The engine starts detached: requests are refused until
    /// [`connect`](Self::connect) runs.
    pub fn new(
        identity: EngineIdentity,
        session: Arc<Session>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            identity,
            session,
            telemetry,
            ready: AtomicBool::new(false),
        }
    }

    /// One-time attach behind the transport; flips the engine into serving
    /// state and reports the start event.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if called more than once —
    /// a wiring bug caught by the startup guard.
    pub fn connect(&self) -> Result<(), ServiceError> {
        if self
            .ready
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ServiceError::Configuration(
                "engine connected twice".into(),
            ));
        }
        self.telemetry.emit(TelemetryEvent::ServerStarted {
            name: self.identity.name.to_owned(),
            version: self.identity.version.to_owned(),
        });
        Ok(())
    }

    /// Whether the engine is currently accepting requests.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Handle one request.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Unavailable`] before connect or after close.
    /// - [`ServiceError::Request`] for an unknown method. Both are scoped to
    ///   this request's response; neither reaches the process level.
    pub fn handle(&self, req: MessageRequest) -> Result<MessageResponse, ServiceError> {
        if !self.is_ready() {
            return Err(ServiceError::Unavailable(
                "engine is not accepting requests".into(),
            ));
        }

        let result = match req.method.as_str() {
            "ping" => json!({ "pong": true }),
            "echo" => req.params.clone(),
            "server/info" => json!({
                "name": self.identity.name,
                "version": self.identity.version,
                "api_base_url": self.session.api_base_url(),
            }),
            other => {
                return Err(ServiceError::Request(format!("unknown method: {other}")));
            }
        };

        self.telemetry.emit(TelemetryEvent::Request {
            method: req.method,
        });

        Ok(MessageResponse {
            result,
            id: req.id,
        })
    }

    /// Asynchronous close: stop accepting requests, then flush the telemetry
    /// sink.
    ///
    /// Only the shutdown sequence calls this, and only once.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Shutdown`] if the sink flush fails.
    pub async fn close(&self) -> Result<(), ServiceError> {
        self.ready.store(false, Ordering::SeqCst);
        self.telemetry.emit(TelemetryEvent::ServerClosing);
        self.telemetry.close().await
    }
}
