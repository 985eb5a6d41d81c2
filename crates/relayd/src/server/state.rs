//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::engine::Engine;
use crate::lifecycle::ShutdownHandle;

/// Application state shared across all request handlers.
///
/// Both fields are cheaply cloneable (`Arc`-backed) so Axum can clone the
/// state per request. Handlers only ever read through these references; the
/// engine's close path belongs to the lifecycle owner, not to the transport.
#[derive(Clone)]
pub struct AppState {
    /// The protocol engine behind this transport.
    pub engine: Arc<Engine>,
    /// Lifecycle handle, read for health reporting.
    pub lifecycle: ShutdownHandle,
}

impl AppState {
    /// Create a new [`AppState`] over an engine and a lifecycle handle.
    pub fn new(engine: Arc<Engine>, lifecycle: ShutdownHandle) -> Self {
        Self { engine, lifecycle }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::Config;
    use crate::engine::EngineIdentity;
    use crate::session::Session;
    use crate::telemetry::Telemetry;

    /// State over a freshly assembled engine; connected when `connect` is set.
    pub fn state(connect: bool) -> AppState {
        let cfg = Config {
            api_base_url: "https://api.example.com".into(),
            api_client_id: "id".into(),
            api_client_secret: "secret".into(),
            port: 3000,
            telemetry_enabled: false,
            telemetry_buffer: 8,
            shutdown_timeout_secs: 30,
            log_level: "info".into(),
        };
        let session = Arc::new(Session::new(&cfg).unwrap());
        let telemetry = Telemetry::create(&session, &cfg);
        let engine = Arc::new(Engine::new(
            EngineIdentity {
                name: "relayd",
                version: "0.1.0",
            },
            session,
            telemetry,
        ));
        if connect {
            engine.connect().unwrap();
        }
        AppState::new(engine, ShutdownHandle::new())
    }
}
