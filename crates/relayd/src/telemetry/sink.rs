//! [`Telemetry`]: fire-and-forget event sink with a flush handshake on close.
//!
//! The sink must never get in the way of serving requests. `emit` is a
//! non-blocking `try_send`; a full buffer or a stopped drain task silently
//! drops the event. Construction cannot fail: when telemetry is disabled the
//! sink degrades to a no-op. The only fallible operation is
//! [`Telemetry::close`], which drains buffered events before the process exits.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use common::ServiceError;

use crate::config::Config;
use crate::log::{LogId, COMPONENT_TELEMETRY};
use crate::session::Session;

/// Events the lifecycle shell and engine report to the sink.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Engine connected and serving.
    ServerStarted { name: String, version: String },
    /// One request dispatched through the transport.
    Request { method: String },
    /// Shutdown sequence entered.
    ServerClosing,
}

/// Shared telemetry sink.
///
/// Cheap to share via `Arc`; all mutation happens behind short-lived locks or
/// inside the drain task.
#[derive(Debug)]
pub struct Telemetry {
    /// Random per-process id attached to every delivered event batch.
    run_id: Uuid,
    /// Upstream endpoint events are attributed to, derived from the session.
    endpoint: String,
    enabled: bool,
    tx: Mutex<Option<mpsc::Sender<TelemetryEvent>>>,
    drain: Mutex<Option<JoinHandle<usize>>>,
}

impl Telemetry {
    /// Create the sink from the session and startup configuration.
    ///
    /// Never fails: when `telemetry_enabled` is false no drain task is
    /// spawned and every [`emit`](Self::emit) is a no-op. Reachability of the
    /// endpoint is irrelevant at construction time; delivery problems only
    /// ever cost events, not startup.
    pub fn create(session: &Session, cfg: &Config) -> Arc<Self> {
        let run_id = Uuid::new_v4();
        let endpoint = format!("{}/telemetry/events", session.api_base_url());
        let origin = session.api_client_id().to_owned();

        if !cfg.telemetry_enabled {
            return Arc::new(Self {
                run_id,
                endpoint,
                enabled: false,
                tx: Mutex::new(None),
                drain: Mutex::new(None),
            });
        }

        let (tx, rx) = mpsc::channel(cfg.telemetry_buffer);
        let drain = tokio::spawn(drain_task(rx, run_id, endpoint.clone(), origin));

        Arc::new(Self {
            run_id,
            endpoint,
            enabled: true,
            tx: Mutex::new(Some(tx)),
            drain: Mutex::new(Some(drain)),
        })
    }

    /// Per-process run id.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Endpoint events are attributed to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Queue an event without blocking.
    ///
    /// Dropped silently when the sink is disabled, already closed, or the
    /// buffer is full.
    pub fn emit(&self, event: TelemetryEvent) {
        let guard = self.tx.lock().expect("telemetry sender lock poisoned");
        if let Some(tx) = guard.as_ref() {
            let _ = tx.try_send(event);
        }
    }

    /// Stop accepting events and wait for the drain task to flush the buffer.
    ///
    /// Called exactly once, by the shutdown sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Shutdown`] if the sink was already closed or
    /// the drain task aborted.
    pub async fn close(&self) -> Result<(), ServiceError> {
        if !self.enabled {
            return Ok(());
        }

        let handle = {
            // Dropping the sender closes the channel; the drain task exits
            // once the buffer is empty.
            let mut tx = self.tx.lock().expect("telemetry sender lock poisoned");
            let mut drain = self.drain.lock().expect("telemetry drain lock poisoned");
            tx.take();
            match drain.take() {
                Some(handle) => handle,
                None => {
                    return Err(ServiceError::Shutdown(
                        "telemetry sink already closed".into(),
                    ))
                }
            }
        };

        let delivered = handle
            .await
            .map_err(|e| ServiceError::Shutdown(format!("telemetry drain task failed: {e}")))?;
        info!(
            log_id = LogId::TelemetryDrained.code(),
            component = COMPONENT_TELEMETRY,
            delivered,
            "telemetry sink drained"
        );
        Ok(())
    }
}

/// Consume events until the channel closes, returning the delivered count.
async fn drain_task(
    mut rx: mpsc::Receiver<TelemetryEvent>,
    run_id: Uuid,
    endpoint: String,
    origin: String,
) -> usize {
    let mut delivered = 0usize;
    while let Some(event) = rx.recv().await {
        // Delivery semantics live upstream; here each event is recorded in
        // its wire shape, attributed to the run, endpoint, and client.
        let payload = serde_json::to_value(&event).unwrap_or(serde_json::Value::Null);
        debug!(
            component = COMPONENT_TELEMETRY,
            run_id = %run_id,
            endpoint = %endpoint,
            origin = %origin,
            event = %payload,
            "telemetry event"
        );
        delivered += 1;
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(enabled: bool) -> Config {
        Config {
            api_base_url: "https://api.example.com".into(),
            api_client_id: "id".into(),
            api_client_secret: "secret".into(),
            port: 3000,
            telemetry_enabled: enabled,
            telemetry_buffer: 8,
            shutdown_timeout_secs: 30,
            log_level: "info".into(),
        }
    }

    fn session() -> Session {
        Session::new(&cfg(true)).unwrap()
    }

    #[tokio::test]
    async fn disabled_sink_is_noop_and_closes_clean() {
        let t = Telemetry::create(&session(), &cfg(false));
        t.emit(TelemetryEvent::ServerClosing);
        assert!(t.close().await.is_ok());
    }

    #[tokio::test]
    async fn close_flushes_buffered_events() {
        let t = Telemetry::create(&session(), &cfg(true));
        t.emit(TelemetryEvent::Request {
            method: "ping".into(),
        });
        t.emit(TelemetryEvent::ServerClosing);
        assert!(t.close().await.is_ok());
    }

    #[tokio::test]
    async fn emit_after_close_is_dropped_not_panicking() {
        let t = Telemetry::create(&session(), &cfg(true));
        t.close().await.unwrap();
        t.emit(TelemetryEvent::ServerClosing);
    }

    #[tokio::test]
    async fn second_close_fails() {
        let t = Telemetry::create(&session(), &cfg(true));
        t.close().await.unwrap();
        let err = t.close().await.unwrap_err();
        assert!(matches!(err, ServiceError::Shutdown(_)));
    }

    #[tokio::test]
    async fn full_buffer_drops_instead_of_blocking() {
        let mut c = cfg(true);
        c.telemetry_buffer = 1;
        let t = Telemetry::create(&session(), &c);
        // Far more events than capacity; emit must never block or error.
        for _ in 0..64 {
            t.emit(TelemetryEvent::ServerClosing);
        }
        assert!(t.close().await.is_ok());
    }

    #[test]
    fn events_serialise_with_kind_tags() {
        let started = serde_json::to_value(TelemetryEvent::ServerStarted {
            name: "relayd".into(),
            version: "0.1.0".into(),
        })
        .unwrap();
        assert_eq!(started["kind"], "server_started");
        assert_eq!(started["name"], "relayd");

        let request = serde_json::to_value(TelemetryEvent::Request {
            method: "ping".into(),
        })
        .unwrap();
        assert_eq!(request["kind"], "request");

        let closing = serde_json::to_value(TelemetryEvent::ServerClosing).unwrap();
        assert_eq!(closing["kind"], "server_closing");
    }

    #[tokio::test]
    async fn endpoint_derives_from_session() {
        let t = Telemetry::create(&session(), &cfg(false));
        assert_eq!(t.endpoint(), "https://api.example.com/telemetry/events");
    }
}
