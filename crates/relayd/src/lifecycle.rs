//! Process lifecycle: the shutdown coordinator and its signal triggers.
//!
//! One [`ShutdownHandle`] is constructed at process entry and owns the only
//! piece of explicitly synchronised state in the system: the tri-state phase
//! flag. Shutdown is exactly-once: the `Running → Closing` transition is a
//! single compare-exchange, so any number of concurrent triggers (signals,
//! explicit requests) collapse into one close sequence. The sequence itself
//! is a plain ordered chain of awaits: the listener stops accepting and
//! drains first, then the engine closes, then the process exits — and the
//! close outcome is always logged before exit.

use std::future::Future;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

use common::ServiceError;

use crate::log::{LogId, COMPONENT_SERVER};

/// Lifecycle phase of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Serving requests.
    Running = 0,
    /// Listener closing / engine close in progress.
    Closing = 1,
    /// Close sequence finished (terminal, success or failure).
    Closed = 2,
}

impl Phase {
    fn from_u8(v: u8) -> Phase {
        match v {
            0 => Phase::Running,
            1 => Phase::Closing,
            _ => Phase::Closed,
        }
    }

    /// Lowercase name used in health responses and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Running => "running",
            Phase::Closing => "closing",
            Phase::Closed => "closed",
        }
    }
}

/// Result of the close sequence, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Engine closed cleanly; exit 0.
    Clean,
    /// Engine close failed or timed out; exit 1.
    Failed,
}

impl ShutdownOutcome {
    /// Process exit status for this outcome.
    pub fn exit_code(self) -> ExitCode {
        match self {
            ShutdownOutcome::Clean => ExitCode::SUCCESS,
            ShutdownOutcome::Failed => ExitCode::FAILURE,
        }
    }
}

struct Inner {
    phase: AtomicU8,
    closing_tx: watch::Sender<bool>,
}

/// Cloneable handle to the process lifecycle owner.
#[derive(Clone)]
pub struct ShutdownHandle {
    inner: Arc<Inner>,
}

impl ShutdownHandle {
    /// Create the lifecycle owner in the `Running` phase.
    pub fn new() -> Self {
        let (closing_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                phase: AtomicU8::new(Phase::Running as u8),
                closing_tx,
            }),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.inner.phase.load(Ordering::SeqCst))
    }

    /// Request shutdown.
    ///
    /// Performs the one-shot `Running → Closing` transition and wakes the
    /// listener's graceful-shutdown future. Returns `true` if this call won
    /// the transition; any trigger arriving while the phase is not `Running`
    /// is a no-op and returns `false`.
    pub fn request(&self, trigger: &str) -> bool {
        let won = self
            .inner
            .phase
            .compare_exchange(
                Phase::Running as u8,
                Phase::Closing as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if won {
            info!(
                log_id = LogId::ServerCloseRequested.code(),
                component = COMPONENT_SERVER,
                trigger,
                "Server close requested"
            );
            self.inner.closing_tx.send_replace(true);
        }
        won
    }

    /// Resolves once the phase has left `Running`.
    ///
    /// This is the future handed to `axum::serve(...).with_graceful_shutdown`:
    /// when it resolves the listener stops accepting new connections and lets
    /// in-flight requests complete.
    pub async fn closing(&self) {
        let mut rx = self.inner.closing_tx.subscribe();
        // The sender lives as long as this handle, so the only way out is a
        // real closing notification.
        let _ = rx.wait_for(|closing| *closing).await;
    }

    fn mark_closed(&self) {
        self.inner.phase.store(Phase::Closed as u8, Ordering::SeqCst);
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Install one-shot shutdown triggers for SIGINT, SIGTERM, and SIGQUIT.
///
/// The signal streams are installed synchronously, so all three dispositions
/// are in place by the time this function returns; only the wait for the
/// first delivery runs in a task. Each task exits after that first delivery.
/// A repeated signal of the same kind therefore finds no waiter and, through
/// the phase flag, would be a no-op anyway.
pub fn register_signal_triggers(handle: &ShutdownHandle) {
    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
        (SignalKind::quit(), "SIGQUIT"),
    ] {
        match signal(kind) {
            Ok(mut sig) => {
                let handle = handle.clone();
                tokio::spawn(async move {
                    sig.recv().await;
                    handle.request(name);
                });
            }
            Err(e) => {
                error!(
                    log_id = LogId::SignalRegisterFailure.code(),
                    component = COMPONENT_SERVER,
                    signal = name,
                    error = %e,
                    "failed to install signal handler"
                );
            }
        }
    }
}

/// Run the final stage of the close sequence.
///
/// Must only be called after the listener future has resolved, i.e. the
/// listener no longer accepts connections and in-flight requests have
/// drained. Awaits `close` (the engine's asynchronous close) under `timeout`
/// (zero = unbounded), logs the outcome, and transitions the phase to
/// `Closed`. Nothing is retried: one failure at any stage is terminal.
pub async fn finish<C>(
    handle: &ShutdownHandle,
    close: C,
    timeout: Duration,
) -> ShutdownOutcome
where
    C: Future<Output = Result<(), ServiceError>>,
{
    let result = if timeout.is_zero() {
        close.await
    } else {
        match tokio::time::timeout(timeout, close).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Shutdown(format!(
                "engine close did not complete within {}s",
                timeout.as_secs()
            ))),
        }
    };

    handle.mark_closed();

    match result {
        Ok(()) => {
            info!(
                log_id = LogId::ServerClosed.code(),
                component = COMPONENT_SERVER,
                "Server closed successfully"
            );
            ShutdownOutcome::Clean
        }
        Err(e) => {
            error!(
                log_id = LogId::ServerCloseFailure.code(),
                component = COMPONENT_SERVER,
                error = %e,
                "Error closing server: {e}"
            );
            ShutdownOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn request_transitions_exactly_once() {
        let handle = ShutdownHandle::new();
        assert_eq!(handle.phase(), Phase::Running);

        assert!(handle.request("SIGTERM"));
        assert_eq!(handle.phase(), Phase::Closing);

        // Second trigger of any kind is a no-op.
        assert!(!handle.request("SIGTERM"));
        assert!(!handle.request("SIGINT"));
        assert_eq!(handle.phase(), Phase::Closing);
    }

    #[tokio::test]
    async fn concurrent_triggers_collapse_to_one() {
        let handle = ShutdownHandle::new();
        let mut wins = Vec::new();
        for name in ["SIGINT", "SIGTERM", "SIGQUIT", "explicit"] {
            let handle = handle.clone();
            wins.push(tokio::spawn(async move { handle.request(name) }));
        }
        let mut won = 0;
        for w in wins {
            if w.await.unwrap() {
                won += 1;
            }
        }
        assert_eq!(won, 1);
    }

    #[tokio::test]
    async fn closing_future_resolves_after_request() {
        let handle = ShutdownHandle::new();

        // Not yet closing: the future must still be pending.
        let pending = tokio::time::timeout(Duration::from_millis(20), handle.closing()).await;
        assert!(pending.is_err());

        handle.request("explicit");
        tokio::time::timeout(Duration::from_secs(1), handle.closing())
            .await
            .expect("closing future should resolve once requested");
    }

    #[tokio::test]
    async fn closing_resolves_even_when_subscribed_late() {
        let handle = ShutdownHandle::new();
        handle.request("explicit");
        // Subscription after the transition must observe it immediately.
        tokio::time::timeout(Duration::from_secs(1), handle.closing())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn signal_after_registration_requests_shutdown() {
        let handle = ShutdownHandle::new();
        register_signal_triggers(&handle);

        // The streams are installed before registration returns, so a signal
        // raised immediately afterwards must be caught.
        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .expect("kill should run");
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), handle.closing())
            .await
            .expect("SIGTERM should request shutdown");
        assert_eq!(handle.phase(), Phase::Closing);
    }

    #[tokio::test]
    async fn finish_success_exits_clean() {
        let handle = ShutdownHandle::new();
        handle.request("SIGTERM");
        let outcome = finish(&handle, async { Ok(()) }, Duration::from_secs(5)).await;
        assert_eq!(outcome, ShutdownOutcome::Clean);
        assert_eq!(handle.phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn finish_failure_exits_nonzero() {
        let handle = ShutdownHandle::new();
        handle.request("SIGTERM");
        let outcome = finish(
            &handle,
            async { Err(ServiceError::Shutdown("sink flush failed".into())) },
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(outcome, ShutdownOutcome::Failed);
        assert_eq!(handle.phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn finish_times_out_a_wedged_close() {
        let handle = ShutdownHandle::new();
        handle.request("SIGTERM");
        let outcome = finish(
            &handle,
            async {
                std::future::pending::<()>().await;
                Ok(())
            },
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(outcome, ShutdownOutcome::Failed);
    }

    #[tokio::test]
    async fn zero_timeout_awaits_unbounded() {
        let handle = ShutdownHandle::new();
        handle.request("SIGTERM");
        let outcome = finish(
            &handle,
            async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(())
            },
            Duration::ZERO,
        )
        .await;
        assert_eq!(outcome, ShutdownOutcome::Clean);
    }

    #[tokio::test]
    async fn listener_drains_before_engine_close() {
        // Pin the ordering contract: the serve future is awaited to
        // completion before finish() ever polls the engine close.
        let handle = ShutdownHandle::new();
        let listener_closed = Arc::new(AtomicBool::new(false));

        handle.request("SIGTERM");

        // Stand-in for the serve future: resolves only once the closing
        // notification fires, the same way the graceful-shutdown listener does.
        {
            let h = handle.clone();
            let flag = Arc::clone(&listener_closed);
            async move {
                h.closing().await;
                flag.store(true, Ordering::SeqCst);
            }
            .await;
        }

        let flag = Arc::clone(&listener_closed);
        let outcome = finish(
            &handle,
            async move {
                assert!(
                    flag.load(Ordering::SeqCst),
                    "engine close started before the listener stopped"
                );
                Ok(())
            },
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(outcome, ShutdownOutcome::Clean);
    }

    #[test]
    fn exit_codes_map_to_outcomes() {
        // ExitCode has no PartialEq; assert via Debug formatting.
        let clean = format!("{:?}", ShutdownOutcome::Clean.exit_code());
        let failed = format!("{:?}", ShutdownOutcome::Failed.exit_code());
        assert_ne!(clean, failed);
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::Running.as_str(), "running");
        assert_eq!(Phase::Closing.as_str(), "closing");
        assert_eq!(Phase::Closed.as_str(), "closed");
    }
}
