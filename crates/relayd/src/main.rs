//! `relayd` — server binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Assemble the dependency chain: session → engine identity → telemetry → engine.
//! 4. Create the lifecycle owner and install one-shot signal triggers.
//! 5. Build the Axum transport and bind the TCP listener.
//! 6. Attach the engine and serve until a shutdown trigger fires.
//! 7. Run the close sequence (listener drained → engine closed) and exit
//!    with its status code.
//!
//! Steps 3–6 run under the startup guard: any error is logged once at
//! emergency severity and the process exits 1. Shutdown-time close failures
//! also exit 1, but only after the outcome has been logged.

mod bootstrap;
mod config;
mod engine;
mod lifecycle;
mod log;
mod server;
mod session;
mod telemetry;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use common::ServiceError;

use config::Config;
use lifecycle::{ShutdownHandle, ShutdownOutcome};
use log::{LogId, COMPONENT_SERVER};
use server::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging is not yet up; write to stderr directly.
            eprintln!("ERROR: configuration invalid: {e}");
            return ExitCode::FAILURE;
        }
    };

    // -----------------------------------------------------------------------
    // 2. Logging
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init(&cfg.log_level) {
        eprintln!("ERROR: {e}");
        return ExitCode::FAILURE;
    }

    match run(cfg).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            // Startup guard: every fatal path arrives here as exactly one
            // taxonomy member and terminates the process with status 1.
            error!(
                log_id = LogId::ServerStartFailure.code(),
                component = COMPONENT_SERVER,
                severity = "emergency",
                error = %e,
                "Fatal error running server: {e}"
            );
            ExitCode::FAILURE
        }
    }
}

/// Assemble, serve, and shut down; returns the close-sequence outcome.
async fn run(cfg: Config) -> Result<ShutdownOutcome, ServiceError> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.port,
        "relayd starting"
    );

    // -----------------------------------------------------------------------
    // 3. Dependency assembly
    // -----------------------------------------------------------------------
    let deps = bootstrap::assemble(&cfg)?;
    debug!(
        api_base_url = deps.session.api_base_url(),
        telemetry_endpoint = deps.telemetry.endpoint(),
        telemetry_run_id = %deps.telemetry.run_id(),
        "dependency chain assembled"
    );

    // -----------------------------------------------------------------------
    // 4. Lifecycle owner and signal triggers
    // -----------------------------------------------------------------------
    let handle = ShutdownHandle::new();
    lifecycle::register_signal_triggers(&handle);

    // -----------------------------------------------------------------------
    // 5. Transport and listener
    // -----------------------------------------------------------------------
    let state = AppState::new(Arc::clone(&deps.engine), handle.clone());
    let router = server::router::build(state);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServiceError::Bind {
            port: cfg.port,
            source,
        })?;
    info!(
        log_id = LogId::ServerInitialized.code(),
        component = COMPONENT_SERVER,
        addr = %addr,
        "HTTP server listening on port {}",
        cfg.port
    );

    // -----------------------------------------------------------------------
    // 6. Attach the engine and serve
    // -----------------------------------------------------------------------
    deps.engine.connect()?;

    // Resolves on the first shutdown trigger; the listener then stops
    // accepting and lets in-flight requests complete before serve returns.
    let closing = {
        let handle = handle.clone();
        async move { handle.closing().await }
    };
    axum::serve(listener, router)
        .with_graceful_shutdown(closing)
        .await
        .map_err(|e| ServiceError::Shutdown(format!("listener failed: {e}")))?;

    // -----------------------------------------------------------------------
    // 7. Close sequence
    // -----------------------------------------------------------------------
    let engine = Arc::clone(&deps.engine);
    let timeout = Duration::from_secs(cfg.shutdown_timeout_secs);
    Ok(lifecycle::finish(&handle, async move { engine.close().await }, timeout).await)
}
