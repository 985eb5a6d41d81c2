//! Stable numeric identifiers for lifecycle log events.
//!
//! Every lifecycle log line carries a `log_id` and a `component` field so that
//! downstream log pipelines can match on codes instead of message text.
//! Message wording may change; codes never do.

/// Identifiers for the lifecycle events the shell emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LogId {
    /// Listener bound and accepting connections.
    ServerInitialized = 1_000_001,
    /// A shutdown trigger transitioned the process into the closing phase.
    ServerCloseRequested = 1_000_002,
    /// Engine close completed; the process exits 0.
    ServerClosed = 1_000_003,
    /// Engine close failed or timed out; the process exits 1.
    ServerCloseFailure = 1_000_004,
    /// Fatal error during startup; the process exits 1.
    ServerStartFailure = 1_000_005,
    /// A signal handler could not be installed.
    SignalRegisterFailure = 1_000_006,
    /// The telemetry drain task stopped.
    TelemetryDrained = 1_000_007,
}

impl LogId {
    /// Numeric code recorded in the `log_id` log field.
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// `component` field value for lifecycle events.
pub const COMPONENT_SERVER: &str = "server";

/// `component` field value for telemetry sink events.
pub const COMPONENT_TELEMETRY: &str = "telemetry";
