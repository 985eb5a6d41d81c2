//! Logging initialisation and the telemetry event sink.
//!
//! Two distinct concerns live here:
//! - [`init`]: the process-wide `tracing` subscriber (structured JSON logs).
//! - [`sink::Telemetry`]: the fire-and-forget event sink shared with the
//!   engine. Sink failures never block startup or request handling; the only
//!   operation that can fail is the flush handshake during shutdown.

pub mod init;
pub mod sink;

pub use init::init;
pub use sink::Telemetry;
