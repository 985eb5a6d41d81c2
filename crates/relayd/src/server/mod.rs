//! Axum HTTP transport: routing, handlers, and shared state.
//!
//! # Responsibilities
//! - Define the router with the message endpoint, health check, and fallback.
//! - Map engine errors to HTTP statuses through the error taxonomy.
//! - Inject shared state (`AppState`) into handlers.
//!
//! The transport is stateless: no session id is generated or persisted across
//! requests, and every accepted request is handled independently.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
