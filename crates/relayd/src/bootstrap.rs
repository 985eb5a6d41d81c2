//! Ordered construction of the engine's dependencies.
//!
//! Assembly is strictly sequential: session first, then the engine identity,
//! then telemetry (which reads the session), then the engine over all three.
//! Each step observes fully initialised predecessors. Any failure propagates
//! unchanged to the startup guard in `main`; there is no partial retry and no
//! cleanup, because nothing observable has started yet.

use std::sync::Arc;

use common::ServiceError;

use crate::config::Config;
use crate::engine::{Engine, EngineIdentity};
use crate::session::Session;
use crate::telemetry::Telemetry;

/// The assembled dependency chain, shared for the process lifetime.
#[derive(Debug)]
pub struct Deps {
    pub session: Arc<Session>,
    pub telemetry: Arc<Telemetry>,
    pub engine: Arc<Engine>,
}

/// Build the dependency chain from validated configuration.
///
/// Telemetry construction never fails hard: an unusable sink degrades to a
/// no-op instead of blocking startup.
///
/// # Errors
///
/// Returns [`ServiceError::Configuration`] when the session credential tuple
/// is invalid.
pub fn assemble(cfg: &Config) -> Result<Deps, ServiceError> {
    let session = Arc::new(Session::new(cfg)?);
    let identity = EngineIdentity::from_package();
    let telemetry = Telemetry::create(&session, cfg);
    let engine = Arc::new(Engine::new(
        identity,
        Arc::clone(&session),
        Arc::clone(&telemetry),
    ));

    Ok(Deps {
        session,
        telemetry,
        engine,
    })
}
