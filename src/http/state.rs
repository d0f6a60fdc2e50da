//! Application state for the HTTP server.

use std::sync::Arc;

use chrono_tz::Tz;

use crate::engine::Engine;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Zone for interpreting request times and rendering responses.
    pub tz: Tz,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, tz: Tz) -> Self {
        Self { engine, tz }
    }
}
