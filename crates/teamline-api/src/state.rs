//! Shared application state.

use std::sync::Arc;

use teamline_core::traits::identity::IdentityResolver;
use teamline_realtime::RealtimeEngine;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The real-time engine.
    pub realtime: RealtimeEngine,
    /// Upstream identity resolution.
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Creates new application state.
    pub fn new(realtime: RealtimeEngine, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { realtime, identity }
    }
}
