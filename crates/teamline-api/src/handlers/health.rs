//! Health and hub status endpoints.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// GET /api/health — liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/health/hub — hub counters for diagnostics.
pub async fn hub_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.realtime.metrics.snapshot();
    Json(json!({
        "status": "ok",
        "connections": state.realtime.registry.connection_count(),
        "online_users": state.realtime.registry.online_users().len(),
        "active_calls": state.realtime.calls.active_count(),
        "metrics": snapshot,
    }))
}
