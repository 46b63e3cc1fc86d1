//! Route table.

use axum::routing::{any, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, ws};
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", any(ws::ws_handler))
        .route("/api/health", get(health::health))
        .route("/api/health/hub", get(health::hub_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
