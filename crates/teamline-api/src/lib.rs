//! # teamline-api
//!
//! HTTP and WebSocket surface for the Teamline hub: the `/ws` upgrade
//! endpoint, health checks, and application state wiring.

pub mod error;
pub mod handlers;
pub mod resolver;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
