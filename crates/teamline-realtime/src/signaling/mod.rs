//! Peer-to-peer call signaling: session state machine and coordinator.

pub mod coordinator;
pub mod session;

pub use coordinator::CallCoordinator;
pub use session::{CallSession, CallState};
