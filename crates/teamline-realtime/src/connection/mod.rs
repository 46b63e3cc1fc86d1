//! Connection lifecycle: handles, pool, room membership, registry.

pub mod handle;
pub mod pool;
pub mod registry;
pub mod rooms;

pub use handle::{ConnectionHandle, ConnectionId};
pub use registry::ConnectionRegistry;
