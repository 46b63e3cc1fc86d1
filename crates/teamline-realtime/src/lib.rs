//! # teamline-realtime
//!
//! Real-time core for Teamline. Provides:
//!
//! - Connection registry with per-user multi-device tracking and room membership
//! - Derived presence tracking with full-set change broadcasts
//! - Room/chat hub with origin-echo suppression and typing relays
//! - Peer-to-peer call-signaling coordinator (offer/answer/ICE relay,
//!   call lifecycle, pending-candidate queues, disconnect cascades)
//! - Notification fan-out to connected recipients

pub mod connection;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod presence;
pub mod room;
pub mod server;
pub mod signaling;
pub mod store;

pub use connection::registry::ConnectionRegistry;
pub use notification::fanout::NotificationFanout;
pub use presence::tracker::PresenceTracker;
pub use room::hub::RoomHub;
pub use server::RealtimeEngine;
pub use signaling::coordinator::CallCoordinator;
