//! Room/chat hub: broadcast fan-out, typing relays, echo suppression.

pub mod echo;
pub mod hub;

pub use echo::EchoSuppressor;
pub use hub::RoomHub;
