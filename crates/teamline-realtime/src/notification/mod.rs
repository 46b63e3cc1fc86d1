//! Notification fan-out to connected recipients.

pub mod fanout;

pub use fanout::NotificationFanout;
