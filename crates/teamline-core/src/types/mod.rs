//! Shared domain types.

pub mod id;
pub mod message;
pub mod notification;
pub mod room;

pub use id::{ConversationId, MessageId, NotificationId, UserId};
pub use message::{ChatMessage, MessageDraft, MessageKind};
pub use notification::{Notification, NotificationDraft};
pub use room::RoomId;
