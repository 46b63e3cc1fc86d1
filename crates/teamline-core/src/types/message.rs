//! Chat message records as exchanged with the persistence collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{MessageId, UserId};
use crate::types::room::RoomId;

/// Kind of chat message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Image attachment reference.
    Image,
    /// Generic file attachment reference.
    File,
}

/// A message as submitted by a client, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDraft {
    /// Target room.
    pub room: RoomId,
    /// Authoring user.
    pub sender: UserId,
    /// Message body (text, or a storage reference for attachments).
    pub body: String,
    /// Payload kind.
    pub kind: MessageKind,
}

/// The canonical persisted message, as returned by the store.
///
/// The hub broadcasts this record verbatim; total ordering across
/// senders is established by `sent_at`/`id`, not by delivery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Stored message id.
    pub id: MessageId,
    /// Target room.
    pub room: RoomId,
    /// Authoring user.
    pub sender: UserId,
    /// Message body.
    pub body: String,
    /// Payload kind.
    pub kind: MessageKind,
    /// Persistence timestamp.
    pub sent_at: DateTime<Utc>,
}
