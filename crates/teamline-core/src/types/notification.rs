//! Notification records as exchanged with the persistence collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{NotificationId, UserId};

/// A notification as produced by a domain event, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDraft {
    /// Recipient user.
    pub recipient: UserId,
    /// Short category tag (e.g. "mention", "task_assigned").
    pub category: String,
    /// Human-readable body.
    pub body: String,
    /// Structured payload for the client to act on.
    pub payload: Option<serde_json::Value>,
}

/// The canonical persisted notification.
///
/// Offline recipients fetch these through the HTTP poll path; the hub
/// only pushes them to recipients with a live connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Stored notification id.
    pub id: NotificationId,
    /// Recipient user.
    pub recipient: UserId,
    /// Short category tag.
    pub category: String,
    /// Human-readable body.
    pub body: String,
    /// Structured payload.
    pub payload: Option<serde_json::Value>,
    /// Persistence timestamp.
    pub created_at: DateTime<Utc>,
}
