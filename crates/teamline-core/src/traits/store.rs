//! Persistence collaborator seams.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::message::{ChatMessage, MessageDraft};
use crate::types::notification::{Notification, NotificationDraft};

/// Durable store for chat messages.
///
/// The hub broadcasts a message only after this store has acknowledged
/// it and returned the canonical record. The store owns ids and
/// timestamps; the hub never invents either.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists a draft and returns the canonical stored record.
    async fn save_message(&self, draft: MessageDraft) -> AppResult<ChatMessage>;
}

/// Durable store for notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persists a draft and returns the canonical stored record.
    async fn save_notification(&self, draft: NotificationDraft) -> AppResult<Notification>;
}
