//! In-memory reference implementations of the persistence collaborators.
//!
//! Used by the default server wiring and the integration tests. A real
//! deployment swaps these for database-backed implementations behind the
//! same traits.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use teamline_core::result::AppResult;
use teamline_core::traits::store::{MessageStore, NotificationStore};
use teamline_core::types::id::{MessageId, NotificationId};
use teamline_core::types::message::{ChatMessage, MessageDraft};
use teamline_core::types::notification::{Notification, NotificationDraft};

/// In-memory message store.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    messages: Mutex<Vec<ChatMessage>>,
}

impl MemoryMessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn save_message(&self, draft: MessageDraft) -> AppResult<ChatMessage> {
        let message = ChatMessage {
            id: MessageId::new(),
            room: draft.room,
            sender: draft.sender,
            body: draft.body,
            kind: draft.kind,
            sent_at: Utc::now(),
        };
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(message)
    }
}

/// In-memory notification store.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryNotificationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notifications.
    pub fn len(&self) -> usize {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn save_notification(&self, draft: NotificationDraft) -> AppResult<Notification> {
        let notification = Notification {
            id: NotificationId::new(),
            recipient: draft.recipient,
            category: draft.category,
            body: draft.body,
            payload: draft.payload,
            created_at: Utc::now(),
        };
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(notification)
    }
}
