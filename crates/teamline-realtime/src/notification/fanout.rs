//! Pushes persisted notifications to recipients' live connections.
//!
//! Offline recipients are not the hub's problem: the record is already
//! durable, and the HTTP poll path delivers it on the next fetch.

use std::sync::Arc;

use tracing::debug;

use teamline_core::result::AppResult;
use teamline_core::traits::store::NotificationStore;
use teamline_core::types::notification::{Notification, NotificationDraft};

use crate::message::types::ServerEvent;
use crate::metrics::HubMetrics;
use crate::room::hub::RoomHub;

/// Thin glue between notification creation and connection fan-out.
pub struct NotificationFanout {
    /// Hub for multi-device delivery.
    hub: Arc<RoomHub>,
    /// Durable notification store collaborator.
    store: Arc<dyn NotificationStore>,
    /// Metrics.
    metrics: Arc<HubMetrics>,
}

impl std::fmt::Debug for NotificationFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFanout").finish()
    }
}

impl NotificationFanout {
    /// Creates a new fan-out.
    pub fn new(
        hub: Arc<RoomHub>,
        store: Arc<dyn NotificationStore>,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            hub,
            store,
            metrics,
        }
    }

    /// Persists a draft, then pushes the stored record to every live
    /// connection of the recipient. The store is awaited before any
    /// delivery state is touched.
    pub async fn publish(&self, draft: NotificationDraft) -> AppResult<Notification> {
        let notification = self.store.save_notification(draft).await?;
        self.push(&notification);
        Ok(notification)
    }

    /// Pushes an already-persisted notification to its recipient's
    /// connections.
    pub fn push(&self, notification: &Notification) {
        debug!(
            notification_id = %notification.id,
            recipient = %notification.recipient,
            "Notification pushed"
        );
        self.hub.relay_to_user(
            &notification.recipient,
            &ServerEvent::NewNotification {
                notification: notification.clone(),
            },
        );
        HubMetrics::inc(&self.metrics.notifications_pushed);
    }

    /// Pushes a batch of persisted notifications.
    pub fn push_many(&self, notifications: &[Notification]) {
        for notification in notifications {
            self.push(notification);
        }
    }
}
