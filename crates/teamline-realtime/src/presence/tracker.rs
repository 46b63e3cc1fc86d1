//! Presence tracker — publishes the derived online-user set.
//!
//! The tracker holds no authoritative copy of who is online. Every
//! publication carries the full set recomputed from the connection pool
//! at that moment, so the presence view can never drift from the
//! registry. Consumers diff consecutive sets if they need deltas.

use tokio::sync::broadcast;
use tracing::debug;

use teamline_core::types::id::UserId;

/// Publishes full online-set snapshots on every presence change.
#[derive(Debug)]
pub struct PresenceTracker {
    /// Change broadcast channel. Lagging receivers miss intermediate
    /// snapshots, which is safe: each snapshot is complete.
    tx: broadcast::Sender<Vec<UserId>>,
}

impl PresenceTracker {
    /// Creates a new tracker with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes to full online-set snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<UserId>> {
        self.tx.subscribe()
    }

    /// Publishes the current online set to all listeners.
    pub fn publish(&self, online: Vec<UserId>) {
        debug!(count = online.len(), "Presence changed");
        // No listeners is fine; the engine still pushes the set to clients.
        let _ = self.tx.send(online);
    }
}
