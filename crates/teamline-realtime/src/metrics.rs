//! Hub metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Total connections opened.
    pub connections_opened: AtomicU64,
    /// Total connections closed.
    pub connections_closed: AtomicU64,
    /// Total inbound events processed.
    pub events_received: AtomicU64,
    /// Total frames fanned out to connections.
    pub frames_sent: AtomicU64,
    /// Total chat messages relayed after persistence.
    pub messages_relayed: AtomicU64,
    /// Total call sessions created.
    pub calls_initiated: AtomicU64,
    /// Total ICE candidates queued ahead of an accept.
    pub candidates_queued: AtomicU64,
    /// Total notifications pushed to live connections.
    pub notifications_pushed: AtomicU64,
}

impl HubMetrics {
    /// Creates new zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments a counter by one.
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds to a counter.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            calls_initiated: self.calls_initiated.load(Ordering::Relaxed),
            candidates_queued: self.candidates_queued.load(Ordering::Relaxed),
            notifications_pushed: self.notifications_pushed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable point-in-time view of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections opened.
    pub connections_opened: u64,
    /// Total connections closed.
    pub connections_closed: u64,
    /// Total inbound events processed.
    pub events_received: u64,
    /// Total frames fanned out.
    pub frames_sent: u64,
    /// Total chat messages relayed.
    pub messages_relayed: u64,
    /// Total call sessions created.
    pub calls_initiated: u64,
    /// Total ICE candidates queued.
    pub candidates_queued: u64,
    /// Total notifications pushed.
    pub notifications_pushed: u64,
}
