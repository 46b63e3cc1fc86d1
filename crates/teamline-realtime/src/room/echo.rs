//! Origin-echo suppression window.
//!
//! A bounded rolling window of recently persisted message ids mapped to
//! the connection that originated them. Delivery consults the window so
//! the literal origin connection never re-receives its own message; the
//! same user's other devices are not suppressed.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use teamline_core::types::id::MessageId;

use crate::connection::handle::ConnectionId;

#[derive(Debug, Default)]
struct EchoWindow {
    /// Insertion order, oldest first.
    order: VecDeque<MessageId>,
    /// Message id → origin connection.
    origin: HashMap<MessageId, ConnectionId>,
}

/// Bounded map of recently originated message ids.
#[derive(Debug)]
pub struct EchoSuppressor {
    /// Maximum retained entries.
    capacity: usize,
    inner: Mutex<EchoWindow>,
}

impl EchoSuppressor {
    /// Creates a suppressor retaining at most `capacity` message ids.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(EchoWindow::default()),
        }
    }

    /// Records a message id and its originating connection, evicting the
    /// oldest entry once the window is full.
    pub fn record(&self, message_id: MessageId, origin: ConnectionId) {
        let mut window = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if window.origin.insert(message_id, origin).is_none() {
            window.order.push_back(message_id);
        }
        while window.order.len() > self.capacity {
            if let Some(evicted) = window.order.pop_front() {
                window.origin.remove(&evicted);
            }
        }
    }

    /// Returns the originating connection of a recent message, if known.
    pub fn origin_of(&self, message_id: &MessageId) -> Option<ConnectionId> {
        let window = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        window.origin.get(message_id).copied()
    }
}
