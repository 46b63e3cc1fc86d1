//! Room/chat hub — routes chat-domain events to the right connections.

use std::sync::Arc;

use tracing::{debug, warn};

use teamline_core::error::AppError;
use teamline_core::result::AppResult;
use teamline_core::traits::store::MessageStore;
use teamline_core::types::id::UserId;
use teamline_core::types::message::{ChatMessage, MessageDraft};
use teamline_core::types::room::RoomId;

use crate::connection::handle::ConnectionId;
use crate::connection::registry::ConnectionRegistry;
use crate::message::types::ServerEvent;
use crate::metrics::HubMetrics;

use super::echo::EchoSuppressor;

/// Routes chat events to room members and identities.
///
/// The hub keeps no per-room chat state of its own: typing indicators
/// are pure relays, and messages are fanned out only after the store
/// has acknowledged them.
pub struct RoomHub {
    /// Connection registry for delivery lookups.
    registry: Arc<ConnectionRegistry>,
    /// Durable message store collaborator.
    store: Arc<dyn MessageStore>,
    /// Origin-echo suppression window.
    echo: EchoSuppressor,
    /// Metrics.
    metrics: Arc<HubMetrics>,
}

impl std::fmt::Debug for RoomHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHub").finish()
    }
}

impl RoomHub {
    /// Creates a new hub.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn MessageStore>,
        echo_window: usize,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            registry,
            store,
            echo: EchoSuppressor::new(echo_window),
            metrics,
        }
    }

    /// Delivers an event to every member of a room, optionally excluding
    /// one connection (the origin that already applied it optimistically).
    pub fn broadcast_to_room(
        &self,
        room: &RoomId,
        event: &ServerEvent,
        exclude: Option<ConnectionId>,
    ) {
        for handle in self.registry.members_of(room) {
            if Some(handle.id) == exclude {
                continue;
            }
            if handle.send(event.clone()) {
                HubMetrics::inc(&self.metrics.frames_sent);
            }
        }
    }

    /// Delivers an event to every connection of an identity
    /// (multi-device fan-out).
    pub fn relay_to_user(&self, user_id: &UserId, event: &ServerEvent) {
        for handle in self.registry.connections_for(user_id) {
            if handle.send(event.clone()) {
                HubMetrics::inc(&self.metrics.frames_sent);
            }
        }
    }

    /// Relays a typing indicator to a room, origin excluded.
    ///
    /// The hub keeps no typing state; the originating client owns the
    /// stop-typing signal.
    pub fn typing(&self, room: RoomId, origin: ConnectionId, from: UserId, started: bool) {
        let event = if started {
            ServerEvent::Typing { room: room.clone(), from }
        } else {
            ServerEvent::StopTyping { room: room.clone(), from }
        };
        self.broadcast_to_room(&room, &event, Some(origin));
    }

    /// Persists a message and fans it out.
    ///
    /// The store is awaited first with no registry state held; membership
    /// is looked up only after the acknowledgement, so a join or leave
    /// racing the write is observed, not lost. Delivery goes to room
    /// members and to the sender's other devices, with the literal origin
    /// connection suppressed via the echo window.
    pub async fn send_message(
        &self,
        origin: ConnectionId,
        draft: MessageDraft,
    ) -> AppResult<ChatMessage> {
        if draft.body.trim().is_empty() {
            return Err(AppError::validation("Empty message body"));
        }
        if matches!(draft.room, RoomId::User(_)) {
            return Err(AppError::validation(
                "Messages target conversation or call rooms",
            ));
        }

        let message = self.store.save_message(draft).await?;
        self.echo.record(message.id, origin);

        let event = ServerEvent::ReceiveMessage {
            message: message.clone(),
        };

        // Membership resolved after the await; sends never suspend.
        let members = self.registry.members_of(&message.room);
        let mut delivered: Vec<ConnectionId> = Vec::with_capacity(members.len());
        for handle in &members {
            if self.echo.origin_of(&message.id) == Some(handle.id) {
                continue;
            }
            if handle.send(event.clone()) {
                HubMetrics::inc(&self.metrics.frames_sent);
            }
            delivered.push(handle.id);
        }

        // The sender's other devices may not have joined the room yet.
        for handle in self.registry.connections_for(&message.sender) {
            if handle.id == origin || delivered.contains(&handle.id) {
                continue;
            }
            if handle.send(event.clone()) {
                HubMetrics::inc(&self.metrics.frames_sent);
            }
        }

        HubMetrics::inc(&self.metrics.messages_relayed);
        debug!(message_id = %message.id, room = %message.room, "Message relayed");

        Ok(message)
    }

    /// Joins a connection to a room; call rooms additionally announce
    /// the new peer to existing members so each can initiate a session
    /// toward the joiner (existing members act as the offering side).
    pub fn join_room(&self, conn_id: ConnectionId, room: RoomId) {
        let Some(handle) = self.registry.get(&conn_id) else {
            warn!(conn_id = %conn_id, "Join from unknown connection ignored");
            return;
        };

        if room.is_call() {
            let announce = ServerEvent::PeerJoined {
                room: room.clone(),
                user: handle.user_id,
                name: handle.display_name.clone(),
                timestamp: chrono::Utc::now(),
            };
            // Announce before joining so the joiner itself is excluded.
            self.broadcast_to_room(&room, &announce, Some(conn_id));
        }

        self.registry.join_room(conn_id, room);
    }

    /// Removes a connection from a room.
    pub fn leave_room(&self, conn_id: ConnectionId, room: &RoomId) {
        self.registry.leave_room(conn_id, room);
    }
}
