//! Inbound and outbound WebSocket message type definitions.
//!
//! Session descriptions and ICE candidates are opaque JSON blobs; the
//! hub relays them without inspecting their contents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use teamline_core::types::id::UserId;
use teamline_core::types::message::{ChatMessage, MessageKind};
use teamline_core::types::notification::Notification;
use teamline_core::types::room::RoomId;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Started typing in a room.
    Typing {
        /// Target room.
        room: RoomId,
    },
    /// Stopped typing in a room.
    StopTyping {
        /// Target room.
        room: RoomId,
    },
    /// Send a chat message to a room.
    SendMessage {
        /// Target room.
        room: RoomId,
        /// Message body.
        text: String,
        /// Payload kind.
        #[serde(default = "default_message_kind")]
        kind: MessageKind,
    },
    /// Join a room (conversation subscription or ad hoc call room).
    JoinRoom {
        /// Room to join.
        room: RoomId,
    },
    /// Leave a room.
    LeaveRoom {
        /// Room to leave.
        room: RoomId,
    },
    /// Initiate a call to another user.
    CallUser {
        /// Callee.
        user_to_call: UserId,
        /// Opaque offer session description.
        signal: serde_json::Value,
        /// Whether video is requested.
        #[serde(default)]
        is_video: bool,
    },
    /// Answer a ringing call.
    AnswerCall {
        /// The caller being answered.
        to: UserId,
        /// Opaque answer session description.
        signal: serde_json::Value,
    },
    /// Relay an ICE candidate to a call peer.
    IceCandidate {
        /// Recipient peer.
        to: UserId,
        /// Opaque candidate payload.
        candidate: serde_json::Value,
    },
    /// The media transport reported the peer link as established.
    CallConnected {
        /// The call peer.
        peer: UserId,
    },
    /// Hang up a call.
    EndCall {
        /// The call peer.
        peer: UserId,
    },
}

fn default_message_kind() -> MessageKind {
    MessageKind::Text
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full online-user set, broadcast on every presence change.
    OnlineUsers {
        /// Every user with at least one live connection.
        users: Vec<UserId>,
    },
    /// Another member started typing.
    Typing {
        /// Room the indicator applies to.
        room: RoomId,
        /// Typing user.
        from: UserId,
    },
    /// Another member stopped typing.
    StopTyping {
        /// Room the indicator applies to.
        room: RoomId,
        /// User who stopped.
        from: UserId,
    },
    /// A persisted chat message, fanned out to room members.
    ReceiveMessage {
        /// The canonical stored record.
        message: ChatMessage,
    },
    /// An incoming call offer.
    IncomingCall {
        /// Calling user.
        from: UserId,
        /// Caller display name.
        name: String,
        /// Opaque offer session description.
        signal: serde_json::Value,
        /// Whether video was requested.
        is_video: bool,
    },
    /// The callee accepted; answer delivery.
    CallAccepted {
        /// Answering user.
        from: UserId,
        /// Opaque answer session description.
        signal: serde_json::Value,
    },
    /// An ICE candidate from the call peer.
    IceCandidate {
        /// Originating peer.
        from: UserId,
        /// Opaque candidate payload.
        candidate: serde_json::Value,
    },
    /// The call ended.
    CallEnded {
        /// The peer the session was with.
        peer: UserId,
        /// Why the call ended ("hangup", "disconnected", "timeout", "failed").
        reason: String,
    },
    /// A new participant joined a call room.
    PeerJoined {
        /// The call room.
        room: RoomId,
        /// Joining user.
        user: UserId,
        /// Joiner display name.
        name: String,
        /// Join timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A persisted notification for this user.
    NewNotification {
        /// The canonical stored record.
        notification: Notification,
    },
    /// Protocol-level error report.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}
