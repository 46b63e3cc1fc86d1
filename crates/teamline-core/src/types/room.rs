//! Typed room identifiers.
//!
//! Conversation rooms (persisted chat threads), ephemeral call rooms
//! (generated join codes), and personal rooms (one per user, used for
//! direct relays) share a single membership table in the hub but must
//! never be cross-wired. Keeping them as distinct variants means a call
//! signal cannot be broadcast into a persisted chat thread by accident.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::id::{ConversationId, UserId};

/// A logical room the hub can broadcast into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RoomId {
    /// A persisted chat conversation, keyed by its stored id.
    Conversation(ConversationId),
    /// An ad hoc call room, keyed by a generated code.
    Call(String),
    /// A user's personal room (direct relays, notifications).
    User(UserId),
}

impl RoomId {
    /// Room for a persisted conversation.
    pub fn conversation(id: ConversationId) -> Self {
        Self::Conversation(id)
    }

    /// Ephemeral call room from a join code.
    pub fn call(code: impl Into<String>) -> Self {
        Self::Call(code.into())
    }

    /// A user's personal room.
    pub fn user(id: UserId) -> Self {
        Self::User(id)
    }

    /// Whether this is an ephemeral call room.
    pub fn is_call(&self) -> bool {
        matches!(self, Self::Call(_))
    }

    /// Parses the `prefix:key` wire form.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let (prefix, key) = s
            .split_once(':')
            .ok_or_else(|| AppError::validation(format!("Malformed room id: '{s}'")))?;

        match prefix {
            "conversation" => key
                .parse::<ConversationId>()
                .map(RoomId::Conversation)
                .map_err(|_| AppError::validation(format!("Invalid conversation id: '{key}'"))),
            "user" => key
                .parse::<UserId>()
                .map(RoomId::User)
                .map_err(|_| AppError::validation(format!("Invalid user id: '{key}'"))),
            "call" => {
                if key.is_empty() {
                    Err(AppError::validation("Empty call room code"))
                } else {
                    Ok(RoomId::Call(key.to_string()))
                }
            }
            other => Err(AppError::validation(format!(
                "Unknown room prefix: '{other}'"
            ))),
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversation(id) => write!(f, "conversation:{id}"),
            Self::Call(code) => write!(f, "call:{code}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

impl FromStr for RoomId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<RoomId> for String {
    fn from(room: RoomId) -> String {
        room.to_string()
    }
}

impl TryFrom<String> for RoomId {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}
