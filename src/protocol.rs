//! Wire vocabulary spoken over `/ws`.
//!
//! Every text frame is one JSON object tagged by `"type"`. Handshake and chat
//! payloads are carried as raw [`Value`]s and never looked into.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{bad, AppResult};

pub type RoomId = String;

/// Opaque per-connection identifier, fresh for every socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Broadcaster,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeKind {
    Offer,
    Answer,
    Candidate,
}

impl fmt::Display for HandshakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandshakeKind::Offer => "offer",
            HandshakeKind::Answer => "answer",
            HandshakeKind::Candidate => "candidate",
        })
    }
}

/* ------------ client → server ------------ */
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join-room", rename_all = "camelCase")]
    JoinRoom { room_id: RoomId, role: Role },

    #[serde(rename = "broadcaster", rename_all = "camelCase")]
    Broadcaster { room_id: RoomId },

    /// Late join / reconnect discovery; the room comes from the registry.
    #[serde(rename = "watcher")]
    Watcher,

    #[serde(rename = "offer")]
    Offer { to: SessionId, payload: Value },

    #[serde(rename = "answer")]
    Answer { to: SessionId, payload: Value },

    #[serde(rename = "candidate")]
    Candidate { to: SessionId, payload: Value },

    #[serde(rename = "chat-message", rename_all = "camelCase")]
    ChatMessage { room_id: RoomId, payload: Value },

    #[serde(rename = "reaction", rename_all = "camelCase")]
    Reaction { room_id: RoomId, payload: Value },

    #[serde(rename = "bitrate_request", rename_all = "camelCase")]
    BitrateRequest { room_id: RoomId, tier: Value },
}

impl ClientMessage {
    /// Parse one text frame. Rejects unknown types, missing fields and blank room ids.
    pub fn decode(raw: &str) -> AppResult<Self> {
        let msg: ClientMessage = serde_json::from_str(raw)?;
        match msg.room_id() {
            Some(room) if room.trim().is_empty() => Err(bad("roomId must not be empty")),
            _ => Ok(msg),
        }
    }

    pub fn room_id(&self) -> Option<&str> {
        match self {
            ClientMessage::JoinRoom { room_id, .. }
            | ClientMessage::Broadcaster { room_id }
            | ClientMessage::ChatMessage { room_id, .. }
            | ClientMessage::Reaction { room_id, .. }
            | ClientMessage::BitrateRequest { room_id, .. } => Some(room_id),
            _ => None,
        }
    }

    /// Splits offer/answer/candidate into `(kind, destination, payload)`.
    pub fn into_handshake(self) -> Result<(HandshakeKind, SessionId, Value), Self> {
        match self {
            ClientMessage::Offer { to, payload } => Ok((HandshakeKind::Offer, to, payload)),
            ClientMessage::Answer { to, payload } => Ok((HandshakeKind::Answer, to, payload)),
            ClientMessage::Candidate { to, payload } => Ok((HandshakeKind::Candidate, to, payload)),
            other => Err(other),
        }
    }
}

/* ------------ server → client ------------ */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "welcome")]
    Welcome { id: SessionId },

    #[serde(rename = "broadcaster")]
    Broadcaster,

    #[serde(rename = "watcher")]
    Watcher { id: SessionId },

    #[serde(rename = "offer")]
    Offer { from: SessionId, payload: Value },

    #[serde(rename = "answer")]
    Answer { from: SessionId, payload: Value },

    #[serde(rename = "candidate")]
    Candidate { from: SessionId, payload: Value },

    #[serde(rename = "disconnectPeer")]
    DisconnectPeer { id: SessionId },

    #[serde(rename = "chat-message")]
    ChatMessage { payload: Value },

    #[serde(rename = "chat-history")]
    ChatHistory { entries: Vec<Value> },

    #[serde(rename = "reaction")]
    Reaction { payload: Value },

    #[serde(rename = "bitrate_request")]
    BitrateRequest { id: SessionId, tier: Value },
}

impl ServerEvent {
    pub fn handshake(kind: HandshakeKind, from: SessionId, payload: Value) -> Self {
        match kind {
            HandshakeKind::Offer => ServerEvent::Offer { from, payload },
            HandshakeKind::Answer => ServerEvent::Answer { from, payload },
            HandshakeKind::Candidate => ServerEvent::Candidate { from, payload },
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
