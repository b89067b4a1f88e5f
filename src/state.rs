use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::protocol::{HandshakeKind, Role, RoomId, ServerEvent, SessionId};

/// Write half of a session: whatever is pushed here ends up on its socket.
/// Bounded; a session that stops reading loses events instead of piling them up.
pub type Outbox = mpsc::Sender<ServerEvent>;

pub const DEFAULT_OUTBOX_CAPACITY: usize = 100;

/// Outcome of an addressed send. Never reported back to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Dropped,
}

struct SessionEntry {
    outbox: Outbox,
    room:   Option<RoomId>,
    role:   Option<Role>,
}

/* ------------ one room ------------ */
pub struct RoomState {
    pub members: Vec<SessionId>,   // join order
    pub history: History,
}

impl RoomState {
    fn new(history_limit: usize) -> Self {
        Self { members: Vec::new(), history: History::new(history_limit) }
    }
}

/* ------------ sessions + rooms ------------ */
/// Every session and room the process knows about.
///
/// Not thread-safe on purpose: a single [`crate::hub::Hub`] task owns it and
/// applies one command at a time.
pub struct Registry {
    sessions:      HashMap<SessionId, SessionEntry>,
    rooms:         HashMap<RoomId, RoomState>,
    history_limit: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl Registry {
    pub fn new(history_limit: usize) -> Self {
        Self { sessions: HashMap::new(), rooms: HashMap::new(), history_limit }
    }

    pub fn connect(&mut self, id: SessionId, outbox: Outbox) {
        self.sessions.insert(id, SessionEntry { outbox, room: None, role: None });
        info!(%id, sessions = self.sessions.len(), "session connected");
        if self.deliver(id, ServerEvent::Welcome { id }) == Delivery::Dropped {
            warn!(%id, "welcome could not be delivered");
        }
    }

    /// Leave the current room (peers are told first), then forget the session.
    pub fn disconnect(&mut self, id: SessionId) {
        self.leave(id);
        if self.sessions.remove(&id).is_some() {
            info!(%id, sessions = self.sessions.len(), "session disconnected");
        }
    }

    pub fn is_connected(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn current_room(&self, id: SessionId) -> Option<&str> {
        self.sessions.get(&id)?.room.as_deref()
    }

    pub fn role(&self, id: SessionId) -> Option<Role> {
        self.sessions.get(&id)?.role
    }

    pub fn members(&self, room: &str) -> &[SessionId] {
        self.rooms.get(room).map(|r| r.members.as_slice()).unwrap_or(&[])
    }

    pub fn history(&self, room: &str) -> Vec<Value> {
        self.rooms.get(room).map(|r| r.history.snapshot()).unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /* ------------ membership ------------ */

    /// Put `id` into `room`. A session lives in one room at most, so joining
    /// elsewhere leaves the previous room first. The joiner gets the room's
    /// history (if any) before anything else; viewers are announced to the
    /// rest of the room as watchers.
    pub fn join(&mut self, id: SessionId, room: &str, role: Role) {
        let Some(prev) = self.sessions.get(&id).map(|s| s.room.clone()) else {
            debug!(%id, room, "join from unknown session ignored");
            return;
        };
        if prev.as_deref().is_some_and(|r| r != room) {
            self.leave(id);
        }

        let limit = self.history_limit;
        let st = self.rooms.entry(room.to_owned()).or_insert_with(|| RoomState::new(limit));
        if !st.members.contains(&id) {
            st.members.push(id);
        }
        let backlog = (!st.history.is_empty()).then(|| st.history.snapshot());

        if let Some(s) = self.sessions.get_mut(&id) {
            s.room = Some(room.to_owned());
            s.role = Some(role);
        }
        info!(%id, room, ?role, members = self.members(room).len(), "joined room");

        if let Some(entries) = backlog {
            self.deliver(id, ServerEvent::ChatHistory { entries });
        }
        if role == Role::Viewer {
            let n = self.fan_out(room, Some(id), ServerEvent::Watcher { id });
            debug!(%id, room, notified = n, "viewer announced");
        }
    }

    /// Resolve room → notify peers → drop membership. Returns how many peers
    /// were told.
    pub fn leave(&mut self, id: SessionId) -> usize {
        let Some(room) = self.sessions.get_mut(&id).and_then(|s| s.room.take()) else {
            return 0;
        };
        let told = self.fan_out(&room, Some(id), ServerEvent::DisconnectPeer { id });
        if let Some(st) = self.rooms.get_mut(&room) {
            st.members.retain(|m| *m != id);
        }
        info!(%id, room = %room, notified = told, "left room");
        told
    }

    /* ------------ relay ------------ */

    /// Addressed forward of a handshake payload. Self-addressed relays are dropped.
    pub fn relay(&self, from: SessionId, kind: HandshakeKind, to: SessionId, payload: Value) -> Delivery {
        if from == to {
            debug!(%from, %kind, "relay to self dropped");
            return Delivery::Dropped;
        }
        let outcome = self.deliver(to, ServerEvent::handshake(kind, from, payload));
        debug!(%from, %to, %kind, ?outcome, "relay");
        outcome
    }

    /* ------------ discovery ------------ */

    pub fn announce_broadcaster(&self, from: SessionId, room: &str) -> usize {
        if !self.in_room(from, room) {
            return 0;
        }
        self.fan_out(room, Some(from), ServerEvent::Broadcaster)
    }

    /// Zero-argument watcher: the room is whatever `from` last joined.
    pub fn request_watch(&self, from: SessionId) -> usize {
        let Some(room) = self.current_room(from) else {
            debug!(%from, "watcher request outside any room");
            return 0;
        };
        self.fan_out(room, Some(from), ServerEvent::Watcher { id: from })
    }

    /* ------------ chat + ephemeral events ------------ */

    /// Log and echo to the whole room, sender included.
    pub fn chat(&mut self, from: SessionId, room: &str, payload: Value) -> usize {
        if !self.in_room(from, room) {
            return 0;
        }
        if let Some(st) = self.rooms.get_mut(room) {
            st.history.push(payload.clone());
        }
        self.fan_out(room, None, ServerEvent::ChatMessage { payload })
    }

    pub fn react(&self, from: SessionId, room: &str, payload: Value) -> usize {
        if !self.in_room(from, room) {
            return 0;
        }
        self.fan_out(room, None, ServerEvent::Reaction { payload })
    }

    pub fn request_bitrate(&self, from: SessionId, room: &str, tier: Value) -> usize {
        if !self.in_room(from, room) {
            return 0;
        }
        self.fan_out(room, Some(from), ServerEvent::BitrateRequest { id: from, tier })
    }

    /* ------------ plumbing ------------ */

    fn in_room(&self, id: SessionId, room: &str) -> bool {
        let ok = self.current_room(id) == Some(room);
        if !ok {
            debug!(%id, room, "message for a room the session is not in");
        }
        ok
    }

    fn deliver(&self, to: SessionId, event: ServerEvent) -> Delivery {
        let Some(s) = self.sessions.get(&to) else {
            return Delivery::Dropped;
        };
        match s.outbox.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => {
                warn!(%to, "outbox full, event dropped");
                Delivery::Dropped
            }
            Err(TrySendError::Closed(_)) => Delivery::Dropped,
        }
    }

    fn fan_out(&self, room: &str, except: Option<SessionId>, event: ServerEvent) -> usize {
        self.members(room)
            .iter()
            .filter(|m| Some(**m) != except)
            .filter(|m| self.deliver(**m, event.clone()) == Delivery::Delivered)
            .count()
    }
}
