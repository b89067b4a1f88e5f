//! Single-owner dispatch loop.
//!
//! Connection tasks never touch the [`Registry`]; they send [`Command`]s to the
//! hub, which applies them strictly one after another. That serialization is
//! what keeps room membership and history consistent without any locks.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::protocol::{ClientMessage, SessionId};
use crate::state::{Outbox, Registry};

#[derive(Debug)]
pub enum Command {
    Connect { id: SessionId, outbox: Outbox },
    Inbound { id: SessionId, msg: ClientMessage },
    Disconnect { id: SessionId },
}

/// Cloneable sending side, shared with every connection task.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl HubHandle {
    /// `false` once the hub task has gone away.
    pub fn send(&self, cmd: Command) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct Hub {
    registry: Registry,
    rx:       mpsc::UnboundedReceiver<Command>,
}

impl Hub {
    pub fn new(registry: Registry) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { registry, rx }, HubHandle { tx })
    }

    /// Runs until every [`HubHandle`] is dropped; hands the registry back.
    pub async fn run(mut self) -> Registry {
        info!("signaling hub started");
        while let Some(cmd) = self.rx.recv().await {
            apply(&mut self.registry, cmd);
        }
        info!("signaling hub stopped");
        self.registry
    }
}

/// Shorthand for `Hub::new` + `tokio::spawn(hub.run())`.
pub fn spawn(registry: Registry) -> (HubHandle, tokio::task::JoinHandle<Registry>) {
    let (hub, handle) = Hub::new(registry);
    (handle, tokio::spawn(hub.run()))
}

pub fn apply(reg: &mut Registry, cmd: Command) {
    match cmd {
        Command::Connect { id, outbox } => reg.connect(id, outbox),
        Command::Disconnect { id } => reg.disconnect(id),
        Command::Inbound { id, msg } => dispatch(reg, id, msg),
    }
}

fn dispatch(reg: &mut Registry, from: SessionId, msg: ClientMessage) {
    match msg {
        ClientMessage::JoinRoom { room_id, role } => reg.join(from, &room_id, role),
        ClientMessage::Broadcaster { room_id } => {
            let n = reg.announce_broadcaster(from, &room_id);
            debug!(%from, room = %room_id, notified = n, "broadcaster announced");
        }
        ClientMessage::Watcher => {
            let n = reg.request_watch(from);
            debug!(%from, notified = n, "watcher request");
        }
        ClientMessage::ChatMessage { room_id, payload } => {
            let n = reg.chat(from, &room_id, payload);
            debug!(%from, room = %room_id, delivered = n, "chat");
        }
        ClientMessage::Reaction { room_id, payload } => {
            let n = reg.react(from, &room_id, payload);
            debug!(%from, room = %room_id, delivered = n, "reaction");
        }
        ClientMessage::BitrateRequest { room_id, tier } => {
            let n = reg.request_bitrate(from, &room_id, tier);
            debug!(%from, room = %room_id, delivered = n, "bitrate request");
        }
        // offer / answer / candidate
        handshake => {
            if let Ok((kind, to, payload)) = handshake.into_handshake() {
                reg.relay(from, kind, to, payload);
            }
        }
    }
}
