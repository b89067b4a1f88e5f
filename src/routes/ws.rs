use std::{sync::Arc, time::Duration};

use axum::{
    Router, routing::get, Extension,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::{sync::mpsc, time};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{AppErr, AppResult},
    hub::{Command, HubHandle},
    protocol::{ClientMessage, SessionId},
};

pub fn router() -> Router {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(hub): Extension<HubHandle>,
    Extension(cfg): Extension<Arc<Config>>,
) -> AppResult<Response> {
    if hub.is_closed() {
        return Err(AppErr::HubDown);
    }
    let (heartbeat, capacity) = (cfg.heartbeat, cfg.outbox_capacity);
    Ok(ws.on_upgrade(move |s| session_ws(s, hub, heartbeat, capacity)))
}

/* ---------------- per session ---------------- */
async fn session_ws(sock: WebSocket, hub: HubHandle, heartbeat: Duration, capacity: usize) {
    let id = SessionId::new();
    let (outbox, mut inbox) = mpsc::channel(capacity.max(1));
    if !hub.send(Command::Connect { id, outbox }) {
        return;
    }
    info!(%id, "websocket open");

    let (mut sender, mut receiver) = sock.split();
    let mut tick = time::interval_at(time::Instant::now() + heartbeat, heartbeat);

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(raw))) => match ClientMessage::decode(&raw) {
                    Ok(msg) => {
                        if !hub.send(Command::Inbound { id, msg }) { break; }
                    }
                    Err(e) => warn!(%id, "dropping malformed frame: {e}"),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Binary(_))) => debug!(%id, "binary frame ignored"),
                Some(Ok(_)) => {}   // ping / pong
                Some(Err(e)) => {
                    warn!(%id, "websocket receive error: {e}");
                    break;
                }
            },

            event = inbox.recv() => {
                let Some(event) = event else { break };
                match event.encode() {
                    Ok(json) => {
                        if sender.send(Message::Text(json)).await.is_err() {
                            warn!(%id, "send failed, dropping session");
                            break;
                        }
                    }
                    Err(e) => warn!(%id, "could not encode event: {e}"),
                }
            }

            _ = tick.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    warn!(%id, "ping failed, dropping session");
                    break;
                }
            }
        }
    }

    /* leave room, peers get disconnectPeer */
    hub.send(Command::Disconnect { id });
    info!(%id, "websocket closed");
}
