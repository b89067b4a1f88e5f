use std::{net::{Ipv4Addr, SocketAddr}, path::PathBuf, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use streamy_server::{config::Config, hub, routes, state::Registry};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    time::timeout,
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(static_dir: PathBuf) -> SocketAddr {
    serve_with(Config { static_dir, ..Config::default() }).await
}

async fn serve_with(cfg: Config) -> SocketAddr {
    let cfg = Arc::new(cfg);
    let (hub, _task) = hub::spawn(Registry::new(cfg.history_limit));
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes::app(cfg, hub)).await.unwrap();
    });
    addr
}

async fn next_json(ws: &mut Client) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send(ws: &mut Client, v: Value) {
    ws.send(Message::Text(v.to_string())).await.unwrap();
}

async fn open(addr: SocketAddr) -> (Client, String) {
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let welcome = next_json(&mut ws).await;
    assert_eq!(welcome["type"], "welcome");
    let id = welcome["id"].as_str().unwrap().to_owned();
    (ws, id)
}

/// Join as broadcaster and wait for our own chat echo, so the join has been
/// applied before anyone else shows up.
async fn join_broadcaster(ws: &mut Client, room: &str) {
    send(ws, json!({"type": "join-room", "roomId": room, "role": "broadcaster"})).await;
    send(ws, json!({"type": "chat-message", "roomId": room, "payload": "on air"})).await;
    assert_eq!(next_json(ws).await, json!({"type": "chat-message", "payload": "on air"}));
}

#[tokio::test]
async fn viewer_discovery_and_handshake_over_websocket() {
    let addr = serve(PathBuf::from("public")).await;
    let (mut b, b_id) = open(addr).await;
    let (mut v, v_id) = open(addr).await;

    join_broadcaster(&mut b, "R1").await;
    send(&mut v, json!({"type": "join-room", "roomId": "R1", "role": "viewer"})).await;

    assert_eq!(
        next_json(&mut v).await,
        json!({"type": "chat-history", "entries": ["on air"]})
    );
    assert_eq!(next_json(&mut b).await, json!({"type": "watcher", "id": v_id}));

    send(&mut b, json!({"type": "offer", "to": v_id, "payload": {"type": "offer", "sdp": "x"}})).await;
    assert_eq!(
        next_json(&mut v).await,
        json!({"type": "offer", "from": b_id, "payload": {"type": "offer", "sdp": "x"}})
    );

    send(&mut v, json!({"type": "answer", "to": b_id, "payload": {"type": "answer", "sdp": "y"}})).await;
    assert_eq!(
        next_json(&mut b).await,
        json!({"type": "answer", "from": v_id, "payload": {"type": "answer", "sdp": "y"}})
    );

    b.close(None).await.unwrap();
    assert_eq!(next_json(&mut v).await, json!({"type": "disconnectPeer", "id": b_id}));
}

#[tokio::test]
async fn malformed_frames_do_not_kill_the_session() {
    let addr = serve(PathBuf::from("public")).await;
    let (mut ws, _id) = open(addr).await;

    ws.send(Message::Text("{not json".into())).await.unwrap();
    send(&mut ws, json!({"type": "self-destruct"})).await;
    send(&mut ws, json!({"type": "join-room", "roomId": "R9", "role": "broadcaster"})).await;
    send(&mut ws, json!({"type": "reaction", "roomId": "R9", "payload": "👏"})).await;

    assert_eq!(next_json(&mut ws).await, json!({"type": "reaction", "payload": "👏"}));
}

#[tokio::test]
async fn unknown_paths_fall_back_to_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>streamy</h1>").unwrap();
    let addr = serve(dir.path().to_path_buf()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /room/abc HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut resp = String::new();
    stream.read_to_string(&mut resp).await.unwrap();

    assert!(resp.starts_with("HTTP/1.1 200"), "{resp}");
    assert!(resp.contains("<h1>streamy</h1>"));
}

#[tokio::test]
async fn idle_sessions_get_heartbeat_pings() {
    let cfg = Config::from_lookup(|key| (key == "HEARTBEAT_SECS").then(|| "1".to_owned())).unwrap();
    let addr = serve_with(cfg).await;
    let (mut ws, _id) = open(addr).await;

    let got_ping = timeout(Duration::from_secs(5), async {
        while let Some(frame) = ws.next().await {
            if let Message::Ping(_) = frame.unwrap() {
                return true;
            }
        }
        false
    })
    .await
    .expect("no ping within 5s");
    assert!(got_ping);
}
