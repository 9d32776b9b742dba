//! Bridge server and client over real sockets.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use flstudio_mcp_bridge::{
    BridgeServer, CommandHandler, FlStudioClient, JsonStreamDecoder, SimulatedStudio,
};
use flstudio_mcp_core::{BridgeSettings, Command, Error, Note, Result};

fn settings(port: u16) -> BridgeSettings {
    BridgeSettings {
        host: "127.0.0.1".to_string(),
        port,
        connect_timeout_ms: 500,
        response_timeout_ms: 2000,
        command_timeout_ms: 1000,
        max_reconnect_attempts: 2,
        reconnect_delay_ms: 10,
        ..BridgeSettings::default()
    }
}

async fn start(handler: Arc<dyn CommandHandler>, command_timeout_ms: u64) -> BridgeSettings {
    let mut bind = settings(0);
    bind.command_timeout_ms = command_timeout_ms;
    let server = BridgeServer::bind(bind, handler).await.unwrap();
    let port = server.local_addr().unwrap().port();
    tokio::spawn(server.run());
    settings(port)
}

struct RawPeer {
    stream: TcpStream,
    decoder: JsonStreamDecoder,
}

impl RawPeer {
    async fn connect(settings: &BridgeSettings) -> Self {
        Self {
            stream: TcpStream::connect(settings.address()).await.unwrap(),
            decoder: JsonStreamDecoder::new(64 * 1024),
        }
    }

    async fn send(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    async fn reply(&mut self) -> Value {
        let mut buf = vec![0u8; 8192];
        loop {
            if let Some(value) = self.decoder.next_message().unwrap() {
                return value;
            }
            let n = self.stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed");
            self.decoder.push(&buf[..n]).unwrap();
        }
    }
}

#[tokio::test]
async fn test_client_round_trip() {
    let studio = Arc::new(SimulatedStudio::new());
    let settings = start(studio.clone(), 1000).await;
    let mut client = FlStudioClient::new(settings);

    let track = client.create_midi_track(-1).await.unwrap();
    assert_eq!(track["index"], json!(0));
    client.set_track_name(0, "Lead").await.unwrap();
    let pattern = client.create_pattern("Hook", 16).await.unwrap();
    let pattern_index = pattern["index"].as_i64().unwrap();
    client
        .add_note_values(pattern_index, 0, &[json!({ "position": 2, "note": "64" }), json!({})])
        .await
        .unwrap();
    client.set_tempo(128.0).await.unwrap();

    let info = client.get_session_info().await.unwrap();
    assert_eq!(info["tempo"], json!(128.0));
    assert_eq!(info["track_count"], json!(1));
    assert!(client.is_connected());
    assert!(!client.simulation_mode());

    let notes = studio.notes(pattern_index as u32, 0);
    assert_eq!(notes, vec![Note::new(0, 60, 1, 100), Note::new(2, 64, 1, 100)]);
}

#[tokio::test]
async fn test_remote_error_is_reported() {
    let settings = start(Arc::new(SimulatedStudio::new()), 1000).await;
    let mut client = FlStudioClient::new(settings);

    let err = client.set_tempo(900.0).await.unwrap_err();
    assert!(matches!(err, Error::Remote(ref m) if m == "Tempo must be between 10 and 522 BPM"));
    assert!(!client.simulation_mode());
}

#[tokio::test]
async fn test_invalid_json_keeps_connection_open() {
    let settings = start(Arc::new(SimulatedStudio::new()), 1000).await;
    let mut peer = RawPeer::connect(&settings).await;

    peer.send(b"{this is not json}").await;
    let reply = peer.reply().await;
    assert_eq!(reply, json!({ "status": "error", "message": "Invalid JSON" }));

    peer.send(br#"{"type":"get_session_info","params":{}}"#).await;
    let reply = peer.reply().await;
    assert_eq!(reply["status"], json!("success"));
}

#[tokio::test]
async fn test_unknown_command_rejected() {
    let settings = start(Arc::new(SimulatedStudio::new()), 1000).await;
    let mut peer = RawPeer::connect(&settings).await;

    peer.send(br#"{"type":"format_disk"}"#).await;
    let reply = peer.reply().await;
    assert_eq!(
        reply,
        json!({ "status": "error", "message": "Unknown command: format_disk" })
    );
}

#[tokio::test]
async fn test_split_and_concatenated_messages() {
    let settings = start(Arc::new(SimulatedStudio::new()), 1000).await;
    let mut peer = RawPeer::connect(&settings).await;

    peer.send(br#"{"type":"start_pl"#).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    peer.send(br#"ayback"}{"type":"stop_playback"}"#).await;

    let first = peer.reply().await;
    assert_eq!(first["result"], json!({ "playing": true }));
    let second = peer.reply().await;
    assert_eq!(second["result"], json!({ "playing": false }));
}

struct Stalled;

impl CommandHandler for Stalled {
    fn handle(&self, _command: &Command) -> Result<Value> {
        std::thread::sleep(Duration::from_millis(500));
        Ok(json!({}))
    }
}

#[tokio::test]
async fn test_slow_command_times_out() {
    let settings = start(Arc::new(Stalled), 50).await;
    let mut client = FlStudioClient::new(settings);

    let err = client.start_playback().await.unwrap_err();
    assert!(
        matches!(err, Error::Remote(ref m) if m == "Timeout waiting for operation to complete")
    );
}

#[tokio::test]
async fn test_falls_back_to_simulation_without_server() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut client = FlStudioClient::new(settings(port));

    let plugins = client.get_plugin_list().await.unwrap();

    assert!(client.simulation_mode());
    assert!(plugins["plugins"].as_array().is_some_and(|p| !p.is_empty()));

    let status = client.test_connection().await;
    assert!(status.simulation_mode);
    assert!(!status.connected);
}

#[tokio::test]
async fn test_oversized_command_is_rejected_without_fallback() {
    let studio = Arc::new(SimulatedStudio::new());
    let mut settings = start(studio.clone(), 1000).await;
    settings.max_message_bytes = settings.read_buffer_bytes;
    let mut client = FlStudioClient::new(settings);

    client.create_midi_track(-1).await.unwrap();
    let pattern = client.create_pattern("Long", 16).await.unwrap();
    let pattern_index = pattern["index"].as_i64().unwrap();

    let notes: Vec<Note> = (0..2000).map(|i| Note::new(i, 60, 1, 100)).collect();
    let err = client
        .add_notes_to_pattern(pattern_index, 0, &notes)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MessageTooLarge(_)));
    assert!(!client.simulation_mode());
    assert!(studio.notes(pattern_index as u32, 0).is_empty());

    client.set_tempo(99.0).await.unwrap();
    assert_eq!(studio.tempo(), 99.0);
}

#[tokio::test]
async fn test_server_closes_after_oversized_message() {
    let mut bind = settings(0);
    bind.max_message_bytes = 64;
    let server = BridgeServer::bind(bind, Arc::new(SimulatedStudio::new()))
        .await
        .unwrap();
    let port = server.local_addr().unwrap().port();
    tokio::spawn(server.run());
    let mut peer = RawPeer::connect(&settings(port)).await;

    let mut oversized = br#"{"type":"set_track_name","params":{"name":""#.to_vec();
    oversized.extend(std::iter::repeat(b'x').take(200));
    peer.send(&oversized).await;

    let reply = peer.reply().await;
    assert_eq!(
        reply,
        json!({ "status": "error", "message": "Message exceeds 64 bytes" })
    );

    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(2), peer.stream.read(&mut buf))
        .await
        .unwrap();
    assert!(matches!(read, Ok(0) | Err(_)));
}

#[tokio::test]
async fn test_shutdown_stops_server_and_connections() {
    let server = BridgeServer::bind(settings(0), Arc::new(SimulatedStudio::new()))
        .await
        .unwrap();
    let port = server.local_addr().unwrap().port();
    let handle = server.shutdown_handle();
    let running = tokio::spawn(server.run());

    let mut peer = RawPeer::connect(&settings(port)).await;
    peer.send(br#"{"type":"get_session_info"}"#).await;
    assert_eq!(peer.reply().await["status"], json!("success"));

    handle.shutdown();

    tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(2), peer.stream.read(&mut buf))
        .await
        .unwrap();
    assert!(matches!(read, Ok(0) | Err(_)));

    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
}
