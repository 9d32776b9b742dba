//! Reconnecting client for the FL Studio bridge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tracing::{debug, error, info, warn};

use flstudio_mcp_core::{BridgeSettings, Command, CommandType, Error, Note, Response, Result};

use crate::framing::JsonStreamDecoder;
use crate::simulate::simulated_response;

/// Shared switch between talking to FL Studio and answering locally.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SimulationFlag(Arc<AtomicBool>);

impl SimulationFlag {
    /// New flag with the given state.
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    /// Current state.
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Change the state, returning the previous one.
    pub fn set(&self, enabled: bool) -> bool {
        self.0.swap(enabled, Ordering::SeqCst)
    }
}

/// Outcome of [`FlStudioClient::test_connection`].
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    /// Address tried
    pub address: String,
    /// Whether a live connection is open
    pub connected: bool,
    /// Whether answers come from the simulator
    pub simulation_mode: bool,
    /// Session info, when the probe succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Value>,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Client for the remote script's TCP command channel.
///
/// Transport failures trigger reconnects; once
/// `max_reconnect_attempts` are exhausted the client switches to
/// simulation mode and keeps answering.
#[derive(Debug)]
pub struct FlStudioClient {
    settings: BridgeSettings,
    stream: Option<TcpStream>,
    decoder: JsonStreamDecoder,
    simulation: SimulationFlag,
}

impl FlStudioClient {
    /// Client with its own simulation flag, initially off.
    pub fn new(settings: BridgeSettings) -> Self {
        Self::with_simulation(settings, SimulationFlag::default())
    }

    /// Client sharing an existing simulation flag.
    pub fn with_simulation(settings: BridgeSettings, simulation: SimulationFlag) -> Self {
        let decoder = JsonStreamDecoder::new(settings.max_message_bytes);
        Self {
            settings,
            stream: None,
            decoder,
            simulation,
        }
    }

    /// Bridge settings in use.
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// The simulation flag, for sharing.
    pub fn simulation_flag(&self) -> SimulationFlag {
        self.simulation.clone()
    }

    /// Whether commands are answered locally.
    pub fn simulation_mode(&self) -> bool {
        self.simulation.get()
    }

    /// Enable or disable simulation mode, returning the previous state.
    pub fn set_simulation_mode(&mut self, enabled: bool) -> bool {
        info!(
            "Simulation mode {}",
            if enabled { "enabled" } else { "disabled" }
        );
        if enabled {
            self.disconnect();
        }
        self.simulation.set(enabled)
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the connection if it is not already open.
    pub async fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let address = self.settings.address();
        let stream = tokio::time::timeout(self.settings.connect_timeout(), open(&address))
            .await
            .map_err(|_| Error::Timeout(self.settings.connect_timeout_ms))??;

        info!("Connected to FL Studio at {}", address);
        self.decoder.clear();
        self.stream = Some(stream);
        Ok(())
    }

    /// Drop the connection.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            debug!("Disconnected from {}", self.settings.address());
        }
        self.decoder.clear();
    }

    /// Send a command and return its `result` payload.
    ///
    /// An error status from FL Studio becomes [`Error::Remote`]. Transport
    /// errors are retried after `reconnect_delay`; when retries run out the
    /// client enters simulation mode and returns a simulated answer.
    pub async fn send_command(&mut self, kind: CommandType, params: Value) -> Result<Value> {
        if self.simulation.get() {
            return Ok(simulate(kind, &params));
        }

        let command = Command::new(kind, params);
        let mut attempts = 0;
        loop {
            info!("Sending command: {}", kind);
            match self.round_trip(&command).await {
                Ok(response) => {
                    debug!("Response status: {:?}", response.status);
                    return response.into_result().map_err(|e| {
                        error!("{}", e);
                        e
                    });
                }
                Err(err) if err.is_transport() => {
                    self.disconnect();
                    if attempts >= self.settings.max_reconnect_attempts {
                        warn!("Connection failed repeatedly, switching to simulation mode");
                        self.simulation.set(true);
                        return Ok(simulate(kind, &Value::Object(command.params.clone())));
                    }
                    attempts += 1;
                    warn!(
                        "Connection error: {}; reconnection attempt {}/{}",
                        err, attempts, self.settings.max_reconnect_attempts
                    );
                    tokio::time::sleep(self.settings.reconnect_delay()).await;
                }
                Err(err) => {
                    error!("Error communicating with FL Studio: {}", err);
                    self.disconnect();
                    return Err(err);
                }
            }
        }
    }

    async fn round_trip(&mut self, command: &Command) -> Result<Response> {
        let payload = serde_json::to_vec(command)?;
        if payload.len() > self.settings.max_message_bytes {
            warn!(
                "Refusing to send {} byte command (limit {})",
                payload.len(),
                self.settings.max_message_bytes
            );
            return Err(Error::MessageTooLarge(self.settings.max_message_bytes));
        }
        self.connect().await?;
        let read_size = self.settings.read_buffer_bytes;
        let timeout_ms = self.settings.response_timeout_ms;

        let Some(stream) = self.stream.as_mut() else {
            return Err(Error::ConnectionClosed);
        };
        stream.write_all(&payload).await?;

        let value = tokio::time::timeout(
            self.settings.response_timeout(),
            read_message(stream, &mut self.decoder, read_size),
        )
        .await
        .map_err(|_| Error::Timeout(timeout_ms))??;

        Ok(serde_json::from_value(value)?)
    }

    /// Probe the bridge with `get_session_info`.
    pub async fn test_connection(&mut self) -> ConnectionStatus {
        let outcome = self
            .send_command(CommandType::GetSessionInfo, json!({}))
            .await;
        let (session, error) = match outcome {
            Ok(session) => (Some(session), None),
            Err(e) => (None, Some(e.to_string())),
        };
        ConnectionStatus {
            address: self.settings.address(),
            connected: self.is_connected(),
            simulation_mode: self.simulation_mode(),
            session,
            error,
        }
    }

    /// Tempo, signature and channel count.
    pub async fn get_session_info(&mut self) -> Result<Value> {
        self.send_command(CommandType::GetSessionInfo, json!({})).await
    }

    /// Details of one channel.
    pub async fn get_track_info(&mut self, track_index: i64) -> Result<Value> {
        self.send_command(CommandType::GetTrackInfo, json!({ "track_index": track_index }))
            .await
    }

    /// Add a channel; a negative index appends.
    pub async fn create_midi_track(&mut self, index: i64) -> Result<Value> {
        self.send_command(CommandType::CreateMidiTrack, json!({ "index": index }))
            .await
    }

    /// Rename a channel.
    pub async fn set_track_name(&mut self, track_index: i64, name: &str) -> Result<Value> {
        self.send_command(
            CommandType::SetTrackName,
            json!({ "track_index": track_index, "name": name }),
        )
        .await
    }

    /// Add a pattern of `length` steps.
    pub async fn create_pattern(&mut self, name: &str, length: u32) -> Result<Value> {
        self.send_command(
            CommandType::CreatePattern,
            json!({ "name": name, "length": length }),
        )
        .await
    }

    /// Write notes into a pattern.
    pub async fn add_notes_to_pattern(
        &mut self,
        pattern_index: i64,
        track_index: i64,
        notes: &[Note],
    ) -> Result<Value> {
        self.send_command(
            CommandType::AddNotesToPattern,
            json!({
                "pattern_index": pattern_index,
                "track_index": track_index,
                "notes": notes,
            }),
        )
        .await
    }

    /// Write loosely typed notes, filling in defaults for missing fields.
    pub async fn add_note_values(
        &mut self,
        pattern_index: i64,
        track_index: i64,
        notes: &[Value],
    ) -> Result<Value> {
        let notes: Vec<Note> = notes.iter().map(Note::sanitize).collect();
        self.add_notes_to_pattern(pattern_index, track_index, &notes)
            .await
    }

    /// Rename a pattern.
    pub async fn set_pattern_name(&mut self, pattern_index: i64, name: &str) -> Result<Value> {
        self.send_command(
            CommandType::SetPatternName,
            json!({ "pattern_index": pattern_index, "name": name }),
        )
        .await
    }

    /// Change the project tempo.
    pub async fn set_tempo(&mut self, tempo: f64) -> Result<Value> {
        self.send_command(CommandType::SetTempo, json!({ "tempo": tempo }))
            .await
    }

    /// Start one pattern.
    pub async fn play_pattern(&mut self, pattern_index: i64) -> Result<Value> {
        self.send_command(
            CommandType::PlayPattern,
            json!({ "pattern_index": pattern_index }),
        )
        .await
    }

    /// Stop one pattern.
    pub async fn stop_pattern(&mut self, pattern_index: i64) -> Result<Value> {
        self.send_command(
            CommandType::StopPattern,
            json!({ "pattern_index": pattern_index }),
        )
        .await
    }

    /// Start the transport.
    pub async fn start_playback(&mut self) -> Result<Value> {
        self.send_command(CommandType::StartPlayback, json!({})).await
    }

    /// Stop the transport.
    pub async fn stop_playback(&mut self) -> Result<Value> {
        self.send_command(CommandType::StopPlayback, json!({})).await
    }

    /// Available generators and effects.
    pub async fn get_plugin_list(&mut self) -> Result<Value> {
        self.send_command(CommandType::GetPluginList, json!({})).await
    }

    /// Load a plugin onto a channel.
    pub async fn load_plugin(&mut self, track_index: i64, plugin_name: &str) -> Result<Value> {
        self.send_command(
            CommandType::LoadPlugin,
            json!({ "track_index": track_index, "plugin_name": plugin_name }),
        )
        .await
    }
}

fn simulate(kind: CommandType, params: &Value) -> Value {
    simulated_response(kind, params, &mut rand::thread_rng())
}

async fn open(address: &str) -> Result<TcpStream> {
    let mut last_error = None;
    for addr in lookup_host(address).await? {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_keepalive(true)?;
        match socket.connect(addr).await {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => {
                debug!("Connect to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }
    Err(match last_error {
        Some(e) => Error::Io(e),
        None => Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no address found for {address}"),
        )),
    })
}

async fn read_message(
    stream: &mut TcpStream,
    decoder: &mut JsonStreamDecoder,
    read_size: usize,
) -> Result<Value> {
    let mut buf = vec![0u8; read_size];
    loop {
        if let Some(value) = decoder.next_message()? {
            return Ok(value);
        }
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        decoder.push(&buf[..n])?;
    }
}
