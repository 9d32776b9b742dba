//! FL Studio MCP Server Implementation
//!
//! This module implements the MCP server using rmcp 0.9's #[tool_router] pattern.
//! Each tool forwards to the [`FlStudioClient`], which talks JSON over TCP to the
//! remote script running inside FL Studio.

use std::sync::Arc;
use tokio::sync::Mutex;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use flstudio_mcp_bridge::{FlStudioClient, SimulationFlag};
use flstudio_mcp_core::{BridgeSettings, CommandType, Error};
use flstudio_mcp_prompt::create_track_from_prompt;

use crate::tools::*;

/// Map a library error onto a JSON-RPC error.
///
/// Bad arguments (whether caught here or rejected by FL Studio) are invalid
/// params; everything else is an internal error.
fn to_mcp_error(context: &str, err: Error) -> McpError {
    error!("{} failed: {}", context, err);
    let code = match err {
        Error::InvalidParams(_) | Error::Remote(_) | Error::UnknownCommand(_) => {
            ErrorCode(-32602) // Invalid params
        }
        _ => ErrorCode(-32603), // Internal error
    };
    McpError::new(code, format!("{context} failed: {err}"), None)
}

fn pretty<T: Serialize>(value: &T, fallback: impl FnOnce() -> String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback()),
    )])
}

/// FL Studio MCP Server
///
/// Exposes the remote script's command set as MCP tools.
#[derive(Clone)]
pub struct FlStudioMcpServer {
    /// Bridge client shared by all tool calls
    client: Arc<Mutex<FlStudioClient>>,
    /// Simulation flag shared with the client, readable without locking it
    simulation: SimulationFlag,
    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FlStudioMcpServer {
    /// Create a server whose client connects with `settings`.
    pub fn new(settings: BridgeSettings) -> Self {
        Self::with_client(FlStudioClient::new(settings))
    }

    /// Create a server around an existing client
    pub fn with_client(client: FlStudioClient) -> Self {
        let simulation = client.simulation_flag();
        Self {
            client: Arc::new(Mutex::new(client)),
            simulation,
            tool_router: Self::tool_router(),
        }
    }

    /// Whether commands are currently answered by the simulator
    pub fn simulation_mode(&self) -> bool {
        self.simulation.get()
    }

    /// Send one command and wrap its result (helper method)
    async fn forward(&self, kind: CommandType, params: Value) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .lock()
            .await
            .send_command(kind, params)
            .await
            .map_err(|e| to_mcp_error(kind.as_str(), e))?;

        let simulated = self.simulation.get();
        if simulated {
            debug!("{} answered in simulation mode", kind);
        }

        let response = CommandResponse {
            command: kind.as_str().to_string(),
            result,
            simulated,
        };
        Ok(pretty(&response, || format!("{kind} completed")))
    }

    /// Get session info
    #[tool(description = "Get FL Studio session info: tempo, time signature and channel count")]
    #[instrument(skip_all)]
    async fn fl_session_info(
        &self,
        Parameters(_params): Parameters<SessionInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward(CommandType::GetSessionInfo, serde_json::json!({}))
            .await
    }

    /// Get track info
    #[tool(description = "Get name, color, volume, pan and mute state of a channel")]
    #[instrument(skip_all)]
    async fn fl_track_info(
        &self,
        Parameters(params): Parameters<TrackInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Track info: track_index={}", params.track_index);
        self.forward(
            CommandType::GetTrackInfo,
            serde_json::json!({ "track_index": params.track_index }),
        )
        .await
    }

    /// Create a channel
    #[tool(description = "Create a new MIDI channel; a negative index appends it at the end")]
    #[instrument(skip_all)]
    async fn fl_create_midi_track(
        &self,
        Parameters(params): Parameters<CreateMidiTrackParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Creating MIDI track: index={}", params.index);
        self.forward(
            CommandType::CreateMidiTrack,
            serde_json::json!({ "index": params.index }),
        )
        .await
    }

    /// Rename a channel
    #[tool(description = "Rename a channel")]
    #[instrument(skip_all)]
    async fn fl_set_track_name(
        &self,
        Parameters(params): Parameters<SetTrackNameParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "Renaming track: track_index={}, name='{}'",
            params.track_index, params.name
        );
        self.forward(
            CommandType::SetTrackName,
            serde_json::json!({ "track_index": params.track_index, "name": params.name }),
        )
        .await
    }

    /// Create a pattern
    #[tool(description = "Create a new pattern with the given name and length in steps")]
    #[instrument(skip_all)]
    async fn fl_create_pattern(
        &self,
        Parameters(params): Parameters<CreatePatternParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "Creating pattern: name='{}', length={}",
            params.name, params.length
        );
        self.forward(
            CommandType::CreatePattern,
            serde_json::json!({ "name": params.name, "length": params.length }),
        )
        .await
    }

    /// Add notes to a pattern
    #[tool(
        description = "Add notes to a pattern on a channel. Each note has position, note (MIDI 0-127), length and velocity"
    )]
    #[instrument(skip_all)]
    async fn fl_add_notes(
        &self,
        Parameters(params): Parameters<AddNotesParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "Adding notes: pattern_index={}, track_index={}, count={}",
            params.pattern_index,
            params.track_index,
            params.notes.len()
        );

        let result = self
            .client
            .lock()
            .await
            .add_note_values(params.pattern_index, params.track_index, &params.notes)
            .await
            .map_err(|e| to_mcp_error("add_notes_to_pattern", e))?;

        let response = CommandResponse {
            command: CommandType::AddNotesToPattern.as_str().to_string(),
            result,
            simulated: self.simulation.get(),
        };
        Ok(pretty(&response, || {
            format!("Added {} notes", params.notes.len())
        }))
    }

    /// Rename a pattern
    #[tool(description = "Rename a pattern")]
    #[instrument(skip_all)]
    async fn fl_set_pattern_name(
        &self,
        Parameters(params): Parameters<SetPatternNameParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward(
            CommandType::SetPatternName,
            serde_json::json!({ "pattern_index": params.pattern_index, "name": params.name }),
        )
        .await
    }

    /// Set the tempo
    #[tool(description = "Set the project tempo in BPM (10-522)")]
    #[instrument(skip_all)]
    async fn fl_set_tempo(
        &self,
        Parameters(params): Parameters<SetTempoParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Setting tempo: {}", params.tempo);
        self.forward(
            CommandType::SetTempo,
            serde_json::json!({ "tempo": params.tempo }),
        )
        .await
    }

    /// Play a pattern
    #[tool(description = "Select a pattern and start playing it")]
    #[instrument(skip_all)]
    async fn fl_play_pattern(
        &self,
        Parameters(params): Parameters<PatternParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward(
            CommandType::PlayPattern,
            serde_json::json!({ "pattern_index": params.pattern_index }),
        )
        .await
    }

    /// Stop a pattern
    #[tool(description = "Stop a playing pattern")]
    #[instrument(skip_all)]
    async fn fl_stop_pattern(
        &self,
        Parameters(params): Parameters<PatternParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward(
            CommandType::StopPattern,
            serde_json::json!({ "pattern_index": params.pattern_index }),
        )
        .await
    }

    /// Start the transport
    #[tool(description = "Start playback")]
    #[instrument(skip_all)]
    async fn fl_start_playback(
        &self,
        Parameters(_params): Parameters<PlaybackParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward(CommandType::StartPlayback, serde_json::json!({}))
            .await
    }

    /// Stop the transport
    #[tool(description = "Stop playback")]
    #[instrument(skip_all)]
    async fn fl_stop_playback(
        &self,
        Parameters(_params): Parameters<PlaybackParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward(CommandType::StopPlayback, serde_json::json!({}))
            .await
    }

    /// List plugins
    #[tool(description = "List the instrument and effect plugins FL Studio can load")]
    #[instrument(skip_all)]
    async fn fl_plugin_list(
        &self,
        Parameters(_params): Parameters<PluginListParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward(CommandType::GetPluginList, serde_json::json!({}))
            .await
    }

    /// Load a plugin
    #[tool(description = "Load a plugin onto a channel by name")]
    #[instrument(skip_all)]
    async fn fl_load_plugin(
        &self,
        Parameters(params): Parameters<LoadPluginParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "Loading plugin: track_index={}, plugin='{}'",
            params.track_index, params.plugin_name
        );
        self.forward(
            CommandType::LoadPlugin,
            serde_json::json!({
                "track_index": params.track_index,
                "plugin_name": params.plugin_name,
            }),
        )
        .await
    }

    /// Create a complete track from a description
    #[tool(
        description = "Create a channel, load a fitting plugin, and write a pattern of notes from a natural-language description such as 'techno bass in F minor at 128 BPM with reverb'"
    )]
    #[instrument(skip_all)]
    async fn fl_create_track_from_prompt(
        &self,
        Parameters(params): Parameters<CreateTrackFromPromptParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Creating track from prompt: '{}'", params.prompt);

        let report = {
            let mut client = self.client.lock().await;
            create_track_from_prompt(&mut client, &params.prompt)
                .await
                .map_err(|e| to_mcp_error("create_track_from_prompt", e))?
        };

        for warning in &report.warnings {
            warn!("Track creation warning: {}", warning);
        }

        let summary = report.summary();
        let response = TrackFromPromptResponse {
            track_index: report.track_index,
            track_name: report.properties.name.clone(),
            plugin: report.plugin.clone(),
            pattern_index: report.pattern_index,
            note_count: report.note_count,
            summary: summary.clone(),
            properties: serde_json::to_value(&report.properties).unwrap_or(Value::Null),
            simulated: self.simulation.get(),
        };

        Ok(pretty(&response, || summary.join("\n")))
    }

    /// Toggle simulation mode
    #[tool(
        description = "Enable or disable simulation mode. In simulation mode commands are answered locally without FL Studio"
    )]
    #[instrument(skip_all)]
    async fn fl_set_simulation_mode(
        &self,
        Parameters(params): Parameters<SimulationModeParams>,
    ) -> Result<CallToolResult, McpError> {
        let previous = self
            .client
            .lock()
            .await
            .set_simulation_mode(params.enabled);

        let response = SimulationModeResponse {
            simulation_mode: params.enabled,
            previous,
            message: format!(
                "Simulation mode {}",
                if params.enabled { "enabled" } else { "disabled" }
            ),
        };
        Ok(pretty(&response, || response.message.clone()))
    }

    /// Probe the connection
    #[tool(description = "Check whether the FL Studio remote script answers on its TCP port")]
    #[instrument(skip_all)]
    async fn fl_test_connection(
        &self,
        Parameters(_params): Parameters<ConnectionTestParams>,
    ) -> Result<CallToolResult, McpError> {
        let status = self.client.lock().await.test_connection().await;
        if status.connected {
            info!("FL Studio reachable at {}", status.address);
        } else {
            warn!(
                "FL Studio not reachable at {} (simulation mode: {})",
                status.address, status.simulation_mode
            );
        }
        Ok(pretty(&status, || {
            format!("connected={}", status.connected)
        }))
    }
}

impl Default for FlStudioMcpServer {
    fn default() -> Self {
        Self::new(BridgeSettings::default())
    }
}

// Implement the ServerHandler trait to define server capabilities
#[tool_handler]
impl rmcp::ServerHandler for FlStudioMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "FL Studio MCP Server - Control FL Studio through its MCP remote script. \
                 Use fl_session_info to inspect the project, fl_create_midi_track and \
                 fl_load_plugin to build channels, fl_create_pattern and fl_add_notes to write \
                 music, or fl_create_track_from_prompt to do all of it from a description. \
                 When FL Studio is unreachable the server falls back to simulation mode."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_are_invalid_params() {
        let err = to_mcp_error("set_tempo", Error::Remote("Tempo out of range".into()));
        assert_eq!(err.code, ErrorCode(-32602));
        assert!(err.message.contains("Tempo out of range"));
    }

    #[test]
    fn transport_errors_are_internal() {
        let err = to_mcp_error("get_session_info", Error::ConnectionClosed);
        assert_eq!(err.code, ErrorCode(-32603));
    }

    #[test]
    fn tool_router_registers_every_tool() {
        let server = FlStudioMcpServer::default();
        let names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        for expected in [
            "fl_session_info",
            "fl_track_info",
            "fl_create_midi_track",
            "fl_set_track_name",
            "fl_create_pattern",
            "fl_add_notes",
            "fl_set_pattern_name",
            "fl_set_tempo",
            "fl_play_pattern",
            "fl_stop_pattern",
            "fl_start_playback",
            "fl_stop_playback",
            "fl_plugin_list",
            "fl_load_plugin",
            "fl_create_track_from_prompt",
            "fl_set_simulation_mode",
            "fl_test_connection",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }
}
