//! MCP Tool Types
//!
//! Parameter and response types for every tool the server exposes. Parameter
//! structs derive `JsonSchema` so rmcp can publish their input schemas.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_append_index() -> i64 {
    -1
}

fn default_pattern_name() -> String {
    "AI Pattern".to_string()
}

fn default_pattern_length() -> u32 {
    16
}

fn default_enabled() -> bool {
    true
}

// =============================================================================
// Session and Track Tools
// =============================================================================

/// Parameters for fl_session_info
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionInfoParams {}

/// Parameters for fl_track_info
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackInfoParams {
    /// Channel index
    pub track_index: i64,
}

/// Parameters for fl_create_midi_track
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateMidiTrackParams {
    /// Position of the new channel; negative appends at the end
    #[serde(default = "default_append_index")]
    pub index: i64,
}

/// Parameters for fl_set_track_name
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetTrackNameParams {
    /// Channel index
    pub track_index: i64,

    /// New channel name
    pub name: String,
}

// =============================================================================
// Pattern Tools
// =============================================================================

/// Parameters for fl_create_pattern
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreatePatternParams {
    /// Pattern name
    #[serde(default = "default_pattern_name")]
    pub name: String,

    /// Length in steps (16 steps = one 4/4 bar)
    #[serde(default = "default_pattern_length")]
    pub length: u32,
}

/// Parameters for fl_add_notes
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddNotesParams {
    /// Pattern receiving the notes
    pub pattern_index: i64,

    /// Channel the notes are written to
    pub track_index: i64,

    /// Notes as objects with `position`, `note`, `length` and `velocity`.
    /// Missing fields default to 0, 60, 1 and 100.
    pub notes: Vec<Value>,
}

/// Parameters for fl_set_pattern_name
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetPatternNameParams {
    /// Pattern index
    pub pattern_index: i64,

    /// New pattern name
    pub name: String,
}

/// Parameters for fl_play_pattern and fl_stop_pattern
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PatternParams {
    /// Pattern index
    pub pattern_index: i64,
}

// =============================================================================
// Transport Tools
// =============================================================================

/// Parameters for fl_set_tempo
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetTempoParams {
    /// Tempo in BPM (10 to 522)
    pub tempo: f64,
}

/// Parameters for fl_start_playback and fl_stop_playback
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PlaybackParams {}

// =============================================================================
// Plugin Tools
// =============================================================================

/// Parameters for fl_plugin_list
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PluginListParams {}

/// Parameters for fl_load_plugin
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoadPluginParams {
    /// Channel index
    pub track_index: i64,

    /// Plugin name as listed by fl_plugin_list (e.g. "Sytrus", "Fruity Reeverb 2")
    pub plugin_name: String,
}

// =============================================================================
// Workflow and Connection Tools
// =============================================================================

/// Parameters for fl_create_track_from_prompt
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateTrackFromPromptParams {
    /// Description such as "Create a techno bass track in F minor at 128 BPM"
    pub prompt: String,
}

/// Parameters for fl_set_simulation_mode
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimulationModeParams {
    /// Answer commands locally instead of talking to FL Studio
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Parameters for fl_test_connection
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConnectionTestParams {}

// =============================================================================
// Responses
// =============================================================================

/// Response for every tool that maps to a single bridge command
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommandResponse {
    /// Wire name of the command sent
    pub command: String,

    /// The `result` payload returned by FL Studio
    pub result: Value,

    /// True when the answer came from the local simulator
    pub simulated: bool,
}

/// Response for fl_set_simulation_mode
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimulationModeResponse {
    /// Current state
    pub simulation_mode: bool,

    /// State before the call
    pub previous: bool,

    /// Human-readable message
    pub message: String,
}

/// Response for fl_create_track_from_prompt
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackFromPromptResponse {
    /// Channel created
    pub track_index: i64,

    /// Name given to the channel
    pub track_name: String,

    /// Plugin loaded on the channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    /// Pattern created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_index: Option<i64>,

    /// Notes written
    pub note_count: usize,

    /// Summary lines
    pub summary: Vec<String>,

    /// Analyzed prompt
    pub properties: Value,

    /// True when the answers came from the local simulator
    pub simulated: bool,
}
