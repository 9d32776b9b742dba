//! JSON wire protocol between clients and the FL Studio remote script.
//!
//! A request is a bare JSON object `{"type": "<command>", "params": {...}}`
//! and the answer is `{"status": "success"|"error", "result"?, "message"?}`.
//! There is no length prefix or delimiter; see the bridge framing module.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Every command the remote script understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Tempo, signature, channel count, master track
    GetSessionInfo,
    /// Details for one channel
    GetTrackInfo,
    /// Add a channel (`index` < 0 appends)
    CreateMidiTrack,
    /// Rename a channel
    SetTrackName,
    /// Add a pattern
    CreatePattern,
    /// Write notes into a pattern
    AddNotesToPattern,
    /// Rename a pattern
    SetPatternName,
    /// Change the project tempo
    SetTempo,
    /// Start playing one pattern
    PlayPattern,
    /// Stop one pattern
    StopPattern,
    /// Start the transport
    StartPlayback,
    /// Stop the transport
    StopPlayback,
    /// List available generators and effects
    GetPluginList,
    /// Load a plugin onto a channel
    LoadPlugin,
}

impl CommandType {
    /// All commands, in protocol documentation order.
    pub const ALL: [CommandType; 14] = [
        CommandType::GetSessionInfo,
        CommandType::GetTrackInfo,
        CommandType::CreateMidiTrack,
        CommandType::SetTrackName,
        CommandType::CreatePattern,
        CommandType::AddNotesToPattern,
        CommandType::SetPatternName,
        CommandType::SetTempo,
        CommandType::PlayPattern,
        CommandType::StopPattern,
        CommandType::StartPlayback,
        CommandType::StopPlayback,
        CommandType::GetPluginList,
        CommandType::LoadPlugin,
    ];

    /// Wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::GetSessionInfo => "get_session_info",
            CommandType::GetTrackInfo => "get_track_info",
            CommandType::CreateMidiTrack => "create_midi_track",
            CommandType::SetTrackName => "set_track_name",
            CommandType::CreatePattern => "create_pattern",
            CommandType::AddNotesToPattern => "add_notes_to_pattern",
            CommandType::SetPatternName => "set_pattern_name",
            CommandType::SetTempo => "set_tempo",
            CommandType::PlayPattern => "play_pattern",
            CommandType::StopPattern => "stop_pattern",
            CommandType::StartPlayback => "start_playback",
            CommandType::StopPlayback => "stop_playback",
            CommandType::GetPluginList => "get_plugin_list",
            CommandType::LoadPlugin => "load_plugin",
        }
    }

    /// Whether the command changes project state.
    ///
    /// The remote script runs these on a worker with a timeout.
    pub fn mutates_state(&self) -> bool {
        !matches!(
            self,
            CommandType::GetSessionInfo | CommandType::GetTrackInfo | CommandType::GetPluginList
        )
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CommandType::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownCommand(s.to_string()))
    }
}

/// A request sent to the remote script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command name; kept as a string so unknown commands can be reported
    #[serde(rename = "type", default)]
    pub command_type: String,

    /// Command parameters
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Command {
    /// Build a command from a typed name and a JSON object of parameters.
    ///
    /// Non-object `params` are replaced with an empty object.
    pub fn new(command_type: CommandType, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            command_type: command_type.as_str().to_string(),
            params,
        }
    }

    /// Parse the command name.
    pub fn kind(&self) -> Result<CommandType> {
        self.command_type.parse()
    }

    /// Integer parameter. Numeric strings and whole floats are accepted.
    pub fn param_i64(&self, name: &str) -> Option<i64> {
        self.params.get(name).and_then(value_as_i64)
    }

    /// Floating point parameter. Numeric strings are accepted.
    pub fn param_f64(&self, name: &str) -> Option<f64> {
        match self.params.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String parameter.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Whether the parameter is present and not null.
    pub fn has_param(&self, name: &str) -> bool {
        self.params.get(name).is_some_and(|v| !v.is_null())
    }

    /// The `notes` parameter, sanitized. Missing or non-array yields an empty list.
    pub fn param_notes(&self) -> Vec<Note> {
        match self.params.get("notes") {
            Some(Value::Array(items)) => items.iter().map(Note::sanitize).collect(),
            _ => Vec::new(),
        }
    }
}

/// Outcome flag of a [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Command executed
    Success,
    /// Command failed; `message` says why
    Error,
}

/// A reply from the remote script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Outcome
    pub status: ResponseStatus,

    /// Command-specific payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    /// Successful response carrying `result`.
    pub fn success(result: Value) -> Self {
        Self {
            status: ResponseStatus::Success,
            result: Some(result),
            message: None,
        }
    }

    /// Error response with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            result: None,
            message: Some(message.into()),
        }
    }

    /// Whether the status is `success`.
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Convert into the `result` payload, or [`Error::Remote`].
    pub fn into_result(self) -> Result<Value> {
        match self.status {
            ResponseStatus::Success => Ok(self
                .result
                .unwrap_or_else(|| Value::Object(Map::new()))),
            ResponseStatus::Error => Err(Error::Remote(
                self.message
                    .unwrap_or_else(|| "Unknown error from FL Studio".to_string()),
            )),
        }
    }
}

impl From<Error> for Response {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidJson(_) => Response::error("Invalid JSON"),
            Error::InvalidParams(msg) | Error::Remote(msg) => Response::error(msg),
            other => Response::error(other.to_string()),
        }
    }
}

/// A single note placed in a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Note {
    /// Step position within the pattern
    #[serde(default)]
    pub position: u32,

    /// MIDI note number (60 = middle C)
    #[serde(default = "default_note")]
    pub note: u8,

    /// Length in steps
    #[serde(default = "default_length")]
    pub length: u32,

    /// MIDI velocity
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

fn default_note() -> u8 {
    60
}

fn default_length() -> u32 {
    1
}

fn default_velocity() -> u8 {
    100
}

impl Default for Note {
    fn default() -> Self {
        Self {
            position: 0,
            note: default_note(),
            length: default_length(),
            velocity: default_velocity(),
        }
    }
}

impl Note {
    /// Create a note.
    pub fn new(position: u32, note: u8, length: u32, velocity: u8) -> Self {
        Self {
            position,
            note,
            length,
            velocity,
        }
    }

    /// Build a note from loosely typed JSON.
    ///
    /// Missing or unparsable fields take the defaults (0, 60, 1, 100);
    /// pitch and velocity are clamped to 0..=127, position and length to >= 0.
    pub fn sanitize(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(value_as_i64);
        let defaults = Note::default();
        Self {
            position: field("position")
                .map(|v| v.clamp(0, u32::MAX as i64) as u32)
                .unwrap_or(defaults.position),
            note: field("note")
                .map(|v| v.clamp(0, 127) as u8)
                .unwrap_or(defaults.note),
            length: field("length")
                .map(|v| v.clamp(0, u32::MAX as i64) as u32)
                .unwrap_or(defaults.length),
            velocity: field("velocity")
                .map(|v| v.clamp(0, 127) as u8)
                .unwrap_or(defaults.velocity),
        }
    }

    /// Last step covered by the note (exclusive).
    pub fn end(&self) -> u32 {
        self.position.saturating_add(self.length)
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
