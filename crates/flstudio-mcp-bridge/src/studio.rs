//! In-process stand-in for FL Studio.
//!
//! [`SimulatedStudio`] keeps a small project model (channels, patterns,
//! notes, transport) and answers every bridge command the way the remote
//! script does, so clients can be exercised without the DAW.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use flstudio_mcp_core::{Command, CommandType, Error, Note, Result};

use crate::handler::CommandHandler;

/// Project tempo of a new FL Studio project.
pub const DEFAULT_TEMPO: f64 = 140.0;

/// Tempo range accepted by FL Studio.
pub const TEMPO_RANGE: std::ops::RangeInclusive<f64> = 10.0..=522.0;

/// Default pattern length in steps.
const DEFAULT_PATTERN_LENGTH: u32 = 16;

/// Plugin category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    /// Generator loaded into a channel
    Instrument,
    /// Mixer effect
    Effect,
}

const CATALOGUE: &[(&str, PluginKind)] = &[
    ("3x Osc", PluginKind::Instrument),
    ("FLEX", PluginKind::Instrument),
    ("Sytrus", PluginKind::Instrument),
    ("Harmless", PluginKind::Instrument),
    ("Harmor", PluginKind::Instrument),
    ("GMS", PluginKind::Instrument),
    ("FPC", PluginKind::Instrument),
    ("Slicex", PluginKind::Instrument),
    ("DirectWave", PluginKind::Instrument),
    ("Sakura", PluginKind::Instrument),
    ("Fruity DX10", PluginKind::Instrument),
    ("DrumSynth Live", PluginKind::Instrument),
    ("Fruity Reeverb 2", PluginKind::Effect),
    ("Fruity Delay 3", PluginKind::Effect),
    ("Fruity Parametric EQ 2", PluginKind::Effect),
    ("Fruity Limiter", PluginKind::Effect),
    ("Fruity Compressor", PluginKind::Effect),
    ("Fruity Fast Dist", PluginKind::Effect),
    ("Fruity Chorus", PluginKind::Effect),
    ("Fruity Filter", PluginKind::Effect),
];

#[derive(Debug, Clone)]
struct Channel {
    name: String,
    generator: Option<String>,
    effects: Vec<String>,
    mute: bool,
    solo: bool,
    volume: f64,
    panning: f64,
}

impl Channel {
    fn new(position: usize) -> Self {
        Self {
            name: format!("Channel {}", position + 1),
            generator: None,
            effects: Vec::new(),
            mute: false,
            solo: false,
            volume: 0.8,
            panning: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
struct Pattern {
    name: String,
    length: u32,
    /// Notes per channel index
    notes: BTreeMap<usize, Vec<Note>>,
}

#[derive(Debug)]
struct ProjectState {
    tempo: f64,
    channels: Vec<Channel>,
    patterns: BTreeMap<u32, Pattern>,
    playing: bool,
    playing_patterns: BTreeSet<u32>,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            channels: Vec::new(),
            patterns: BTreeMap::new(),
            playing: false,
            playing_patterns: BTreeSet::new(),
        }
    }
}

/// Simulated FL Studio project.
#[derive(Debug, Default)]
pub struct SimulatedStudio {
    state: Mutex<ProjectState>,
}

fn missing(what: &str) -> Error {
    Error::InvalidParams(format!("Missing {what} parameter"))
}

impl SimulatedStudio {
    /// Empty project at the default tempo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a plugin in the catalogue, ignoring case.
    pub fn find_plugin(name: &str) -> Option<(&'static str, PluginKind)> {
        CATALOGUE
            .iter()
            .copied()
            .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
    }

    /// Current tempo.
    pub fn tempo(&self) -> f64 {
        self.lock().tempo
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.lock().channels.len()
    }

    /// Notes stored in a pattern for one channel.
    pub fn notes(&self, pattern_index: u32, track_index: usize) -> Vec<Note> {
        self.lock()
            .patterns
            .get(&pattern_index)
            .and_then(|p| p.notes.get(&track_index))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the transport is running.
    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn lock(&self) -> MutexGuard<'_, ProjectState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(&self, kind: CommandType, cmd: &Command) -> Result<Value> {
        let mut state = self.lock();
        match kind {
            CommandType::GetSessionInfo => Ok(json!({
                "tempo": state.tempo,
                "signature_numerator": 4,
                "signature_denominator": 4,
                "track_count": state.channels.len(),
                "pattern_count": state.patterns.len(),
                "playing": state.playing,
                "master_track": { "name": "Master", "volume": 0.8, "panning": 0.5 },
            })),

            CommandType::GetTrackInfo => {
                let index = cmd.param_i64("track_index").unwrap_or(0);
                let position = channel_position(&state, index)?;
                let channel = &state.channels[position];
                let patterns: Vec<u32> = state
                    .patterns
                    .iter()
                    .filter(|(_, p)| p.notes.contains_key(&position))
                    .map(|(i, _)| *i)
                    .collect();
                Ok(json!({
                    "index": index,
                    "name": channel.name,
                    "is_audio_track": false,
                    "is_midi_track": true,
                    "mute": channel.mute,
                    "solo": channel.solo,
                    "volume": channel.volume,
                    "panning": channel.panning,
                    "plugin": channel.generator,
                    "effects": channel.effects,
                    "patterns": patterns,
                }))
            }

            CommandType::CreateMidiTrack => {
                let requested = cmd.param_i64("index").unwrap_or(-1);
                let position = if requested < 0 {
                    state.channels.len()
                } else {
                    let position = requested as usize;
                    if position > state.channels.len() {
                        return Err(Error::InvalidParams(format!(
                            "Invalid track index: {requested}"
                        )));
                    }
                    position
                };
                let channel = Channel::new(position);
                let name = channel.name.clone();
                state.channels.insert(position, channel);
                Ok(json!({ "index": position, "name": name }))
            }

            CommandType::SetTrackName => {
                let (Some(index), Some(name)) = (cmd.param_i64("track_index"), cmd.param_str("name"))
                else {
                    return Err(missing("track_index or name"));
                };
                let position = channel_position(&state, index)?;
                state.channels[position].name = name.to_string();
                Ok(json!({ "name": name }))
            }

            CommandType::CreatePattern => {
                let index = match cmd.param_i64("pattern_index") {
                    Some(i) if i >= 0 => i as u32,
                    Some(i) => {
                        return Err(Error::InvalidParams(format!("Invalid pattern index: {i}")))
                    }
                    None => state.patterns.keys().next_back().map_or(0, |last| last + 1),
                };
                let length = cmd
                    .param_i64("length")
                    .filter(|l| *l > 0)
                    .map_or(DEFAULT_PATTERN_LENGTH, |l| l.min(u32::MAX as i64) as u32);
                let name = cmd
                    .param_str("name")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Pattern {}", index + 1));
                state.patterns.insert(
                    index,
                    Pattern {
                        name: name.clone(),
                        length,
                        notes: BTreeMap::new(),
                    },
                );
                Ok(json!({ "index": index, "name": name, "length": length }))
            }

            CommandType::AddNotesToPattern => {
                let notes = cmd.param_notes();
                let (Some(pattern_index), Some(track_index)) =
                    (cmd.param_i64("pattern_index"), cmd.param_i64("track_index"))
                else {
                    return Err(missing("pattern_index, track_index, or notes"));
                };
                if notes.is_empty() {
                    return Err(missing("pattern_index, track_index, or notes"));
                }
                let position = channel_position(&state, track_index)?;
                let pattern = pattern_mut(&mut state, pattern_index)?;
                let stored = pattern.notes.entry(position).or_default();
                stored.extend(notes.iter().copied());
                stored.sort_by_key(|n| (n.position, n.note));
                let end = notes.iter().map(Note::end).max().unwrap_or(0);
                if end > pattern.length {
                    debug!("Pattern {} grows to {} steps", pattern_index, end);
                    pattern.length = end;
                }
                Ok(json!({ "note_count": notes.len() }))
            }

            CommandType::SetPatternName => {
                let (Some(index), Some(name)) = (cmd.param_i64("pattern_index"), cmd.param_str("name"))
                else {
                    return Err(missing("pattern_index or name"));
                };
                pattern_mut(&mut state, index)?.name = name.to_string();
                Ok(json!({ "name": name }))
            }

            CommandType::SetTempo => {
                let tempo = cmd.param_f64("tempo").ok_or_else(|| missing("tempo"))?;
                if !TEMPO_RANGE.contains(&tempo) {
                    return Err(Error::InvalidParams(format!(
                        "Tempo must be between {} and {} BPM",
                        TEMPO_RANGE.start(),
                        TEMPO_RANGE.end()
                    )));
                }
                state.tempo = tempo;
                Ok(json!({ "tempo": tempo }))
            }

            CommandType::PlayPattern => {
                let index = cmd
                    .param_i64("pattern_index")
                    .ok_or_else(|| missing("pattern_index"))?;
                pattern_mut(&mut state, index)?;
                state.playing_patterns.insert(index as u32);
                state.playing = true;
                Ok(json!({ "playing": true, "pattern_index": index }))
            }

            CommandType::StopPattern => {
                let index = cmd
                    .param_i64("pattern_index")
                    .ok_or_else(|| missing("pattern_index"))?;
                pattern_mut(&mut state, index)?;
                state.playing_patterns.remove(&(index as u32));
                if state.playing_patterns.is_empty() {
                    state.playing = false;
                }
                Ok(json!({ "stopped": true, "pattern_index": index }))
            }

            CommandType::StartPlayback => {
                state.playing = true;
                Ok(json!({ "playing": true }))
            }

            CommandType::StopPlayback => {
                state.playing = false;
                state.playing_patterns.clear();
                Ok(json!({ "playing": false }))
            }

            CommandType::GetPluginList => {
                let plugins: Vec<Value> = CATALOGUE
                    .iter()
                    .map(|(name, kind)| json!({ "name": name, "type": kind }))
                    .collect();
                Ok(json!({ "plugins": plugins }))
            }

            CommandType::LoadPlugin => {
                let (Some(index), Some(requested)) =
                    (cmd.param_i64("track_index"), cmd.param_str("plugin_name"))
                else {
                    return Err(missing("track_index or plugin_name"));
                };
                let (name, kind) = Self::find_plugin(requested)
                    .ok_or_else(|| Error::InvalidParams(format!("Plugin not found: {requested}")))?;
                let position = channel_position(&state, index)?;
                let channel = &mut state.channels[position];
                match kind {
                    PluginKind::Instrument => channel.generator = Some(name.to_string()),
                    PluginKind::Effect => channel.effects.push(name.to_string()),
                }
                Ok(json!({ "loaded": true, "plugin_name": name, "track_index": index }))
            }
        }
    }
}

fn channel_position(state: &ProjectState, index: i64) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < state.channels.len())
        .ok_or_else(|| Error::InvalidParams(format!("Invalid track index: {index}")))
}

fn pattern_mut(state: &mut ProjectState, index: i64) -> Result<&mut Pattern> {
    u32::try_from(index)
        .ok()
        .and_then(|i| state.patterns.get_mut(&i))
        .ok_or_else(|| Error::InvalidParams(format!("Invalid pattern index: {index}")))
}

impl CommandHandler for SimulatedStudio {
    fn handle(&self, command: &Command) -> Result<Value> {
        let kind = command.kind()?;
        self.execute(kind, command)
    }
}
