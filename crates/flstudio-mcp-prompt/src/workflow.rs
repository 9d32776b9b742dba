//! End-to-end track creation from a prompt.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use flstudio_mcp_bridge::FlStudioClient;
use flstudio_mcp_core::{Error, Result};

use crate::analyze::{analyze_prompt, TrackProperties};
use crate::notes::generate_notes;
use crate::plugins::{plugin_names, select_plugin, FALLBACK_PLUGINS};

/// What [`create_track_from_prompt`] did.
#[derive(Debug, Clone, Serialize)]
pub struct TrackCreationReport {
    /// The analyzed prompt
    pub properties: TrackProperties,
    /// Channel created
    pub track_index: i64,
    /// Tempo applied, if the prompt named one and FL Studio accepted it
    pub tempo: Option<u32>,
    /// Plugin loaded on the channel
    pub plugin: Option<String>,
    /// Pattern created
    pub pattern_index: Option<i64>,
    /// Name given to the pattern
    pub pattern_name: String,
    /// Notes written into the pattern
    pub note_count: usize,
    /// Effect plugins loaded
    pub effects: Vec<String>,
    /// Steps that failed without aborting the run
    pub warnings: Vec<String>,
}

impl TrackCreationReport {
    /// Human-readable summary lines.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Track creation complete for '{}' (track {})",
            self.properties.name, self.track_index
        )];
        if let Some(plugin) = &self.plugin {
            lines.push(format!("Plugin: {plugin}"));
        }
        lines.push(format!(
            "Pattern: {} ({} steps, {} notes)",
            self.pattern_name, self.properties.pattern_length, self.note_count
        ));
        if let Some(tempo) = self.tempo {
            lines.push(format!("Tempo: {tempo} BPM"));
        }
        if !self.effects.is_empty() {
            lines.push(format!("Effects: {}", self.effects.join(", ")));
        }
        for warning in &self.warnings {
            lines.push(format!("Warning: {warning}"));
        }
        lines
    }
}

fn index_of(result: &Value) -> Option<i64> {
    result.get("index").and_then(Value::as_i64)
}

/// Create a channel, plugin, pattern and notes described by `prompt`.
///
/// Creating and naming the channel must succeed; later steps that fail are
/// recorded as warnings and the run continues.
pub async fn create_track_from_prompt(
    client: &mut FlStudioClient,
    prompt: &str,
) -> Result<TrackCreationReport> {
    info!("Analyzing prompt: '{}'", prompt);
    let props = analyze_prompt(prompt);
    let mut warnings = Vec::new();

    let created = client.create_midi_track(-1).await?;
    let track_index = index_of(&created)
        .ok_or_else(|| Error::Other("FL Studio did not report a track index".to_string()))?;
    client.set_track_name(track_index, &props.name).await?;
    info!("Created track '{}' at index {}", props.name, track_index);

    let mut tempo = None;
    if let Some(bpm) = props.tempo {
        match client.set_tempo(f64::from(bpm)).await {
            Ok(_) => tempo = Some(bpm),
            Err(e) => warnings.push(format!("Could not set tempo: {e}")),
        }
    }

    let available = match client.get_plugin_list().await {
        Ok(list) => plugin_names(&list),
        Err(e) => {
            warn!("Could not get plugin list: {}", e);
            Vec::new()
        }
    };
    let available = if available.is_empty() {
        FALLBACK_PLUGINS.iter().map(|p| p.to_string()).collect()
    } else {
        available
    };
    let plugin_name = select_plugin(&props, &available);
    let plugin = match client.load_plugin(track_index, &plugin_name).await {
        Ok(_) => {
            info!("Loaded plugin '{}' on track {}", plugin_name, track_index);
            Some(plugin_name)
        }
        Err(e) => {
            warnings.push(format!("Could not load plugin '{plugin_name}': {e}"));
            None
        }
    };

    let pattern_name = format!("{} Pattern", props.name);
    let mut pattern_index = None;
    let mut note_count = 0;
    match client
        .create_pattern(&pattern_name, props.pattern_length)
        .await
        .map(|r| index_of(&r))
    {
        Ok(Some(index)) => {
            pattern_index = Some(index);
            let notes = generate_notes(&props, &mut StdRng::from_entropy());
            match client.add_notes_to_pattern(index, track_index, &notes).await {
                Ok(_) => note_count = notes.len(),
                Err(e) => warnings.push(format!("Could not add notes: {e}")),
            }
        }
        Ok(None) => warnings.push("FL Studio did not report a pattern index".to_string()),
        Err(e) => warnings.push(format!("Could not create pattern: {e}")),
    }

    let mut effects = Vec::new();
    for effect in &props.effects {
        let name = effect.plugin_name();
        match client.load_plugin(track_index, name).await {
            Ok(_) => effects.push(name.to_string()),
            Err(e) => warnings.push(format!("Could not load effect '{name}': {e}")),
        }
    }

    for warning in &warnings {
        warn!("{}", warning);
    }

    Ok(TrackCreationReport {
        properties: props,
        track_index,
        tempo,
        plugin,
        pattern_index,
        pattern_name,
        note_count,
        effects,
        warnings,
    })
}
