//! Plugin selection.

use serde_json::Value;

use crate::analyze::{InstrumentType, TrackProperties, TrackType};

/// Plugins assumed available when FL Studio cannot be asked.
pub const FALLBACK_PLUGINS: [&str; 6] = ["FLEX", "Fruity DX10", "Sytrus", "GMS", "FPC", "DirectWave"];

const DEFAULT_PLUGIN: &str = "FLEX";

/// Plugin names from a `get_plugin_list` result.
///
/// Entries may be bare strings or objects with a `name` field.
pub fn plugin_names(result: &Value) -> Vec<String> {
    result
        .get("plugins")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name.clone()),
                    Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn preferred_plugins(props: &TrackProperties) -> &'static [&'static str] {
    match props.instrument_type {
        InstrumentType::Piano
        | InstrumentType::Strings
        | InstrumentType::Brass
        | InstrumentType::Guitar => &["FLEX", "DirectWave"],
        InstrumentType::Synth => &["FLEX", "Sytrus", "Harmor", "GMS"],
        _ => match props.track_type {
            TrackType::Bass => &["FLEX", "Sytrus", "GMS", "Harmor"],
            TrackType::Lead => &["FLEX", "Sytrus", "Harmor"],
            TrackType::Pad => &["FLEX", "Harmor", "Sytrus"],
            TrackType::Drums => &["FPC", "DrumSynth Live"],
            _ => &[DEFAULT_PLUGIN],
        },
    }
}

/// Pick the plugin for a track.
///
/// The instrument decides first, then the track type. Falls back to FLEX,
/// then to the first available plugin, then to "FLEX" regardless.
pub fn select_plugin(props: &TrackProperties, available: &[String]) -> String {
    let has = |name: &str| available.iter().any(|a| a == name);

    if let Some(found) = preferred_plugins(props).iter().find(|p| has(p)) {
        return (*found).to_string();
    }
    if has(DEFAULT_PLUGIN) {
        return DEFAULT_PLUGIN.to_string();
    }
    available
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_PLUGIN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze_prompt;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plugin_names_accepts_both_shapes() {
        let strings = json!({ "plugins": ["FLEX", "Sytrus"] });
        assert_eq!(plugin_names(&strings), names(&["FLEX", "Sytrus"]));

        let objects = json!({ "plugins": [{ "name": "FPC", "type": "instrument" }, 7] });
        assert_eq!(plugin_names(&objects), names(&["FPC"]));

        assert!(plugin_names(&json!({ "status": "success" })).is_empty());
    }

    #[test]
    fn test_drums_prefer_fpc() {
        let props = analyze_prompt("Make a hip hop drum beat at 90 BPM");
        assert_eq!(select_plugin(&props, &names(&FALLBACK_PLUGINS)), "FPC");
    }

    #[test]
    fn test_synth_skips_missing_plugins() {
        let props = analyze_prompt("synth lead");
        assert_eq!(select_plugin(&props, &names(&["GMS", "Harmor"])), "Harmor");
    }

    #[test]
    fn test_fallback_order() {
        let props = analyze_prompt("vocal chop");
        assert_eq!(select_plugin(&props, &names(&["Sakura", "FLEX"])), "FLEX");
        assert_eq!(select_plugin(&props, &names(&["Sakura", "GMS"])), "Sakura");
        assert_eq!(select_plugin(&props, &[]), "FLEX");
    }
}
