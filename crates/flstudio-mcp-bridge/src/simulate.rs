//! Canned answers used by the client in simulation mode.

use rand::Rng;
use serde_json::{json, Value};
use tracing::info;

use flstudio_mcp_core::CommandType;

/// Plugins reported by [`simulated_response`] for `get_plugin_list`.
pub const SIMULATED_PLUGINS: &[&str] = &[
    "FLEX",
    "Fruity DX10",
    "Harmor",
    "Sytrus",
    "GMS",
    "FPC",
    "DirectWave",
    "Sakura",
    "Sawer",
    "Toxic Biohazard",
];

/// Answer a command without FL Studio.
///
/// Creation commands return plausible random indexes.
pub fn simulated_response<R: Rng>(kind: CommandType, params: &Value, rng: &mut R) -> Value {
    info!("Simulating response for command: {}", kind);
    match kind {
        CommandType::CreateMidiTrack => {
            let index = params.get("index").and_then(Value::as_i64).unwrap_or(-1);
            let index = if index < 0 { rng.gen_range(1..=10) } else { index };
            json!({ "index": index })
        }
        CommandType::CreatePattern => json!({ "index": rng.gen_range(0..=5_i64) }),
        CommandType::GetPluginList => json!({ "plugins": SIMULATED_PLUGINS }),
        CommandType::SetTrackName
        | CommandType::AddNotesToPattern
        | CommandType::SetTempo
        | CommandType::LoadPlugin => json!({ "status": "success" }),
        _ => json!({ "status": "success", "message": "Simulated response" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_track_index_kept_or_randomized() {
        let mut rng = StdRng::seed_from_u64(7);
        let kept = simulated_response(CommandType::CreateMidiTrack, &json!({ "index": 4 }), &mut rng);
        assert_eq!(kept, json!({ "index": 4 }));

        for _ in 0..50 {
            let random = simulated_response(CommandType::CreateMidiTrack, &json!({}), &mut rng);
            let index = random["index"].as_i64().unwrap();
            assert!((1..=10).contains(&index));
        }
    }

    #[test]
    fn test_pattern_index_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let v = simulated_response(CommandType::CreatePattern, &json!({}), &mut rng);
            assert!((0..=5).contains(&v["index"].as_i64().unwrap()));
        }
    }

    #[test]
    fn test_plugin_list_and_fallback() {
        let mut rng = StdRng::seed_from_u64(0);
        let list = simulated_response(CommandType::GetPluginList, &json!({}), &mut rng);
        assert_eq!(list["plugins"].as_array().unwrap().len(), SIMULATED_PLUGINS.len());

        let other = simulated_response(CommandType::StartPlayback, &json!({}), &mut rng);
        assert_eq!(other["message"], json!("Simulated response"));
    }
}
