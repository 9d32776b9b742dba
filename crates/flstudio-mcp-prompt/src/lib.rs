//! # flstudio-mcp-prompt
//!
//! Turns a sentence like "Create a techno bass track in F minor" into a
//! channel, a plugin, a pattern and notes in FL Studio.
//!
//! This crate provides:
//! - Prompt analysis into [`TrackProperties`]
//! - Note generation per track type
//! - Plugin selection from the available plugin list
//! - The end-to-end [`create_track_from_prompt`] workflow
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it drives FL Studio through
//! flstudio-mcp-bridge.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyze;
pub mod notes;
pub mod plugins;
pub mod workflow;

// Re-export commonly used types
pub use analyze::{
    analyze_prompt, Effect, Genre, InstrumentType, Scale, TrackProperties, TrackType, MAX_BARS,
};
pub use notes::{generate_notes, scale_notes};
pub use plugins::{plugin_names, select_plugin, FALLBACK_PLUGINS};
pub use workflow::{create_track_from_prompt, TrackCreationReport};

/// Example prompts offered to users.
pub const PRESET_PROMPTS: [&str; 8] = [
    "Create a synth lead with reverb",
    "Make a hip hop drum beat at 90 BPM",
    "Create a techno bass track in F minor",
    "Add a pad with delay effect",
    "Create an orchestral strings track with vibrato",
    "Make a trap beat with 808 bass",
    "Create a jazz piano with chords",
    "Add a EDM pluck synth with filter",
];
