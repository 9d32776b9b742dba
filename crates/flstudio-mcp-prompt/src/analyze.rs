//! Prompt analysis.
//!
//! Classification is keyword based: the prompt is lowercased and each table
//! is scanned in order, first match wins (effects collect every match).

use lazy_static::lazy_static;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name used when no track type is recognized.
pub const DEFAULT_TRACK_NAME: &str = "AI Generated Track";

/// Pattern length in steps when the prompt gives none.
pub const DEFAULT_PATTERN_LENGTH: u32 = 16;

/// Steps per bar in 4/4.
const STEPS_PER_BAR: u32 = 4;

/// Largest bar count taken from a prompt; larger requests are clamped.
///
/// At most 3.5 notes are generated per bar, so a full-length pattern stays
/// well below the bridge's default 1 MiB message limit.
pub const MAX_BARS: u32 = 1024;

lazy_static! {
    static ref TEMPO_RE: Regex = Regex::new(r"(\d+)\s*bpm").expect("tempo pattern");
    static ref BARS_RE: Regex = Regex::new(r"(\d+)\s*bars?").expect("bars pattern");
    // Note letters only count when capitalized, so "a minor change" or "in a"
    // stay words.
    static ref KEY_WITH_SCALE_RE: Regex =
        Regex::new(r"\b([A-G]#?)\s+(?i:(major|minor))\b").expect("key/scale pattern");
    static ref KEY_AFTER_IN_RE: Regex =
        Regex::new(r"\b(?i:in|key of)\s+([A-G]#?)(?:\s|$|[,.;!?])").expect("key pattern");
    static ref SHORT_MINOR_RE: Regex = Regex::new(r"\b([A-G]#?)m\b").expect("minor pattern");
}

/// Role of the track in the arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    /// Bass line
    Bass,
    /// Drum beat
    Drums,
    /// Melody
    Lead,
    /// Sustained background
    Pad,
    /// Chord progression
    Chords,
    /// Risers, impacts, transitions
    Fx,
    /// Nothing recognized
    Unknown,
}

/// Instrument family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum InstrumentType {
    Piano,
    Guitar,
    Strings,
    Brass,
    Synth,
    Organ,
    Woodwind,
    Vocal,
    /// Nothing recognized
    Unknown,
}

/// Musical genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Genre {
    Edm,
    HipHop,
    Rock,
    Pop,
    Jazz,
    Classical,
    Ambient,
    #[serde(rename = "rnb")]
    RnB,
    Reggae,
    Folk,
    /// Nothing recognized
    Unknown,
}

/// Effect requested in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Effect {
    Reverb,
    Delay,
    Distortion,
    Chorus,
    Compression,
    Eq,
    Filter,
    Sidechain,
}

impl Effect {
    /// FL Studio plugin providing the effect.
    pub fn plugin_name(&self) -> &'static str {
        match self {
            Effect::Reverb => "Fruity Reeverb 2",
            Effect::Delay => "Fruity Delay 3",
            Effect::Distortion => "Fruity Fast Dist",
            Effect::Chorus => "Fruity Chorus",
            Effect::Compression => "Fruity Compressor",
            Effect::Eq => "Fruity Parametric EQ 2",
            Effect::Filter => "Fruity Filter",
            Effect::Sidechain => "Fruity Limiter",
        }
    }
}

/// Major or natural minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Scale {
    #[default]
    Major,
    Minor,
}

impl Scale {
    /// Semitone offsets of the seven scale degrees.
    pub fn intervals(&self) -> [u8; 7] {
        match self {
            Scale::Major => [0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => [0, 2, 3, 5, 7, 8, 10],
        }
    }
}

/// Note names, indexed by semitone above C.
pub const KEY_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const TRACK_TYPES: &[(TrackType, &[&str])] = &[
    (TrackType::Bass, &["bass", "808", "sub"]),
    (
        TrackType::Drums,
        &["drum", "beat", "percussion", "kick", "snare", "hat"],
    ),
    (
        TrackType::Lead,
        &["lead", "melody", "synth", "arp", "arpeggiat"],
    ),
    (
        TrackType::Pad,
        &["pad", "ambient", "atmosphere", "background"],
    ),
    (TrackType::Chords, &["chord", "harmony", "progression"]),
    (
        TrackType::Fx,
        &["fx", "effect", "transition", "riser", "impact"],
    ),
];

const INSTRUMENTS: &[(InstrumentType, &[&str])] = &[
    (InstrumentType::Piano, &["piano", "keys", "keyboard", "grand"]),
    (
        InstrumentType::Guitar,
        &["guitar", "acoustic", "electric guitar", "distorted"],
    ),
    (
        InstrumentType::Strings,
        &["strings", "violin", "cello", "viola", "orchestral", "orchestra"],
    ),
    (
        InstrumentType::Brass,
        &["brass", "trumpet", "trombone", "horn", "saxophone", "sax"],
    ),
    (
        InstrumentType::Synth,
        &["synth", "synthesizer", "analog", "digital", "wavetable"],
    ),
    (InstrumentType::Organ, &["organ", "hammond", "church"]),
    (
        InstrumentType::Woodwind,
        &["flute", "woodwind", "clarinet", "oboe"],
    ),
    (
        InstrumentType::Vocal,
        &["vocal", "voice", "choir", "singing"],
    ),
];

const GENRES: &[(Genre, &[&str])] = &[
    (
        Genre::Edm,
        &["edm", "electronic", "dance", "house", "techno", "trance", "dubstep"],
    ),
    (
        Genre::HipHop,
        &["hip hop", "rap", "trap", "drill", "boom bap"],
    ),
    (Genre::Rock, &["rock", "alternative", "indie", "metal", "punk"]),
    (Genre::Pop, &["pop", "mainstream", "chart"]),
    (Genre::Jazz, &["jazz", "blues", "swing", "bebop"]),
    (
        Genre::Classical,
        &["classical", "orchestral", "orchestra", "symphony"],
    ),
    (
        Genre::Ambient,
        &["ambient", "chill", "relaxing", "atmospheric"],
    ),
    (Genre::RnB, &["r&b", "rnb", "soul", "funk"]),
    (Genre::Reggae, &["reggae", "dub", "dancehall"]),
    (Genre::Folk, &["folk", "acoustic", "country"]),
];

const EFFECTS: &[(Effect, &[&str])] = &[
    (Effect::Reverb, &["reverb", "hall", "room", "space", "echo"]),
    (Effect::Delay, &["delay", "echo", "repeat"]),
    (
        Effect::Distortion,
        &["distortion", "distorted", "overdrive", "fuzz"],
    ),
    (Effect::Chorus, &["chorus", "flanger", "phaser"]),
    (
        Effect::Compression,
        &["compression", "compressor", "squash"],
    ),
    (Effect::Eq, &["eq", "equalizer", "equalization"]),
    (
        Effect::Filter,
        &["filter", "lowpass", "highpass", "bandpass"],
    ),
    (Effect::Sidechain, &["sidechain", "pumping", "ducking"]),
];

const PROGRESSIONS: &[(&str, &[&str])] = &[
    ("I-IV-V", &["i-iv-v", "1-4-5"]),
    ("I-V-vi-IV", &["i-v-vi-iv", "1-5-6-4", "pop progression"]),
    ("ii-V-I", &["ii-v-i", "2-5-1", "jazz progression"]),
    ("I-vi-IV-V", &["i-vi-iv-v", "1-6-4-5", "50s progression"]),
    ("vi-IV-I-V", &["vi-iv-i-v", "6-4-1-5", "sad progression"]),
];

fn first_match<T: Copy>(text: &str, table: &[(T, &[&str])]) -> Option<T> {
    table
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(value, _)| *value)
}

impl TrackType {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Bass => "bass",
            TrackType::Drums => "drums",
            TrackType::Lead => "lead",
            TrackType::Pad => "pad",
            TrackType::Chords => "chords",
            TrackType::Fx => "fx",
            TrackType::Unknown => "unknown",
        }
    }
}

impl InstrumentType {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentType::Piano => "piano",
            InstrumentType::Guitar => "guitar",
            InstrumentType::Strings => "strings",
            InstrumentType::Brass => "brass",
            InstrumentType::Synth => "synth",
            InstrumentType::Organ => "organ",
            InstrumentType::Woodwind => "woodwind",
            InstrumentType::Vocal => "vocal",
            InstrumentType::Unknown => "unknown",
        }
    }
}

impl Genre {
    /// Display name as used in track names.
    pub fn title(&self) -> &'static str {
        match self {
            Genre::Edm => "Edm",
            Genre::HipHop => "Hip Hop",
            Genre::Rock => "Rock",
            Genre::Pop => "Pop",
            Genre::Jazz => "Jazz",
            Genre::Classical => "Classical",
            Genre::Ambient => "Ambient",
            Genre::RnB => "R&B",
            Genre::Reggae => "Reggae",
            Genre::Folk => "Folk",
            Genre::Unknown => "Unknown",
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Everything recognized in a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrackProperties {
    /// Role of the track
    pub track_type: TrackType,
    /// Instrument family
    pub instrument_type: InstrumentType,
    /// Genre
    pub genre: Genre,
    /// Tempo in BPM, when stated
    pub tempo: Option<u32>,
    /// Pattern length in steps
    pub pattern_length: u32,
    /// Generated channel name
    pub name: String,
    /// Effects, in table order
    pub effects: Vec<Effect>,
    /// Named chord progression, e.g. `ii-V-I`
    pub chord_progression: Option<String>,
    /// Semitone of the key above C (0 = C)
    pub key: u8,
    /// Scale
    pub scale: Scale,
}

impl Default for TrackProperties {
    fn default() -> Self {
        Self {
            track_type: TrackType::Unknown,
            instrument_type: InstrumentType::Unknown,
            genre: Genre::Unknown,
            tempo: None,
            pattern_length: DEFAULT_PATTERN_LENGTH,
            name: DEFAULT_TRACK_NAME.to_string(),
            effects: Vec::new(),
            chord_progression: None,
            key: 0,
            scale: Scale::Major,
        }
    }
}

impl TrackProperties {
    /// Key name such as `F#`.
    pub fn key_name(&self) -> &'static str {
        KEY_NAMES[usize::from(self.key % 12)]
    }
}

fn key_index(name: &str) -> Option<u8> {
    KEY_NAMES
        .iter()
        .position(|k| k.eq_ignore_ascii_case(name))
        .map(|i| i as u8)
}

fn detect_key(original: &str) -> Option<(u8, Scale)> {
    if let Some(caps) = KEY_WITH_SCALE_RE.captures(original) {
        let scale = if caps[2].eq_ignore_ascii_case("minor") {
            Scale::Minor
        } else {
            Scale::Major
        };
        return key_index(&caps[1]).map(|k| (k, scale));
    }
    if let Some(caps) = KEY_AFTER_IN_RE.captures(original) {
        return key_index(&caps[1]).map(|k| (k, Scale::Major));
    }
    SHORT_MINOR_RE
        .captures(original)
        .and_then(|caps| key_index(&caps[1]))
        .map(|k| (k, Scale::Minor))
}

fn leading_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .filter(|n| *n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Analyze a prompt.
pub fn analyze_prompt(prompt: &str) -> TrackProperties {
    let text = prompt.to_lowercase();
    let mut props = TrackProperties::default();

    props.track_type = first_match(&text, TRACK_TYPES).unwrap_or(TrackType::Unknown);
    props.instrument_type = first_match(&text, INSTRUMENTS).unwrap_or(InstrumentType::Unknown);
    props.genre = first_match(&text, GENRES).unwrap_or(Genre::Unknown);

    props.tempo = leading_number(&TEMPO_RE, &text);
    if let Some(bars) = leading_number(&BARS_RE, &text) {
        props.pattern_length = bars.min(MAX_BARS) * STEPS_PER_BAR;
    }

    props.effects = EFFECTS
        .iter()
        .filter(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(effect, _)| *effect)
        .collect();

    props.chord_progression = first_match(&text, PROGRESSIONS).map(str::to_string);

    if let Some((key, scale)) = detect_key(prompt) {
        props.key = key;
        props.scale = scale;
    }

    if props.track_type != TrackType::Unknown {
        let mut parts = Vec::new();
        if props.genre != Genre::Unknown {
            parts.push(props.genre.title().to_string());
        }
        if props.instrument_type != InstrumentType::Unknown {
            parts.push(title_case(props.instrument_type.as_str()));
        }
        parts.push(title_case(props.track_type.as_str()));
        props.name = parts.join(" ");
    }

    props
}
