//! Note generation per track type.

use rand::seq::SliceRandom;
use rand::Rng;

use flstudio_mcp_core::Note;

use crate::analyze::{TrackProperties, TrackType};

/// General MIDI drum notes.
const KICK: u8 = 36;
const SNARE: u8 = 38;
const CLOSED_HAT: u8 = 42;

/// Octave the generated notes start from.
fn base_octave(track_type: TrackType) -> u8 {
    match track_type {
        TrackType::Bass => 2,
        TrackType::Pad | TrackType::Chords | TrackType::Drums => 3,
        TrackType::Fx => 5,
        TrackType::Lead | TrackType::Unknown => 4,
    }
}

/// Two octaves of the track's key and scale, ascending.
pub fn scale_notes(props: &TrackProperties) -> Vec<u8> {
    let octave = base_octave(props.track_type);
    let intervals = props.scale.intervals();
    (octave..octave + 2)
        .flat_map(|o| {
            intervals
                .iter()
                .map(move |i| (o * 12 + props.key % 12 + i).min(127))
        })
        .collect()
}

/// Generate a pattern for the track.
///
/// - drums: kick every 4 steps, snare on step 4 of every 8, closed hat every 2
/// - bass: one 4-step note every 4 steps from the lower octave
/// - chords: a I, IV or V triad every 4 steps
/// - pad: root and fifth held for the whole pattern
/// - lead, fx, unknown: 70% chance of a note on every even step
pub fn generate_notes<R: Rng>(props: &TrackProperties, rng: &mut R) -> Vec<Note> {
    let length = props.pattern_length;
    let available = scale_notes(props);
    let mut notes = Vec::new();

    match props.track_type {
        TrackType::Drums => {
            for step in 0..length {
                if step % 4 == 0 {
                    notes.push(Note::new(step, KICK, 1, 100));
                }
                if step % 8 == 4 {
                    notes.push(Note::new(step, SNARE, 1, 90));
                }
                if step % 2 == 0 {
                    notes.push(Note::new(step, CLOSED_HAT, 1, 80));
                }
            }
        }
        TrackType::Bass => {
            let low = &available[..available.len().min(7)];
            for step in (0..length).step_by(4) {
                if let Some(note) = low.choose(rng) {
                    notes.push(Note::new(step, *note, 4, 90));
                }
            }
        }
        TrackType::Chords => {
            for step in (0..length).step_by(4) {
                let root = *[0usize, 3, 4].choose(rng).unwrap_or(&0);
                for degree in [root, root + 2, root + 4] {
                    if let Some(note) = available.get(degree) {
                        notes.push(Note::new(step, *note, 4, 80));
                    }
                }
            }
        }
        TrackType::Pad => {
            let root = available.first().copied().unwrap_or(60);
            let fifth = available.get(4).copied().unwrap_or(root.saturating_add(7));
            notes.push(Note::new(0, root, length, 70));
            notes.push(Note::new(0, fifth, length, 70));
        }
        TrackType::Lead | TrackType::Fx | TrackType::Unknown => {
            for step in (0..length).step_by(2) {
                if rng.gen::<f64>() > 0.3 {
                    if let (Some(note), Some(len)) = (available.choose(rng), [1, 2, 4].choose(rng)) {
                        notes.push(Note::new(step, *note, *len, 85));
                    }
                }
            }
        }
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{analyze_prompt, Scale};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn props(track_type: TrackType) -> TrackProperties {
        TrackProperties {
            track_type,
            ..TrackProperties::default()
        }
    }

    #[test]
    fn test_scale_notes_c_major_octave_four() {
        let notes = scale_notes(&props(TrackType::Lead));
        assert_eq!(notes.len(), 14);
        assert_eq!(&notes[..7], &[48, 50, 52, 53, 55, 57, 59]);
    }

    #[test]
    fn test_scale_notes_f_minor_bass() {
        let mut p = props(TrackType::Bass);
        p.key = 5;
        p.scale = Scale::Minor;
        assert_eq!(&scale_notes(&p)[..7], &[29, 31, 32, 34, 36, 37, 39]);
    }

    #[test]
    fn test_drum_pattern() {
        let notes = generate_notes(&props(TrackType::Drums), &mut StdRng::seed_from_u64(0));
        let kicks: Vec<u32> = notes.iter().filter(|n| n.note == KICK).map(|n| n.position).collect();
        let snares: Vec<u32> = notes.iter().filter(|n| n.note == SNARE).map(|n| n.position).collect();
        let hats = notes.iter().filter(|n| n.note == CLOSED_HAT).count();
        assert_eq!(kicks, vec![0, 4, 8, 12]);
        assert_eq!(snares, vec![4, 12]);
        assert_eq!(hats, 8);
    }

    #[test]
    fn test_bass_uses_lower_octave() {
        let p = analyze_prompt("Create a techno bass track in F minor");
        let low = &scale_notes(&p)[..7];
        let notes = generate_notes(&p, &mut StdRng::seed_from_u64(3));
        assert_eq!(notes.len(), 4);
        for (i, note) in notes.iter().enumerate() {
            assert_eq!(note.position, i as u32 * 4);
            assert_eq!(note.length, 4);
            assert!(low.contains(&note.note));
        }
    }

    #[test]
    fn test_chords_are_triads() {
        let notes = generate_notes(&props(TrackType::Chords), &mut StdRng::seed_from_u64(9));
        assert_eq!(notes.len(), 12);
        for chord in notes.chunks(3) {
            assert!(chord.iter().all(|n| n.position == chord[0].position));
        }
    }

    #[test]
    fn test_pad_holds_root_and_fifth() {
        let notes = generate_notes(&props(TrackType::Pad), &mut StdRng::seed_from_u64(1));
        assert_eq!(notes, vec![Note::new(0, 36, 16, 70), Note::new(0, 43, 16, 70)]);
    }

    #[test]
    fn test_lead_on_even_steps() {
        let notes = generate_notes(&props(TrackType::Lead), &mut StdRng::seed_from_u64(5));
        assert!(notes.len() <= 8);
        assert!(notes.iter().all(|n| n.position % 2 == 0 && [1, 2, 4].contains(&n.length)));
    }
}
