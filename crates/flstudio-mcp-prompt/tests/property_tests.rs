//! Property-based tests for prompt analysis and note generation.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use flstudio_mcp_prompt::{analyze_prompt, generate_notes, scale_notes, TrackType, MAX_BARS};

proptest! {
    /// Analysis never panics and always yields a name.
    #[test]
    fn analysis_is_total(prompt in ".{0,80}") {
        let props = analyze_prompt(&prompt);
        prop_assert!(!props.name.is_empty());
        prop_assert!(props.key < 12);
    }

    /// Bar counts become four steps per bar.
    #[test]
    fn bars_become_steps(bars in 1u32..64) {
        let props = analyze_prompt(&format!("bass line {bars} bars"));
        prop_assert_eq!(props.pattern_length, bars * 4);
    }

    /// Any bar count yields a bounded pattern and a bounded note list.
    #[test]
    fn pattern_length_is_bounded(bars in 1u64..=u64::MAX, kind in 0usize..5) {
        let word = ["drum beat", "bass", "chord", "lead", "pad"][kind];
        let props = analyze_prompt(&format!("{word} {bars} bars"));
        prop_assert!(props.pattern_length <= MAX_BARS * 4);

        let notes = generate_notes(&props, &mut StdRng::seed_from_u64(bars));
        prop_assert!(notes.len() <= props.pattern_length as usize * 3);
    }

    /// Melodic notes stay inside the pattern and the scale.
    #[test]
    fn notes_fit_pattern(bars in 1u32..16, seed in any::<u64>(), kind in 0usize..4) {
        let word = ["bass", "chord", "lead", "pad"][kind];
        let props = analyze_prompt(&format!("{word} in D minor, {bars} bars"));
        let scale = scale_notes(&props);
        let notes = generate_notes(&props, &mut StdRng::seed_from_u64(seed));

        prop_assert!(props.track_type != TrackType::Unknown);
        for note in notes {
            prop_assert!(note.position < props.pattern_length);
            prop_assert!(scale.contains(&note.note));
            prop_assert!(note.velocity <= 127);
        }
    }
}
