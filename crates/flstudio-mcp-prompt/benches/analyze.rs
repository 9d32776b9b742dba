use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flstudio_mcp_prompt::{analyze_prompt, generate_notes, PRESET_PROMPTS};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_prompt");

    for (i, prompt) in PRESET_PROMPTS.iter().enumerate() {
        group.bench_with_input(BenchmarkId::from_parameter(i), prompt, |b, prompt| {
            b.iter(|| analyze_prompt(black_box(prompt)))
        });
    }

    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_notes");

    for prompt in ["drum beat 8 bars", "bass in F minor", "piano chords", "synth lead 16 bars"] {
        let props = analyze_prompt(prompt);
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_function(prompt, |b| {
            b.iter(|| generate_notes(black_box(&props), &mut rng))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_analyze, bench_generate);
criterion_main!(benches);
