use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use emotag::policy::{decide, integrate};
use emotag::signal::{AudioSignal, TextSignal};
use std::hint::black_box;

/// One input per rule, in table order.
fn rule_inputs() -> Vec<(&'static str, AudioSignal, TextSignal)> {
    vec![
        ("angry_agreed", AudioSignal::new("angry"), TextSignal::new(-0.6, 1.0)),
        ("happy_agreed", AudioSignal::new("happy"), TextSignal::new(0.8, 1.2)),
        ("sad_agreed", AudioSignal::new("sad"), TextSignal::new(-0.5, 0.8)),
        ("audio_trusted", AudioSignal::new("happy"), TextSignal::new(-0.9, 2.0)),
        ("text_very_positive", AudioSignal::new("normal"), TextSignal::new(0.9, 1.5)),
        ("text_very_negative", AudioSignal::error(), TextSignal::new(-0.9, 1.5)),
        ("normal_audio", AudioSignal::new("normal"), TextSignal::neutral()),
        ("fallback", AudioSignal::new("surprised"), TextSignal::new(0.1, 0.2)),
    ]
}

fn bench_integrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrate");
    for (name, audio, text) in rule_inputs() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(audio, text), |b, (a, t)| {
            b.iter(|| integrate(black_box(a), black_box(t)))
        });
    }
    group.finish();
}

fn bench_decide_batch(c: &mut Criterion) {
    let inputs = rule_inputs();
    c.bench_function("decide_10k_rows", |b| {
        b.iter(|| {
            let mut fired = [0usize; 8];
            for i in 0..10_000 {
                let (_, audio, text) = &inputs[i % inputs.len()];
                fired[decide(black_box(audio), black_box(text)).rule - 1] += 1;
            }
            fired
        })
    });
}

criterion_group!(benches, bench_integrate, bench_decide_batch);
criterion_main!(benches);
