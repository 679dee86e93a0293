//! Criterion benchmarks for the reverb engine
//!
//! Run with: cargo bench -p sala-reverb
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sala_reverb::{Reverb, ReverbSettings};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];
const DELAY_UNITS: &[usize] = &[1, 4, 16];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn make_reverb(units: usize) -> Reverb {
    Reverb::with_settings(ReverbSettings {
        delay_units: units,
        sample_rate: SAMPLE_RATE,
        wet_gain: 0.5,
        ..ReverbSettings::default()
    })
    .unwrap()
}

fn bench_block_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reverb/block_size");

    for &size in BLOCK_SIZES {
        let input = generate_test_signal(size);
        let mut out_l = vec![0.0f32; size];
        let mut out_r = vec![0.0f32; size];
        let mut reverb = make_reverb(4);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("process_buffer", size), &size, |b, _| {
            b.iter(|| {
                reverb.process_buffer(black_box(&input), black_box(&input), &mut out_l, &mut out_r);
            });
        });
    }

    group.finish();
}

fn bench_delay_units(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reverb/delay_units");
    let size = 256;
    let input = generate_test_signal(size);

    for &units in DELAY_UNITS {
        let mut out_l = vec![0.0f32; size];
        let mut out_r = vec![0.0f32; size];
        let mut reverb = make_reverb(units);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("process_buffer", units), &units, |b, _| {
            b.iter(|| {
                reverb.process_buffer(black_box(&input), black_box(&input), &mut out_l, &mut out_r);
            });
        });
    }

    group.finish();
}

fn bench_parameter_changes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reverb/parameters");
    let size = 256;
    let input = generate_test_signal(size);
    let mut out_l = vec![0.0f32; size];
    let mut out_r = vec![0.0f32; size];

    // Coefficient recompute at every block start
    let mut reverb = make_reverb(4);
    let mut rt60 = 1.0f32;
    group.bench_function("rt60_every_block", |b| {
        b.iter(|| {
            rt60 = if rt60 > 3.0 { 1.0 } else { rt60 + 0.01 };
            reverb.set_rt60_decay_time(rt60).unwrap();
            reverb.process_buffer(black_box(&input), black_box(&input), &mut out_l, &mut out_r);
        });
    });

    // Full topology rebuild
    let mut reverb = make_reverb(4);
    let mut units = 4usize;
    group.bench_function("delay_units_every_block", |b| {
        b.iter(|| {
            units = if units == 4 { 8 } else { 4 };
            reverb.set_num_delay_units(units).unwrap();
            reverb.process_buffer(black_box(&input), black_box(&input), &mut out_l, &mut out_r);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_block_sizes, bench_delay_units, bench_parameter_changes);
criterion_main!(benches);
