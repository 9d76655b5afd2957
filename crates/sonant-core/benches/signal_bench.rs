//! Criterion benchmarks for sonant-core timelines and rendering
//!
//! Run with: cargo bench -p sonant-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sonant_core::{AutomationTimeline, Context, Min, Signal, Units};

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn ramp_timeline(events: usize) -> AutomationTimeline {
    let mut timeline = AutomationTimeline::new(0.0);
    for i in 0..events {
        let t = i as f64 * 0.01;
        if i % 2 == 0 {
            timeline.linear_ramp_to_value_at_time(1.0, t);
        } else {
            timeline.exponential_ramp_to_value_at_time(0.1, t);
        }
    }
    timeline
}

fn bench_timeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("AutomationTimeline");

    for &events in &[4usize, 32, 256] {
        let timeline = ramp_timeline(events);
        let span = events as f64 * 0.01;
        group.bench_with_input(BenchmarkId::new("value_at", events), &events, |b, _| {
            b.iter(|| {
                for i in 0..256 {
                    black_box(timeline.value_at(black_box(span * i as f64 / 256.0)));
                }
            });
        });
    }

    group.finish();
}

fn bench_signal_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("Signal");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("render_ramp", block_size),
            &block_size,
            |b, &frames| {
                let mut ctx = Context::new(SAMPLE_RATE);
                let mut freq = Signal::with_units(&mut ctx, 220.0, Units::Frequency).unwrap();
                freq.ramp_to(&mut ctx, 880.0, 3600.0).unwrap();
                b.iter(|| black_box(ctx.render(frames, freq.output()).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_min_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("Min");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("render", block_size),
            &block_size,
            |b, &frames| {
                let mut ctx = Context::new(SAMPLE_RATE);
                let min = Min::new(&mut ctx, 0.5).unwrap();
                let mut input = Signal::new(&mut ctx, 0.0).unwrap();
                input.linear_ramp_to(&mut ctx, 1.0, 3600.0).unwrap();
                input.connect(&mut ctx, min.input()).unwrap();
                b.iter(|| black_box(ctx.render(frames, min.output()).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_timeline, bench_signal_render, bench_min_render);
criterion_main!(benches);
