//! # Conversion Benchmarks
//!
//! Measures unit conversion between angle, pulse width and value domains.
//!
//! Run: `cargo bench --bench convert_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use piard_core::prelude::*;
use piard_core::{Span, convert, degree_to_pulse_width};

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    let angle = Span::new(-90.0, 90.0).unwrap();
    let pulse = Span::new(1000.0, 2000.0).unwrap();

    group.bench_function("angle_to_pulse", |b| {
        b.iter(|| black_box(convert(black_box(45.0), angle, pulse, false)))
    });

    group.bench_function("angle_to_value_flipped", |b| {
        b.iter(|| black_box(convert(black_box(45.0), angle, Span::VALUE, true)))
    });

    group.bench_function("degree_to_pulse_width", |b| {
        b.iter(|| {
            black_box(degree_to_pulse_width(
                black_box(90.0),
                (1000.0, 2000.0),
                (0.0, 180.0),
            ))
        })
    });

    group.finish();
}

fn bench_unit_setters(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit_setters");

    for flip in [false, true] {
        let config = ServoConfig {
            flip,
            ..Default::default()
        };
        let mut unit = ServoUnit::new(0, config).unwrap();

        group.bench_with_input(BenchmarkId::new("set_pulse_width", flip), &flip, |b, _| {
            b.iter(|| unit.set_pulse_width(black_box(1750.0)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_convert, bench_unit_setters);
criterion_main!(benches);
