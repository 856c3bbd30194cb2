//! # ServoArray Benchmarks
//!
//! Measures array construction (parameter broadcasting + validation) and
//! bulk movement for growing array sizes.
//!
//! Run: `cargo bench --bench array_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use piard_core::prelude::*;

const SIZES: [usize; 3] = [2, 16, 256];

fn sparse_config() -> ServoArrayConfig {
    ServoArrayConfig {
        min_angle: ParamSpec::sparse(-45.0, [(1, -90.0)]),
        flip: ParamSpec::sparse(false, [(0, true)]),
        ..Default::default()
    }
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_new");
    let config = sparse_config();

    for n in SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(ServoArray::new(n, &config)))
        });
    }

    group.finish();
}

fn bench_movement(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_move");

    for n in SIZES {
        let mut servos = ServoArray::new(n, &sparse_config()).unwrap();
        let deltas: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 5.0 } else { -5.0 }).collect();

        group.bench_with_input(BenchmarkId::new("move_by", n), &deltas, |b, deltas| {
            b.iter(|| servos.move_by(black_box(deltas)))
        });
        group.bench_with_input(BenchmarkId::new("step_by", n), &deltas, |b, deltas| {
            b.iter(|| servos.step_by(black_box(deltas)))
        });
        group.bench_function(BenchmarkId::new("show_value", n), |b| {
            b.iter(|| black_box(servos.show(ServoField::Value)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_construction, bench_movement);
criterion_main!(benches);
