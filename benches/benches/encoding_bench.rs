//! # Frame Encoding Benchmarks
//!
//! Measures comma-delimited and two-byte framing of a whole array.
//!
//! Run: `cargo bench --bench encoding_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use piard_core::prelude::*;
use piard_drivers::{CommaDelimitedEncoder, FrameEncoder, TwoByteEncoder};

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let comma = CommaDelimitedEncoder::default();
    let two_byte = TwoByteEncoder::default();

    for n in [2usize, 32, 512] {
        let mut servos = ServoArray::new(n, &ServoArrayConfig::default()).unwrap();
        let angles: Vec<f64> = (0..n).map(|i| (i % 180) as f64 - 90.0).collect();
        servos.set_angles(&angles.into()).unwrap();

        group.bench_with_input(BenchmarkId::new("comma", n), &servos, |b, servos| {
            b.iter(|| black_box(comma.frame(servos)))
        });
        group.bench_with_input(BenchmarkId::new("two_byte", n), &servos, |b, servos| {
            b.iter(|| black_box(two_byte.frame(servos)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
