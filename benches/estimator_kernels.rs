//! Benchmarks for the pure-Rust scalar kernels in [`framepace::estimator`]
//! and [`framepace::interpolate`] — the same cost/confidence/candidate-
//! selection math the WGSL passes implement, kept here so hot-path formula
//! changes have a regression baseline independent of any GPU driver.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use framepace::estimator::cost;
use framepace::interpolate::reference as interp;

fn bench_coarse_search_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("coarse_search");
    group.bench_function("coarse_confidence", |b| {
        b.iter(|| cost::coarse_confidence(black_box(0.37)));
    });
    group.bench_function("sample_weight", |b| {
        b.iter(|| cost::sample_weight(black_box(0.6)));
    });
    group.bench_function("uniqueness", |b| {
        b.iter(|| cost::uniqueness(black_box(0.12), black_box(0.9)));
    });
    group.finish();
}

fn bench_refine_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("refine");
    group.bench_function("final_confidence", |b| {
        b.iter(|| cost::final_confidence(black_box(0.05), black_box(0.6), black_box(0.8)));
    });
    group.bench_function("snap_back_blend", |b| {
        b.iter(|| cost::snap_back_blend(black_box(0.6), black_box(0.8)));
    });
    group.bench_function("quarter_pass_skipped", |b| {
        b.iter(|| cost::quarter_pass_skipped(black_box(0.002), black_box(0.8), black_box(0.01)));
    });
    group.finish();
}

fn bench_interpolator_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolator");
    group.bench_function("interp_weight", |b| {
        b.iter(|| interp::interp_weight(black_box(0.8), black_box(0.6), black_box(0.9), black_box(0.1)));
    });
    group.bench_function("consensus_candidate", |b| {
        let neighbors = [((1.0, 0.0), 0.5), ((1.2, 0.1), 0.4), ((0.9, -0.1), 0.6), ((1.1, 0.05), 0.5)];
        b.iter(|| interp::consensus_candidate(black_box((1.0, 0.0)), black_box(neighbors), black_box(1.0), black_box(1.0)));
    });
    group.bench_function("catmull_rom_weights", |b| {
        b.iter(|| interp::catmull_rom_weights(black_box(0.37)));
    });
    group.bench_function("warp_trust", |b| {
        b.iter(|| interp::warp_trust(black_box(0.2), black_box(0.05)));
    });
    group.finish();
}

criterion_group!(benches, bench_coarse_search_kernels, bench_refine_kernels, bench_interpolator_kernels);
criterion_main!(benches);
