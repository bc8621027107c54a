//! Benchmarks for the front-end compensators
//!
//! Run with: cargo bench -p cohrx-core --bench compensation_bench

use cohrx_core::frontend::FrontendCompensator;
use cohrx_core::impairments::HybridImpairment;
use cohrx_core::prelude::*;
use cohrx_core::rf_delay::RfDelayCompensator;
use cohrx_core::{FrontendConfig, LaneDelays};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use num_complex::Complex64;
use std::f64::consts::PI;

const FS: f64 = DEFAULT_SAMPLE_RATE;

fn impaired_block(n: usize) -> Vec<Complex64> {
    let clean: Vec<Complex64> = (0..n)
        .map(|k| Complex64::from_polar(1.0, 2.0 * PI * 0.123 * k as f64))
        .collect();
    HybridImpairment::from_degrees_db(6.0, 0.8)
        .with_dc_offset(Complex64::new(0.01, -0.02))
        .apply(&clean)
}

fn lane(n: usize, seed: f64) -> Vec<f64> {
    (0..n).map(|k| (0.31 * k as f64 + seed).sin()).collect()
}

// ============================================================================
// IQ Imbalance
// ============================================================================

fn bench_iq_imbalance(c: &mut Criterion) {
    let mut group = c.benchmark_group("iq_imbalance");

    for size in [1024, 16384, 262144].iter() {
        let block = impaired_block(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("estimate", size), size, |b, _| {
            b.iter(|| estimate_iq_imbalance(black_box(&block)))
        });

        group.bench_with_input(BenchmarkId::new("compensate", size), size, |b, _| {
            b.iter(|| compensate_iq_imbalance(black_box(&block)))
        });
    }

    group.finish();
}

// ============================================================================
// RF Delay
// ============================================================================

fn bench_rf_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("rf_delay");

    for size in [1024, 4096, 65536].iter() {
        let signal = lane(*size, 0.0);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("one_shot", size), size, |b, _| {
            b.iter(|| compensate_rf_delay_slice(black_box(&signal), 3.3e-12, FS))
        });

        let mut planned = RfDelayCompensator::new(*size, FS).unwrap();
        group.bench_with_input(BenchmarkId::new("planned", size), size, |b, _| {
            b.iter(|| planned.process(black_box(&signal), 3.3e-12))
        });
    }

    group.finish();
}

// ============================================================================
// Full front end
// ============================================================================

fn bench_frontend(c: &mut Criterion) {
    let mut group = c.benchmark_group("frontend");
    let n = 16384;

    let lanes = SampleBlock::from_rows((0..4).map(|r| lane(n, r as f64)).collect()).unwrap();
    let mut fe = FrontendCompensator::new(FrontendConfig {
        sample_rate: FS,
        lane_delays: LaneDelays {
            xi: 0.0,
            xq: 2.1e-12,
            yi: -0.7e-12,
            yq: 4.4e-12,
        },
        compensate_iq: true,
    })
    .unwrap();

    group.throughput(Throughput::Elements((4 * n) as u64));
    group.bench_function("four_lane_16k", |b| b.iter(|| fe.process(black_box(&lanes))));

    group.finish();
}

criterion_group!(
    name = compensation_benches;
    config = Criterion::default();
    targets = bench_iq_imbalance, bench_rf_delay, bench_frontend
);

criterion_main!(compensation_benches);
