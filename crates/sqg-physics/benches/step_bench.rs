// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — Step Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use sqg_math::spectral::SerialBackend;
use sqg_physics::generator::TurbGenerator;
use sqg_physics::model::SqgModel;
use sqg_types::config::TurbConfig;

fn build_model(nx: usize) -> SqgModel {
    let config = TurbConfig {
        nx,
        ..Default::default()
    };
    let gen = TurbGenerator::new(&config).expect("supported grid size");
    let pv0 = gen.random_initial_condition().expect("valid defaults");
    SqgModel::new(&pv0, gen.params(), Arc::new(SerialBackend)).expect("matching shapes")
}

/// Benchmark a single RK4 step on the production 64×64 grid.
///
/// The model is constructed once outside the closure; stepping mutates
/// it in place, which matches how a long run actually spends its time.
fn bench_step_64(c: &mut Criterion) {
    let mut model = build_model(64);
    c.bench_function("bench_sqg_step_64", |b| {
        b.iter(|| {
            model.step();
            std::hint::black_box(model.t)
        });
    });
}

/// Benchmark a single RK4 step on a 128×128 grid.
fn bench_step_128(c: &mut Criterion) {
    let mut model = build_model(128);
    c.bench_function("bench_sqg_step_128", |b| {
        b.iter(|| {
            model.step();
            std::hint::black_box(model.t)
        });
    });
}

/// Benchmark 100 consecutive steps on a 64×64 grid, the realistic
/// throughput figure for trajectory generation.
fn bench_run_100_64(c: &mut Criterion) {
    c.bench_function("bench_sqg_run_100_64", |b| {
        b.iter(|| {
            let mut model = build_model(64);
            model.advance(100);
            std::hint::black_box(model.t)
        });
    });
}

criterion_group!(benches, bench_step_64, bench_step_128, bench_run_100_64);
criterion_main!(benches);
