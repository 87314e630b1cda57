use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ferric_fdm::core::OptionType;
use ferric_fdm::fdm::FdmSchemeDesc;
use ferric_fdm::fdm::solvers::{
    FdmBlackScholesSolver, FdmHestonHullWhiteSolver, FdmHestonSolver, interpolate_many,
};
use ferric_fdm::models::{BlackScholesProcess, FlatRate, HestonProcess, HullWhiteProcess};

// Performance goals (guideline, measured on target hardware):
// - 1D Black-Scholes, 200 x 100 Crank-Nicolson: < 1 ms
// - 2D Heston, 100 x 50 x 100 Douglas: < 50 ms

fn bs_process() -> BlackScholesProcess {
    BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2)
}

fn heston_process() -> HestonProcess {
    HestonProcess::new(100.0, 0.05, 0.0).with_variance_dynamics(0.04, 1.5, 0.04, 0.3, -0.7)
}

fn bench_black_scholes_time_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("fdm_black_scholes_call");

    for steps in [25_usize, 100, 400] {
        group.bench_with_input(BenchmarkId::from_parameter(steps), &steps, |b, &steps| {
            b.iter(|| {
                let px = FdmBlackScholesSolver::builder(
                    black_box(bs_process()),
                    OptionType::Call,
                    100.0,
                    1.0,
                )
                .with_x_grid(200)
                .with_time_steps(steps)
                .with_scheme(FdmSchemeDesc::crank_nicolson())
                .solve()
                .and_then(|s| s.value())
                .expect("pricing should succeed");
                black_box(px)
            })
        });
    }

    group.finish();
}

fn bench_american_put(c: &mut Criterion) {
    c.bench_function("fdm_black_scholes_american_put", |b| {
        b.iter(|| {
            let px = FdmBlackScholesSolver::builder(
                black_box(bs_process()),
                OptionType::Put,
                100.0,
                1.0,
            )
            .with_american_exercise()
            .solve()
            .and_then(|s| s.value())
            .expect("pricing should succeed");
            black_box(px)
        })
    });
}

fn bench_heston_schemes(c: &mut Criterion) {
    let mut group = c.benchmark_group("fdm_heston_call");
    group.sample_size(20);

    let schemes = [
        ("douglas", FdmSchemeDesc::douglas()),
        ("craig_sneyd", FdmSchemeDesc::craig_sneyd()),
        ("modified_craig_sneyd", FdmSchemeDesc::modified_craig_sneyd()),
        ("hundsdorfer", FdmSchemeDesc::hundsdorfer()),
    ];
    for (name, scheme) in schemes {
        group.bench_with_input(BenchmarkId::from_parameter(name), &scheme, |b, scheme| {
            b.iter(|| {
                let px = FdmHestonSolver::builder(heston_process(), OptionType::Call, 100.0, 1.0)
                    .with_x_grid(100)
                    .with_v_grid(50)
                    .with_time_steps(100)
                    .with_scheme(*scheme)
                    .solve()
                    .and_then(|s| s.value())
                    .expect("pricing should succeed");
                black_box(px)
            })
        });
    }

    group.finish();
}

fn bench_heston_hull_white(c: &mut Criterion) {
    let mut group = c.benchmark_group("fdm_heston_hull_white");
    group.sample_size(10);

    let hull_white = HullWhiteProcess::new(Arc::new(FlatRate::new(0.05)), 0.1, 0.01);
    group.bench_function("call_50x20x10", |b| {
        b.iter(|| {
            let px = FdmHestonHullWhiteSolver::builder(
                heston_process(),
                hull_white.clone(),
                0.3,
                OptionType::Call,
                100.0,
                1.0,
            )
            .with_x_grid(50)
            .with_v_grid(20)
            .with_r_grid(10)
            .with_time_steps(25)
            .solve()
            .and_then(|s| s.value())
            .expect("pricing should succeed");
            black_box(px)
        })
    });

    group.finish();
}

fn bench_batch_queries(c: &mut Criterion) {
    let solver = FdmHestonSolver::builder(heston_process(), OptionType::Put, 100.0, 1.0)
        .solve()
        .expect("pricing should succeed");
    let points: Vec<(f64, f64)> = (0..1_000)
        .map(|i| (80.0 + 0.04 * i as f64, 0.02 + 0.00004 * i as f64))
        .collect();

    c.bench_function("fdm_heston_interpolate_1000", |b| {
        b.iter(|| {
            let values = interpolate_many(black_box(&points), |&(s, v)| solver.value_at(s, v))
                .expect("queries inside the grid");
            black_box(values)
        })
    });
}

criterion_group!(
    fdm_benches,
    bench_black_scholes_time_steps,
    bench_american_put,
    bench_heston_schemes,
    bench_heston_hull_white,
    bench_batch_queries
);
criterion_main!(fdm_benches);
