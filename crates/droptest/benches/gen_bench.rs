//! Criterion microbenches for the generators on the submission hot path.
//!
//! - Grids: default grid near capacity (repeat 2, doe 600), large repeat.
//! - Sampling: LHS offsets, random impact points.
//! - Submission: a five-template collection resolved end to end.
//!
//! Results live under `target/criterion`.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use droptest::api::{
    dedup_grid, diverse_default_grid, generate_lhs_variations, random_impact_locations,
    ScenarioCollection, SeedToken, StandardScenario, SubmitCfg,
};

fn bench_grids(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");
    for (repeat, doe) in [(3usize, 100usize), (2, 600), (6, 1000)] {
        group.bench_function(
            BenchmarkId::new("diverse_default_grid", format!("{repeat}x{doe}")),
            |b| b.iter(|| diverse_default_grid(repeat, doe)),
        );
    }
    group.bench_function(BenchmarkId::new("dedup_grid", "3x200"), |b| {
        b.iter_batched(
            || diverse_default_grid(3, 200).value,
            |g| {
                let _ = dedup_grid(&g);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");
    group.bench_function(BenchmarkId::new("lhs_variations", 1000), |b| {
        b.iter_batched(
            || SeedToken::new(42, 0).to_std_rng(),
            |mut rng| {
                let _ = generate_lhs_variations(&mut rng, 1000, 5.0);
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function(BenchmarkId::new("random_impact_locations", 100), |b| {
        b.iter_batched(
            || SeedToken::new(7, 3).to_std_rng(),
            |mut rng| {
                let _ = random_impact_locations(&mut rng, 100);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_submit(c: &mut Criterion) {
    let mut coll = ScenarioCollection::new();
    for t in StandardScenario::ALL {
        coll.create_standard(t);
    }
    let cfg = SubmitCfg {
        seed: 1,
        components: (0..50).map(|i| format!("part_{i}_pkg")).collect(),
    };
    c.bench_function("submit_all/templates", |b| {
        b.iter(|| coll.submit_all(&cfg).map(|v| v.len()))
    });
}

criterion_group!(benches, bench_grids, bench_sampling, bench_submit);
criterion_main!(benches);
