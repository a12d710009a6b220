use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use packmind_core::{SessionConfig, WorldSnapshot, standard_pack};
use packmind_swarm::{AlgorithmKind, build_optimizer};
use rand::{SeedableRng, rngs::SmallRng};

fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");
    let state = WorldSnapshot::new(4.0, 0.8, 6.0);
    // Iteration budget the selector uses per tick.
    let iterations: u32 = std::env::var("PM_BENCH_ITERATIONS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(10);

    for kind in AlgorithmKind::ALL {
        group.bench_function(kind.label(), |b| {
            b.iter_batched(
                || {
                    let mut rng = SmallRng::seed_from_u64(0xBE9C);
                    let optimizer =
                        build_optimizer(kind, standard_pack(&SessionConfig::default()), &mut rng);
                    (optimizer, rng)
                },
                |(mut optimizer, mut rng)| {
                    optimizer.optimize(iterations, state, &mut rng);
                    optimizer.weighted_behaviors()
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_optimize);
criterion_main!(benches);
