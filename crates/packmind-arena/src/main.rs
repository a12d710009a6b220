//! Headless Packmind arena: one enemy per optimizer family hunts a scripted
//! target while the profiler compares the three algorithms.

use anyhow::Result;
use rand::rngs::SmallRng;
use std::time::Instant;
use tracing::info;

use packmind_arena::{ArenaNavigator, EnemyAgent, OptimizationProfiler};
use packmind_core::{Difficulty, Navigator, Point3, SessionConfig, WorldSnapshot};
use packmind_swarm::AlgorithmKind;

const TICKS: u32 = 1_800;
const MAX_HEALTH: f32 = 100.0;

fn main() -> Result<()> {
    init_tracing();

    let config = SessionConfig {
        rng_seed: Some(0xAC5E_17F0),
        ..SessionConfig::for_difficulty(Difficulty::Medium)
    };
    config.validate()?;

    let mut rng: SmallRng = config.seeded_rng();
    let mut profiler = OptimizationProfiler::new(&config);

    let mut actors: Vec<(EnemyAgent, ArenaNavigator, f32)> = AlgorithmKind::ALL
        .iter()
        .enumerate()
        .map(|(slot, &kind)| {
            let agent = EnemyAgent::spawn(kind, &config, &mut rng);
            let spawn = Point3::new(6.0 + 3.0 * slot as f32, 0.0, -4.0);
            let nav = ArenaNavigator::new(spawn, 0.12, 0.5, 40.0);
            (agent, nav, MAX_HEALTH)
        })
        .collect();

    info!(ticks = TICKS, "starting arena run");

    for tick in 0..TICKS {
        let target = target_position(tick);

        for (agent, nav, health) in &mut actors {
            nav.set_target(Some(target));

            // Scripted attrition keeps the health-driven fitness terms moving.
            if tick % 90 == 0 && *health > 10.0 {
                *health -= 4.0;
            }

            let state = WorldSnapshot::new(
                nav.position().distance(target),
                *health / MAX_HEALTH,
                nav.position().distance(Point3::default()),
            );

            agent.tick(state, nav, &mut rng);
            nav.step();
        }

        if profiler.sample_due(Instant::now()) {
            sample_all(&mut profiler, &mut actors, target, &mut rng);
        }
    }

    // One forced sweep so short runs still end with fresh numbers.
    let target = target_position(TICKS);
    sample_all(&mut profiler, &mut actors, target, &mut rng);

    for (agent, _, _) in &actors {
        let stats = profiler.stats(agent.algorithm());
        info!(
            algorithm = agent.algorithm().label(),
            active = agent.active_behavior().unwrap_or("none"),
            memory_kib = stats.memory_kib,
            execution_ms = stats.execution_ms,
            effectiveness = stats.effectiveness,
            measurements = stats.measurements,
            "final stats"
        );
    }

    let report = profiler.sensitivity_analysis();
    println!("{report}");
    println!("winner: {}", report.winner().label());
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Scripted target: a slow orbit that sweeps through every distance bucket.
fn target_position(tick: u32) -> Point3 {
    let angle = tick as f32 * 0.005;
    let orbit = 8.0 + 6.0 * (tick as f32 * 0.001).sin();
    Point3::new(orbit * angle.cos(), 0.0, orbit * angle.sin())
}

fn sample_all(
    profiler: &mut OptimizationProfiler,
    actors: &mut [(EnemyAgent, ArenaNavigator, f32)],
    target: Point3,
    rng: &mut SmallRng,
) {
    for (agent, nav, health) in actors.iter_mut() {
        let state = WorldSnapshot::new(
            nav.position().distance(target),
            *health / MAX_HEALTH,
            nav.position().distance(Point3::default()),
        );
        profiler.sample(agent.optimizer_mut(), state, rng);
    }
}
