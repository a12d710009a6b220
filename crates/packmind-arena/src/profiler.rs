//! Comparative profiler for the three optimizer families.
//!
//! Samples memory footprint, optimize-call latency, and decision quality on
//! a fixed wall-clock cadence, keeping a bounded running mean per algorithm.
//! A multi-criteria sensitivity analysis collapses the three metrics into a
//! single comparative score.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

use rand::RngCore;

use packmind_core::{BehaviorKind, SessionConfig, WorldSnapshot};
use packmind_swarm::{AlgorithmKind, Optimizer};

/// Repeated optimize calls per latency measurement.
const TIMING_ITERATIONS: u32 = 100;
/// Rubric trials per effectiveness measurement.
const EFFECTIVENESS_TRIALS: u32 = 100;
/// Iteration budget handed to each timed optimize call.
const PROFILE_REFINE_ITERATIONS: u32 = 10;

/// Running statistics for one algorithm family.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AlgorithmStats {
    /// Estimated optimizer state size, KiB.
    pub memory_kib: f32,
    /// Mean latency of one optimize call, milliseconds.
    pub execution_ms: f32,
    /// Bounded running mean of the decision-quality score.
    pub effectiveness: f32,
    /// Samples folded into the running mean so far.
    pub measurements: u32,
    total_effectiveness: f32,
}

/// Score how good the top-ranked behavior is for the given situation.
///
/// Hand-authored rubric over distance and health buckets: attacking is right
/// up close and healthy, chasing at mid range, patrolling when far away or
/// badly hurt.
#[must_use]
pub fn decision_quality(kind: BehaviorKind, state: &WorldSnapshot) -> f32 {
    let distance = state.distance_to_target;
    let health = state.health_fraction;
    match kind {
        BehaviorKind::Attack => {
            if distance <= 2.0 && health > 0.5 {
                1.0
            } else if distance <= 2.0 {
                0.5
            } else {
                0.2
            }
        }
        BehaviorKind::Chase => {
            if distance > 2.0 && distance < 10.0 && health > 0.3 {
                1.0
            } else if distance < 10.0 {
                0.6
            } else {
                0.3
            }
        }
        BehaviorKind::Patrol => {
            if distance > 10.0 || health < 0.3 {
                1.0
            } else if health < 0.5 {
                0.7
            } else {
                0.4
            }
        }
    }
}

/// Which measured metric a criterion reads.
#[derive(Clone, Copy)]
enum Metric {
    Speed,
    Effectiveness,
    Memory,
}

/// One criterion of the sensitivity analysis.
struct Criterion {
    name: &'static str,
    metric: Metric,
    importance: f32,
    baseline: f32,
    maximize: bool,
}

const CRITERIA: [Criterion; 3] = [
    Criterion {
        name: "speed min (ms)",
        metric: Metric::Speed,
        importance: 0.25,
        baseline: 100.0,
        maximize: false,
    },
    Criterion {
        name: "effectiveness max",
        metric: Metric::Effectiveness,
        importance: 0.5,
        baseline: 1.0,
        maximize: true,
    },
    Criterion {
        name: "memory min (MiB)",
        metric: Metric::Memory,
        importance: 0.25,
        baseline: 500.0,
        maximize: false,
    },
];

/// Rescale a measured value onto 1–10 against the criterion baseline.
fn normalize_to_scale(value: f32, criterion: &Criterion) -> f32 {
    let t = (value / criterion.baseline).clamp(0.0, 1.0);
    if criterion.maximize {
        1.0 + 9.0 * t
    } else {
        10.0 - 9.0 * t
    }
}

/// One criterion row of the sensitivity report.
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityRow {
    pub criterion: &'static str,
    pub importance: f32,
    /// Normalized 1–10 scores, indexed by [`AlgorithmKind::index`].
    pub scores: [f32; 3],
}

/// Outcome of the multi-criteria sensitivity analysis.
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityReport {
    pub rows: Vec<SensitivityRow>,
    /// Importance-weighted totals, indexed by [`AlgorithmKind::index`].
    pub final_scores: [f32; 3],
}

impl SensitivityReport {
    /// The algorithm with the highest weighted total.
    #[must_use]
    pub fn winner(&self) -> AlgorithmKind {
        let mut best = AlgorithmKind::GreyWolf;
        for kind in AlgorithmKind::ALL {
            if self.final_scores[kind.index()] > self.final_scores[best.index()] {
                best = kind;
            }
        }
        best
    }
}

impl fmt::Display for SensitivityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| constraint | importance | gwo | pso | fa |")?;
        writeln!(f, "| ---------- | ---------- | --- | --- | -- |")?;
        for row in &self.rows {
            writeln!(
                f,
                "| {} | {:.2} | {:.2} | {:.2} | {:.2} |",
                row.criterion, row.importance, row.scores[0], row.scores[1], row.scores[2]
            )?;
        }
        writeln!(
            f,
            "| final score | - | {:.2} | {:.2} | {:.2} |",
            self.final_scores[0], self.final_scores[1], self.final_scores[2]
        )
    }
}

/// Side-by-side profiler over the three optimizer families.
///
/// The stats table is a fixed-size array indexed by [`AlgorithmKind`]; each
/// slot stops updating once the measurement cap is reached.
pub struct OptimizationProfiler {
    stats: [AlgorithmStats; 3],
    interval: Duration,
    measurement_cap: u32,
    last_sample: Option<Instant>,
}

impl OptimizationProfiler {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            stats: [AlgorithmStats::default(); 3],
            interval: Duration::from_millis(config.profiler_interval_ms),
            measurement_cap: config.profiler_measurement_cap,
            last_sample: None,
        }
    }

    /// Running statistics for one algorithm family.
    #[must_use]
    pub fn stats(&self, kind: AlgorithmKind) -> &AlgorithmStats {
        &self.stats[kind.index()]
    }

    /// Whether every algorithm has hit its measurement cap.
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        self.stats
            .iter()
            .all(|slot| slot.measurements >= self.measurement_cap)
    }

    /// Interval gate for hosts sampling on a wall-clock cadence. Returns
    /// `true` (and arms the next window) when a sample is due at `now`.
    pub fn sample_due(&mut self, now: Instant) -> bool {
        match self.last_sample {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_sample = Some(now);
                true
            }
        }
    }

    /// Measure one optimizer instance and fold the result into its slot.
    ///
    /// No-op once the slot has reached the measurement cap. The latency
    /// measurement runs real optimize calls, so the profiled optimizer's
    /// population state advances alongside the measurement.
    pub fn sample(
        &mut self,
        optimizer: &mut dyn Optimizer,
        state: WorldSnapshot,
        rng: &mut dyn RngCore,
    ) {
        let slot = &mut self.stats[optimizer.kind().index()];
        if slot.measurements >= self.measurement_cap {
            return;
        }

        slot.memory_kib = optimizer.memory_estimate() / 1024.0;

        let started = Instant::now();
        for _ in 0..TIMING_ITERATIONS {
            optimizer.optimize(PROFILE_REFINE_ITERATIONS, state, rng);
        }
        let elapsed = started.elapsed();
        slot.execution_ms = elapsed.as_secs_f32() * 1_000.0 / TIMING_ITERATIONS as f32;

        let mut total_score = 0.0;
        for _ in 0..EFFECTIVENESS_TRIALS {
            if let Some(top) = optimizer.weighted_behaviors().first() {
                total_score += decision_quality(top.kind, &state);
            }
        }
        let effectiveness = total_score / EFFECTIVENESS_TRIALS as f32;

        slot.total_effectiveness += effectiveness;
        slot.measurements += 1;
        slot.effectiveness = slot.total_effectiveness / slot.measurements as f32;
    }

    /// Collapse the measured metrics into one comparative score per
    /// algorithm: each metric is rescaled onto 1–10 against its baseline,
    /// weighted by the criterion importance, and summed.
    #[must_use]
    pub fn sensitivity_analysis(&self) -> SensitivityReport {
        let mut rows = Vec::with_capacity(CRITERIA.len());
        let mut final_scores = [0.0_f32; 3];

        for criterion in &CRITERIA {
            let mut scores = [0.0_f32; 3];
            for kind in AlgorithmKind::ALL {
                let slot = &self.stats[kind.index()];
                let value = match criterion.metric {
                    Metric::Speed => slot.execution_ms,
                    Metric::Effectiveness => slot.effectiveness,
                    Metric::Memory => slot.memory_kib / 1024.0,
                };
                let score = normalize_to_scale(value, criterion);
                scores[kind.index()] = score;
                final_scores[kind.index()] += score * criterion.importance;
            }
            rows.push(SensitivityRow {
                criterion: criterion.name,
                importance: criterion.importance,
                scores,
            });
        }

        SensitivityReport { rows, final_scores }
    }
}
