//! Swarm metaheuristic optimizers for Packmind behavior selection.
//!
//! Three interchangeable population-based searchers rank an actor's behavior
//! candidates against the current world state: a grey wolf pack hierarchy, a
//! particle swarm, and a firefly colony. Each mutates only the 1-D search
//! position of its candidates; the candidates' own fitness shapes stay pure.
//!
//! All randomness flows through an injected [`rand::RngCore`], so a seeded
//! stream reproduces every ranking bit for bit.

use ordered_float::OrderedFloat;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use packmind_core::{BehaviorKind, Candidate, WorldSnapshot};

pub mod firefly;
pub mod grey_wolf;
pub mod particle_swarm;

pub use firefly::FireflyOptimizer;
pub use grey_wolf::GreyWolfOptimizer;
pub use particle_swarm::ParticleSwarmOptimizer;

/// Identifies one of the three optimizer families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    GreyWolf,
    ParticleSwarm,
    Firefly,
}

impl AlgorithmKind {
    /// All algorithm families, in profiler display order.
    pub const ALL: [AlgorithmKind; 3] = [
        AlgorithmKind::GreyWolf,
        AlgorithmKind::ParticleSwarm,
        AlgorithmKind::Firefly,
    ];

    /// Stable display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            AlgorithmKind::GreyWolf => "grey wolf optimizer",
            AlgorithmKind::ParticleSwarm => "particle swarm",
            AlgorithmKind::Firefly => "firefly algorithm",
        }
    }

    /// Dense index for fixed-size per-algorithm tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            AlgorithmKind::GreyWolf => 0,
            AlgorithmKind::ParticleSwarm => 1,
            AlgorithmKind::Firefly => 2,
        }
    }
}

/// One entry of a ranked behavior list, produced fresh per query.
///
/// `index` addresses the candidate inside the owning optimizer's population
/// as of this query; it stays valid until the next `optimize` call. `signal`
/// carries per-algorithm telemetry: particle velocity for the swarm,
/// brightness for the fireflies, the search position for the wolves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedBehavior {
    pub index: usize,
    pub kind: BehaviorKind,
    pub weight: f32,
    pub signal: f32,
}

/// Shared contract for the three optimizer families.
///
/// `optimize` runs the variant's refinement passes against a world snapshot;
/// `weighted_behaviors` is a pure read of the resulting ranking. An inert
/// instance (failed construction) returns an empty ranking and ignores
/// `optimize` calls.
pub trait Optimizer {
    /// Which algorithm family this instance belongs to.
    fn kind(&self) -> AlgorithmKind;

    /// Run `iterations` refinement passes against `state`.
    fn optimize(&mut self, iterations: u32, state: WorldSnapshot, rng: &mut dyn RngCore);

    /// Full population ranked descending by normalized weight.
    fn weighted_behaviors(&self) -> Vec<WeightedBehavior>;

    /// Number of candidates in the population.
    fn population_len(&self) -> usize;

    /// Borrow a candidate by its position in the population.
    fn candidate(&self, index: usize) -> Option<&dyn Candidate>;

    /// Mutably borrow a candidate so the selector can evaluate it.
    fn candidate_mut(&mut self, index: usize) -> Option<&mut dyn Candidate>;

    /// Estimated resident size of the optimizer state, in bytes, summed over
    /// its per-candidate arrays and scalar parameters.
    fn memory_estimate(&self) -> f32;
}

/// Normalize raw scores into weights that sum to one.
///
/// A degenerate population (total at or below epsilon) falls back to uniform
/// weights rather than dividing by zero.
pub(crate) fn normalize_weights(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let total: f32 = raw.iter().sum();
    if total <= f32::EPSILON {
        let uniform = 1.0 / raw.len() as f32;
        return vec![uniform; raw.len()];
    }
    raw.iter().map(|w| w / total).collect()
}

/// Order a ranking descending by weight. The sort is stable, so equal
/// weights keep population order.
pub(crate) fn rank_descending(mut behaviors: Vec<WeightedBehavior>) -> Vec<WeightedBehavior> {
    behaviors.sort_by_key(|wb| Reverse(OrderedFloat(wb.weight)));
    behaviors
}

/// Construct an optimizer of the requested family over `candidates`.
pub fn build_optimizer(
    kind: AlgorithmKind,
    candidates: Vec<Box<dyn Candidate>>,
    rng: &mut dyn RngCore,
) -> Box<dyn Optimizer> {
    match kind {
        AlgorithmKind::GreyWolf => Box::new(GreyWolfOptimizer::new(candidates, rng)),
        AlgorithmKind::ParticleSwarm => Box::new(ParticleSwarmOptimizer::new(candidates, rng)),
        AlgorithmKind::Firefly => Box::new(FireflyOptimizer::new(candidates, rng)),
    }
}
