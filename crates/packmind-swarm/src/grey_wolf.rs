//! Grey wolf pack-hierarchy optimizer.
//!
//! The three fittest candidates lead as alpha, beta, and delta; every pass
//! pulls the whole pack toward the mean leader position with an exploration
//! coefficient that decays across the iteration budget.

use ordered_float::OrderedFloat;
use rand::{Rng, RngCore};
use std::cmp::Reverse;
use tracing::error;

use packmind_core::{Candidate, WorldSnapshot};

use crate::{AlgorithmKind, Optimizer, WeightedBehavior, normalize_weights, rank_descending};

/// Lower bound of the wolf search range. Positions never collapse to zero,
/// so a wolf's fitness bias stays above half its base value.
pub const MIN_POSITION: f32 = 0.1;

/// Leadership hierarchy depth; construction fails below this.
pub const MIN_PACK_SIZE: usize = 3;

/// Grey Wolf Optimizer over one actor's behavior candidates.
pub struct GreyWolfOptimizer {
    /// Population sorted descending by fitness after every pass; the first
    /// three entries are the alpha, beta, and delta leaders.
    wolves: Vec<Box<dyn Candidate>>,
    current_state: WorldSnapshot,
    cached_adaptive_a: f32,
    cached_health_factor: f32,
    cached_distance_factor: f32,
}

impl GreyWolfOptimizer {
    /// Build a pack over `candidates`, scattering initial positions in
    /// `[MIN_POSITION, 1)`.
    ///
    /// A population below [`MIN_PACK_SIZE`] cannot form the leadership
    /// hierarchy: the failure is logged and the instance is left inert
    /// (no-op `optimize`, empty `weighted_behaviors`) rather than panicking.
    pub fn new(mut candidates: Vec<Box<dyn Candidate>>, rng: &mut dyn RngCore) -> Self {
        if candidates.len() < MIN_PACK_SIZE {
            error!(
                population = candidates.len(),
                minimum = MIN_PACK_SIZE,
                "grey wolf optimizer needs a full leadership hierarchy; instance is inert"
            );
            candidates.clear();
        } else {
            for wolf in &mut candidates {
                wolf.set_position(rng.random_range(MIN_POSITION..1.0));
            }
        }

        let mut optimizer = Self {
            wolves: candidates,
            current_state: WorldSnapshot::default(),
            cached_adaptive_a: 0.0,
            cached_health_factor: 0.0,
            cached_distance_factor: 0.0,
        };
        if !optimizer.is_inert() {
            optimizer.update_hierarchy();
        }
        optimizer
    }

    /// Whether construction failed and the instance ignores all calls.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.wolves.len() < MIN_PACK_SIZE
    }

    /// Mean search position of the alpha/beta/delta leaders.
    #[must_use]
    pub fn mean_leader_position(&self) -> f32 {
        if self.is_inert() {
            return 0.0;
        }
        (self.wolves[0].position() + self.wolves[1].position() + self.wolves[2].position()) / 3.0
    }

    fn update_cached_factors(&mut self) {
        self.cached_health_factor = 1.0 - self.current_state.health_fraction;
        self.cached_distance_factor = (self.current_state.distance_to_target - 5.0).abs() / 5.0;
    }

    /// Refresh every wolf's fitness and re-sort so the three fittest lead.
    /// The sort is stable: wolves with equal fitness keep their order.
    fn update_hierarchy(&mut self) {
        for wolf in &mut self.wolves {
            wolf.refresh_fitness(&self.current_state);
        }
        self.wolves
            .sort_by_key(|wolf| Reverse(OrderedFloat(wolf.fitness())));
    }

    fn update_positions(&mut self, rng: &mut dyn RngCore) {
        let mean_leader = self.mean_leader_position();
        // One shared pull factor per pass; only the anti-stagnation jitter
        // differs per wolf.
        let r = rng.random::<f32>();
        let pull = 2.0 * self.cached_adaptive_a * r - self.cached_adaptive_a;

        for wolf in &mut self.wolves {
            let gap = (mean_leader - wolf.position()).abs().max(0.1);
            let stepped = mean_leader - pull * gap;
            let jittered = stepped + rng.random_range(-0.05..0.05);
            wolf.set_position(jittered.clamp(MIN_POSITION, 1.0));
        }
    }
}

impl Optimizer for GreyWolfOptimizer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::GreyWolf
    }

    fn optimize(&mut self, iterations: u32, state: WorldSnapshot, rng: &mut dyn RngCore) {
        if self.is_inert() || iterations == 0 {
            return;
        }

        self.current_state = state;
        self.update_cached_factors();

        for i in 0..iterations {
            // Exploration coefficient decays linearly from 2 toward 0 across
            // the budget, widened when hurt or far off the engagement range.
            let a = 2.0 * (1.0 - i as f32 / iterations as f32);
            self.cached_adaptive_a =
                a * (1.0 + self.cached_health_factor + self.cached_distance_factor);

            self.update_positions(rng);
            self.update_hierarchy();
        }
    }

    fn weighted_behaviors(&self) -> Vec<WeightedBehavior> {
        if self.wolves.is_empty() {
            return Vec::new();
        }

        let raw: Vec<f32> = self.wolves.iter().map(|wolf| wolf.fitness()).collect();
        let weights = normalize_weights(&raw);

        let entries = self
            .wolves
            .iter()
            .zip(weights)
            .enumerate()
            .map(|(index, (wolf, weight))| WeightedBehavior {
                index,
                kind: wolf.kind(),
                weight,
                signal: wolf.position(),
            })
            .collect();
        rank_descending(entries)
    }

    fn population_len(&self) -> usize {
        self.wolves.len()
    }

    fn candidate(&self, index: usize) -> Option<&dyn Candidate> {
        self.wolves.get(index).map(|wolf| wolf.as_ref())
    }

    fn candidate_mut(&mut self, index: usize) -> Option<&mut dyn Candidate> {
        self.wolves.get_mut(index).map(|wolf| wolf.as_mut() as &mut dyn Candidate)
    }

    fn memory_estimate(&self) -> f32 {
        let float = std::mem::size_of::<f32>() as f32;
        let count = self.wolves.len() as f32;
        // Per-wolf position and fitness, the three leader positions, the
        // exploration coefficient and its cached factors, and the state.
        float * (count * 2.0 + 3.0 + 3.0 + 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packmind_core::{SessionConfig, standard_pack};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn pack() -> Vec<Box<dyn Candidate>> {
        standard_pack(&SessionConfig::default())
    }

    fn engaged_state() -> WorldSnapshot {
        WorldSnapshot::new(4.0, 0.8, 6.0)
    }

    #[test]
    fn weights_sum_to_one_and_rank_descending() {
        let mut rng = SmallRng::seed_from_u64(0xA1FA);
        let mut gwo = GreyWolfOptimizer::new(pack(), &mut rng);
        gwo.optimize(10, engaged_state(), &mut rng);

        let behaviors = gwo.weighted_behaviors();
        assert_eq!(behaviors.len(), 3);
        let total: f32 = behaviors.iter().map(|wb| wb.weight).sum();
        assert!((total - 1.0).abs() < 1e-4);
        for pair in behaviors.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn under_populated_pack_is_inert() {
        let mut rng = SmallRng::seed_from_u64(0xBE7A);
        let two: Vec<Box<dyn Candidate>> = pack().into_iter().take(2).collect();
        let mut gwo = GreyWolfOptimizer::new(two, &mut rng);

        assert!(gwo.is_inert());
        // Inert instances swallow optimize calls and rank nothing.
        gwo.optimize(10, engaged_state(), &mut rng);
        assert!(gwo.weighted_behaviors().is_empty());
        assert_eq!(gwo.population_len(), 0);
    }

    #[test]
    fn positions_stay_inside_clamp_range() {
        let mut rng = SmallRng::seed_from_u64(0xDE17A);
        let mut gwo = GreyWolfOptimizer::new(pack(), &mut rng);
        for _ in 0..5 {
            gwo.optimize(10, engaged_state(), &mut rng);
        }

        for index in 0..gwo.population_len() {
            let position = gwo.candidate(index).expect("populated").position();
            assert!((MIN_POSITION..=1.0).contains(&position));
        }
    }

    #[test]
    fn ranking_is_deterministic_under_a_fixed_seed() {
        let run = || {
            let mut rng = SmallRng::seed_from_u64(0x5EED);
            let mut gwo = GreyWolfOptimizer::new(pack(), &mut rng);
            gwo.optimize(10, engaged_state(), &mut rng);
            gwo.weighted_behaviors()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn weighted_behaviors_is_idempotent() {
        let mut rng = SmallRng::seed_from_u64(0x1D3);
        let mut gwo = GreyWolfOptimizer::new(pack(), &mut rng);
        gwo.optimize(10, engaged_state(), &mut rng);
        assert_eq!(gwo.weighted_behaviors(), gwo.weighted_behaviors());
    }
}
