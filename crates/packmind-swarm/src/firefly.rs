//! Firefly colony optimizer.
//!
//! Every firefly glows with an intensity derived from its fitness, energy,
//! and light absorption; dimmer fireflies drift toward brighter ones with an
//! attraction that decays over squared distance. Randomization strength and
//! absorption drift across generations, so early passes explore and later
//! passes settle.

use rand::{Rng, RngCore};

use packmind_core::{Candidate, WorldSnapshot};

use crate::{AlgorithmKind, Optimizer, WeightedBehavior, normalize_weights, rank_descending};

/// Attractiveness at zero distance.
const BETA_ZERO: f32 = 1.0;
/// Initial randomization strength; decays every generation.
const INITIAL_ALPHA: f32 = 0.2;
/// Initial light-absorption falloff; drifts toward [`GAMMA_TARGET`].
const INITIAL_GAMMA: f32 = 1.0;
const GAMMA_TARGET: f32 = 2.0;

/// Firefly Algorithm optimizer over one actor's behavior candidates.
///
/// The candidate list and every parallel array below stay index-aligned;
/// the ranking pass swaps all of them together.
pub struct FireflyOptimizer {
    fireflies: Vec<Box<dyn Candidate>>,
    intensity: Vec<f32>,
    attractiveness: Vec<f32>,
    light_absorption: Vec<f32>,
    movement_history: Vec<f32>,
    energy_levels: Vec<f32>,
    alpha: f32,
    gamma: f32,
    current_state: WorldSnapshot,
}

impl FireflyOptimizer {
    /// Build a colony over `candidates`, scattering positions and absorption
    /// coefficients in `[0, 1)` with full energy.
    pub fn new(mut candidates: Vec<Box<dyn Candidate>>, rng: &mut dyn RngCore) -> Self {
        let count = candidates.len();
        let mut light_absorption = Vec::with_capacity(count);

        for firefly in &mut candidates {
            firefly.set_position(rng.random::<f32>());
            light_absorption.push(rng.random::<f32>());
        }

        Self {
            fireflies: candidates,
            intensity: vec![0.0; count],
            attractiveness: vec![0.0; count],
            light_absorption,
            movement_history: vec![0.0; count],
            energy_levels: vec![1.0; count],
            alpha: INITIAL_ALPHA,
            gamma: INITIAL_GAMMA,
            current_state: WorldSnapshot::default(),
        }
    }

    /// Composite ranking score for the firefly at `index`.
    fn glow_score(&self, index: usize) -> f32 {
        self.intensity[index] * self.energy_levels[index] * (1.0 - self.light_absorption[index])
    }

    /// Refresh fitness and recompute every firefly's light intensity.
    fn update_light_intensity(&mut self) {
        let mut refreshed = Vec::with_capacity(self.fireflies.len());
        for (i, firefly) in self.fireflies.iter_mut().enumerate() {
            firefly.refresh_fitness(&self.current_state);

            let position_factor = firefly.position().sqrt();
            let energy_factor = self.energy_levels[i].powi(2);
            let absorption_factor = 1.0 / (1.0 + self.light_absorption[i]);
            refreshed.push(firefly.fitness() * position_factor * energy_factor * absorption_factor);
        }
        self.intensity = refreshed;
    }

    /// Drift firefly `i` toward the brighter firefly `j`.
    fn move_firefly(&mut self, i: usize, j: usize, rng: &mut dyn RngCore) {
        let previous = self.fireflies[i].position();
        let toward = self.fireflies[j].position();

        let distance = (previous - toward).abs();
        let absorption_effect = (-self.gamma * distance * distance * self.light_absorption[i]).exp();
        let energy_effect = self.energy_levels[i].sqrt();

        let movement = self.attractiveness[i] * (toward - previous) * absorption_effect;
        let randomization = self.alpha * (rng.random::<f32>() - 0.5) * energy_effect;

        let stepped = (previous + movement + randomization).clamp(0.0, 1.0);
        self.fireflies[i].set_position(stepped);

        let travelled = (stepped - previous).abs();
        self.movement_history[i] =
            self.movement_history[i] + (travelled - self.movement_history[i]) * 0.3;
    }

    /// Decay randomization and drift absorption/energy once per generation.
    fn update_parameters(&mut self, generation: u32, max_generation: u32, rng: &mut dyn RngCore) {
        let progress = generation as f32 / max_generation as f32;

        self.alpha *= (-0.1 * progress).exp();
        self.gamma += (GAMMA_TARGET - self.gamma) * progress * 0.1;

        for i in 0..self.fireflies.len() {
            let drifted = (self.light_absorption[i] + (rng.random::<f32>() - 0.5) * 0.1)
                .clamp(0.0, 1.0);
            self.light_absorption[i] =
                self.light_absorption[i] + (drifted - self.light_absorption[i]) * 0.2;

            self.energy_levels[i] = (self.energy_levels[i]
                + (1.0 - progress) * (rng.random::<f32>() - 0.5) * 0.1)
                .clamp(0.0, 1.0);
        }
    }

    /// Order the colony descending by glow score, swapping the candidate
    /// list and every parallel array identically.
    fn rank_fireflies(&mut self) {
        let count = self.fireflies.len();
        for i in 0..count.saturating_sub(1) {
            for j in 0..count - i - 1 {
                if self.glow_score(j) < self.glow_score(j + 1) {
                    self.swap_fireflies(j, j + 1);
                }
            }
        }
    }

    fn swap_fireflies(&mut self, i: usize, j: usize) {
        self.fireflies.swap(i, j);
        self.intensity.swap(i, j);
        self.attractiveness.swap(i, j);
        self.light_absorption.swap(i, j);
        self.movement_history.swap(i, j);
        self.energy_levels.swap(i, j);
    }
}

impl Optimizer for FireflyOptimizer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Firefly
    }

    fn optimize(&mut self, iterations: u32, state: WorldSnapshot, rng: &mut dyn RngCore) {
        if self.fireflies.is_empty() || iterations == 0 {
            return;
        }

        self.current_state = state;

        for generation in 0..iterations {
            self.update_light_intensity();

            for i in 0..self.fireflies.len() {
                for j in 0..self.fireflies.len() {
                    if self.intensity[j] > self.intensity[i] {
                        let distance =
                            (self.fireflies[i].position() - self.fireflies[j].position()).abs();
                        let absorption_factor = (-self.light_absorption[i] * distance).exp();
                        self.attractiveness[i] =
                            BETA_ZERO * absorption_factor * self.energy_levels[i];

                        self.move_firefly(i, j, rng);

                        self.energy_levels[i] *=
                            (-0.1 * self.movement_history[i].abs()).exp();
                    }
                }
            }

            self.update_parameters(generation, iterations, rng);
        }

        self.rank_fireflies();
    }

    fn weighted_behaviors(&self) -> Vec<WeightedBehavior> {
        if self.fireflies.is_empty() {
            return Vec::new();
        }

        let raw: Vec<f32> = (0..self.fireflies.len())
            .map(|i| self.glow_score(i) * (1.0 + self.movement_history[i].abs()))
            .collect();
        let weights = normalize_weights(&raw);

        let entries = self
            .fireflies
            .iter()
            .zip(weights)
            .enumerate()
            .map(|(index, (firefly, weight))| WeightedBehavior {
                index,
                kind: firefly.kind(),
                weight,
                signal: self.intensity[index],
            })
            .collect();
        rank_descending(entries)
    }

    fn population_len(&self) -> usize {
        self.fireflies.len()
    }

    fn candidate(&self, index: usize) -> Option<&dyn Candidate> {
        self.fireflies.get(index).map(|firefly| firefly.as_ref())
    }

    fn candidate_mut(&mut self, index: usize) -> Option<&mut dyn Candidate> {
        self.fireflies.get_mut(index).map(|firefly| firefly.as_mut() as &mut dyn Candidate)
    }

    fn memory_estimate(&self) -> f32 {
        let float = std::mem::size_of::<f32>() as f32;
        let count = self.fireflies.len() as f32;
        // Per-firefly position/fitness plus the five parallel arrays, the
        // colony parameters, and the state.
        float * (count * 7.0 + 4.0 + 3.0)
    }
}
