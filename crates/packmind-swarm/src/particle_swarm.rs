//! Particle swarm optimizer.
//!
//! Candidates move through the search space as particles balancing inertia,
//! a cognitive pull toward their personal best, and a social pull toward the
//! swarm-wide best. Each `optimize` pass runs several inner sub-steps, so the
//! swarm converges faster than one update per pass would allow.

use rand::{Rng, RngCore};

use packmind_core::{Candidate, WorldSnapshot};

use crate::{AlgorithmKind, Optimizer, WeightedBehavior, normalize_weights, rank_descending};

const BASE_INERTIA: f32 = 0.729;
const COGNITIVE_PULL: f32 = 1.49;
const SOCIAL_PULL: f32 = 1.49;
/// Refinement sub-steps per `optimize` pass.
const INNER_STEPS: u32 = 5;

/// Particle Swarm Optimizer over one actor's behavior candidates.
pub struct ParticleSwarmOptimizer {
    particles: Vec<Box<dyn Candidate>>,
    personal_best_positions: Vec<f32>,
    personal_best_fitness: Vec<f32>,
    velocities: Vec<f32>,
    momentum_factors: Vec<f32>,
    velocity_history: Vec<f32>,
    global_best_position: f32,
    global_best_fitness: f32,
    current_state: WorldSnapshot,
}

impl ParticleSwarmOptimizer {
    /// Build a swarm over `candidates`, scattering positions in `[0, 1)` and
    /// seeding every particle with a random initial velocity and momentum.
    pub fn new(mut candidates: Vec<Box<dyn Candidate>>, rng: &mut dyn RngCore) -> Self {
        let count = candidates.len();
        let mut personal_best_positions = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);
        let mut momentum_factors = Vec::with_capacity(count);

        for particle in &mut candidates {
            let position = rng.random::<f32>();
            particle.set_position(position);
            personal_best_positions.push(position);
            velocities.push(rng.random_range(-0.5..0.5));
            momentum_factors.push(rng.random::<f32>());
        }

        Self {
            particles: candidates,
            personal_best_positions,
            personal_best_fitness: vec![f32::MIN; count],
            velocities,
            momentum_factors,
            velocity_history: vec![0.0; count],
            global_best_position: 0.0,
            global_best_fitness: f32::MIN,
            current_state: WorldSnapshot::default(),
        }
    }

    /// Best shaped fitness the swarm has seen this run. Never decreases
    /// across successive `optimize` calls.
    #[must_use]
    pub fn global_best_fitness(&self) -> f32 {
        self.global_best_fitness
    }

    /// Search position where the global best was found.
    #[must_use]
    pub fn global_best_position(&self) -> f32 {
        self.global_best_position
    }

    /// Inertia adapts to the actor's situation: a hurt actor or one far off
    /// the engagement distance keeps more momentum to search wider.
    fn adaptive_inertia(&self) -> f32 {
        let health_factor = (1.0 - self.current_state.health_fraction).powi(2);
        let distance_factor = (-(self.current_state.distance_to_target - 5.0).abs() / 5.0).exp();
        BASE_INERTIA * (0.5 + (health_factor + distance_factor) * 0.25)
    }

    /// Recompute shaped fitness for every particle and track bests.
    ///
    /// Shaping dampens fitness for fast-moving particles (they overshoot),
    /// rewards accumulated momentum, and credits velocity history. Bests
    /// update on strict improvement only.
    fn update_fitness(&mut self) {
        let mut shaped = Vec::with_capacity(self.particles.len());

        for (i, particle) in self.particles.iter_mut().enumerate() {
            particle.refresh_fitness(&self.current_state);

            let velocity_influence = (-self.velocities[i].abs()).exp();
            let momentum_influence = self.momentum_factors[i].sqrt();
            let historical_influence = 1.0 + self.velocity_history[i].abs() * 0.1;
            let fitness =
                particle.fitness() * velocity_influence * momentum_influence * historical_influence;
            shaped.push(fitness);

            if fitness > self.personal_best_fitness[i] {
                self.personal_best_fitness[i] = fitness;
                self.personal_best_positions[i] = particle.position();
            }
            if fitness > self.global_best_fitness {
                self.global_best_fitness = fitness;
                self.global_best_position = particle.position();
            }
        }

        for (particle, fitness) in self.particles.iter_mut().zip(shaped) {
            particle.set_fitness(fitness);
        }
    }

    fn update_velocities_and_positions(&mut self, rng: &mut dyn RngCore) {
        let inertia = self.adaptive_inertia();

        for (i, particle) in self.particles.iter_mut().enumerate() {
            self.velocity_history[i] = self.velocities[i];

            let r1 = rng.random::<f32>();
            let r2 = rng.random::<f32>();
            let r3 = rng.random::<f32>();

            let position = particle.position();
            let momentum = (self.momentum_factors[i]
                + (r3 - 0.5) * 0.1
                + (position * std::f32::consts::PI).sin() * 0.05)
                .clamp(0.0, 1.0);
            self.momentum_factors[i] = momentum;

            let velocity = inertia * self.velocities[i] * (1.0 + momentum)
                + COGNITIVE_PULL * r1 * (self.personal_best_positions[i] - position)
                + SOCIAL_PULL * r2 * (self.global_best_position - position);

            let max_velocity = 0.5 + 0.5 * momentum;
            let velocity = velocity.clamp(-max_velocity, max_velocity);
            self.velocities[i] = velocity;

            let stepped = position + velocity * momentum + self.velocity_history[i] * 0.1;
            particle.set_position(stepped.clamp(0.0, 1.0));
        }
    }
}

impl Optimizer for ParticleSwarmOptimizer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::ParticleSwarm
    }

    fn optimize(&mut self, iterations: u32, state: WorldSnapshot, rng: &mut dyn RngCore) {
        if self.particles.is_empty() {
            return;
        }

        self.current_state = state;
        for _ in 0..iterations {
            for _ in 0..INNER_STEPS {
                self.update_fitness();
                self.update_velocities_and_positions(rng);
            }
        }
    }

    fn weighted_behaviors(&self) -> Vec<WeightedBehavior> {
        if self.particles.is_empty() {
            return Vec::new();
        }

        let raw: Vec<f32> = self
            .particles
            .iter()
            .enumerate()
            .map(|(i, particle)| {
                particle.fitness()
                    * (1.0 + particle.position())
                    * (1.0 + self.velocities[i].abs())
                    * self.momentum_factors[i]
            })
            .collect();
        let weights = normalize_weights(&raw);

        let entries = self
            .particles
            .iter()
            .zip(weights)
            .enumerate()
            .map(|(index, (particle, weight))| WeightedBehavior {
                index,
                kind: particle.kind(),
                weight,
                signal: self.velocities[index],
            })
            .collect();
        rank_descending(entries)
    }

    fn population_len(&self) -> usize {
        self.particles.len()
    }

    fn candidate(&self, index: usize) -> Option<&dyn Candidate> {
        self.particles.get(index).map(|particle| particle.as_ref())
    }

    fn candidate_mut(&mut self, index: usize) -> Option<&mut dyn Candidate> {
        self.particles
            .get_mut(index)
            .map(|particle| particle.as_mut() as &mut dyn Candidate)
    }

    fn memory_estimate(&self) -> f32 {
        let float = std::mem::size_of::<f32>() as f32;
        let count = self.particles.len() as f32;
        // Per-particle position/fitness plus the five parallel arrays, the
        // swarm constants and global best, and the state.
        float * (count * 7.0 + 5.0 + 3.0)
    }
}
