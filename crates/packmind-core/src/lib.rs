//! Core types shared across the Packmind workspace.
//!
//! Packmind drives game enemies by ranking a small population of behavior
//! candidates (attack, chase, patrol) with swarm optimizers. This crate holds
//! the world-state snapshot fed to the optimizers, the candidate
//! implementations, the locomotion seam they act through, and the session
//! configuration. The optimizers themselves live in `packmind-swarm`.

use rand::{Rng, RngCore, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Number of refinement passes the selector requests per tick.
pub const REFINE_ITERATIONS: u32 = 10;
/// Minimum normalized weight a behavior needs before the selector will run it.
pub const WEIGHT_THRESHOLD: f32 = 0.3;

/// A point in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Component-wise translation.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32, dz: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// World state sampled once per tick and handed to the optimizers.
///
/// The three components are the only signals the search sees: how far the
/// target is, how healthy the actor is, and how far the actor has strayed
/// from its patrol anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Distance from the actor to its current target.
    pub distance_to_target: f32,
    /// Actor health as a fraction in `[0, 1]`.
    pub health_fraction: f32,
    /// Distance from the actor to its patrol anchor point.
    pub distance_to_anchor: f32,
}

impl WorldSnapshot {
    #[must_use]
    pub const fn new(distance_to_target: f32, health_fraction: f32, distance_to_anchor: f32) -> Self {
        Self {
            distance_to_target,
            health_fraction,
            distance_to_anchor,
        }
    }
}

/// Result of running one behavior candidate for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorStatus {
    /// The behavior finished its job this tick.
    Success,
    /// The behavior cannot act in the current state.
    Fail,
    /// The behavior issued orders and needs more ticks.
    Running,
}

impl BehaviorStatus {
    /// Returns `true` unless the status is [`BehaviorStatus::Fail`].
    #[must_use]
    pub fn is_actionable(self) -> bool {
        !matches!(self, BehaviorStatus::Fail)
    }
}

/// Identity tag for the fixed set of selectable behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    Attack,
    Chase,
    Patrol,
}

impl BehaviorKind {
    /// All behavior kinds, in spawn order.
    pub const ALL: [BehaviorKind; 3] = [
        BehaviorKind::Attack,
        BehaviorKind::Chase,
        BehaviorKind::Patrol,
    ];

    /// Stable display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            BehaviorKind::Attack => "attack",
            BehaviorKind::Chase => "chase",
            BehaviorKind::Patrol => "patrol",
        }
    }
}

/// Locomotion capabilities a behavior candidate acts through.
///
/// The host supplies an implementation per actor; candidates never touch the
/// world directly. Queries are snapshots of the host's navigation state, and
/// order methods (`set_destination`, `clear_path`, `face`) take effect on the
/// host's next movement step.
pub trait Navigator {
    /// Current actor position.
    fn position(&self) -> Point3;

    /// Current target position, if a target exists.
    fn target(&self) -> Option<Point3>;

    /// Order movement toward `point`.
    fn set_destination(&mut self, point: Point3);

    /// Drop the active path, halting at the current position.
    fn clear_path(&mut self);

    /// Whether a destination is currently active.
    fn has_path(&self) -> bool;

    /// Remaining travel distance to the active destination (0 when idle).
    fn remaining_distance(&self) -> f32;

    /// Distance at which a destination counts as reached.
    fn stopping_distance(&self) -> f32;

    /// Turn in place toward `point`.
    fn face(&mut self, point: Point3);

    /// Nearest navigable point to `probe` within `radius`, if one exists and
    /// is reachable from the current position.
    fn nearest_reachable(&self, probe: Point3, radius: f32) -> Option<Point3>;
}

/// One selectable action, carrying its search-space coordinate and fitness.
///
/// The optimizer owns the population and is the only writer of `position`;
/// candidates own their action state (cooldowns, path retries) and their
/// pure fitness shape.
pub trait Candidate {
    /// Identity tag, stable for the candidate's lifetime.
    fn kind(&self) -> BehaviorKind;

    /// Current coordinate in the abstract 1-D search space.
    fn position(&self) -> f32;

    /// Overwrite the search coordinate. Callers clamp to their own range.
    fn set_position(&mut self, position: f32);

    /// Fitness as of the last refresh.
    fn fitness(&self) -> f32;

    /// Overwrite the fitness score (optimizers shape fitness further after
    /// the base refresh).
    fn set_fitness(&mut self, fitness: f32);

    /// Pure desirability of this behavior under `state`, before the search
    /// position weighs in. Never negative.
    fn base_fitness(&self, state: &WorldSnapshot) -> f32;

    /// Recompute fitness from world state, biased by the search position.
    /// The position nudges fitness between 50% and 100% of its base value,
    /// so it biases the ranking without ever fully deciding it.
    fn refresh_fitness(&mut self, state: &WorldSnapshot) {
        let base = self.base_fitness(state);
        let shaped = base * (0.5 + 0.5 * self.position());
        self.set_fitness(shaped);
    }

    /// Run the behavior for one tick, issuing orders through `nav`.
    fn evaluate(
        &mut self,
        state: &WorldSnapshot,
        nav: &mut dyn Navigator,
        rng: &mut dyn RngCore,
    ) -> BehaviorStatus;

    /// Stable display name.
    fn name(&self) -> &'static str {
        self.kind().label()
    }
}

/// Errors raised when validating a session configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Difficulty tier selected once at session start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Static configuration for one Packmind session.
///
/// Built once at session start and read-only afterwards; actors receive a
/// shared reference rather than reading global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Difficulty tier the session was started with.
    pub difficulty: Difficulty,
    /// Range within which the attack behavior can strike.
    pub attack_range: f32,
    /// Ticks between attack strikes while in range.
    pub attack_cooldown_ticks: u32,
    /// Radius within which a target can be detected and chased.
    pub detection_radius: f32,
    /// Minimum ticks between chase destination updates.
    pub chase_repath_ticks: u32,
    /// Radius patrol wander points are sampled in.
    pub wander_radius: f32,
    /// Minimum distance a wander point must be from the actor.
    pub min_wander_distance: f32,
    /// Sampling attempts before patrol gives up finding a wander point.
    pub wander_sample_attempts: u32,
    /// Ticks between patrol stuck checks.
    pub stuck_check_ticks: u32,
    /// Displacement below which the actor counts as stuck.
    pub stuck_threshold: f32,
    /// Re-path attempts before patrol hard-resets its path.
    pub max_path_retries: u32,
    /// Refinement passes the selector requests per tick.
    pub refine_iterations: u32,
    /// Minimum normalized weight before the selector runs a behavior.
    pub weight_threshold: f32,
    /// Milliseconds between profiler samples.
    pub profiler_interval_ms: u64,
    /// Samples after which the profiler stops updating an algorithm's stats.
    pub profiler_measurement_cap: u32,
    /// Optional RNG seed for reproducible sessions.
    pub rng_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            attack_range: 2.0,
            attack_cooldown_ticks: 180,
            detection_radius: 10.0,
            chase_repath_ticks: 30,
            wander_radius: 10.0,
            min_wander_distance: 5.0,
            wander_sample_attempts: 30,
            stuck_check_ticks: 60,
            stuck_threshold: 0.1,
            max_path_retries: 5,
            refine_iterations: REFINE_ITERATIONS,
            weight_threshold: WEIGHT_THRESHOLD,
            profiler_interval_ms: 500,
            profiler_measurement_cap: 100,
            rng_seed: None,
        }
    }
}

impl SessionConfig {
    /// Preset tuned for the given difficulty tier.
    #[must_use]
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let base = Self::default();
        match difficulty {
            Difficulty::Easy => Self {
                difficulty,
                detection_radius: 8.0,
                attack_cooldown_ticks: 240,
                chase_repath_ticks: 45,
                ..base
            },
            Difficulty::Medium => Self { difficulty, ..base },
            Difficulty::Hard => Self {
                difficulty,
                detection_radius: 14.0,
                attack_range: 2.5,
                attack_cooldown_ticks: 120,
                chase_repath_ticks: 15,
                ..base
            },
        }
    }

    /// Ensure every knob is usable before a session starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attack_range <= 0.0 {
            return Err(ConfigError::Invalid("attack_range must be positive"));
        }
        if self.detection_radius <= self.attack_range {
            return Err(ConfigError::Invalid(
                "detection_radius must exceed attack_range",
            ));
        }
        if self.wander_radius <= 0.0 {
            return Err(ConfigError::Invalid("wander_radius must be positive"));
        }
        if self.min_wander_distance >= self.wander_radius {
            return Err(ConfigError::Invalid(
                "min_wander_distance must be below wander_radius",
            ));
        }
        if self.wander_sample_attempts == 0 {
            return Err(ConfigError::Invalid(
                "wander_sample_attempts must be non-zero",
            ));
        }
        if self.stuck_check_ticks == 0 {
            return Err(ConfigError::Invalid("stuck_check_ticks must be non-zero"));
        }
        if self.refine_iterations == 0 {
            return Err(ConfigError::Invalid("refine_iterations must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.weight_threshold) {
            return Err(ConfigError::Invalid(
                "weight_threshold must be within [0, 1]",
            ));
        }
        if self.profiler_measurement_cap == 0 {
            return Err(ConfigError::Invalid(
                "profiler_measurement_cap must be non-zero",
            ));
        }
        Ok(())
    }

    /// RNG seeded from the config, or from entropy when no seed is pinned.
    #[must_use]
    pub fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed = rand::rng().random::<u64>();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// The standard three-candidate population, built from session config.
#[must_use]
pub fn standard_pack(config: &SessionConfig) -> Vec<Box<dyn Candidate>> {
    vec![
        Box::new(AttackBehavior::new(
            config.attack_range,
            config.attack_cooldown_ticks,
        )),
        Box::new(ChaseBehavior::new(
            config.detection_radius,
            config.chase_repath_ticks,
        )),
        Box::new(PatrolBehavior::new(config)),
    ]
}

/// Strike the target while it is inside attack range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackBehavior {
    attack_range: f32,
    cooldown_ticks: u32,
    cooldown_remaining: u32,
    strikes_delivered: u64,
    position: f32,
    fitness: f32,
}

impl AttackBehavior {
    #[must_use]
    pub fn new(attack_range: f32, cooldown_ticks: u32) -> Self {
        Self {
            attack_range,
            cooldown_ticks,
            cooldown_remaining: 0,
            strikes_delivered: 0,
            position: 0.0,
            fitness: 0.0,
        }
    }

    /// Strikes landed so far (observability for the host's damage hookup).
    #[must_use]
    pub fn strikes_delivered(&self) -> u64 {
        self.strikes_delivered
    }
}

impl Candidate for AttackBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Attack
    }

    fn position(&self) -> f32 {
        self.position
    }

    fn set_position(&mut self, position: f32) {
        self.position = position;
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn base_fitness(&self, state: &WorldSnapshot) -> f32 {
        let base = if state.distance_to_target <= self.attack_range {
            1.0
        } else {
            1.0 / (state.distance_to_target + 1.0)
        };
        (base * state.health_fraction).max(0.0)
    }

    fn evaluate(
        &mut self,
        state: &WorldSnapshot,
        nav: &mut dyn Navigator,
        _rng: &mut dyn RngCore,
    ) -> BehaviorStatus {
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);

        let Some(target) = nav.target() else {
            return BehaviorStatus::Fail;
        };
        if state.distance_to_target > self.attack_range {
            return BehaviorStatus::Fail;
        }

        nav.face(target);
        if self.cooldown_remaining == 0 {
            self.strikes_delivered += 1;
            self.cooldown_remaining = self.cooldown_ticks;
        }
        BehaviorStatus::Success
    }
}

/// Close the distance to a detected target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaseBehavior {
    detection_radius: f32,
    repath_ticks: u32,
    since_repath: u32,
    position: f32,
    fitness: f32,
}

impl ChaseBehavior {
    #[must_use]
    pub fn new(detection_radius: f32, repath_ticks: u32) -> Self {
        Self {
            detection_radius,
            repath_ticks,
            since_repath: 0,
            position: 0.0,
            fitness: 0.0,
        }
    }
}

impl Candidate for ChaseBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Chase
    }

    fn position(&self) -> f32 {
        self.position
    }

    fn set_position(&mut self, position: f32) {
        self.position = position;
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn base_fitness(&self, state: &WorldSnapshot) -> f32 {
        // Triangular falloff peaking at half the detection radius.
        let optimal = self.detection_radius * 0.5;
        let factor = 1.0 - (state.distance_to_target - optimal).abs() / self.detection_radius;
        (factor * state.health_fraction).max(0.0)
    }

    fn evaluate(
        &mut self,
        state: &WorldSnapshot,
        nav: &mut dyn Navigator,
        _rng: &mut dyn RngCore,
    ) -> BehaviorStatus {
        let Some(target) = nav.target() else {
            return BehaviorStatus::Fail;
        };
        if state.distance_to_target > self.detection_radius {
            return BehaviorStatus::Fail;
        }

        // Re-pathing is rate limited; the target rarely moves far in one tick.
        if self.since_repath == 0 {
            nav.set_destination(target);
            self.since_repath = self.repath_ticks;
        } else {
            self.since_repath -= 1;
        }
        nav.face(target);

        if nav.remaining_distance() > nav.stopping_distance() {
            BehaviorStatus::Running
        } else {
            BehaviorStatus::Success
        }
    }
}

/// Wander between randomized reachable points near the patrol anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatrolBehavior {
    wander_radius: f32,
    min_wander_distance: f32,
    sample_attempts: u32,
    stuck_check_ticks: u32,
    stuck_threshold: f32,
    max_path_retries: u32,
    ticks_since_check: u32,
    last_position: Option<Point3>,
    retry_count: u32,
    position: f32,
    fitness: f32,
}

impl PatrolBehavior {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            wander_radius: config.wander_radius,
            min_wander_distance: config.min_wander_distance,
            sample_attempts: config.wander_sample_attempts,
            stuck_check_ticks: config.stuck_check_ticks,
            stuck_threshold: config.stuck_threshold,
            max_path_retries: config.max_path_retries,
            ticks_since_check: 0,
            last_position: None,
            retry_count: 0,
            position: 0.0,
            fitness: 0.0,
        }
    }

    /// Re-path attempts made since the last successful destination.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    fn random_point(&self, nav: &dyn Navigator, rng: &mut dyn RngCore) -> Option<Point3> {
        let origin = nav.position();
        for _ in 0..self.sample_attempts {
            let (dx, dy, dz) = random_in_unit_sphere(rng);
            let probe = origin.offset(
                dx * self.wander_radius,
                dy * self.wander_radius,
                dz * self.wander_radius,
            );
            if let Some(hit) = nav.nearest_reachable(probe, self.wander_radius) {
                if hit.distance(origin) >= self.min_wander_distance {
                    return Some(hit);
                }
            }
        }
        None
    }

    fn handle_stuck(&mut self, nav: &mut dyn Navigator, rng: &mut dyn RngCore) {
        if self.retry_count < self.max_path_retries {
            if let Some(point) = self.random_point(nav, rng) {
                nav.clear_path();
                nav.set_destination(point);
                self.retry_count += 1;
            }
        } else {
            debug!(retries = self.retry_count, "patrol exhausted re-path attempts, resetting path");
            nav.clear_path();
            self.retry_count = 0;
        }
    }
}

impl Candidate for PatrolBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Patrol
    }

    fn position(&self) -> f32 {
        self.position
    }

    fn set_position(&mut self, position: f32) {
        self.position = position;
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn base_fitness(&self, state: &WorldSnapshot) -> f32 {
        // Patrolling pays off far from the target, at low health, and close
        // to the anchor point.
        let danger_factor = state.distance_to_target / 20.0;
        let health_factor = 1.0 - state.health_fraction;
        let anchor_factor = 1.0 / (state.distance_to_anchor + 1.0);
        ((danger_factor + health_factor) * anchor_factor).max(0.0)
    }

    fn evaluate(
        &mut self,
        _state: &WorldSnapshot,
        nav: &mut dyn Navigator,
        rng: &mut dyn RngCore,
    ) -> BehaviorStatus {
        self.ticks_since_check += 1;
        if self.ticks_since_check >= self.stuck_check_ticks {
            let here = nav.position();
            if let Some(last) = self.last_position {
                if here.distance(last) < self.stuck_threshold && nav.has_path() {
                    self.handle_stuck(nav, rng);
                }
            }
            self.last_position = Some(here);
            self.ticks_since_check = 0;
        }

        if !nav.has_path() || nav.remaining_distance() <= nav.stopping_distance() {
            if let Some(point) = self.random_point(nav, rng) {
                nav.set_destination(point);
                self.retry_count = 0;
            }
        }

        if nav.remaining_distance() <= nav.stopping_distance() && !nav.has_path() {
            BehaviorStatus::Success
        } else {
            // Holds position when no reachable point was found; retried next
            // tick rather than surfacing an error.
            BehaviorStatus::Running
        }
    }
}

/// Uniformly distributed direction inside the unit sphere.
fn random_in_unit_sphere(rng: &mut dyn RngCore) -> (f32, f32, f32) {
    for _ in 0..16 {
        let x = rng.random_range(-1.0_f32..1.0);
        let y = rng.random_range(-1.0_f32..1.0);
        let z = rng.random_range(-1.0_f32..1.0);
        if x * x + y * y + z * z <= 1.0 {
            return (x, y, z);
        }
    }
    // Degenerate streams land on a fixed axis rather than looping forever.
    (1.0, 0.0, 0.0)
}
