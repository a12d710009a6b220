//! Host glue for Packmind actors.
//!
//! The arena crate wires the pieces together: [`EnemyAgent`] runs the
//! per-tick decision loop over one optimizer, [`profiler`] benchmarks the
//! three algorithm families side by side, and [`navigator`] provides a
//! kinematic [`packmind_core::Navigator`] for headless runs and tests.

use rand::RngCore;
use tracing::debug;

use packmind_core::{BehaviorKind, Navigator, SessionConfig, WorldSnapshot, standard_pack};
use packmind_swarm::{AlgorithmKind, Optimizer, build_optimizer};

pub mod navigator;
pub mod profiler;

pub use navigator::ArenaNavigator;
pub use profiler::{AlgorithmStats, OptimizationProfiler, SensitivityReport, decision_quality};

/// One enemy actor: an optimizer-ranked behavior population plus the
/// selection policy that executes the winner each tick.
pub struct EnemyAgent {
    optimizer: Box<dyn Optimizer>,
    refine_iterations: u32,
    weight_threshold: f32,
    active_behavior: Option<&'static str>,
}

impl EnemyAgent {
    /// Wrap an existing optimizer with the session's selection policy.
    #[must_use]
    pub fn new(optimizer: Box<dyn Optimizer>, config: &SessionConfig) -> Self {
        Self {
            optimizer,
            refine_iterations: config.refine_iterations,
            weight_threshold: config.weight_threshold,
            active_behavior: None,
        }
    }

    /// Spawn an agent with the standard three-candidate population under the
    /// requested algorithm family.
    #[must_use]
    pub fn spawn(kind: AlgorithmKind, config: &SessionConfig, rng: &mut dyn RngCore) -> Self {
        let optimizer = build_optimizer(kind, standard_pack(config), rng);
        Self::new(optimizer, config)
    }

    /// Which algorithm family drives this agent.
    #[must_use]
    pub fn algorithm(&self) -> AlgorithmKind {
        self.optimizer.kind()
    }

    /// Name of the last behavior accepted through the weight threshold.
    #[must_use]
    pub fn active_behavior(&self) -> Option<&'static str> {
        self.active_behavior
    }

    /// Borrow the underlying optimizer (profiler access).
    #[must_use]
    pub fn optimizer(&self) -> &dyn Optimizer {
        self.optimizer.as_ref()
    }

    /// Mutably borrow the underlying optimizer (profiler access).
    pub fn optimizer_mut(&mut self) -> &mut dyn Optimizer {
        self.optimizer.as_mut()
    }

    /// Run one decision tick against a world snapshot.
    ///
    /// Refines the population, then walks the ranking in descending weight
    /// order and executes the first behavior that clears the weight
    /// threshold and does not fail. When nothing qualifies, the top-ranked
    /// behavior runs unconditionally — the actor always acts, even if that
    /// action fails visibly. Returns the kind that was executed, or `None`
    /// for an inert optimizer.
    pub fn tick(
        &mut self,
        state: WorldSnapshot,
        nav: &mut dyn Navigator,
        rng: &mut dyn RngCore,
    ) -> Option<BehaviorKind> {
        self.optimizer.optimize(self.refine_iterations, state, rng);
        let ranking = self.optimizer.weighted_behaviors();

        for entry in &ranking {
            if entry.weight < self.weight_threshold {
                continue;
            }
            let Some(candidate) = self.optimizer.candidate_mut(entry.index) else {
                continue;
            };
            let status = candidate.evaluate(&state, nav, rng);
            if status.is_actionable() {
                let name = candidate.name();
                self.active_behavior = Some(name);
                debug!(
                    behavior = name,
                    weight = entry.weight,
                    position = candidate.position(),
                    health = state.health_fraction,
                    distance = state.distance_to_target,
                    "executing behavior"
                );
                return Some(entry.kind);
            }
        }

        // Always-act fallback: the top-ranked behavior runs regardless of
        // weight or outcome. The accepted-behavior record is left untouched.
        if let Some(top) = ranking.first() {
            if let Some(candidate) = self.optimizer.candidate_mut(top.index) {
                candidate.evaluate(&state, nav, rng);
                return Some(top.kind);
            }
        }
        None
    }
}
