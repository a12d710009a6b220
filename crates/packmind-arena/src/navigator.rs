//! Kinematic navigator for headless arenas.
//!
//! A point-mass stand-in for a real navigation mesh: straight-line travel at
//! a fixed speed per tick inside a circular walkable area. Good enough to
//! exercise every candidate order path without an engine in the loop.

use serde::{Deserialize, Serialize};

use packmind_core::{Navigator, Point3};

/// Walkable-disc navigator driven by explicit [`step`](ArenaNavigator::step)
/// calls from the host loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaNavigator {
    position: Point3,
    target: Option<Point3>,
    destination: Option<Point3>,
    facing: Option<Point3>,
    /// Travel per tick, world units.
    speed: f32,
    stopping_distance: f32,
    /// Radius of the walkable disc around the origin.
    walkable_radius: f32,
}

impl ArenaNavigator {
    #[must_use]
    pub fn new(spawn: Point3, speed: f32, stopping_distance: f32, walkable_radius: f32) -> Self {
        Self {
            position: spawn,
            target: None,
            destination: None,
            facing: None,
            speed,
            stopping_distance,
            walkable_radius,
        }
    }

    /// Update the tracked target position (the host's player proxy).
    pub fn set_target(&mut self, target: Option<Point3>) {
        self.target = target;
    }

    /// Point most recently faced, if any.
    #[must_use]
    pub fn facing(&self) -> Option<Point3> {
        self.facing
    }

    /// Advance one tick of travel toward the active destination. The path
    /// completes (and clears) once within stopping distance.
    pub fn step(&mut self) {
        let Some(destination) = self.destination else {
            return;
        };

        let gap = self.position.distance(destination);
        if gap <= self.stopping_distance.max(self.speed) {
            self.position = destination;
            self.destination = None;
            return;
        }

        let scale = self.speed / gap;
        self.position = self.position.offset(
            (destination.x - self.position.x) * scale,
            (destination.y - self.position.y) * scale,
            (destination.z - self.position.z) * scale,
        );
    }

    fn inside_walkable(&self, point: Point3) -> bool {
        point.distance(Point3::default()) <= self.walkable_radius
    }

    /// Nearest point of the walkable disc to `probe`.
    fn clamp_to_walkable(&self, probe: Point3) -> Point3 {
        let from_origin = probe.distance(Point3::default());
        if from_origin <= self.walkable_radius {
            return probe;
        }
        let scale = self.walkable_radius / from_origin;
        Point3::new(probe.x * scale, probe.y * scale, probe.z * scale)
    }
}

impl Navigator for ArenaNavigator {
    fn position(&self) -> Point3 {
        self.position
    }

    fn target(&self) -> Option<Point3> {
        self.target
    }

    fn set_destination(&mut self, point: Point3) {
        self.destination = Some(self.clamp_to_walkable(point));
    }

    fn clear_path(&mut self) {
        self.destination = None;
    }

    fn has_path(&self) -> bool {
        self.destination.is_some()
    }

    fn remaining_distance(&self) -> f32 {
        self.destination
            .map(|destination| self.position.distance(destination))
            .unwrap_or(0.0)
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn face(&mut self, point: Point3) {
        self.facing = Some(point);
    }

    fn nearest_reachable(&self, probe: Point3, radius: f32) -> Option<Point3> {
        if self.inside_walkable(probe) {
            return Some(probe);
        }
        let clamped = self.clamp_to_walkable(probe);
        (clamped.distance(probe) <= radius).then_some(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator() -> ArenaNavigator {
        ArenaNavigator::new(Point3::default(), 1.0, 0.5, 20.0)
    }

    #[test]
    fn travels_toward_destination_and_completes() {
        let mut nav = navigator();
        nav.set_destination(Point3::new(3.0, 0.0, 0.0));
        assert!(nav.has_path());

        nav.step();
        assert!((nav.position().x - 1.0).abs() < 1e-5);
        nav.step();
        nav.step();
        assert!(!nav.has_path());
        assert_eq!(nav.position(), Point3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn destinations_outside_the_disc_are_clamped() {
        let mut nav = navigator();
        nav.set_destination(Point3::new(100.0, 0.0, 0.0));
        let destination = nav.destination.expect("clamped destination");
        assert!((destination.x - 20.0).abs() < 1e-4);
    }

    #[test]
    fn reachability_respects_the_sample_radius() {
        let nav = navigator();
        assert!(nav.nearest_reachable(Point3::new(5.0, 0.0, 0.0), 1.0).is_some());
        // 5 units past the rim, sampled with a 10-unit radius: snaps to rim.
        let snapped = nav
            .nearest_reachable(Point3::new(25.0, 0.0, 0.0), 10.0)
            .expect("within sample radius of the rim");
        assert!((snapped.x - 20.0).abs() < 1e-4);
        // 30 units past the rim is out of sampling reach.
        assert!(nav.nearest_reachable(Point3::new(50.0, 0.0, 0.0), 10.0).is_none());
    }
}
