//! Context steering: score eight fixed directions by interest in the target minus
//! danger from the nearest obstacle and crowding peers, then blend them.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec2;

use crate::follower::Steering;
use crate::geometry::angle_toward;

/// Cardinals followed by diagonals, all unit length.
pub const DIRECTIONS: [Vec2; 8] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    Vec2::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

/// Lower bound on distances used as divisors.
const MIN_DISTANCE: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextSteering {
    /// Scale of the repulsion from obstacles and peers.
    pub force: f32,
    /// Peers closer than this push the agent away.
    pub separation_radius: f32,
    /// Within this distance of the target the agent stops.
    pub stop_distance: f32,
}

impl Default for ContextSteering {
    fn default() -> Self {
        Self {
            force: 120.0,
            separation_radius: 100.0,
            stop_distance: 75.0,
        }
    }
}

impl ContextSteering {
    /// Steer `agent` toward `target`. Only the nearest of `obstacles` contributes
    /// danger; every peer inside the separation radius does. A peer at exactly the
    /// agent's position is taken to be the agent itself and ignored.
    pub fn steer(
        &self,
        agent: Vec2,
        target: Vec2,
        obstacles: &[Vec2],
        peers: &[Vec2],
        speed: f32,
    ) -> Steering {
        let angle = angle_toward(agent, target);
        if agent.distance(target) < self.stop_distance {
            return Steering::hold(angle);
        }

        let interest = self.interest(agent, target);
        let danger = self.danger(agent, obstacles, peers);

        let desired = DIRECTIONS
            .iter()
            .zip(interest.iter().zip(danger.iter()))
            .fold(Vec2::ZERO, |acc, (dir, (i, d))| acc + *dir * (i - d));

        Steering {
            velocity: desired.normalize_or_zero() * speed,
            angle,
        }
    }

    fn interest(&self, agent: Vec2, target: Vec2) -> [f32; 8] {
        let to_target = (target - agent).normalize_or_zero();
        DIRECTIONS.map(|dir| dir.dot(to_target))
    }

    fn danger(&self, agent: Vec2, obstacles: &[Vec2], peers: &[Vec2]) -> [f32; 8] {
        let mut danger = [0.0; 8];

        let nearest = obstacles
            .iter()
            .copied()
            .min_by(|a, b| agent.distance(*a).total_cmp(&agent.distance(*b)));
        if let Some(obstacle) = nearest {
            self.accumulate(&mut danger, agent - obstacle);
        }

        for &peer in peers {
            let delta = agent - peer;
            let d = delta.length();
            if d > 0.0 && d < self.separation_radius {
                self.accumulate(&mut danger, delta);
            }
        }

        danger
    }

    /// `delta` points from the threat to the agent; moving against it is dangerous.
    fn accumulate(&self, danger: &mut [f32; 8], delta: Vec2) {
        let push = -delta.normalize_or_zero() * self.force / delta.length().max(MIN_DISTANCE);
        for (slot, dir) in danger.iter_mut().zip(DIRECTIONS.iter()) {
            *slot += dir.dot(push);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_unit() {
        for d in DIRECTIONS {
            assert!((d.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn clear_field_heads_straight_for_target() {
        let s = ContextSteering::default().steer(
            Vec2::ZERO,
            Vec2::new(300.0, 0.0),
            &[],
            &[],
            50.0,
        );
        assert!((s.velocity - Vec2::new(50.0, 0.0)).length() < 1e-3);
        assert!(s.angle.abs() < 1e-6);
    }

    #[test]
    fn stops_inside_stop_distance() {
        let s = ContextSteering::default().steer(
            Vec2::ZERO,
            Vec2::new(0.0, 50.0),
            &[Vec2::new(10.0, 0.0)],
            &[],
            50.0,
        );
        assert_eq!(s.velocity, Vec2::ZERO);
        assert!((s.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn nearby_obstacle_deflects_away() {
        let steering = ContextSteering::default();
        // Obstacle off to one side of the straight line to the target.
        let s = steering.steer(
            Vec2::ZERO,
            Vec2::new(400.0, 0.0),
            &[Vec2::new(100.0, 100.0), Vec2::new(-300.0, -300.0)],
            &[],
            50.0,
        );
        assert!(s.velocity.x > 0.0, "still progresses toward target");
        assert!(s.velocity.y < 0.0, "pushed away from the obstacle");
        assert!((s.velocity.length() - 50.0).abs() < 1e-3);
        // Facing is unaffected by avoidance.
        assert!(s.angle.abs() < 1e-6);
    }

    #[test]
    fn only_nearest_obstacle_counts() {
        let steering = ContextSteering::default();
        let near_only = steering.steer(
            Vec2::ZERO,
            Vec2::new(400.0, 0.0),
            &[Vec2::new(20.0, 20.0)],
            &[],
            50.0,
        );
        let with_far = steering.steer(
            Vec2::ZERO,
            Vec2::new(400.0, 0.0),
            &[Vec2::new(20.0, 20.0), Vec2::new(30.0, -30.0)],
            &[],
            50.0,
        );
        assert!((near_only.velocity - with_far.velocity).length() < 1e-4);
    }

    #[test]
    fn peers_separate_but_self_and_distant_are_ignored() {
        let steering = ContextSteering::default();
        let target = Vec2::new(400.0, 0.0);
        let base = steering.steer(Vec2::ZERO, target, &[], &[Vec2::ZERO], 50.0);
        assert!((base.velocity - Vec2::new(50.0, 0.0)).length() < 1e-3);

        let far = steering.steer(Vec2::ZERO, target, &[], &[Vec2::new(0.0, 500.0)], 50.0);
        assert!((far.velocity - base.velocity).length() < 1e-4);

        let crowded = steering.steer(Vec2::ZERO, target, &[], &[Vec2::new(0.0, -5.0)], 50.0);
        assert!(crowded.velocity.y > 0.0);
    }
}
