//! Per-agent path cache: periodic replanning and waypoint-by-waypoint steering.

use std::collections::VecDeque;

use glam::Vec2;
use tracing::trace;

use crate::astar::PathPlanner;
use crate::geometry::angle_toward;
use crate::grid::{CellCoord, SpatialGrid};

/// A waypoint closer than this (world units) counts as reached.
pub const WAYPOINT_REACHED: f32 = 2.0;

/// Default minimum interval between replans, in milliseconds.
pub const DEFAULT_REFRESH_MS: f32 = 1000.0;

/// Desired motion for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub velocity: Vec2,
    /// Facing angle in radians.
    pub angle: f32,
}

impl Steering {
    /// Stand still, facing `angle`.
    pub fn hold(angle: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            angle,
        }
    }
}

/// Cached path of grid cells plus the countdown to the next replan.
#[derive(Debug, Clone)]
pub struct PathFollower {
    path: VecDeque<CellCoord>,
    refresh_ms: f32,
    max_refresh_ms: f32,
}

impl Default for PathFollower {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_MS)
    }
}

impl PathFollower {
    /// The first [`tick`](Self::tick) always plans.
    pub fn new(max_refresh_ms: f32) -> Self {
        Self {
            path: VecDeque::new(),
            refresh_ms: 0.0,
            max_refresh_ms,
        }
    }

    pub fn path(&self) -> &VecDeque<CellCoord> {
        &self.path
    }

    pub fn refresh_ms(&self) -> f32 {
        self.refresh_ms
    }

    pub fn max_refresh_ms(&self) -> f32 {
        self.max_refresh_ms
    }

    /// Drop the cached path and force a replan on the next tick.
    pub fn invalidate(&mut self) {
        self.path.clear();
        self.refresh_ms = 0.0;
    }

    /// Replace the cached path without touching the refresh countdown.
    pub fn set_path(&mut self, path: impl IntoIterator<Item = CellCoord>) {
        self.path = path.into_iter().collect();
    }

    /// Advance the replan countdown and steer along the cached path.
    pub fn tick(
        &mut self,
        planner: &mut PathPlanner,
        grid: &SpatialGrid,
        agent: Vec2,
        target: Vec2,
        speed: f32,
        elapsed_ms: f32,
    ) -> Steering {
        self.refresh_ms -= elapsed_ms;
        if self.refresh_ms <= 0.0 {
            let start = grid.map_to_cell(agent);
            let goal = grid.map_to_cell(target);
            self.path = planner.find_path(grid, start, goal).into();
            self.refresh_ms = self.max_refresh_ms;
            trace!(?start, ?goal, waypoints = self.path.len(), "replanned");
        }
        self.steer(grid, agent, target, speed)
    }

    /// Pop a reached waypoint, then head for the next one. Facing always tracks
    /// `target`, not the waypoint.
    pub fn steer(&mut self, grid: &SpatialGrid, agent: Vec2, target: Vec2, speed: f32) -> Steering {
        let angle = angle_toward(agent, target);

        if let Some(front) = self.front_position(grid) {
            if agent.distance(front) < WAYPOINT_REACHED {
                self.path.pop_front();
            }
        }

        match self.front_position(grid) {
            Some(waypoint) => Steering {
                velocity: (waypoint - agent).normalize_or_zero() * speed,
                angle,
            },
            None => Steering::hold(angle),
        }
    }

    fn front_position(&mut self, grid: &SpatialGrid) -> Option<Vec2> {
        let front = *self.path.front()?;
        match grid.node(front) {
            Some(node) => Some(node.position),
            None => {
                // Path belongs to a grid that has since been replaced.
                self.path.clear();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid() -> SpatialGrid {
        SpatialGrid::new(10, 6, Vec2::splat(50.0)).unwrap()
    }

    #[test]
    fn first_tick_plans_and_resets_countdown() {
        let grid = open_grid();
        let mut planner = PathPlanner::new();
        let mut f = PathFollower::default();
        let s = f.tick(
            &mut planner,
            &grid,
            Vec2::new(25.0, 175.0),
            Vec2::new(475.0, 175.0),
            50.0,
            16.0,
        );
        assert_eq!(f.refresh_ms(), DEFAULT_REFRESH_MS);
        assert_eq!(f.path().len(), 8);
        assert!(s.velocity.x > 0.0);
        assert!(s.velocity.y.abs() < 1e-4);
        assert!((s.velocity.length() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn replans_at_most_once_per_interval() {
        let grid = open_grid();
        let mut planner = PathPlanner::new();
        let mut f = PathFollower::new(1000.0);
        let agent = Vec2::new(25.0, 175.0);
        f.tick(&mut planner, &grid, agent, Vec2::new(475.0, 175.0), 50.0, 16.0);
        f.set_path(std::iter::empty());
        // Still inside the window, so the emptied path stays empty.
        let s = f.tick(&mut planner, &grid, agent, Vec2::new(475.0, 175.0), 50.0, 500.0);
        assert!(f.path().is_empty());
        assert_eq!(s.velocity, Vec2::ZERO);
        assert_eq!(f.refresh_ms(), 500.0);
        f.tick(&mut planner, &grid, agent, Vec2::new(475.0, 175.0), 50.0, 500.0);
        assert!(!f.path().is_empty());
        assert_eq!(f.refresh_ms(), 1000.0);
    }

    #[test]
    fn invalidate_forces_immediate_replan() {
        let grid = open_grid();
        let mut planner = PathPlanner::new();
        let mut f = PathFollower::default();
        let target = Vec2::new(475.0, 175.0);
        f.tick(&mut planner, &grid, Vec2::new(25.0, 175.0), target, 50.0, 16.0);
        f.invalidate();
        assert!(f.path().is_empty());
        f.tick(&mut planner, &grid, Vec2::new(225.0, 25.0), target, 50.0, 16.0);
        assert_eq!(f.path().front(), Some(&CellCoord::new(5, 1)));
    }

    #[test]
    fn waypoints_pop_as_agent_arrives() {
        let grid = open_grid();
        let mut f = PathFollower::default();
        f.set_path((1..=4).map(|c| CellCoord::new(c, 0)));
        let target = Vec2::new(275.0, 25.0);
        let mut agent = Vec2::new(25.0, 25.0);
        let mut last_len = f.path().len();

        for _ in 0..400 {
            let front = f.path().front().and_then(|&c| grid.node(c)).map(|n| n.position);
            let s = f.steer(&grid, agent, target, 1.0);
            if f.path().len() < last_len {
                assert!(agent.distance(front.unwrap()) < WAYPOINT_REACHED);
                last_len = f.path().len();
            }
            if let Some(&c) = f.path().front() {
                let wp = grid.node(c).unwrap().position;
                let expected = (wp - agent).normalize();
                assert!((s.velocity.normalize() - expected).length() < 1e-4);
            }
            agent += s.velocity;
        }
        assert!(f.path().is_empty());
        assert_eq!(f.steer(&grid, agent, target, 1.0).velocity, Vec2::ZERO);
    }

    #[test]
    fn facing_tracks_target_not_waypoint() {
        let grid = open_grid();
        let mut f = PathFollower::default();
        f.set_path([CellCoord::new(1, 0)]);
        let s = f.steer(&grid, Vec2::new(25.0, 25.0), Vec2::new(25.0, 275.0), 10.0);
        assert!(s.velocity.x > 0.0);
        assert!((s.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn stale_grid_path_is_dropped() {
        let small = SpatialGrid::new(2, 2, Vec2::splat(50.0)).unwrap();
        let mut f = PathFollower::default();
        f.set_path([CellCoord::new(8, 5)]);
        let s = f.steer(&small, Vec2::ZERO, Vec2::new(10.0, 0.0), 5.0);
        assert_eq!(s.velocity, Vec2::ZERO);
        assert!(f.path().is_empty());
    }
}
