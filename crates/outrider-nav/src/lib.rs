//! Navigation core: occupancy grid, A* planning, path following, context steering
//! and line-of-sight sampling. Nothing in this crate knows about the ECS.

pub mod astar;
pub mod follower;
pub mod geometry;
pub mod grid;
pub mod los;
pub mod steering;

pub use astar::{PathPlanner, SearchScratch};
pub use follower::{PathFollower, Steering};
pub use geometry::Aabb;
pub use grid::{CellCoord, GridError, GridNode, SpatialGrid};
pub use steering::ContextSteering;
