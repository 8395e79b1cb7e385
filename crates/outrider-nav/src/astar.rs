//! A* over a [`SpatialGrid`] with wall clearance and adjacent-to-goal termination.
//!
//! Cost state lives in a [`SearchScratch`] owned by the planner, never in the grid.
//! The scratch is reset after every search whether or not a path was found.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::grid::{CellCoord, SpatialGrid};

/// g-cost of a cell the current search has not reached.
pub const UNVISITED_COST: f32 = 1e9;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScratchCell {
    g: f32,
    h: f32,
    parent: Option<usize>,
}

impl ScratchCell {
    const RESET: Self = Self {
        g: UNVISITED_COST,
        h: 0.0,
        parent: None,
    };
}

/// Per-search cost table keyed by linear cell index.
#[derive(Debug, Clone, Default)]
pub struct SearchScratch {
    cells: Vec<ScratchCell>,
}

impl SearchScratch {
    fn prepare(&mut self, len: usize) {
        if self.cells.len() != len {
            self.cells = vec![ScratchCell::RESET; len];
        }
    }

    fn reset(&mut self) {
        self.cells.fill(ScratchCell::RESET);
    }

    /// True when no cell carries cost or parent state from a previous search.
    pub fn is_reset(&self) -> bool {
        self.cells.iter().all(|c| *c == ScratchCell::RESET)
    }

    pub fn g_cost(&self, index: usize) -> Option<f32> {
        self.cells.get(index).map(|c| c.g)
    }
}

/// Open-list entry. Ordered so that `BinaryHeap` pops the lowest f first and
/// breaks ties by push order.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f32,
    g: f32,
    seq: u64,
    index: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Grid A* planner.
///
/// Every step costs 1.0 by default, diagonals included, which yields paths
/// with more diagonal zig-zag than a true shortest path. Use
/// [`PathPlanner::with_diagonal_cost`] with `SQRT_2` for Euclidean-shortest paths.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    diagonal_cost: f32,
    scratch: SearchScratch,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PathPlanner {
    pub fn new() -> Self {
        Self::with_diagonal_cost(1.0)
    }

    pub fn with_diagonal_cost(diagonal_cost: f32) -> Self {
        Self {
            diagonal_cost,
            scratch: SearchScratch::default(),
        }
    }

    pub fn diagonal_cost(&self) -> f32 {
        self.diagonal_cost
    }

    pub fn scratch(&self) -> &SearchScratch {
        &self.scratch
    }

    /// Plan from `start` toward `goal`.
    ///
    /// The result excludes `start` and stops at the first expanded cell within one
    /// step of `goal`. An empty result means "hold position": either no route
    /// exists or the agent is already next to the goal.
    pub fn find_path(
        &mut self,
        grid: &SpatialGrid,
        start: CellCoord,
        goal: CellCoord,
    ) -> Vec<CellCoord> {
        let (Some(start_idx), Some(_)) = (grid.index(start), grid.index(goal)) else {
            return Vec::new();
        };

        self.scratch.prepare(grid.len());
        let path = self.search(grid, start_idx, goal);
        self.scratch.reset();

        trace!(?start, ?goal, len = path.len(), "path planned");
        path
    }

    fn search(&mut self, grid: &SpatialGrid, start_idx: usize, goal: CellCoord) -> Vec<CellCoord> {
        let cells = &mut self.scratch.cells;
        let mut open = BinaryHeap::new();
        let mut seq = 0u64;

        let start = grid.coord_of(start_idx);
        cells[start_idx].g = 0.0;
        cells[start_idx].h = heuristic(start, goal);
        open.push(OpenEntry {
            f: cells[start_idx].h,
            g: 0.0,
            seq,
            index: start_idx,
        });

        while let Some(entry) = open.pop() {
            let current = entry.index;
            // Stale entry superseded by a cheaper push.
            if entry.g > cells[current].g {
                continue;
            }

            let coord = grid.coord_of(current);
            if coord.steps_to(goal) <= 1 {
                return reconstruct(grid, cells, current);
            }

            for next in grid.neighbors(coord) {
                if !has_clearance(grid, next, goal) {
                    continue;
                }
                let Some(next_idx) = grid.index(next) else {
                    continue;
                };
                let step = if next.col != coord.col && next.row != coord.row {
                    self.diagonal_cost
                } else {
                    1.0
                };
                let tentative = cells[current].g + step;
                if tentative < cells[next_idx].g {
                    let h = heuristic(next, goal);
                    cells[next_idx] = ScratchCell {
                        g: tentative,
                        h,
                        parent: Some(current),
                    };
                    seq += 1;
                    open.push(OpenEntry {
                        f: tentative + h,
                        g: tentative,
                        seq,
                        index: next_idx,
                    });
                }
            }
        }

        Vec::new()
    }
}

/// Straight-line distance in cell units.
fn heuristic(from: CellCoord, to: CellCoord) -> f32 {
    let dc = from.col as f32 - to.col as f32;
    let dr = from.row as f32 - to.row as f32;
    (dc * dc + dr * dr).sqrt()
}

/// A cell is enterable when it and all of its neighbours are walkable. A blocked
/// neighbour is tolerated only when it is the goal itself.
fn has_clearance(grid: &SpatialGrid, cell: CellCoord, goal: CellCoord) -> bool {
    grid.is_walkable(cell)
        && grid
            .neighbors(cell)
            .all(|n| n == goal || grid.is_walkable(n))
}

fn reconstruct(grid: &SpatialGrid, cells: &[ScratchCell], end: usize) -> Vec<CellCoord> {
    let mut path = Vec::new();
    let mut cursor = Some(end);
    while let Some(idx) = cursor {
        path.push(grid.coord_of(idx));
        cursor = cells[idx].parent;
    }
    path.reverse();
    // First cell is where the agent already stands.
    path.remove(0);
    path
}
