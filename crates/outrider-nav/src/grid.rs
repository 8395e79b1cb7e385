//! Occupancy grid covering one room: a flat arena of cells addressed by `(col, row)`.

use glam::Vec2;
use thiserror::Error;

/// Layout glyph for a blocked cell.
pub const WALL_GLYPH: char = '#';
/// Layout glyph for a walkable cell.
pub const FLOOR_GLYPH: char = '.';

/// Upper clamp of the normalized coordinate in [`SpatialGrid::map_to_cell`].
const EDGE_CLAMP: f32 = 0.99;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid must have at least one column and one row, got {cols}x{rows}")]
    EmptyGrid { cols: usize, rows: usize },
    #[error("cell size must be positive, got {0}x{1}")]
    BadCellSize(f32, f32),
    #[error("layout row {row} has {len} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("unknown layout glyph {glyph:?} at ({col}, {row})")]
    UnknownGlyph { glyph: char, col: usize, row: usize },
    #[error("cell ({col}, {row}) is outside a {cols}x{rows} grid")]
    OutOfRange {
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
    },
}

/// Integer cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub col: usize,
    pub row: usize,
}

impl CellCoord {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Chebyshev distance: 0 for the same cell, 1 for any of the 8 neighbours.
    pub fn steps_to(self, other: CellCoord) -> usize {
        self.col.abs_diff(other.col).max(self.row.abs_diff(other.row))
    }
}

/// Persistent data of one cell. Search scratch lives in [`crate::SearchScratch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridNode {
    /// World-space center of the cell.
    pub position: Vec2,
    pub coord: CellCoord,
    pub size: Vec2,
    pub not_walkable: bool,
}

/// A `cols x rows` grid of equally sized cells starting at the world origin.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cols: usize,
    rows: usize,
    cell_size: Vec2,
    nodes: Vec<GridNode>,
}

impl SpatialGrid {
    /// All-walkable grid.
    pub fn new(cols: usize, rows: usize, cell_size: Vec2) -> Result<Self, GridError> {
        if cols == 0 || rows == 0 {
            return Err(GridError::EmptyGrid { cols, rows });
        }
        if !(cell_size.x > 0.0 && cell_size.y > 0.0) {
            return Err(GridError::BadCellSize(cell_size.x, cell_size.y));
        }

        let mut nodes = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let position = Vec2::new(
                    col as f32 * cell_size.x + cell_size.x / 2.0,
                    row as f32 * cell_size.y + cell_size.y / 2.0,
                );
                nodes.push(GridNode {
                    position,
                    coord: CellCoord::new(col, row),
                    size: cell_size,
                    not_walkable: false,
                });
            }
        }

        Ok(Self {
            cols,
            rows,
            cell_size,
            nodes,
        })
    }

    /// Build a grid from text rows, `#` for walls and `.` for floor. Row 0 is the first line.
    pub fn from_layout<S: AsRef<str>>(lines: &[S], cell_size: Vec2) -> Result<Self, GridError> {
        let rows = lines.len();
        let cols = lines.first().map(|l| l.as_ref().chars().count()).unwrap_or(0);
        let mut grid = Self::new(cols, rows, cell_size)?;

        for (row, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let len = line.chars().count();
            if len != cols {
                return Err(GridError::RaggedRow {
                    row,
                    len,
                    expected: cols,
                });
            }
            for (col, glyph) in line.chars().enumerate() {
                match glyph {
                    WALL_GLYPH => grid.set_blocked(CellCoord::new(col, row))?,
                    FLOOR_GLYPH => {}
                    other => {
                        return Err(GridError::UnknownGlyph {
                            glyph: other,
                            col,
                            row,
                        })
                    }
                }
            }
        }

        Ok(grid)
    }

    /// Mark a cell as occupied by a wall. Only meant for room generation.
    pub fn set_blocked(&mut self, coord: CellCoord) -> Result<(), GridError> {
        let idx = self.index_checked(coord)?;
        self.nodes[idx].not_walkable = true;
        Ok(())
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Map size in world units.
    pub fn dimensions(&self) -> Vec2 {
        Vec2::new(
            self.cols as f32 * self.cell_size.x,
            self.rows as f32 * self.cell_size.y,
        )
    }

    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    /// Cell containing `world`. Positions outside the map snap to the nearest edge cell.
    pub fn map_to_cell(&self, world: Vec2) -> CellCoord {
        let dims = self.dimensions();
        let fx = (world.x / dims.x).clamp(0.0, EDGE_CLAMP);
        let fy = (world.y / dims.y).clamp(0.0, EDGE_CLAMP);
        // NaN survives clamp; `as usize` saturates it to 0.
        let col = ((fx * self.cols as f32).floor() as usize).min(self.cols - 1);
        let row = ((fy * self.rows as f32).floor() as usize).min(self.rows - 1);
        CellCoord::new(col, row)
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.col < self.cols && coord.row < self.rows
    }

    /// Linear index of an in-bounds coordinate.
    pub fn index(&self, coord: CellCoord) -> Option<usize> {
        self.contains(coord).then(|| coord.row * self.cols + coord.col)
    }

    pub fn coord_of(&self, index: usize) -> CellCoord {
        CellCoord::new(index % self.cols, index / self.cols)
    }

    pub fn node(&self, coord: CellCoord) -> Option<&GridNode> {
        self.index(coord).map(|i| &self.nodes[i])
    }

    /// Out-of-range cells count as blocked.
    pub fn is_walkable(&self, coord: CellCoord) -> bool {
        self.node(coord).map(|n| !n.not_walkable).unwrap_or(false)
    }

    /// In-bounds 8-neighbourhood of `coord`: cardinals first, then diagonals.
    pub fn neighbors(&self, coord: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        const OFFSETS: [(isize, isize); 8] = [
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ];
        OFFSETS.iter().filter_map(move |&(dc, dr)| {
            let col = coord.col.checked_add_signed(dc)?;
            let row = coord.row.checked_add_signed(dr)?;
            let next = CellCoord::new(col, row);
            self.contains(next).then_some(next)
        })
    }

    /// Blocked cells that border walkable space or sit on the room edge.
    ///
    /// Collision code only needs to test these.
    pub fn exposed_cells(&self) -> Vec<CellCoord> {
        self.nodes
            .iter()
            .filter(|n| n.not_walkable)
            .map(|n| n.coord)
            .filter(|&c| {
                let on_edge =
                    c.col == 0 || c.row == 0 || c.col == self.cols - 1 || c.row == self.rows - 1;
                on_edge
                    || self
                        .neighbors(c)
                        .take(4)
                        .any(|n| self.is_walkable(n))
            })
            .collect()
    }

    fn index_checked(&self, coord: CellCoord) -> Result<usize, GridError> {
        self.index(coord).ok_or(GridError::OutOfRange {
            col: coord.col,
            row: coord.row,
            cols: self.cols,
            rows: self.rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_10x6() -> SpatialGrid {
        SpatialGrid::new(10, 6, Vec2::splat(50.0)).unwrap()
    }

    #[test]
    fn node_centers() {
        let g = grid_10x6();
        assert_eq!(g.dimensions(), Vec2::new(500.0, 300.0));
        let n = g.node(CellCoord::new(2, 1)).unwrap();
        assert_eq!(n.position, Vec2::new(125.0, 75.0));
        assert_eq!(n.size, Vec2::splat(50.0));
        assert!(!n.not_walkable);
    }

    #[test]
    fn map_to_cell_interior() {
        let g = grid_10x6();
        assert_eq!(g.map_to_cell(Vec2::new(125.0, 75.0)), CellCoord::new(2, 1));
        assert_eq!(g.map_to_cell(Vec2::new(0.0, 0.0)), CellCoord::new(0, 0));
    }

    #[test]
    fn map_to_cell_clamps_far_edge_and_outside() {
        let g = grid_10x6();
        assert_eq!(g.map_to_cell(Vec2::new(500.0, 300.0)), CellCoord::new(9, 5));
        assert_eq!(g.map_to_cell(Vec2::new(9000.0, -40.0)), CellCoord::new(9, 0));
        assert_eq!(g.map_to_cell(Vec2::new(-1.0, 1e9)), CellCoord::new(0, 5));
        assert_eq!(g.map_to_cell(Vec2::new(f32::NAN, 10.0)), CellCoord::new(0, 0));
    }

    #[test]
    fn neighbors_respect_bounds() {
        let g = grid_10x6();
        assert_eq!(g.neighbors(CellCoord::new(0, 0)).count(), 3);
        assert_eq!(g.neighbors(CellCoord::new(9, 2)).count(), 5);
        assert_eq!(g.neighbors(CellCoord::new(4, 3)).count(), 8);
    }

    #[test]
    fn from_layout_marks_walls() {
        let g = SpatialGrid::from_layout(&["#..", ".#."], Vec2::splat(10.0)).unwrap();
        assert_eq!(g.cols(), 3);
        assert_eq!(g.rows(), 2);
        assert!(!g.is_walkable(CellCoord::new(0, 0)));
        assert!(g.is_walkable(CellCoord::new(1, 0)));
        assert!(!g.is_walkable(CellCoord::new(1, 1)));
        assert!(!g.is_walkable(CellCoord::new(7, 7)), "out of range is blocked");
    }

    #[test]
    fn from_layout_errors() {
        let ragged = SpatialGrid::from_layout(&["...", ".."], Vec2::splat(10.0));
        assert_eq!(
            ragged.unwrap_err(),
            GridError::RaggedRow {
                row: 1,
                len: 2,
                expected: 3
            }
        );
        let glyph = SpatialGrid::from_layout(&[".x."], Vec2::splat(10.0));
        assert!(matches!(
            glyph,
            Err(GridError::UnknownGlyph { glyph: 'x', .. })
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(
            SpatialGrid::from_layout(&empty, Vec2::splat(10.0)),
            Err(GridError::EmptyGrid { .. })
        ));
        assert!(SpatialGrid::new(2, 2, Vec2::new(0.0, 5.0)).is_err());
    }

    #[test]
    fn set_blocked_out_of_range() {
        let mut g = grid_10x6();
        assert!(g.set_blocked(CellCoord::new(10, 0)).is_err());
    }

    #[test]
    fn exposed_cells_skip_buried_walls() {
        let g = SpatialGrid::from_layout(
            &["#####", "#####", "###..", "###..", "#####"],
            Vec2::splat(10.0),
        )
        .unwrap();
        let exposed = g.exposed_cells();
        // (1,1) is surrounded by walls and not on the edge.
        assert!(!exposed.contains(&CellCoord::new(1, 1)));
        // (2,2) touches floor at (3,2).
        assert!(exposed.contains(&CellCoord::new(2, 2)));
        assert!(exposed.contains(&CellCoord::new(0, 0)));
        assert!(exposed.iter().all(|&c| !g.is_walkable(c)));
    }

    #[test]
    fn steps_to_is_chebyshev() {
        let a = CellCoord::new(3, 3);
        assert_eq!(a.steps_to(a), 0);
        assert_eq!(a.steps_to(CellCoord::new(4, 4)), 1);
        assert_eq!(a.steps_to(CellCoord::new(5, 2)), 2);
    }
}
