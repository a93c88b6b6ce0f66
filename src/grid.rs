//! Cell arithmetic, neighborhoods, and bounds clipping.
//!
//! Everything in the simulation is keyed by [`Cell`]. Fractional positions
//! belong to entities; a position maps back to its cell by per-axis rounding.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Integer grid coordinate. Immutable value type, hashable, used as the
/// terrain and occupancy key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell a fractional position resolves to (per-axis round).
    pub fn from_position(pos: Vec2) -> Self {
        Self {
            x: pos.x.round() as i32,
            y: pos.y.round() as i32,
        }
    }

    /// Cell displaced by (dx, dy).
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

/// Level extent in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub cols: i32,
    pub rows: i32,
}

impl Bounds {
    pub fn new(cols: i32, rows: i32) -> Self {
        Self { cols, rows }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.cols && cell.y < self.rows
    }

    /// Number of cells in the level.
    pub fn area(&self) -> usize {
        (self.cols as usize) * (self.rows as usize)
    }
}

/// All integer cells in the half-open rectangle [x_min, x_max) x [y_min, y_max).
/// Used by the terrain fill and sector construction.
pub fn cells_in_block(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(
        ((x_max - x_min).max(0) as usize) * ((y_max - y_min).max(0) as usize),
    );
    for y in y_min..y_max {
        for x in x_min..x_max {
            cells.push(Cell::new(x, y));
        }
    }
    cells
}

/// All cells within `thickness` of a footprint of `shape` (cols, rows)
/// anchored at `cell`, clipped to `bounds`.
///
/// This is the local neighborhood an entity needs to decide its next step;
/// fetching it up front keeps collision/terrain lookups from scanning the
/// whole grid.
pub fn surrounding_cells(cell: Cell, shape: (i32, i32), bounds: Bounds, thickness: i32) -> Vec<Cell> {
    let (cols, rows) = shape;
    let x_min = (cell.x - thickness).max(0);
    let x_max = (cell.x + cols + thickness).min(bounds.cols);
    let y_min = (cell.y - thickness).max(0);
    let y_max = (cell.y + rows + thickness).min(bounds.rows);
    cells_in_block(x_min, x_max, y_min, y_max)
}

/// Reduce a displacement component to -1, 0, or 1.
pub fn sign_or_zero(n: i32) -> i32 {
    n.signum()
}

/// Chebyshev distance: max(|dx|, |dy|). The sight metric.
pub fn chebyshev_distance(a: Cell, b: Cell) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// 8-way facing for the render sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// Facing for a unit displacement. (0, 0) keeps no meaningful facing and
    /// returns None.
    pub fn from_displacement(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, 1) => Some(Direction::North),
            (1, 1) => Some(Direction::NorthEast),
            (1, 0) => Some(Direction::East),
            (1, -1) => Some(Direction::SouthEast),
            (0, -1) => Some(Direction::South),
            (-1, -1) => Some(Direction::SouthWest),
            (-1, 0) => Some(Direction::West),
            (-1, 1) => Some(Direction::NorthWest),
            _ => None,
        }
    }
}
