//! Terrain model: every in-bounds cell carries exactly one terrain kind.
//!
//! Explicit placements from the level spec are applied first; any cell not
//! explicitly assigned defaults to Water. Lookups are O(1) into a row-major
//! vector; callers clip candidate cells to bounds before looking them up,
//! so an out-of-range access is a programming error, not a runtime case.

use crate::grid::{cells_in_block, Bounds, Cell};

/// Closed set of terrain kinds.
///
/// `Unpassable` reads as land but blocks every character; `Goal` behaves as
/// water for passability and marks where the goodies must arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainKind {
    Water,
    Land,
    Unpassable,
    Goal,
}

impl TerrainKind {
    /// Water-like for speed selection and shark passability.
    pub fn is_water(&self) -> bool {
        matches!(self, TerrainKind::Water | TerrainKind::Goal)
    }

    pub fn is_land(&self) -> bool {
        matches!(self, TerrainKind::Land | TerrainKind::Unpassable)
    }
}

/// A rectangular terrain placement from the level spec:
/// [x_min, x_max) x [y_min, y_max) filled with one kind.
#[derive(Debug, Clone, Copy)]
pub struct TerrainBlock {
    pub kind: TerrainKind,
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

/// Dense cell -> kind map over the level bounds.
#[derive(Debug, Clone)]
pub struct TerrainMap {
    bounds: Bounds,
    kinds: Vec<TerrainKind>,
}

impl TerrainMap {
    /// Build from ordered placements, default-filling unassigned cells with
    /// Water. Later placements overwrite earlier ones. Placements are clipped
    /// to the bounds.
    pub fn build(bounds: Bounds, blocks: &[TerrainBlock]) -> Self {
        let mut kinds = vec![TerrainKind::Water; bounds.area()];
        for block in blocks {
            let x_min = block.x_min.max(0);
            let x_max = block.x_max.min(bounds.cols);
            let y_min = block.y_min.max(0);
            let y_max = block.y_max.min(bounds.rows);
            for cell in cells_in_block(x_min, x_max, y_min, y_max) {
                kinds[Self::index(bounds, cell)] = block.kind;
            }
        }
        Self { bounds, kinds }
    }

    fn index(bounds: Bounds, cell: Cell) -> usize {
        debug_assert!(bounds.contains(cell), "terrain lookup out of bounds: {cell:?}");
        (cell.y as usize) * (bounds.cols as usize) + (cell.x as usize)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Terrain kind at `cell`. `cell` must be within bounds.
    pub fn kind(&self, cell: Cell) -> TerrainKind {
        self.kinds[Self::index(self.bounds, cell)]
    }

    /// All cells of the given kind (used for goal collection and sector
    /// construction).
    pub fn cells_of_kind(&self, kind: TerrainKind) -> Vec<Cell> {
        let mut cells = Vec::new();
        for y in 0..self.bounds.rows {
            for x in 0..self.bounds.cols {
                let cell = Cell::new(x, y);
                if self.kind(cell) == kind {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}
