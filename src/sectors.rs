//! Coarse patrol sectors.
//!
//! The grid is partitioned into spacing x spacing blocks; every water cell
//! belongs to exactly one sector (land-only blocks produce no sector). Each
//! shark owns its own table and bumps a sector's visit count when its current
//! cell newly enters that sector, biasing patrol toward the least-covered
//! parts of the map.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::Cell;
use crate::terrain::TerrainMap;

/// One coarse block: its water cells and how often the owner has entered it.
#[derive(Debug, Clone)]
pub struct Sector {
    cells: Vec<Cell>,
    visits: u32,
}

impl Sector {
    pub fn visits(&self) -> u32 {
        self.visits
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// Sector partition of a level's water cells. Built once at level load;
/// cloned per shark so coverage counts are tracked per owner.
#[derive(Debug, Clone)]
pub struct SectorTable {
    sectors: Vec<Sector>,
    /// water cell -> index into `sectors`
    membership: HashMap<Cell, usize>,
}

impl SectorTable {
    /// Group every water cell by integer-divided row/col at the given
    /// spacing. Blocks without water cells are dropped.
    pub fn build(terrain: &TerrainMap, spacing: i32) -> Self {
        assert!(spacing > 0, "sector spacing must be positive");

        let mut by_block: HashMap<(i32, i32), Vec<Cell>> = HashMap::new();
        for y in 0..terrain.bounds().rows {
            for x in 0..terrain.bounds().cols {
                let cell = Cell::new(x, y);
                if terrain.kind(cell).is_water() {
                    by_block
                        .entry((cell.x / spacing, cell.y / spacing))
                        .or_default()
                        .push(cell);
                }
            }
        }

        // Stable sector numbering regardless of HashMap iteration order.
        let mut blocks: Vec<_> = by_block.into_iter().collect();
        blocks.sort_by_key(|(key, _)| *key);

        let mut sectors = Vec::with_capacity(blocks.len());
        let mut membership = HashMap::new();
        for (_, cells) in blocks {
            let idx = sectors.len();
            for &cell in &cells {
                membership.insert(cell, idx);
            }
            sectors.push(Sector { cells, visits: 0 });
        }
        Self { sectors, membership }
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn sector(&self, idx: usize) -> &Sector {
        &self.sectors[idx]
    }

    /// The sector a water cell belongs to. None for land cells.
    pub fn sector_of(&self, cell: Cell) -> Option<usize> {
        self.membership.get(&cell).copied()
    }

    /// Record a cell change. The visit count increments exactly when the new
    /// cell's sector differs from the old cell's.
    pub fn record_entry(&mut self, old: Option<Cell>, new: Cell) {
        let Some(new_idx) = self.sector_of(new) else {
            return;
        };
        if old.and_then(|c| self.sector_of(c)) == Some(new_idx) {
            return;
        }
        self.sectors[new_idx].visits += 1;
    }

    /// Sector indices ascending by visit count, ties broken randomly.
    pub fn least_visited_order(&self, rng: &mut impl Rng) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.sectors.len()).collect();
        // Shuffle first so the stable sort randomizes equal counts.
        order.shuffle(rng);
        order.sort_by_key(|&idx| self.sectors[idx].visits);
        order
    }

    /// A pseudo-random water cell belonging to the sector.
    pub fn random_cell(&self, idx: usize, rng: &mut impl Rng) -> Cell {
        let cells = &self.sectors[idx].cells;
        cells[rng.gen_range(0..cells.len())]
    }
}
