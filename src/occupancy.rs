//! Occupancy index and line-of-sight checks.
//!
//! Rebuilt once per tick after all entities have stepped. AI decisions and
//! movement both read the snapshot from the end of the previous tick, so a
//! mover's free-cell check never observes a partial in-tick update.

use std::collections::HashMap;

use hecs::{Entity, World};

use crate::components::{Health, Position, Role};
use crate::grid::{chebyshev_distance, Cell};

/// Cell -> entity maps, one layer per role. Dead characters are excluded at
/// rebuild time; they no longer block or get attacked.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    goodies: HashMap<Cell, Entity>,
    baddies: HashMap<Cell, Entity>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every live character by its current cell.
    pub fn rebuild_from_world(world: &World) -> Self {
        puffin::profile_function!();

        let mut index = Self::new();
        for (entity, (pos, role, health)) in world.query::<(&Position, &Role, &Health)>().iter() {
            if !health.is_alive() {
                continue;
            }
            match role {
                Role::Goodie => index.goodies.insert(pos.cell(), entity),
                Role::Baddie => index.baddies.insert(pos.cell(), entity),
            };
        }
        index
    }

    /// Entity of the goodie layer at `cell`, if any.
    pub fn goodie_entity_at(&self, cell: Cell) -> Option<Entity> {
        self.goodies.get(&cell).copied()
    }

    /// Entity of the baddie layer at `cell`, if any.
    pub fn baddie_entity_at(&self, cell: Cell) -> Option<Entity> {
        self.baddies.get(&cell).copied()
    }

    /// Whether a goodie other than `exclude` occupies `cell`.
    pub fn goodie_at(&self, cell: Cell, exclude: Option<Entity>) -> bool {
        self.goodies
            .get(&cell)
            .is_some_and(|&e| exclude.map_or(true, |ex| e != ex))
    }

    /// Whether a baddie other than `exclude` occupies `cell`.
    pub fn baddie_at(&self, cell: Cell, exclude: Option<Entity>) -> bool {
        self.baddies
            .get(&cell)
            .is_some_and(|&e| exclude.map_or(true, |ex| e != ex))
    }

    pub fn goodie_cells(&self) -> impl Iterator<Item = (Cell, Entity)> + '_ {
        self.goodies.iter().map(|(&c, &e)| (c, e))
    }
}

/// An observer sees a target cell when the Chebyshev distance between their
/// cells is within the visibility radius.
pub fn can_see(observer: Cell, target: Cell, radius: i32) -> bool {
    chebyshev_distance(observer, target) <= radius
}

/// Whether any observer cell has line of sight to the target.
pub fn is_spotted<I>(target: Cell, observers: I, radius: i32) -> bool
where
    I: IntoIterator<Item = Cell>,
{
    observers.into_iter().any(|obs| can_see(obs, target, radius))
}
