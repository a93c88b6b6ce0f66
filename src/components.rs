//! ECS components for characters and their movement state.

use glam::Vec2;

use crate::grid::{Cell, Direction};
use crate::occupancy::OccupancyIndex;
use crate::terrain::TerrainKind;

/// Fractional position component. The occupied cell is the per-axis round.
#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn cell(&self) -> Cell {
        Cell::from_position(self.0)
    }

    /// True when the position sits exactly on a cell center.
    pub fn is_at(&self, cell: Cell) -> bool {
        self.0 == cell.as_vec2()
    }
}

/// Movement state: a goal cell plus the single-cell waypoint currently being
/// advanced toward. No goal means the entity is idle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mover {
    pub goal_cell: Option<Cell>,
    pub next_cell: Option<Cell>,
    pub next_displacement: Option<(i32, i32)>,
}

impl Mover {
    /// An entity is active iff it has not yet reached its goal.
    pub fn is_active(&self) -> bool {
        self.goal_cell.is_some()
    }

    /// Request movement to `target`. If the entity was idle the waypoint is
    /// initialized to the current cell and recomputed on the next tick. A
    /// goal issued mid-travel overwrites the previous one immediately.
    pub fn move_to(&mut self, current: Cell, target: Cell) {
        if self.goal_cell.is_none() {
            self.next_cell = Some(current);
            self.next_displacement = None;
        }
        self.goal_cell = Some(target);
    }

    /// Back to idle: goal reached (or explicitly cancelled).
    pub fn clear(&mut self) {
        self.goal_cell = None;
        self.next_cell = None;
        self.next_displacement = None;
    }
}

/// Per-entity terrain speeds in cells per second.
#[derive(Debug, Clone, Copy)]
pub struct Speed {
    pub water: f32,
    pub land: f32,
}

impl Speed {
    /// Speed for the terrain under the entity's current cell.
    pub fn on(&self, terrain: TerrainKind) -> f32 {
        if terrain.is_land() {
            self.land
        } else {
            self.water
        }
    }
}

/// Health component. Damage only ever decreases it, clamped at zero; a
/// character at zero is dead and no longer interacts.
#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn take_damage(&mut self, damage: f32) {
        self.current = (self.current - damage).max(0.0);
    }
}

/// Character role. The two roles are disjoint: pursued entities (including
/// the player-controlled hero) and pursuers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Goodie,
    Baddie,
}

impl Role {
    /// Role-specific passability predicate, evaluated against terrain and the
    /// pre-tick occupancy snapshot.
    ///
    /// A goodie is blocked by unpassable terrain and by other live goodies.
    /// A baddie is blocked by land terrain, by its own recently-visited
    /// cells, and by other baddies.
    pub fn is_free_cell(
        &self,
        cell: Cell,
        terrain: TerrainKind,
        occupancy: &OccupancyIndex,
        mover: hecs::Entity,
        history: Option<&RecentCells>,
    ) -> bool {
        match self {
            Role::Goodie => {
                if terrain == TerrainKind::Unpassable {
                    return false;
                }
                !occupancy.goodie_at(cell, Some(mover))
            }
            Role::Baddie => {
                if terrain.is_land() {
                    return false;
                }
                if history.is_some_and(|h| h.contains(cell)) {
                    return false;
                }
                !occupancy.baddie_at(cell, Some(mover))
            }
        }
    }
}

/// Marker for the player-controlled goodie.
#[derive(Debug, Clone, Copy)]
pub struct Hero;

/// Pursuer data: contact damage per second.
#[derive(Debug, Clone, Copy)]
pub struct Shark {
    pub damage_rate: f32,
}

/// Fixed-capacity ring buffer of the most recently visited cells, oldest
/// evicted first. The contains/push semantics are load-bearing for the
/// anti-oscillation behavior of shark pathing.
#[derive(Debug, Clone)]
pub struct RecentCells {
    cells: Vec<Cell>,
    capacity: usize,
    head: usize,
}

impl RecentCells {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be non-zero");
        Self {
            cells: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Record a newly entered cell, evicting the oldest entry once full.
    pub fn push(&mut self, cell: Cell) {
        if self.cells.len() < self.capacity {
            self.cells.push(cell);
        } else {
            self.cells[self.head] = cell;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Animation-facing tag describing what the character is doing. Exposed to
/// the render sink; the core never draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Stand,
    TreadWater,
    Walk,
    Swim,
    Attack,
    Attacked,
    Die,
}

/// Render-sink facing, updated from the last chosen displacement.
#[derive(Debug, Clone, Copy)]
pub struct Facing(pub Direction);

impl Default for Facing {
    fn default() -> Self {
        Facing(Direction::South)
    }
}
