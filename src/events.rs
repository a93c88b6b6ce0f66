//! Game event system and the replayable move log.
//!
//! Systems emit events, the embedder consumes them. The move log is the only
//! persisted artifact: an append-only sequence of externally-issued move
//! requests that can be fed back through the simulation to reproduce a run.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::grid::Cell;
use crate::systems::ai::AiState;

/// Events systems can emit and subscribe to.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// A move intent was accepted for an entity (player click or AI decision)
    MoveRequested {
        entity: Entity,
        target: Cell,
        timestamp: f32,
    },
    /// An entity's current cell changed during stepping
    CellChanged {
        entity: Entity,
        from: Cell,
        to: Cell,
    },
    /// A shark made contact with a goodie
    ContactDamage {
        attacker: Entity,
        target: Entity,
        damage: f32,
    },
    /// A character's health reached zero
    CharacterDied { entity: Entity },
    /// A shark switched between patrolling and chasing
    AiStateChanged { entity: Entity, new_state: AiState },
    /// The level finished
    LevelOver { won: bool, elapsed: f32 },
}

/// Simple event queue - events are pushed during the tick, drained by the
/// embedder afterwards.
#[derive(Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// One logged move request: which entity (by stable roster index), when, and
/// where to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub entity_index: usize,
    pub timestamp: f32,
    pub x: i32,
    pub y: i32,
}

impl MoveRecord {
    pub fn target(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// Append-only, ordered log of move requests. Replaying it against a freshly
/// built level reproduces the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveLog {
    pub records: Vec<MoveRecord>,
}

impl MoveLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entity_index: usize, timestamp: f32, target: Cell) {
        self.records.push(MoveRecord {
            entity_index,
            timestamp,
            x: target.x,
            y: target.y,
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
