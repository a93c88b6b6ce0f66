//! Top-level simulation loop.
//!
//! Owns the built level, the end-of-tick occupancy snapshot, the RNG, the
//! event queue and the move log. Single-threaded: the tick boundary is the
//! only synchronization point, and the hot path does no I/O. All externally
//! initiated moves, player clicks and shark decisions alike, enter through
//! `update` so the move log captures everything needed to replay a run.

use glam::Vec2;
use hecs::Entity;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

use crate::components::{ActionState, Facing, Health, Mover, Position, Role};
use crate::constants::VISIBILITY_RADIUS;
use crate::events::{EventQueue, GameEvent, MoveLog};
use crate::grid::{Cell, Direction};
use crate::level::{Level, LevelError, LevelSpec};
use crate::occupancy::{is_spotted, OccupancyIndex};
use crate::systems::ai::{update_sharks, SharkBrain};
use crate::systems::combat::resolve_contacts;
use crate::systems::movement::step_movers;

/// Outcome of a tick. `Won` and `Lost` are sticky: once returned, every
/// further call returns the same value without advancing the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Running,
    Won,
    Lost,
}

/// What the render sink gets to see each tick.
#[derive(Debug, Clone, Copy)]
pub struct VisibleEntity {
    pub entity: Entity,
    pub position: Vec2,
    pub role: Role,
    pub action: ActionState,
    pub facing: Direction,
}

pub struct Simulation {
    level: Level,
    occupancy: OccupancyIndex,
    roster_index: HashMap<Entity, usize>,
    elapsed: f32,
    status: TickStatus,
    rng: StdRng,
    events: EventQueue,
    move_log: MoveLog,
    ai_enabled: bool,
}

impl Simulation {
    pub fn new(spec: &LevelSpec, seed: u64) -> Result<Self, LevelError> {
        Self::with_ai(spec, seed, true)
    }

    /// Build with shark decisions suppressed. Replay uses this: the sharks'
    /// logged moves are fed back in instead of being re-decided.
    pub fn without_ai(spec: &LevelSpec, seed: u64) -> Result<Self, LevelError> {
        Self::with_ai(spec, seed, false)
    }

    fn with_ai(spec: &LevelSpec, seed: u64, ai_enabled: bool) -> Result<Self, LevelError> {
        let level = Level::build(spec)?;
        let occupancy = OccupancyIndex::rebuild_from_world(&level.world);
        let roster_index = level
            .roster
            .iter()
            .enumerate()
            .map(|(idx, &entity)| (entity, idx))
            .collect();
        Ok(Self {
            level,
            occupancy,
            roster_index,
            elapsed: 0.0,
            status: TickStatus::Running,
            rng: StdRng::seed_from_u64(seed),
            events: EventQueue::new(),
            move_log: MoveLog::new(),
            ai_enabled,
        })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn status(&self) -> TickStatus {
        self.status
    }

    pub fn move_log(&self) -> &MoveLog {
        &self.move_log
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain().collect()
    }

    pub fn roster_index_of(&self, entity: Entity) -> Option<usize> {
        self.roster_index.get(&entity).copied()
    }

    /// Issue a move request for a roster entity. The sole externally-initiated
    /// move entry point: logs the request, then hands the goal to the mover.
    /// Returns false for an unknown index or a dead character.
    pub fn update(&mut self, entity_index: usize, target: Cell) -> bool {
        if self.status != TickStatus::Running {
            return false;
        }
        let Some(&entity) = self.level.roster.get(entity_index) else {
            return false;
        };

        // A goodie directed at another character's cell is a follow request,
        // not a move. Following is unimplemented, so the request is dropped
        // without touching the log.
        let is_goodie = self
            .level
            .world
            .get::<&Role>(entity)
            .map(|r| *r == Role::Goodie)
            .unwrap_or(false);
        if is_goodie {
            let occupied = self
                .occupancy
                .goodie_entity_at(target)
                .is_some_and(|other| other != entity)
                || self.occupancy.baddie_entity_at(target).is_some();
            if occupied {
                return false;
            }
        }

        self.issue_move(entity_index, entity, target)
    }

    fn issue_move(&mut self, entity_index: usize, entity: Entity, target: Cell) -> bool {
        let world = &mut self.level.world;
        let alive = world
            .get::<&Health>(entity)
            .map(|h| h.is_alive())
            .unwrap_or(false);
        if !alive {
            return false;
        }
        let current = match world.get::<&Position>(entity) {
            Ok(pos) => pos.cell(),
            Err(_) => return false,
        };
        let Ok(mut mover) = world.get::<&mut Mover>(entity) else {
            return false;
        };
        mover.move_to(current, target);
        drop(mover);

        self.move_log.append(entity_index, self.elapsed, target);
        self.events.push(GameEvent::MoveRequested {
            entity,
            target,
            timestamp: self.elapsed,
        });
        true
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Tick order: terminal check, shark decisions (against the previous
    /// tick's occupancy), movement, contact damage, bookkeeping, occupancy
    /// rebuild. The rebuilt index is what the next tick's decisions and
    /// free-cell checks observe.
    pub fn step(&mut self, dt: f32) -> TickStatus {
        puffin::profile_function!();

        if self.status != TickStatus::Running {
            return self.status;
        }
        self.elapsed += dt;

        if let Some(outcome) = self.check_terminal() {
            self.status = outcome;
            self.events.push(GameEvent::LevelOver {
                won: outcome == TickStatus::Won,
                elapsed: self.elapsed,
            });
            return self.status;
        }

        if self.ai_enabled {
            let decisions = update_sharks(
                &mut self.level.world,
                &self.level.terrain,
                &self.occupancy,
                &mut self.rng,
                &mut self.events,
            );
            for decision in decisions {
                if let Some(idx) = self.roster_index_of(decision.entity) {
                    self.issue_move(idx, decision.entity, decision.target);
                }
            }
        }

        let transitions = step_movers(
            &mut self.level.world,
            &self.level.terrain,
            &self.occupancy,
            dt,
        );
        resolve_contacts(&mut self.level.world, dt, &mut self.events);

        for transition in &transitions {
            self.events.push(GameEvent::CellChanged {
                entity: transition.entity,
                from: transition.from,
                to: transition.to,
            });
            if let Ok(mut brain) = self.level.world.get::<&mut SharkBrain>(transition.entity) {
                brain
                    .sectors
                    .record_entry(Some(transition.from), transition.to);
            }
        }

        self.occupancy = OccupancyIndex::rebuild_from_world(&self.level.world);
        self.status
    }

    /// Lost beats Won so the two are mutually exclusive: a run that exhausts
    /// its goodies or its clock can never also be a win.
    fn check_terminal(&self) -> Option<TickStatus> {
        let live_goodie_cells: Vec<Cell> = self
            .level
            .goodies
            .iter()
            .filter_map(|&goodie| {
                let alive = self
                    .level
                    .world
                    .get::<&Health>(goodie)
                    .map(|h| h.is_alive())
                    .unwrap_or(false);
                if !alive {
                    return None;
                }
                self.level
                    .world
                    .get::<&Position>(goodie)
                    .ok()
                    .map(|p| p.cell())
            })
            .collect();

        if live_goodie_cells.is_empty() || self.elapsed > self.level.time_limit {
            return Some(TickStatus::Lost);
        }
        if live_goodie_cells
            .iter()
            .all(|cell| self.level.goal_cells.contains(cell))
        {
            return Some(TickStatus::Won);
        }
        None
    }

    /// Render sink: every goodie, plus every shark spotted by a live goodie.
    /// The core never draws; this is the whole surface the embedder reads.
    pub fn visible_entities(&self) -> Vec<VisibleEntity> {
        let observer_cells: Vec<Cell> = self.occupancy.goodie_cells().map(|(c, _)| c).collect();

        let mut visible = Vec::new();
        for (entity, (pos, role, action, facing)) in self
            .level
            .world
            .query::<(&Position, &Role, &ActionState, &Facing)>()
            .iter()
        {
            let spotted = match role {
                Role::Goodie => true,
                Role::Baddie => is_spotted(
                    pos.cell(),
                    observer_cells.iter().copied(),
                    VISIBILITY_RADIUS,
                ),
            };
            if spotted {
                visible.push(VisibleEntity {
                    entity,
                    position: pos.0,
                    role: *role,
                    action: *action,
                    facing: facing.0,
                });
            }
        }
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelSpec;

    /// A 1-row channel: hero at x=0, goal column at x=7, no obstacles.
    fn channel_spec(time_limit: f32, with_shark: bool) -> LevelSpec {
        let mut game_objects = vec![("hero".to_string(), placement(0.0, 0.0))];
        if with_shark {
            game_objects.push(("shark".to_string(), placement(4.0, 0.0)));
        }
        LevelSpec {
            name: "channel".to_string(),
            shape: (1, 8),
            time_limit,
            terrain: vec![("goal".to_string(), placement(7.0, 0.0))],
            game_objects,
        }
    }

    fn placement(x: f32, y: f32) -> crate::level::Placement {
        crate::level::Placement {
            x,
            y,
            shape: (1, 1),
        }
    }

    #[test]
    fn test_hero_reaching_goal_wins() {
        let mut sim = Simulation::new(&channel_spec(60.0, false), 7).unwrap();
        assert!(sim.update(0, Cell::new(7, 0)));

        let mut status = TickStatus::Running;
        for _ in 0..20 {
            status = sim.step(1.0);
            if status != TickStatus::Running {
                break;
            }
        }
        assert_eq!(status, TickStatus::Won);
        assert!(sim
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::LevelOver { won: true, .. })));
    }

    #[test]
    fn test_time_limit_exceeded_loses() {
        let mut sim = Simulation::new(&channel_spec(1.0, false), 7).unwrap();
        assert_eq!(sim.step(0.6), TickStatus::Running);
        assert_eq!(sim.step(0.6), TickStatus::Lost);
    }

    #[test]
    fn test_all_goodies_dead_loses() {
        let mut spec = channel_spec(100.0, true);
        // Shark one cell from the hero: it chases in, lands on the hero's
        // cell and the contact damage over a long dt is lethal.
        spec.game_objects[1].1 = placement(1.0, 0.0);
        let mut sim = Simulation::new(&spec, 7).unwrap();

        assert_eq!(sim.step(20.0), TickStatus::Running);
        assert_eq!(sim.step(0.1), TickStatus::Lost);
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let mut sim = Simulation::new(&channel_spec(1.0, false), 7).unwrap();
        sim.step(2.0);
        assert_eq!(sim.status(), TickStatus::Lost);

        let elapsed = sim.elapsed();
        assert_eq!(sim.step(5.0), TickStatus::Lost);
        assert_eq!(sim.elapsed(), elapsed);
        assert!(!sim.update(0, Cell::new(3, 0)));
    }

    #[test]
    fn test_player_moves_are_logged() {
        let mut sim = Simulation::new(&channel_spec(60.0, false), 7).unwrap();
        sim.update(0, Cell::new(5, 0));
        assert_eq!(sim.move_log().len(), 1);
        assert_eq!(sim.move_log().records[0].entity_index, 0);
        assert_eq!(sim.move_log().records[0].target(), Cell::new(5, 0));
    }

    #[test]
    fn test_shark_decisions_are_logged() {
        let mut sim = Simulation::new(&channel_spec(60.0, true), 7).unwrap();
        sim.step(0.1);

        let shark_index = sim.roster_index_of(sim.level().baddies[0]).unwrap();
        assert!(sim
            .move_log()
            .records
            .iter()
            .any(|r| r.entity_index == shark_index));
    }

    #[test]
    fn test_cell_changes_emit_events_and_visit_counts() {
        let mut sim = Simulation::new(&channel_spec(60.0, false), 7).unwrap();
        sim.update(0, Cell::new(3, 0));
        sim.step(2.0);

        let events = sim.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::CellChanged { .. })));
    }

    #[test]
    fn test_click_on_character_cell_is_a_follow_request() {
        let mut sim = Simulation::new(&channel_spec(60.0, true), 7).unwrap();
        // Shark sits at x=4; directing the hero there is not a move.
        assert!(!sim.update(0, Cell::new(4, 0)));
        assert!(sim.move_log().is_empty());
    }

    #[test]
    fn test_out_of_range_roster_index_is_rejected() {
        let mut sim = Simulation::new(&channel_spec(60.0, false), 7).unwrap();
        assert!(!sim.update(9, Cell::new(1, 0)));
        assert!(sim.move_log().is_empty());
    }

    #[test]
    fn test_unspotted_shark_is_hidden_from_render_sink() {
        let mut spec = channel_spec(60.0, true);
        spec.shape = (1, 24);
        spec.terrain = vec![("goal".to_string(), placement(23.0, 0.0))];
        spec.game_objects[1].1 = placement(20.0, 0.0);
        let sim = Simulation::new(&spec, 7).unwrap();

        let visible = sim.visible_entities();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].role, Role::Goodie);
    }

    #[test]
    fn test_spotted_shark_is_visible() {
        let sim = Simulation::new(&channel_spec(60.0, true), 7).unwrap();
        let visible = sim.visible_entities();
        assert!(visible.iter().any(|v| v.role == Role::Baddie));
    }
}
