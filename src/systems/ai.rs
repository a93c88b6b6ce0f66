//! Shark decision engine: sector patrol and greedy chase.
//!
//! Each shark runs a two-state machine. Patrolling walks the map sector by
//! sector, biased toward the least-visited sector and away from the shark's
//! own recent cells. Chasing greedily steps one cell along the octant
//! direction toward a spotted goodie. There is no shortest-path search -
//! the movement engine's candidate-preference fallback supplies local
//! obstacle avoidance, which makes this a deliberately approximate policy.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{Health, Mover, Position, RecentCells};
use crate::constants::VISIBILITY_RADIUS;
use crate::events::{EventQueue, GameEvent};
use crate::grid::{chebyshev_distance, sign_or_zero, Cell};
use crate::occupancy::{can_see, OccupancyIndex};
use crate::sectors::SectorTable;
use crate::terrain::TerrainMap;

/// Shark behavior states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    Patrolling,
    Chasing,
}

/// Per-shark AI data: the state machine and the shark's own sector table.
#[derive(Debug, Clone)]
pub struct SharkBrain {
    pub state: AiState,
    pub sectors: SectorTable,
}

impl SharkBrain {
    pub fn new(sectors: SectorTable) -> Self {
        Self {
            state: AiState::Patrolling,
            sectors,
        }
    }
}

/// A move intent produced by the AI. The simulation feeds these through the
/// same logged `update` entry point as player clicks.
#[derive(Debug, Clone, Copy)]
pub struct AiDecision {
    pub entity: Entity,
    pub target: Cell,
}

/// Run one AI pass over every live shark against the previous tick's
/// occupancy snapshot. Returns the move intents to issue.
pub fn update_sharks(
    world: &mut World,
    terrain: &TerrainMap,
    occupancy: &OccupancyIndex,
    rng: &mut impl Rng,
    events: &mut EventQueue,
) -> Vec<AiDecision> {
    puffin::profile_function!();

    let mut decisions = Vec::new();

    for (entity, (pos, brain, mover, health, recent)) in
        world.query_mut::<(&Position, &mut SharkBrain, &Mover, &Health, &RecentCells)>()
    {
        if !health.is_alive() {
            continue;
        }
        let shark_cell = pos.cell();

        // Nearest live goodie standing in water within sight, if any.
        let target = occupancy
            .goodie_cells()
            .filter(|(cell, _)| terrain.kind(*cell).is_water())
            .filter(|(cell, _)| can_see(shark_cell, *cell, VISIBILITY_RADIUS))
            .min_by_key(|(cell, _)| chebyshev_distance(shark_cell, *cell))
            .map(|(cell, _)| cell);

        // Exact overlap cannot produce a chase direction; treat it like no
        // target and fall back to patrol.
        let chase_dir = target.map(|t| {
            (
                sign_or_zero(t.x - shark_cell.x),
                sign_or_zero(t.y - shark_cell.y),
            )
        });

        match chase_dir {
            Some(dir) if dir != (0, 0) => {
                // Re-evaluate only when not already committed to a chase.
                if !(brain.state == AiState::Chasing && mover.is_active()) {
                    if brain.state != AiState::Chasing {
                        brain.state = AiState::Chasing;
                        events.push(GameEvent::AiStateChanged {
                            entity,
                            new_state: AiState::Chasing,
                        });
                    }
                    decisions.push(AiDecision {
                        entity,
                        target: shark_cell.offset(dir.0, dir.1),
                    });
                }
            }
            _ => {
                let was_chasing = brain.state == AiState::Chasing;
                if was_chasing {
                    brain.state = AiState::Patrolling;
                    events.push(GameEvent::AiStateChanged {
                        entity,
                        new_state: AiState::Patrolling,
                    });
                }
                if was_chasing || !mover.is_active() {
                    if let Some(target) = pick_patrol_cell(&brain.sectors, recent, rng) {
                        decisions.push(AiDecision { entity, target });
                    }
                }
            }
        }
    }

    decisions
}

/// Coverage-biased random patrol: walk sectors in ascending visit order
/// (random tie-breaks), take one random cell per sector, and settle on the
/// first cell outside the shark's recent history. None when every candidate
/// was recently visited.
fn pick_patrol_cell(
    sectors: &SectorTable,
    recent: &RecentCells,
    rng: &mut impl Rng,
) -> Option<Cell> {
    for idx in sectors.least_visited_order(rng) {
        let cell = sectors.random_cell(idx, rng);
        if !recent.contains(cell) {
            return Some(cell);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ActionState, Facing, Role, Shark, Speed};
    use crate::constants::{SECTOR_SPACING, SHARK_DAMAGE_RATE};
    use crate::grid::Bounds;
    use crate::terrain::{TerrainBlock, TerrainKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn water_terrain(cols: i32, rows: i32) -> TerrainMap {
        TerrainMap::build(Bounds::new(cols, rows), &[])
    }

    fn spawn_shark(world: &mut World, terrain: &TerrainMap, x: f32, y: f32) -> Entity {
        world.spawn((
            Position::new(x, y),
            Mover::default(),
            Speed { water: 2.0, land: 0.0 },
            Role::Baddie,
            Shark { damage_rate: SHARK_DAMAGE_RATE },
            Health::new(100.0),
            ActionState::Swim,
            Facing::default(),
            RecentCells::new(3),
            SharkBrain::new(SectorTable::build(terrain, SECTOR_SPACING)),
        ))
    }

    fn spawn_goodie(world: &mut World, x: f32, y: f32) -> Entity {
        world.spawn((
            Position::new(x, y),
            Mover::default(),
            Speed { water: 1.0, land: 2.0 },
            Role::Goodie,
            Health::new(100.0),
            ActionState::TreadWater,
            Facing::default(),
        ))
    }

    fn brain_state(world: &World, shark: Entity) -> AiState {
        world.get::<&SharkBrain>(shark).unwrap().state
    }

    #[test]
    fn test_visible_swimmer_triggers_chase_same_tick() {
        let terrain = water_terrain(8, 8);
        let mut world = World::new();
        let shark = spawn_shark(&mut world, &terrain, 1.0, 1.0);
        spawn_goodie(&mut world, 4.0, 4.0);

        let occupancy = OccupancyIndex::rebuild_from_world(&world);
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = EventQueue::new();
        let decisions = update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);

        assert_eq!(brain_state(&world, shark), AiState::Chasing);
        assert_eq!(decisions.len(), 1);
        // One cell along the (+1, +1) octant.
        assert_eq!(decisions[0].target, Cell::new(2, 2));
    }

    #[test]
    fn test_target_on_land_is_not_eligible() {
        let terrain = TerrainMap::build(
            Bounds::new(8, 8),
            &[TerrainBlock { kind: TerrainKind::Land, x_min: 4, x_max: 5, y_min: 4, y_max: 5 }],
        );
        let mut world = World::new();
        let shark = spawn_shark(&mut world, &terrain, 1.0, 1.0);
        spawn_goodie(&mut world, 4.0, 4.0);

        let occupancy = OccupancyIndex::rebuild_from_world(&world);
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = EventQueue::new();
        update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);

        assert_eq!(brain_state(&world, shark), AiState::Patrolling);
    }

    #[test]
    fn test_chase_reverts_to_patrol_when_target_leaves_water() {
        let terrain = TerrainMap::build(
            Bounds::new(8, 8),
            &[TerrainBlock { kind: TerrainKind::Land, x_min: 6, x_max: 7, y_min: 6, y_max: 7 }],
        );
        let mut world = World::new();
        let shark = spawn_shark(&mut world, &terrain, 1.0, 1.0);
        let goodie = spawn_goodie(&mut world, 4.0, 4.0);

        let mut rng = StdRng::seed_from_u64(1);
        let mut events = EventQueue::new();

        let occupancy = OccupancyIndex::rebuild_from_world(&world);
        update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);
        assert_eq!(brain_state(&world, shark), AiState::Chasing);

        // Goodie reaches land; next tick the shark drops back to patrol.
        world.get::<&mut Position>(goodie).unwrap().0 = glam::Vec2::new(6.0, 6.0);
        let occupancy = OccupancyIndex::rebuild_from_world(&world);
        update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);
        assert_eq!(brain_state(&world, shark), AiState::Patrolling);
    }

    #[test]
    fn test_out_of_sight_target_means_patrol() {
        let terrain = water_terrain(32, 32);
        let mut world = World::new();
        let shark = spawn_shark(&mut world, &terrain, 0.0, 0.0);
        spawn_goodie(&mut world, 30.0, 30.0);

        let occupancy = OccupancyIndex::rebuild_from_world(&world);
        let mut rng = StdRng::seed_from_u64(5);
        let mut events = EventQueue::new();
        let decisions = update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);

        assert_eq!(brain_state(&world, shark), AiState::Patrolling);
        // Idle patroller gets a sector goal.
        assert_eq!(decisions.len(), 1);
    }

    #[test]
    fn test_exact_overlap_falls_back_to_patrol() {
        let terrain = water_terrain(8, 8);
        let mut world = World::new();
        let shark = spawn_shark(&mut world, &terrain, 3.0, 3.0);
        spawn_goodie(&mut world, 3.0, 3.0);

        let occupancy = OccupancyIndex::rebuild_from_world(&world);
        let mut rng = StdRng::seed_from_u64(2);
        let mut events = EventQueue::new();
        update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);

        // No chase direction exists, so the shark stays a patroller.
        assert_eq!(brain_state(&world, shark), AiState::Patrolling);
        assert!(events
            .drain()
            .all(|e| !matches!(e, GameEvent::AiStateChanged { .. })));
    }

    #[test]
    fn test_patrol_prefers_least_visited_sector() {
        let terrain = water_terrain(8, 8);
        let mut world = World::new();
        let shark = spawn_shark(&mut world, &terrain, 1.0, 1.0);

        // Mark every sector but the far one as heavily visited.
        {
            let mut brain = world.get::<&mut SharkBrain>(shark).unwrap();
            let far = brain.sectors.sector_of(Cell::new(6, 6)).unwrap();
            for _ in 0..3 {
                for idx in 0..brain.sectors.len() {
                    if idx != far {
                        let cell = brain.sectors.sector(idx).cells()[0];
                        brain.sectors.record_entry(None, cell);
                    }
                }
            }
        }

        let occupancy = OccupancyIndex::rebuild_from_world(&world);
        let mut rng = StdRng::seed_from_u64(9);
        let mut events = EventQueue::new();
        let decisions = update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);

        assert_eq!(decisions.len(), 1);
        let brain = world.get::<&SharkBrain>(shark).unwrap();
        let far = brain.sectors.sector_of(Cell::new(6, 6)).unwrap();
        assert_eq!(brain.sectors.sector_of(decisions[0].target), Some(far));
    }

    #[test]
    fn test_patrol_with_every_candidate_in_history_yields_nothing() {
        // A 1-row corridor: the whole map is 3 water cells, all of them held
        // in the shark's history, so the patrol scan must come up empty
        // without panicking.
        let terrain = water_terrain(3, 1);
        let mut world = World::new();
        let shark = spawn_shark(&mut world, &terrain, 1.0, 0.0);
        {
            let mut recent = world.get::<&mut RecentCells>(shark).unwrap();
            recent.push(Cell::new(0, 0));
            recent.push(Cell::new(1, 0));
            recent.push(Cell::new(2, 0));
        }

        let occupancy = OccupancyIndex::rebuild_from_world(&world);
        let mut rng = StdRng::seed_from_u64(4);
        let mut events = EventQueue::new();
        let decisions = update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);

        assert!(decisions.is_empty());
    }

    #[test]
    fn test_committed_chaser_does_not_reissue() {
        let terrain = water_terrain(8, 8);
        let mut world = World::new();
        let shark = spawn_shark(&mut world, &terrain, 1.0, 1.0);
        spawn_goodie(&mut world, 4.0, 4.0);

        let occupancy = OccupancyIndex::rebuild_from_world(&world);
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = EventQueue::new();
        let first = update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);
        assert_eq!(first.len(), 1);

        // Give the shark an active goal, as the simulation would.
        {
            let current = world.get::<&Position>(shark).unwrap().cell();
            world
                .get::<&mut Mover>(shark)
                .unwrap()
                .move_to(current, first[0].target);
        }

        let second = update_sharks(&mut world, &terrain, &occupancy, &mut rng, &mut events);
        assert!(second.is_empty(), "chasing with an active goal re-issues nothing");
    }
}
