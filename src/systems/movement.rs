//! Continuous-position movement engine.
//!
//! Converts a discrete goal cell into per-frame fractional movement, one
//! waypoint cell at a time. Each active entity spends a distance budget of
//! speed x dt per tick and may cross several cells in one tick at high speed
//! or low tick rate.
//!
//! Waypoint selection is greedy: the octant direction toward the goal picks a
//! fixed preference list of up to three unit displacements, and the first one
//! whose destination passes the role's passability check wins. There is no
//! full path search; local obstacle avoidance falls out of the candidate
//! fallback order.

use hecs::{Entity, World};

use crate::components::{ActionState, Facing, Health, Mover, Position, RecentCells, Role, Speed};
use crate::constants::DIAGONAL_SCALE;
use crate::grid::{sign_or_zero, surrounding_cells, Cell, Direction};
use crate::occupancy::OccupancyIndex;
use crate::terrain::TerrainMap;

/// An entity's current cell changed during stepping. Consumed by the
/// simulation loop for sector bookkeeping and events.
#[derive(Debug, Clone, Copy)]
pub struct CellTransition {
    pub entity: Entity,
    pub from: Cell,
    pub to: Cell,
}

/// Preference-ordered candidate displacements for an octant direction.
///
/// A diagonal octant tries the diagonal first, then its two axis-aligned
/// neighbors; a cardinal octant tries the cardinal first, then the two
/// adjacent diagonals. The ordering is load-bearing: it is what steers
/// entities around obstacles without a path search.
pub fn octant_prefs(dx: i32, dy: i32) -> [(i32, i32); 3] {
    match (dx, dy) {
        (1, 0) => [(1, 0), (1, 1), (1, -1)],
        (1, -1) => [(1, -1), (1, 0), (0, -1)],
        (0, -1) => [(0, -1), (1, -1), (-1, -1)],
        (-1, -1) => [(-1, -1), (0, -1), (-1, 0)],
        (-1, 0) => [(-1, 0), (-1, -1), (-1, 1)],
        (-1, 1) => [(-1, 1), (-1, 0), (0, 1)],
        (0, 1) => [(0, 1), (-1, 1), (1, 1)],
        (1, 1) => [(1, 1), (0, 1), (1, 0)],
        _ => unreachable!("octant direction must be a non-zero unit pair"),
    }
}

/// Step every live, active entity by its distance budget for this tick.
///
/// All free-cell checks read the `occupancy` snapshot built at the end of the
/// previous tick; in-tick moves by other entities are deliberately invisible.
/// Returns cell transitions in the order they happened.
pub fn step_movers(
    world: &mut World,
    terrain: &TerrainMap,
    occupancy: &OccupancyIndex,
    dt: f32,
) -> Vec<CellTransition> {
    puffin::profile_function!();

    let bounds = terrain.bounds();
    let mut transitions = Vec::new();

    for (entity, (pos, mover, speed, role, health, action, facing, mut recent)) in world
        .query_mut::<(
            &mut Position,
            &mut Mover,
            &Speed,
            &Role,
            &Health,
            &mut ActionState,
            &mut Facing,
            Option<&mut RecentCells>,
        )>()
    {
        if !health.is_alive() || !mover.is_active() {
            continue;
        }

        let start_terrain = terrain.kind(pos.cell());
        let mut budget = speed.on(start_terrain) * dt;
        if budget <= 0.0 {
            continue;
        }
        *action = if start_terrain.is_land() {
            ActionState::Walk
        } else {
            ActionState::Swim
        };

        while budget > 0.0 && mover.is_active() {
            let current = pos.cell();

            // Pick a fresh waypoint when the old one has been consumed or no
            // displacement has been chosen yet. A freshly issued goal on a
            // fractional position leaves next_cell set to the current cell
            // without a displacement; it must not be mistaken for an
            // in-flight waypoint or the budget loop never advances.
            let needs_waypoint = mover.next_displacement.is_none()
                || mover.next_cell.map_or(true, |next| pos.is_at(next));
            if needs_waypoint {
                let goal = mover.goal_cell.expect("active mover has a goal");
                let dir = (
                    sign_or_zero(goal.x - current.x),
                    sign_or_zero(goal.y - current.y),
                );
                if dir == (0, 0) {
                    // Already at the goal cell: idle, no waypoint search.
                    mover.clear();
                    break;
                }

                // Local neighborhood, already clipped to bounds. Candidates
                // outside it are off the map.
                let neighborhood = surrounding_cells(current, (1, 1), bounds, 1);

                let mut chosen = None;
                for (sx, sy) in octant_prefs(dir.0, dir.1) {
                    let candidate = current.offset(sx, sy);
                    if !neighborhood.contains(&candidate) {
                        continue;
                    }
                    let free = role.is_free_cell(
                        candidate,
                        terrain.kind(candidate),
                        occupancy,
                        entity,
                        recent.as_deref(),
                    );
                    if free {
                        chosen = Some((candidate, (sx, sy)));
                        break;
                    }
                }

                match chosen {
                    Some((next, disp)) => {
                        mover.next_cell = Some(next);
                        mover.next_displacement = Some(disp);
                        if let Some(d) = Direction::from_displacement(disp.0, disp.1) {
                            *facing = Facing(d);
                        }
                    }
                    None => {
                        // Stuck: drop the waypoint but keep the goal so the
                        // search is re-attempted next tick.
                        mover.next_cell = None;
                        mover.next_displacement = None;
                        break;
                    }
                }
            }

            let next = mover.next_cell.expect("waypoint chosen above");
            let (sx, sy) = mover
                .next_displacement
                .expect("displacement set alongside the waypoint");

            // Diagonal sub-steps advance each axis by budget * cos(45deg) and
            // the budget is consumed at the full per-axis sum, so a diagonal
            // step costs the same total budget as two orthogonal half-steps.
            let axis_step = if sx != 0 && sy != 0 {
                budget * DIAGONAL_SCALE
            } else {
                budget
            };

            let target = next.as_vec2();
            let remaining_x = target.x - pos.0.x;
            let remaining_y = target.y - pos.0.y;

            let step_x = (sx as f32) * axis_step;
            let dx_actual = if step_x.abs() < remaining_x.abs() {
                pos.0.x += step_x;
                step_x
            } else {
                pos.0.x = target.x;
                remaining_x
            };
            let step_y = (sy as f32) * axis_step;
            let dy_actual = if step_y.abs() < remaining_y.abs() {
                pos.0.y += step_y;
                step_y
            } else {
                pos.0.y = target.y;
                remaining_y
            };
            budget -= dx_actual.abs() + dy_actual.abs();

            let landed = pos.cell();
            if landed != current {
                if let Some(recent) = recent.as_deref_mut() {
                    recent.push(landed);
                }
                transitions.push(CellTransition {
                    entity,
                    from: current,
                    to: landed,
                });
            }

            // Arrival at the goal discards any leftover budget.
            if mover.goal_cell == Some(next) && pos.is_at(next) {
                mover.clear();
                let here = terrain.kind(pos.cell());
                *action = if here.is_land() {
                    ActionState::Stand
                } else {
                    ActionState::TreadWater
                };
                break;
            }
        }
    }

    transitions
}
