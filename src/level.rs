//! Level specs and level construction.
//!
//! A level is described by a JSON spec: a name, the grid shape, a time limit,
//! an ordered list of terrain placements and an ordered list of character
//! placements. Names resolve through fixed registration tables; an unknown
//! name fails the build instead of being skipped, so a typo in a level file
//! surfaces immediately.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use glam::Vec2;
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{
    ActionState, Facing, Health, Hero, Mover, Position, RecentCells, Role, Shark, Speed,
};
use crate::constants::{
    GOODIE_LAND_SPEED, GOODIE_WATER_SPEED, MAX_HEALTH, RECENT_CELLS_CAPACITY, SECTOR_SPACING,
    SHARK_DAMAGE_RATE, SHARK_LAND_SPEED, SHARK_WATER_SPEED,
};
use crate::grid::{Bounds, Cell};
use crate::sectors::SectorTable;
use crate::systems::ai::SharkBrain;
use crate::terrain::{TerrainBlock, TerrainKind, TerrainMap};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("unknown terrain kind `{0}`")]
    UnknownTerrain(String),
    #[error("unknown game object `{0}`")]
    UnknownGameObject(String),
    #[error("level `{name}` has invalid shape ({rows}, {cols})")]
    InvalidShape { name: String, rows: i32, cols: i32 },
    #[error("level `{0}` has no hero")]
    MissingHero(String),
    #[error("game object `{name}` spawns out of bounds at ({x}, {y})")]
    SpawnOutOfBounds { name: String, x: f32, y: f32 },
    #[error("failed to read level file")]
    Io(#[from] std::io::Error),
    #[error("malformed level file")]
    Parse(#[from] serde_json::Error),
}

/// Where a terrain block or character goes. `shape` is (rows, cols); the
/// covered block is [x, x + cols) x [y, y + rows). Characters use the
/// default 1x1 shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    #[serde(default = "unit_shape")]
    pub shape: (i32, i32),
}

fn unit_shape() -> (i32, i32) {
    (1, 1)
}

/// On-disk level description. Loaded once at level start and never
/// re-queried mid-tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSpec {
    pub name: String,
    /// (rows, cols)
    pub shape: (i32, i32),
    pub time_limit: f32,
    pub terrain: Vec<(String, Placement)>,
    pub game_objects: Vec<(String, Placement)>,
}

impl LevelSpec {
    pub fn from_path(path: &Path) -> Result<Self, LevelError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// terrain name -> kind. Closed table; adding a kind means adding a row.
const TERRAIN_NAMES: &[(&str, TerrainKind)] = &[
    ("water", TerrainKind::Water),
    ("land", TerrainKind::Land),
    ("unpassable", TerrainKind::Unpassable),
    ("goal", TerrainKind::Goal),
];

fn terrain_kind_by_name(name: &str) -> Option<TerrainKind> {
    TERRAIN_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, kind)| kind)
}

struct SpawnContext<'a> {
    terrain: &'a TerrainMap,
    sectors: &'a SectorTable,
}

type Spawner = fn(&mut World, &SpawnContext, Vec2) -> Entity;

/// game object name -> spawner.
const GAME_OBJECT_NAMES: &[(&str, Spawner)] = &[
    ("hero", spawn_hero),
    ("goodie", spawn_goodie),
    ("shark", spawn_shark),
];

fn spawner_by_name(name: &str) -> Option<Spawner> {
    GAME_OBJECT_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, spawner)| spawner)
}

fn goodie_action(ctx: &SpawnContext, cell: Cell) -> ActionState {
    if ctx.terrain.kind(cell).is_land() {
        ActionState::Stand
    } else {
        ActionState::TreadWater
    }
}

fn spawn_goodie(world: &mut World, ctx: &SpawnContext, at: Vec2) -> Entity {
    let action = goodie_action(ctx, Cell::from_position(at));
    world.spawn((
        Position(at),
        Mover::default(),
        Speed {
            water: GOODIE_WATER_SPEED,
            land: GOODIE_LAND_SPEED,
        },
        Role::Goodie,
        Health::new(MAX_HEALTH),
        action,
        Facing::default(),
    ))
}

fn spawn_hero(world: &mut World, ctx: &SpawnContext, at: Vec2) -> Entity {
    let entity = spawn_goodie(world, ctx, at);
    world
        .insert_one(entity, Hero)
        .unwrap_or_else(|_| unreachable!("freshly spawned entity is live"));
    entity
}

fn spawn_shark(world: &mut World, ctx: &SpawnContext, at: Vec2) -> Entity {
    // The spawn cell already counts as visited, so the first patrol is not
    // biased back toward home.
    let mut sectors = ctx.sectors.clone();
    sectors.record_entry(None, Cell::from_position(at));
    world.spawn((
        Position(at),
        Mover::default(),
        Speed {
            water: SHARK_WATER_SPEED,
            land: SHARK_LAND_SPEED,
        },
        Role::Baddie,
        Shark {
            damage_rate: SHARK_DAMAGE_RATE,
        },
        Health::new(MAX_HEALTH),
        ActionState::Swim,
        Facing::default(),
        RecentCells::new(RECENT_CELLS_CAPACITY),
        SharkBrain::new(sectors),
    ))
}

/// A fully built level: terrain, sector partition, spawned characters and the
/// rosters the simulation addresses them through.
pub struct Level {
    pub name: String,
    pub bounds: Bounds,
    pub time_limit: f32,
    pub terrain: TerrainMap,
    pub goal_cells: HashSet<Cell>,
    pub world: World,
    pub hero: Entity,
    pub goodies: Vec<Entity>,
    pub baddies: Vec<Entity>,
    /// Every character in spec order; move log records index into this.
    pub roster: Vec<Entity>,
}

impl Level {
    pub fn build(spec: &LevelSpec) -> Result<Self, LevelError> {
        let (rows, cols) = spec.shape;
        if rows <= 0 || cols <= 0 {
            return Err(LevelError::InvalidShape {
                name: spec.name.clone(),
                rows,
                cols,
            });
        }
        let bounds = Bounds::new(cols, rows);

        let mut blocks = Vec::with_capacity(spec.terrain.len());
        for (name, placement) in &spec.terrain {
            let kind = terrain_kind_by_name(name)
                .ok_or_else(|| LevelError::UnknownTerrain(name.clone()))?;
            let origin = Cell::from_position(Vec2::new(placement.x, placement.y));
            let (p_rows, p_cols) = placement.shape;
            blocks.push(TerrainBlock {
                kind,
                x_min: origin.x,
                x_max: origin.x + p_cols,
                y_min: origin.y,
                y_max: origin.y + p_rows,
            });
        }
        let terrain = TerrainMap::build(bounds, &blocks);
        let goal_cells: HashSet<Cell> =
            terrain.cells_of_kind(TerrainKind::Goal).into_iter().collect();
        let sectors = SectorTable::build(&terrain, SECTOR_SPACING);

        let mut world = World::new();
        let ctx = SpawnContext {
            terrain: &terrain,
            sectors: &sectors,
        };
        let mut hero = None;
        let mut goodies = Vec::new();
        let mut baddies = Vec::new();
        let mut roster = Vec::new();
        for (name, placement) in &spec.game_objects {
            let spawner =
                spawner_by_name(name).ok_or_else(|| LevelError::UnknownGameObject(name.clone()))?;
            let at = Vec2::new(placement.x, placement.y);
            if !bounds.contains(Cell::from_position(at)) {
                return Err(LevelError::SpawnOutOfBounds {
                    name: name.clone(),
                    x: placement.x,
                    y: placement.y,
                });
            }
            let entity = spawner(&mut world, &ctx, at);
            roster.push(entity);
            match *world
                .get::<&Role>(entity)
                .unwrap_or_else(|_| unreachable!("spawners attach a role"))
            {
                Role::Goodie => goodies.push(entity),
                Role::Baddie => baddies.push(entity),
            }
            if name == "hero" {
                hero = Some(entity);
            }
        }
        let hero = hero.ok_or_else(|| LevelError::MissingHero(spec.name.clone()))?;

        Ok(Self {
            name: spec.name.clone(),
            bounds,
            time_limit: spec.time_limit,
            terrain,
            goal_cells,
            world,
            hero,
            goodies,
            baddies,
            roster,
        })
    }
}
