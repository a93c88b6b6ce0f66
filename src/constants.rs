//! Game constants.
//!
//! Centralizing magic numbers makes tuning easier and documents intent.

/// Maximum health for every character
pub const MAX_HEALTH: f32 = 100.0;

/// Goodie swim speed (cells per second)
pub const GOODIE_WATER_SPEED: f32 = 1.0;
/// Goodie walk speed (cells per second)
pub const GOODIE_LAND_SPEED: f32 = 2.0;

/// Shark swim speed (cells per second)
pub const SHARK_WATER_SPEED: f32 = 2.0;
/// Sharks cannot travel on land
pub const SHARK_LAND_SPEED: f32 = 0.0;
/// Damage a shark inflicts per second of contact
pub const SHARK_DAMAGE_RATE: f32 = 10.0;

/// How many recently-visited cells a shark remembers.
/// The history biases waypoint selection away from backtracking.
pub const RECENT_CELLS_CAPACITY: usize = 6;

/// Chebyshev radius within which a shark spots a goodie
pub const VISIBILITY_RADIUS: i32 = 8;

/// Rows/cols per patrol sector (the grid is divided into coarse blocks of
/// this spacing)
pub const SECTOR_SPACING: i32 = 4;

/// Default fixed timestep for the headless runner (120 Hz)
pub const DEFAULT_DT: f32 = 1.0 / 120.0;

/// cos(45 deg) - per-axis scale applied to diagonal sub-steps
pub const DIAGONAL_SCALE: f32 = std::f32::consts::FRAC_1_SQRT_2;
