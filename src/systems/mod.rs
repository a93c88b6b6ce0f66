//! Per-tick simulation systems.

pub mod ai;
pub mod combat;
pub mod movement;
