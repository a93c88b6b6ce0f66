//! Replay a logged run against a freshly built level.
//!
//! The move log captures every externally-issued move request, shark
//! decisions included, so replay rebuilds the level from the same spec and
//! seed, disables the shark AI, and feeds each record back through `update`
//! as the clock passes its timestamp. Stepping with the same dt then
//! reproduces the original run exactly: same trajectories, same outcome,
//! same tick count.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::events::MoveLog;
use crate::level::{LevelError, LevelSpec};
use crate::simulation::{Simulation, TickStatus};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("failed to read or write move log")]
    Io(#[from] std::io::Error),
    #[error("malformed move log")]
    Parse(#[from] serde_json::Error),
}

/// How a driven run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub status: TickStatus,
    pub ticks: u32,
    pub elapsed: f32,
}

/// Step `sim` with a fixed dt, feeding it `log` records as their timestamps
/// come due, until the run ends or `max_ticks` is reached.
///
/// A record logged at timestamp `t` took effect in the tick whose clock
/// reached `t`, so it is fed just before the step that crosses its
/// timestamp. Timestamps come from the same clock arithmetic as the replay's,
/// which makes the comparison exact rather than approximate.
pub fn drive(sim: &mut Simulation, log: &MoveLog, dt: f32, max_ticks: u32) -> RunSummary {
    let mut cursor = 0;
    let mut ticks = 0;
    while sim.status() == TickStatus::Running && ticks < max_ticks {
        let horizon = sim.elapsed() + dt;
        while cursor < log.records.len() && log.records[cursor].timestamp <= horizon {
            let record = &log.records[cursor];
            sim.update(record.entity_index, record.target());
            cursor += 1;
        }
        sim.step(dt);
        ticks += 1;
    }
    RunSummary {
        status: sim.status(),
        ticks,
        elapsed: sim.elapsed(),
    }
}

/// Rebuild the level and play a logged run back through it. Returns the
/// finished simulation so the caller can inspect outcome and final state.
pub fn replay(
    spec: &LevelSpec,
    seed: u64,
    log: &MoveLog,
    dt: f32,
    max_ticks: u32,
) -> Result<(Simulation, RunSummary), ReplayError> {
    let mut sim = Simulation::without_ai(spec, seed)?;
    let summary = drive(&mut sim, log, dt, max_ticks);
    Ok((sim, summary))
}

pub fn save_move_log(path: &Path, log: &MoveLog) -> Result<(), ReplayError> {
    let text = serde_json::to_string_pretty(log)?;
    fs::write(path, text)?;
    Ok(())
}

pub fn load_move_log(path: &Path) -> Result<MoveLog, ReplayError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
