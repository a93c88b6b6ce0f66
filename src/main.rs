mod components;
mod constants;
mod events;
mod grid;
mod level;
mod occupancy;
mod replay;
mod sectors;
mod simulation;
mod systems;
mod terrain;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use grid::chebyshev_distance;
use level::LevelSpec;
use replay::RunSummary;
use simulation::{Simulation, TickStatus};

const DT: f32 = constants::DEFAULT_DT;
const MAX_TICKS: u32 = 2_000_000;
const SEED: u64 = 0xC0FFEE;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(level_path) = args.next().map(PathBuf::from) else {
        bail!("usage: reef-crossing <level.json> [move-log.json]");
    };
    let log_path = args.next().map(PathBuf::from);

    let spec = LevelSpec::from_path(&level_path)
        .with_context(|| format!("loading level {}", level_path.display()))?;

    let mut sim = Simulation::new(&spec, SEED)?;
    send_hero_to_goal(&mut sim)?;

    let summary = run_to_end(&mut sim);
    print_summary(&spec.name, &summary);

    if let Some(log_path) = log_path {
        replay::save_move_log(&log_path, sim.move_log())
            .with_context(|| format!("writing move log {}", log_path.display()))?;

        let (_, replayed) = replay::replay(&spec, SEED, sim.move_log(), DT, MAX_TICKS)?;
        if replayed.status != summary.status || replayed.ticks != summary.ticks {
            bail!(
                "replay diverged: live {:?} after {} ticks, replay {:?} after {}",
                summary.status,
                summary.ticks,
                replayed.status,
                replayed.ticks
            );
        }
        println!("replay verified against {}", log_path.display());
    }

    Ok(())
}

/// One-shot hero driver: head for the goal cell nearest the hero.
fn send_hero_to_goal(sim: &mut Simulation) -> Result<()> {
    let hero = sim.level().hero;
    let hero_cell = sim
        .level()
        .world
        .get::<&components::Position>(hero)
        .map(|p| p.cell())
        .context("hero has no position")?;
    let target = sim
        .level()
        .goal_cells
        .iter()
        .copied()
        .min_by_key(|&goal| chebyshev_distance(hero_cell, goal))
        .context("level has no goal cells")?;

    let hero_index = sim
        .roster_index_of(hero)
        .context("hero missing from roster")?;
    if !sim.update(hero_index, target) {
        bail!("hero rejected move to {:?}", target);
    }
    Ok(())
}

fn run_to_end(sim: &mut Simulation) -> RunSummary {
    let mut ticks = 0;
    while sim.status() == TickStatus::Running && ticks < MAX_TICKS {
        sim.step(DT);
        ticks += 1;
        sim.drain_events();
    }
    RunSummary {
        status: sim.status(),
        ticks,
        elapsed: sim.elapsed(),
    }
}

fn print_summary(name: &str, summary: &RunSummary) {
    let verdict = match summary.status {
        TickStatus::Won => "won",
        TickStatus::Lost => "lost",
        TickStatus::Running => "unfinished",
    };
    println!(
        "{name}: {verdict} after {:.2}s ({} ticks)",
        summary.elapsed, summary.ticks
    );
}
