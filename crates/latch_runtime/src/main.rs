//! Latch Spatial Runtime
//!
//! Drives the spatial grid with a fixed-tick mover simulation.
//! Usage: `latch-spatial-demo [settings.json]`

mod settings;
mod sim;

use anyhow::Result;
use latch_spatial::GridEvent;
use settings::Settings;
use sim::Simulation;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Latch Spatial v{}", latch_spatial::VERSION);

    let settings = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            tracing::info!("Loading settings from {}", path.display());
            Settings::load(&path)?
        }
        None => Settings::default(),
    };
    let ticks = settings.simulation.ticks;
    let report_interval = settings.simulation.report_interval.max(1);

    let mut simulation = Simulation::new(settings)?;
    let grid = simulation.grid();
    tracing::info!(
        "Grid {} cells of {} covering {}..{}",
        grid.cell_counts(),
        grid.cell_size(),
        grid.origin(),
        grid.end()
    );

    let mut total_moves = 0;
    for _ in 0..ticks {
        let report = simulation.step();
        total_moves += report.moves_applied;

        if report.tick % report_interval == 0 {
            tracing::info!(
                "tick {}: {} moves applied, {} inside the grid, {} watch hits",
                report.tick,
                report.moves_applied,
                report.in_grid,
                report.watch_hits
            );
        }
    }

    tracing::info!(
        "Simulated {:.2}s ({} ticks), {} move notifications applied",
        simulation.clock().elapsed().as_secs_f64(),
        simulation.clock().tick(),
        total_moves
    );
    for (event, count) in simulation.grid().counters().iter() {
        tracing::info!("  {}: {}", event.name(), count);
    }
    tracing::debug!(
        "{} queries issued",
        simulation.grid().counters().get(GridEvent::Query)
    );

    Ok(())
}
