//! Headless Tessera server: loads the demo dimensions, spawns a population
//! and ticks until the configured tick count is reached.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tessera_config::{CliArgs, Config};
use tessera_entity::EntityTypeRegistry;
use tessera_server::{Simulation, SimulationError, TickReport, demo};
use tracing::{info, warn};

/// How often the config file is checked for edits, in ticks.
const RELOAD_CHECK_TICKS: u64 = 200;

fn main() {
    let args = CliArgs::parse();
    if let Err(e) = run(&args) {
        eprintln!("tessera-server: {e}");
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), SimulationError> {
    let config_dir = match &args.config {
        Some(dir) => dir.clone(),
        None => Config::default_dir()?,
    };
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(args);

    let log_dir: Option<PathBuf> = config.debug.log_dir.clone();
    tessera_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));
    info!(
        config = %config_dir.display(),
        seed = config.server.seed,
        tick_rate = config.server.tick_rate,
        "starting tessera-server"
    );

    let config = Arc::new(config);
    let mut sim = Simulation::new(Arc::clone(&config), Arc::new(EntityTypeRegistry::builtin()));
    demo::load_dimensions(&mut sim)?;
    demo::populate(&mut sim, config.server.demo_entities)?;

    let period = Duration::from_secs_f64(1.0 / config.server.tick_rate.max(1) as f64);
    let started = Instant::now();
    let mut total = TickReport::default();
    let mut on_disk = (*config).clone();

    while config.server.ticks == 0 || sim.ticks() < config.server.ticks {
        let tick_start = Instant::now();
        let report = sim.tick();
        total.failed += report.failed;
        total.transferred += report.transferred;
        total.events += report.events;
        sim.drain_events();

        if sim.ticks() % RELOAD_CHECK_TICKS == 0 {
            match on_disk.reload(&config_dir) {
                Ok(Some(changed)) => {
                    info!("config file changed; new values apply on restart");
                    on_disk = changed;
                }
                Ok(None) => {}
                Err(e) => warn!("config reload failed: {e}"),
            }
        }

        if config.server.realtime
            && let Some(rest) = period.checked_sub(tick_start.elapsed())
        {
            std::thread::sleep(rest);
        }
    }

    let population = sim.population();
    info!(
        ticks = sim.ticks(),
        population,
        failed = total.failed,
        transferred = total.transferred,
        events = total.events,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "simulation finished"
    );
    Ok(())
}
