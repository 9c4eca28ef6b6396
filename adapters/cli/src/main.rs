#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Tile Defense level.

mod map;
mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tile_defense_core::{AgentState, Command, Event, TileCoord, TowerKind};
use tile_defense_system_spawning::Spawning;
use tile_defense_world::{self as world, query, World};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::scenario::{parse_tile, Scenario};

/// Runs a tile defense level without a window and prints the final grid.
#[derive(Debug, Parser)]
#[command(name = "tile-defense", version, about, long_about = None)]
struct Cli {
    /// TOML scenario describing the grid, spawner and initial towers.
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Additional basic tower given as `column,row`. May be repeated.
    #[arg(short, long = "tower", value_parser = parse_tile)]
    towers: Vec<TileCoord>,

    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Aggregated outcome of a headless run.
#[derive(Debug, Default)]
struct RunSummary {
    spawned: u32,
    escaped: u32,
    stuck_transitions: u32,
    path_changes: u32,
}

impl RunSummary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemySpawned { .. } => self.spawned += 1,
                Event::EnemyEscaped { .. } => self.escaped += 1,
                Event::AgentStateChanged {
                    state: AgentState::Stuck,
                    ..
                } => self.stuck_transitions += 1,
                Event::PathChanged { .. } => self.path_changes += 1,
                Event::TowerPlacementRejected { kind, tile, reason } => {
                    warn!(kind = kind.label(), ?tile, %reason, "tower rejected");
                }
                _ => {}
            }
        }
    }
}

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("invalid log filter `{default_filter}`"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Entry point for the Tile Defense command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    let mut world =
        World::new(scenario.world.clone()).context("failed to construct the world")?;
    let mut spawning = Spawning::new(scenario.spawning.to_config());
    let mut summary = RunSummary::default();
    let mut events = Vec::new();

    let placements = scenario
        .towers
        .iter()
        .map(|placement| (placement.kind, placement.tile))
        .chain(cli.towers.iter().map(|tile| (TowerKind::Basic, *tile)));
    for (kind, tile) in placements {
        world::apply(&mut world, Command::PlaceTower { kind, tile }, &mut events);
    }
    summary.record(&events);
    info!(
        waypoints = query::canonical_path(&world).len(),
        towers = query::objects(&world)
            .filter(|(_, object)| object.as_tower().is_some())
            .count(),
        "level prepared"
    );

    let dt = Duration::from_millis(cli.tick_ms);
    let mut commands = Vec::new();
    for frame in 0..cli.ticks {
        events.clear();
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        spawning.handle(&events, query::play_mode(&world), &mut commands);
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
        summary.record(&events);

        if query::lives(&world) == 0 {
            warn!(frame, "no lives left");
            break;
        }
        debug!(frame, enemies = query::enemy_positions(&world).len(), "frame complete");
    }

    print!("{}", map::render(&world));
    println!(
        "level {} | lives {} | spawned {} | escaped {} | stuck {} | path changes {} | enemies on grid {}",
        query::level(&world),
        query::lives(&world),
        summary.spawned,
        summary.escaped,
        summary.stuck_transitions,
        summary.path_changes,
        query::enemy_positions(&world).len(),
    );
    Ok(())
}
