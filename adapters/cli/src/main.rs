#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives a headless Rampart Defence simulation.
//!
//! The binary stands in for the game shell: it configures the terrain,
//! places a handful of towers, routes each spawn zone to the destination,
//! and then runs waves through the scheduler, printing every spawn event.
//! Enemy lifetime is simulated as one tick per route cell, which exercises
//! the liveness-notification contract without a motion subsystem.

mod snapshot_transfer;

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use rampart_core::{
    CellCoord, Command, EnemyId, EnemyKind, EnemySpawnConfig, SpawnPattern, WaveConfig,
    WaveNumber, WavePhase,
};
use rampart_system_pathfinding::PathSearch;
use rampart_system_spawning::{Config, SpawnScheduler};
use rampart_system_wave_generation::WaveGenerator;
use rampart_world::{self as world, query, World};

/// Ticks an enemy survives when no route can be computed for it.
const FALLBACK_LIFETIME_TICKS: u32 = 10;
/// Upper bound on simulated ticks per wave before the run is aborted.
const MAX_TICKS_PER_WAVE: u32 = 100_000;

/// Command-line options for the simulation driver.
#[derive(Debug, Parser)]
#[command(
    name = "rampart-defence",
    about = "Headless driver for the Rampart Defence simulation core"
)]
struct Options {
    /// Number of grid columns.
    #[arg(long, default_value_t = 24)]
    columns: u32,
    /// Number of grid rows.
    #[arg(long, default_value_t = 16)]
    rows: u32,
    /// Edge length of one grid cell in world units.
    #[arg(long, default_value_t = 32.0)]
    cell_length: f32,
    /// Number of waves to simulate.
    #[arg(long, default_value_t = 5)]
    waves: u32,
    /// Seed shared by the scheduler stream and the wave generator.
    #[arg(long, default_value_t = 0x5eed_0000_0000_0001)]
    seed: u64,
    /// Simulation tick length in milliseconds.
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,
    /// Towers placed on the first buildable cells before the assault.
    #[arg(long, default_value_t = 4)]
    towers: u32,
    /// Resume from a snapshot token printed by `--snapshot-at-wave`.
    #[arg(long)]
    resume: Option<String>,
    /// Print a snapshot token after the given wave's first spawn and exit.
    #[arg(long)]
    snapshot_at_wave: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    let tick = Duration::from_millis(options.tick_ms.max(1));

    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureGrid {
            columns: options.columns,
            rows: options.rows,
            cell_length: options.cell_length,
        },
        &mut events,
    );
    println!("{}", query::welcome_banner(&world));

    place_towers(&mut world, options.towers);
    let mut search = PathSearch::default();
    report_routes(&world, &mut search)?;

    let mut scheduler =
        SpawnScheduler::new(Config::new(options.seed), WaveGenerator::new(options.seed));
    scheduler.set_spawn_points(query::spawn_positions(&world));
    scheduler
        .load_waves(authored_roster())
        .context("authored roster is invalid")?;

    let mut next_wave = WaveNumber::FIRST;
    if let Some(token) = options.resume.as_deref() {
        let snapshot = snapshot_transfer::decode(token)
            .map_err(|error| anyhow!(error))
            .context("could not decode the --resume token")?;
        scheduler.restore(snapshot);
        if let Some(active) = scheduler.wave_state().wave_number {
            println!("resuming wave {active} mid-flight");
            if run_wave(&mut scheduler, &world, &mut search, tick, &options)? {
                return Ok(());
            }
            next_wave = active.next();
        }
    }

    while next_wave.get() <= options.waves {
        scheduler
            .start_wave(next_wave)
            .with_context(|| format!("could not start wave {next_wave}"))?;
        announce_wave(&scheduler, next_wave);
        if run_wave(&mut scheduler, &world, &mut search, tick, &options)? {
            return Ok(());
        }
        next_wave = next_wave.next();
    }

    println!("assault finished after {} wave(s)", options.waves);
    Ok(())
}

/// Hand-authored opening waves; everything past them comes from the
/// procedural generator.
fn authored_roster() -> Vec<WaveConfig> {
    let count = |n: u32| NonZeroU32::new(n).expect("authored counts are positive");
    vec![
        WaveConfig {
            wave_number: WaveNumber::FIRST,
            enemies: vec![EnemySpawnConfig::new(
                EnemyKind::Grunt,
                count(6),
                Duration::from_millis(900),
            )],
            start_delay: Duration::from_millis(1_500),
            spawn_pattern: None,
        },
        WaveConfig {
            wave_number: WaveNumber::FIRST.next(),
            enemies: vec![
                EnemySpawnConfig::new(EnemyKind::Grunt, count(6), Duration::from_millis(800)),
                EnemySpawnConfig::new(EnemyKind::Scout, count(4), Duration::from_millis(500)),
            ],
            start_delay: Duration::from_millis(1_200),
            spawn_pattern: Some(SpawnPattern::RoundRobin),
        },
    ]
}

fn place_towers(world: &mut World, requested: u32) {
    let mut placed = 0;
    let mut events = Vec::new();
    let (columns, rows) = {
        let grid = query::terrain_grid(world);
        (grid.columns(), grid.rows())
    };

    'rows: for row in 0..rows {
        for column in 0..columns {
            if placed == requested {
                break 'rows;
            }
            let cell = CellCoord::new(column, row);
            if !query::terrain_grid(world).is_buildable(cell) {
                continue;
            }
            world::apply(world, Command::PlaceTower { cell }, &mut events);
            placed += 1;
        }
    }

    println!("placed {placed} tower(s)");
}

fn report_routes(world: &World, search: &mut PathSearch) -> anyhow::Result<()> {
    let grid = query::terrain_grid(world);
    let destination = *grid
        .destination_cells()
        .first()
        .ok_or_else(|| anyhow!("generated grid carries no destination"))?;

    for spawn in grid.spawn_cells() {
        let view = query::terrain_view(world);
        match search.find_path(&view, *spawn, destination) {
            Some(path) => println!(
                "route from ({}, {}) reaches the destination in {} cells",
                spawn.column(),
                spawn.row(),
                path.len()
            ),
            None => println!(
                "route from ({}, {}) is blocked; spawns there will mill around",
                spawn.column(),
                spawn.row()
            ),
        }
    }
    Ok(())
}

fn announce_wave(scheduler: &SpawnScheduler, wave: WaveNumber) {
    let generator = scheduler.generator();
    let flavor = scheduler
        .active_flavor()
        .map_or("Wave", |flavor| flavor.description());
    println!(
        "wave {wave} ({flavor}): reward {}, health x{:.2}, damage x{:.2}",
        generator.reward(wave),
        generator.health_multiplier(wave),
        generator.damage_multiplier(wave),
    );
}

/// Runs the active wave to completion, returning `true` when the run emitted
/// a snapshot token and should exit.
fn run_wave(
    scheduler: &mut SpawnScheduler,
    world: &World,
    search: &mut PathSearch,
    tick: Duration,
    options: &Options,
) -> anyhow::Result<bool> {
    let grid = query::terrain_grid(world);
    let destination = grid.destination_cells().first().copied();
    // Enemies inherited from a restored snapshot have no recorded route;
    // give them the fallback lifetime so the wave can still drain.
    let mut lifetimes: VecDeque<(u32, EnemyId)> = scheduler
        .tracked_enemies()
        .into_iter()
        .map(|enemy| (FALLBACK_LIFETIME_TICKS, enemy))
        .collect();
    let mut now: u32 = 0;
    let snapshot_wave = options
        .snapshot_at_wave
        .and_then(WaveNumber::new)
        .filter(|wave| scheduler.wave_state().wave_number == Some(*wave));

    loop {
        now += 1;
        if now > MAX_TICKS_PER_WAVE {
            bail!("wave exceeded {MAX_TICKS_PER_WAVE} ticks without draining");
        }

        let released = scheduler.update(tick);
        for event in &released {
            let lifetime = enemy_lifetime(world, search, destination, event.position);
            lifetimes.push_back((now + lifetime, event.enemy));
            println!(
                "  t+{:>6}ms wave {} spawns {} #{} at ({:.1}, {:.1})",
                scheduler.wave_state().elapsed.as_millis(),
                event.wave,
                event.kind,
                event.enemy.get(),
                event.position.x,
                event.position.y,
            );
        }

        if !released.is_empty() {
            if let Some(wave) = snapshot_wave {
                let token = snapshot_transfer::encode(&scheduler.snapshot());
                println!("snapshot of wave {wave} captured; resume with:");
                println!("{token}");
                return Ok(true);
            }
        }

        // Lifetimes are not monotonic in spawn order; sweep the whole set.
        let mut survivors = VecDeque::with_capacity(lifetimes.len());
        for (expires, enemy) in lifetimes.drain(..) {
            if expires <= now {
                let _ = scheduler.notify_enemy_removed(enemy);
            } else {
                survivors.push_back((expires, enemy));
            }
        }
        lifetimes = survivors;

        if scheduler.wave_state().phase == WavePhase::Idle {
            return Ok(false);
        }
    }
}

fn enemy_lifetime(
    world: &World,
    search: &mut PathSearch,
    destination: Option<CellCoord>,
    position: glam::Vec2,
) -> u32 {
    let grid = query::terrain_grid(world);
    let route = destination.and_then(|destination| {
        let origin = grid.world_to_grid(position)?;
        search.find_path(&query::terrain_view(world), origin, destination)
    });
    match route {
        Some(path) => u32::try_from(path.len()).unwrap_or(FALLBACK_LIFETIME_TICKS),
        None => FALLBACK_LIFETIME_TICKS,
    }
}
