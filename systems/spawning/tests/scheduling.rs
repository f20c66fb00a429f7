use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use rampart_core::{Command, EnemyKind, WaveNumber, WavePhase};
use rampart_system_spawning::{Config, SpawnScheduler};
use rampart_system_wave_generation::WaveGenerator;
use rampart_world::{self as world, query, World};

const TICK: Duration = Duration::from_millis(250);
const SCHEDULER_SEED: u64 = 0x4d59_5df4_d0f3_3173;
const GENERATOR_SEED: u64 = 0x5eed_cafe_0000_0042;

fn configured_world() -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureGrid {
            columns: 16,
            rows: 12,
            cell_length: 24.0,
        },
        &mut events,
    );
    world
}

fn scheduler_for(world: &World) -> SpawnScheduler {
    let mut scheduler = SpawnScheduler::new(
        Config::new(SCHEDULER_SEED),
        WaveGenerator::new(GENERATOR_SEED),
    );
    scheduler.set_spawn_points(query::spawn_positions(world));
    scheduler
}

#[test]
fn spawn_positions_land_on_world_spawn_cells() {
    let world = configured_world();
    let grid = query::terrain_grid(&world);
    let mut scheduler = scheduler_for(&world);

    scheduler
        .start_wave(WaveNumber::FIRST)
        .expect("generated first wave");

    let mut spawned = 0;
    for _ in 0..200 {
        for event in scheduler.update(TICK) {
            spawned += 1;
            let cell = grid
                .world_to_grid(event.position)
                .expect("spawn position inside the grid");
            assert!(
                grid.spawn_cells().contains(&cell),
                "spawn at {:?} missed the spawn zone",
                event.position
            );
        }
        if scheduler.wave_state().phase == WavePhase::DrainedActive {
            break;
        }
    }
    assert!(spawned > 0, "wave released no enemies");
}

#[test]
fn waves_run_to_completion_once_enemies_are_cleared() {
    let world = configured_world();
    let mut scheduler = scheduler_for(&world);

    scheduler
        .start_wave(WaveNumber::FIRST)
        .expect("generated first wave");

    let mut live = Vec::new();
    for _ in 0..400 {
        for event in scheduler.update(TICK) {
            live.push(event.enemy);
        }
        if scheduler.wave_state().queued == 0 {
            break;
        }
    }

    assert!(!scheduler.is_wave_complete(), "enemies still alive");
    for enemy in live {
        assert!(scheduler.notify_enemy_removed(enemy));
    }
    assert!(scheduler.is_wave_complete());

    // The next wave can start immediately once the field is clear.
    scheduler
        .start_wave(WaveNumber::FIRST.next())
        .expect("second wave starts after completion");
}

#[test]
fn deterministic_replay_produces_identical_sequence() {
    let first = replay();
    let second = replay();
    assert_eq!(first, second, "replay diverged between runs");
}

fn replay() -> Vec<ReplayRecord> {
    let world = configured_world();
    let mut scheduler = scheduler_for(&world);
    let mut log = Vec::new();

    for n in 1..=3u32 {
        let wave = WaveNumber::new(n).expect("non-zero wave");
        scheduler.start_wave(wave).expect("wave starts");

        for _ in 0..400 {
            for event in scheduler.update(TICK) {
                log.push(ReplayRecord {
                    enemy: event.enemy.get(),
                    kind: event.kind,
                    wave: event.wave.get(),
                    position: (
                        event.position.x.to_bits(),
                        event.position.y.to_bits(),
                    ),
                });
                assert!(scheduler.notify_enemy_removed(event.enemy));
            }
            if scheduler.wave_state().phase == WavePhase::Idle {
                break;
            }
        }
        assert!(scheduler.is_wave_complete(), "wave {n} never drained");
    }

    log
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayRecord {
    enemy: u32,
    kind: EnemyKind,
    wave: u32,
    position: (u32, u32),
}

#[test]
fn replay_fingerprint_is_stable_within_a_run() {
    let mut hasher = DefaultHasher::new();
    replay().hash(&mut hasher);
    let first = hasher.finish();

    let mut hasher = DefaultHasher::new();
    replay().hash(&mut hasher);
    assert_eq!(first, hasher.finish());
}
