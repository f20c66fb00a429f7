#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduling and timed spawn release.
//!
//! The scheduler owns the authored wave roster, expands one wave at a time
//! into a time-ordered spawn queue, and releases due entries as elapsed time
//! is reported. Its only side effects are the spawn events it returns and the
//! set of live enemies it tracks; everything else (entity construction,
//! motion, combat) belongs to external collaborators.

mod patterns;

use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rampart_core::{
    EnemyId, RosterError, SpawnEvent, SpawnPattern, SpawnQueueEntry, WaveConfig, WaveFlavor,
    WaveNumber, WavePhase, WaveStartError, WaveState,
};
use rampart_system_wave_generation::WaveGenerator;
use serde::{Deserialize, Serialize};

use crate::patterns::{resolve_spawn_point, PatternState};

/// Configuration parameters required to construct the scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided random stream seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Orchestrates wave timing, spawn quantity, and spawn origin.
///
/// Lifecycle per wave: idle until [`SpawnScheduler::start_wave`] succeeds,
/// spawning while queue entries remain, drained-but-active while tracked
/// enemies are still alive, and idle again once the queue is empty and every
/// tracked enemy has been reported removed.
#[derive(Debug)]
pub struct SpawnScheduler {
    roster: Vec<WaveConfig>,
    generator: WaveGenerator,
    spawn_points: Vec<Vec2>,
    active: Option<ActiveWave>,
    tracked: BTreeSet<EnemyId>,
    next_enemy_id: u32,
    round_robin_cursor: usize,
    rng: ChaCha8Rng,
}

#[derive(Debug)]
struct ActiveWave {
    wave_number: WaveNumber,
    flavor: WaveFlavor,
    elapsed: Duration,
    queue: VecDeque<SpawnQueueEntry>,
}

/// Serializable mid-wave scheduler state.
///
/// Restoring a snapshot reproduces identical subsequent [`SpawnScheduler::update`]
/// outputs for identical elapsed-time inputs: queue entries are persisted
/// verbatim and the random stream state travels with them. The authored
/// roster and spawn point list are configuration, not state, and are not part
/// of the snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    wave_number: Option<WaveNumber>,
    flavor: Option<WaveFlavor>,
    elapsed: Duration,
    queue: Vec<SpawnQueueEntry>,
    tracked: Vec<EnemyId>,
    next_enemy_id: u32,
    round_robin_cursor: usize,
    rng: ChaCha8Rng,
}

impl SpawnScheduler {
    /// Creates a scheduler with an empty roster and the provided generator
    /// for waves beyond it.
    #[must_use]
    pub fn new(config: Config, generator: WaveGenerator) -> Self {
        Self {
            roster: Vec::new(),
            generator,
            spawn_points: Vec::new(),
            active: None,
            tracked: BTreeSet::new(),
            next_enemy_id: 0,
            round_robin_cursor: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Generator consulted for waves beyond the authored roster.
    #[must_use]
    pub const fn generator(&self) -> &WaveGenerator {
        &self.generator
    }

    /// Replaces the spawn point list used to resolve world positions.
    pub fn set_spawn_points(&mut self, points: Vec<Vec2>) {
        self.spawn_points = points;
    }

    /// Replaces the authored wave roster.
    ///
    /// The roster must be non-empty with strictly increasing wave numbers;
    /// a rejected roster leaves the previous one in place.
    pub fn load_waves(&mut self, roster: Vec<WaveConfig>) -> Result<(), RosterError> {
        if roster.is_empty() {
            return Err(RosterError::Empty);
        }
        for pair in roster.windows(2) {
            if pair[1].wave_number <= pair[0].wave_number {
                return Err(RosterError::NonIncreasing {
                    previous: pair[0].wave_number,
                    offending: pair[1].wave_number,
                });
            }
        }
        self.roster = roster;
        Ok(())
    }

    /// Starts the provided wave, materializing its complete spawn queue.
    ///
    /// The request is rejected atomically, with no state mutation, while a
    /// wave is active, when no spawn points are configured, or when the wave
    /// number falls inside the authored roster without matching an entry.
    /// Wave numbers beyond the authored roster are synthesized by the
    /// generator.
    ///
    /// For every enemy contingent, `count` entries are scheduled at
    /// `start_delay + index * spawn_delay`: each enemy type's delay timer
    /// starts independently at the wave's start delay rather than chaining
    /// after the previous type's last spawn. Entries are stably sorted by
    /// due time, and spawn points are resolved here so the queue persists
    /// verbatim across snapshots.
    pub fn start_wave(&mut self, wave: WaveNumber) -> Result<(), WaveStartError> {
        if self.active.is_some() {
            return Err(WaveStartError::WaveActive);
        }
        if self.spawn_points.is_empty() {
            return Err(WaveStartError::NoSpawnPoints);
        }

        let authored = self.roster.iter().find(|entry| entry.wave_number == wave);
        let (config, flavor) = match authored {
            Some(config) => (config.clone(), WaveFlavor::Standard),
            None => {
                let beyond_roster = self
                    .roster
                    .last()
                    .map_or(true, |last| wave > last.wave_number);
                if !beyond_roster {
                    return Err(WaveStartError::UnknownWave(wave));
                }
                let generated = self.generator.generate(wave);
                (generated.config, generated.flavor)
            }
        };

        let queue = self.materialize(&config);
        self.active = Some(ActiveWave {
            wave_number: wave,
            flavor,
            elapsed: Duration::ZERO,
            queue,
        });
        Ok(())
    }

    /// Advances wave time and releases every spawn entry that came due.
    ///
    /// Entries are released in queue order; ties on the schedule preserve
    /// construction order. Once the queue drains and no tracked enemies
    /// remain, the scheduler returns to idle.
    pub fn update(&mut self, dt: Duration) -> Vec<SpawnEvent> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };

        active.elapsed = active.elapsed.saturating_add(dt);
        let mut released = Vec::new();

        while let Some(entry) = active.queue.front().copied() {
            if entry.scheduled_at > active.elapsed {
                break;
            }
            let _ = active.queue.pop_front();
            let enemy = EnemyId::new(self.next_enemy_id);
            self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
            let _ = self.tracked.insert(enemy);
            released.push(SpawnEvent {
                enemy,
                kind: entry.kind,
                position: resolve_position(&self.spawn_points, entry.spawn_point),
                wave: active.wave_number,
            });
        }

        self.settle();
        released
    }

    /// Removes an enemy from the tracked set following an external liveness
    /// report. Returns whether the enemy was tracked.
    pub fn notify_enemy_removed(&mut self, enemy: EnemyId) -> bool {
        let removed = self.tracked.remove(&enemy);
        self.settle();
        removed
    }

    /// Reports whether the current wave has fully resolved: spawn queue
    /// empty and zero tracked enemies alive.
    #[must_use]
    pub fn is_wave_complete(&self) -> bool {
        let queue_empty = self
            .active
            .as_ref()
            .map_or(true, |active| active.queue.is_empty());
        queue_empty && self.tracked.is_empty()
    }

    /// Cancels the active wave by clearing its remaining queue.
    ///
    /// Already-spawned tracked enemies are unaffected; they continue to hold
    /// the scheduler in the drained-active phase until reported removed.
    pub fn cancel_wave(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.queue.clear();
        }
        self.settle();
    }

    /// Point-in-time summary of wave progress.
    #[must_use]
    pub fn wave_state(&self) -> WaveState {
        match self.active.as_ref() {
            None => WaveState {
                wave_number: None,
                phase: WavePhase::Idle,
                elapsed: Duration::ZERO,
                queued: 0,
                live: self.tracked.len(),
            },
            Some(active) => WaveState {
                wave_number: Some(active.wave_number),
                phase: if active.queue.is_empty() {
                    WavePhase::DrainedActive
                } else {
                    WavePhase::Spawning
                },
                elapsed: active.elapsed,
                queued: active.queue.len(),
                live: self.tracked.len(),
            },
        }
    }

    /// Flavor of the active wave, for UI notification surfaces.
    #[must_use]
    pub fn active_flavor(&self) -> Option<WaveFlavor> {
        self.active.as_ref().map(|active| active.flavor)
    }

    /// Identifiers of every enemy spawned and not yet reported removed, in
    /// ascending order. Lets a collaborator reconcile its own records after
    /// restoring a snapshot.
    #[must_use]
    pub fn tracked_enemies(&self) -> Vec<EnemyId> {
        self.tracked.iter().copied().collect()
    }

    /// Captures the persistable mid-wave state.
    #[must_use]
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            wave_number: self.active.as_ref().map(|active| active.wave_number),
            flavor: self.active.as_ref().map(|active| active.flavor),
            elapsed: self
                .active
                .as_ref()
                .map_or(Duration::ZERO, |active| active.elapsed),
            queue: self
                .active
                .as_ref()
                .map_or_else(Vec::new, |active| active.queue.iter().copied().collect()),
            tracked: self.tracked.iter().copied().collect(),
            next_enemy_id: self.next_enemy_id,
            round_robin_cursor: self.round_robin_cursor,
            rng: self.rng.clone(),
        }
    }

    /// Restores a previously captured snapshot, replacing any active wave.
    ///
    /// Roster, generator, and spawn points are configuration and survive
    /// untouched.
    pub fn restore(&mut self, snapshot: SchedulerSnapshot) {
        self.active = match (snapshot.wave_number, snapshot.flavor) {
            (Some(wave_number), Some(flavor)) => Some(ActiveWave {
                wave_number,
                flavor,
                elapsed: snapshot.elapsed,
                queue: snapshot.queue.into_iter().collect(),
            }),
            _ => None,
        };
        self.tracked = snapshot.tracked.into_iter().collect();
        self.next_enemy_id = snapshot.next_enemy_id;
        self.round_robin_cursor = snapshot.round_robin_cursor;
        self.rng = snapshot.rng;
    }

    fn materialize(&mut self, config: &WaveConfig) -> VecDeque<SpawnQueueEntry> {
        let wave_pattern = config.spawn_pattern.unwrap_or(SpawnPattern::SinglePoint);
        let mut entries: Vec<(SpawnQueueEntry, SpawnPattern)> = Vec::new();

        for enemy in &config.enemies {
            let pattern = enemy.pattern_override.unwrap_or(wave_pattern);
            for index in 0..enemy.count.get() {
                entries.push((
                    SpawnQueueEntry {
                        kind: enemy.kind,
                        scheduled_at: config.start_delay + enemy.spawn_delay * index,
                        spawn_point: 0,
                    },
                    pattern,
                ));
            }
        }

        entries.sort_by_key(|(entry, _)| entry.scheduled_at);

        let point_count = self.spawn_points.len();
        let mut state = PatternState {
            round_robin_cursor: &mut self.round_robin_cursor,
            rng: &mut self.rng,
            burst_point: None,
        };
        entries
            .into_iter()
            .enumerate()
            .map(|(position, (mut entry, pattern))| {
                entry.spawn_point = resolve_spawn_point(pattern, position, point_count, &mut state);
                entry
            })
            .collect()
    }

    fn settle(&mut self) {
        let drained = self
            .active
            .as_ref()
            .is_some_and(|active| active.queue.is_empty());
        if drained && self.tracked.is_empty() {
            self.active = None;
        }
    }
}

fn resolve_position(points: &[Vec2], index: usize) -> Vec2 {
    // A shrunken point list after a restore degrades to wrapping; the list is
    // never empty while a wave is active.
    match points.get(index) {
        Some(position) => *position,
        None => points
            .get(index % points.len().max(1))
            .copied()
            .unwrap_or(Vec2::ZERO),
    }
}
