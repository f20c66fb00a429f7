#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative terrain world, and pure systems. Adapters submit [`Command`]
//! values describing desired grid mutations, the world executes those commands
//! via its `apply` entry point and broadcasts [`Event`] values in response.
//! Systems consume immutable views and configuration records, and answer with
//! path results and spawn events for external collaborators to act on.

use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the simulation boots.
pub const WELCOME_BANNER: &str = "Rampart Defence simulation core ready.";

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Computes the Chebyshev distance between two cell coordinates.
    ///
    /// This is the grid distance under 8-connected movement where diagonal
    /// steps count the same as cardinal ones.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }
}

/// Terrain or occupancy category assigned to one grid cell.
///
/// The set is closed: every cell carries exactly one classification for the
/// lifetime of the grid, and mutation replaces the value in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellClassification {
    /// Unoccupied ground open for traversal and construction.
    Empty,
    /// Designated route cell reserved for enemy traffic.
    Path,
    /// Cell occupied by a player-placed tower.
    Tower,
    /// Permanently impassable cell.
    Blocked,
    /// Map decoration that obstructs traversal but is not player-placed.
    Obstacle,
    /// Traversable ground that slows units crossing it.
    Rough,
    /// Open water; impassable unless bridged.
    Water,
    /// Walkable crossing laid over water.
    Bridge,
    /// Cell belonging to an enemy spawn zone.
    Spawn,
    /// Cell belonging to the defended destination zone.
    Destination,
}

impl CellClassification {
    /// Reports whether a tower may be constructed on a cell of this kind.
    ///
    /// Only open ground qualifies; path, blocked, and otherwise occupied
    /// classifications never do.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(self, Self::Empty | Self::Rough)
    }

    /// Base cost of stepping onto a cell of this kind.
    ///
    /// Costs are expressed in tenths so that diagonal steps can be weighted
    /// without floating point: a cardinal step over ordinary ground costs 10.
    /// Rough terrain costs more, matching the motion subsystem's
    /// per-classification speed table. The cost is defined for every
    /// classification; whether a classification is passable at all is decided
    /// separately by [`ClassificationSet`].
    #[must_use]
    pub const fn traversal_cost(self) -> u32 {
        match self {
            Self::Rough => 25,
            Self::Water => 40,
            _ => 10,
        }
    }

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Closed set of classifications, used to configure impassability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassificationSet(u16);

impl ClassificationSet {
    /// The empty set.
    pub const NONE: Self = Self(0);

    /// Returns the set extended with the provided classification.
    #[must_use]
    pub const fn with(self, classification: CellClassification) -> Self {
        Self(self.0 | classification.bit())
    }

    /// Reports whether the set contains the provided classification.
    #[must_use]
    pub const fn contains(&self, classification: CellClassification) -> bool {
        self.0 & classification.bit() != 0
    }

    /// The default impassable set used by path search: blocked cells,
    /// towers, obstacles, and open water.
    #[must_use]
    pub const fn default_impassable() -> Self {
        Self::NONE
            .with(CellClassification::Blocked)
            .with(CellClassification::Tower)
            .with(CellClassification::Obstacle)
            .with(CellClassification::Water)
    }
}

/// Cosmetic terrain variant attached to cells for presentation purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiomeVariant {
    /// Temperate grassland.
    Meadow,
    /// Dense woodland.
    Forest,
    /// Frozen ground.
    Tundra,
    /// Scorched volcanic soil.
    Ashland,
}

/// State of a single grid cell: classification plus per-cell metadata.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCell {
    /// Terrain or occupancy category of the cell.
    pub classification: CellClassification,
    /// Normalized elevation of the cell in `[0, 1]`.
    pub height: f32,
    /// Cosmetic biome variant, when the map generator assigned one.
    pub biome: Option<BiomeVariant>,
}

impl GridCell {
    /// Creates a flat, unadorned cell of the provided classification.
    #[must_use]
    pub const fn flat(classification: CellClassification) -> Self {
        Self {
            classification,
            height: 0.0,
            biome: None,
        }
    }
}

/// Unique identifier assigned to a spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Categories of hostile units the scheduler can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline infantry unit.
    Grunt,
    /// Fast, fragile runner.
    Scout,
    /// Slow, armoured bruiser.
    Brute,
    /// Boss-tier unit fielded on milestone waves.
    Colossus,
}

impl EnemyKind {
    /// Reports whether the kind counts toward a wave's heavy contingent.
    #[must_use]
    pub const fn is_heavy(self) -> bool {
        matches!(self, Self::Brute | Self::Colossus)
    }

    /// Inclusive bounds, in milliseconds, for the kind's spawn cadence.
    ///
    /// The wave generator samples a per-wave delay from this range; authored
    /// rosters are free to ignore it.
    #[must_use]
    pub const fn cadence_range_ms(self) -> (u32, u32) {
        match self {
            Self::Grunt => (700, 1_100),
            Self::Scout => (350, 600),
            Self::Brute => (1_400, 2_200),
            Self::Colossus => (2_800, 4_000),
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Grunt => "Grunt",
            Self::Scout => "Scout",
            Self::Brute => "Brute",
            Self::Colossus => "Colossus",
        };
        f.write_str(name)
    }
}

/// One-based wave index. Wave numbering starts at 1 and is unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveNumber(NonZeroU32);

impl WaveNumber {
    /// The first wave.
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Creates a wave number, rejecting zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Retrieves the numeric wave index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }

    /// The wave following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for WaveNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Rule selecting which spawn point an enemy instance originates from.
///
/// The first four patterns are correctness-critical and fully deterministic;
/// the named variants below them layer clustering and randomness for variety
/// and are documented as cosmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnPattern {
    /// Every enemy emerges from spawn point 0.
    SinglePoint,
    /// Uniformly random spawn point per enemy.
    Random,
    /// Cycles through spawn points; the cursor persists across waves.
    RoundRobin,
    /// Queue position modulo point count; deterministic spread.
    Distributed,
    /// Clusters spawns toward the outermost spawn points.
    EdgeFocused,
    /// Alternates between the two extreme spawn points.
    CornerFocused,
    /// Releases enemies in bursts sharing one randomly chosen point.
    BurstSpawn,
    /// Splits the wave between the two halves of the spawn line.
    PincerMovement,
    /// Round-robin with occasional random skips.
    AdaptiveSpawn,
    /// Fully randomized point choice with no clustering at all.
    ChaosMode,
}

/// Quantity and timing of one enemy type inside a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawnConfig {
    /// Kind of enemy to emit.
    pub kind: EnemyKind,
    /// How many enemies of this kind the wave contains.
    pub count: NonZeroU32,
    /// Delay between successive spawns of this kind.
    ///
    /// The delay timer starts at the wave's `start_delay` independently for
    /// every enemy type; types are never chained after one another.
    pub spawn_delay: Duration,
    /// Overrides the wave-level spawn pattern for this kind when present.
    pub pattern_override: Option<SpawnPattern>,
}

impl EnemySpawnConfig {
    /// Creates a spawn configuration without a pattern override.
    #[must_use]
    pub const fn new(kind: EnemyKind, count: NonZeroU32, spawn_delay: Duration) -> Self {
        Self {
            kind,
            count,
            spawn_delay,
            pattern_override: None,
        }
    }
}

/// Complete description of one combat wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// One-based index of the wave.
    pub wave_number: WaveNumber,
    /// Ordered enemy contingents composing the wave.
    pub enemies: Vec<EnemySpawnConfig>,
    /// Delay between wave start and the first possible spawn.
    pub start_delay: Duration,
    /// Wave-level spawn pattern; [`SpawnPattern::SinglePoint`] when absent.
    pub spawn_pattern: Option<SpawnPattern>,
}

/// One pending spawn inside the active wave's time-ordered queue.
///
/// Entries are materialized in full at wave start with their spawn point
/// already resolved, so a persisted queue replays verbatim after a restore.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnQueueEntry {
    /// Kind of enemy this entry releases.
    pub kind: EnemyKind,
    /// Wave-relative time at which the entry becomes due.
    pub scheduled_at: Duration,
    /// Index into the scheduler's spawn point list.
    pub spawn_point: usize,
}

/// Lifecycle phase of the spawn scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// No wave is active.
    Idle,
    /// A wave is active and spawn queue entries remain.
    Spawning,
    /// The queue is drained but tracked enemies are still alive.
    DrainedActive,
}

/// Point-in-time summary of the scheduler's wave progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveState {
    /// Wave currently active, if any.
    pub wave_number: Option<WaveNumber>,
    /// Lifecycle phase of the scheduler.
    pub phase: WavePhase,
    /// Time elapsed since the active wave started.
    pub elapsed: Duration,
    /// Spawn queue entries not yet released.
    pub queued: usize,
    /// Enemies spawned by this scheduler and not yet reported removed.
    pub live: usize,
}

/// Spawn descriptor released by the scheduler for the entity factory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnEvent {
    /// Identifier the scheduler tracks the enemy under.
    pub enemy: EnemyId,
    /// Kind of enemy to construct.
    pub kind: EnemyKind,
    /// World-space position the enemy originates from.
    pub position: Vec2,
    /// Wave the enemy belongs to.
    pub wave: WaveNumber,
}

/// Stat multipliers the entity factory applies at construction time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyMultipliers {
    /// Hit point multiplier relative to the kind's base health.
    pub health: f32,
    /// Damage multiplier relative to the kind's base damage.
    pub damage: f32,
}

/// Special-wave category of a generated wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveFlavor {
    /// Ordinary wave with the mix dictated by the step table.
    Standard,
    /// Tank-heavy milestone wave with boosted multipliers.
    Boss,
    /// Numerous but individually weaker enemies.
    Swarm,
    /// Few but individually stronger enemies.
    Elite,
    /// Fast-type enemies only.
    Speed,
}

impl WaveFlavor {
    /// Human-readable description surfaced to UI notification layers.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Standard => "Wave",
            Self::Boss => "Boss Wave",
            Self::Swarm => "Swarm Wave",
            Self::Elite => "Elite Wave",
            Self::Speed => "Speed Wave",
        }
    }
}

impl fmt::Display for WaveFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Replaces the terrain grid with a freshly generated layout.
    ConfigureGrid {
        /// Number of cell columns in the new grid.
        columns: u32,
        /// Number of cell rows in the new grid.
        rows: u32,
        /// Edge length of each square cell in world units.
        cell_length: f32,
    },
    /// Reclassifies a single cell in place.
    SetClassification {
        /// Cell to mutate.
        cell: CellCoord,
        /// Classification to assign.
        classification: CellClassification,
    },
    /// Requests construction of a tower on the provided cell.
    PlaceTower {
        /// Cell the tower should occupy.
        cell: CellCoord,
    },
    /// Requests removal of the tower occupying the provided cell.
    RemoveTower {
        /// Cell the tower currently occupies.
        cell: CellCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new terrain grid was generated.
    GridConfigured {
        /// Number of cell columns in the grid.
        columns: u32,
        /// Number of cell rows in the grid.
        rows: u32,
        /// Edge length of each square cell in world units.
        cell_length: f32,
    },
    /// Confirms that a cell's classification changed.
    ///
    /// Any previously computed path crossing the cell is invalid from this
    /// point on; the core caches nothing and callers that do must refresh.
    ClassificationChanged {
        /// Cell that was mutated.
        cell: CellCoord,
        /// Classification now occupying the cell.
        classification: CellClassification,
    },
    /// Confirms that a tower was constructed.
    TowerPlaced {
        /// Cell occupied by the new tower.
        cell: CellCoord,
        /// Classification the tower displaced.
        displaced: CellClassification,
    },
    /// Confirms that a tower was removed.
    TowerRemoved {
        /// Cell the tower previously occupied.
        cell: CellCoord,
        /// Classification restored to the cell.
        restored: CellClassification,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Cell provided in the removal request.
        cell: CellCoord,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the configured grid.
    #[error("cell lies outside the configured grid")]
    OutOfBounds,
    /// The requested cell's classification does not permit construction.
    #[error("cell is not buildable")]
    NotBuildable,
}

/// Reasons a tower removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RemovalError {
    /// The requested cell lies outside the configured grid.
    #[error("cell lies outside the configured grid")]
    OutOfBounds,
    /// The requested cell does not hold a tower.
    #[error("no tower occupies the cell")]
    NoTower,
}

/// Reasons the scheduler may reject a `start_wave` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum WaveStartError {
    /// A wave is already active; the request mutated nothing.
    #[error("a wave is already active")]
    WaveActive,
    /// The wave number falls inside the authored roster but matches no entry.
    #[error("wave {0} is not present in the authored roster")]
    UnknownWave(WaveNumber),
    /// No spawn points have been configured.
    #[error("no spawn points are configured")]
    NoSpawnPoints,
}

/// Reasons an authored roster may be rejected by `load_waves`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum RosterError {
    /// The provided roster contained no waves.
    #[error("authored roster is empty")]
    Empty,
    /// Wave numbers did not strictly increase.
    #[error("wave numbers must strictly increase (wave {offending} follows wave {previous})")]
    NonIncreasing {
        /// Wave number preceding the violation.
        previous: WaveNumber,
        /// Wave number that failed to increase.
        offending: WaveNumber,
    },
}

/// Read-only dense snapshot of the terrain grid.
///
/// Path search and other systems consume this view instead of the world
/// itself, treating the grid as immutable for the duration of one query.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    cells: &'a [GridCell],
    columns: u32,
    rows: u32,
}

impl<'a> TerrainView<'a> {
    /// Captures a new terrain view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [GridCell], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Returns the cell at the provided coordinate, if it is in bounds.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&'a GridCell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Returns the classification of the provided cell, if it is in bounds.
    #[must_use]
    pub fn classification(&self, cell: CellCoord) -> Option<CellClassification> {
        self.cell(cell).map(|cell| cell.classification)
    }

    /// Provides the dimensions of the underlying grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}
