#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative terrain world for the Rampart Defence simulation.
//!
//! The world owns the grid of classified cells, executes mutation commands
//! submitted by adapters, and exposes read-only queries for systems. It never
//! caches derived data: reclassifying a cell immediately invalidates any path
//! previously computed across it, and callers that cache paths must refresh
//! them on the corresponding events.

mod terrain;
mod towers;

use glam::Vec2;
use rampart_core::{
    CellClassification, CellCoord, Command, Event, GridCell, PlacementError, RemovalError,
    WELCOME_BANNER,
};

use crate::towers::TowerRegistry;

const DEFAULT_GRID_COLUMNS: u32 = 24;
const DEFAULT_GRID_ROWS: u32 = 16;
const DEFAULT_CELL_LENGTH: f32 = 32.0;

/// Fixed-size grid of classified cells with world-space conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainGrid {
    columns: u32,
    rows: u32,
    cell_length: f32,
    cells: Vec<GridCell>,
    spawn_cells: Vec<CellCoord>,
    destination_cells: Vec<CellCoord>,
    waypoints: Vec<CellCoord>,
}

impl TerrainGrid {
    pub(crate) fn new(
        columns: u32,
        rows: u32,
        cell_length: f32,
        cells: Vec<GridCell>,
        spawn_cells: Vec<CellCoord>,
        destination_cells: Vec<CellCoord>,
        waypoints: Vec<CellCoord>,
    ) -> Self {
        Self {
            columns,
            rows,
            cell_length,
            cells,
            spawn_cells,
            destination_cells,
            waypoints,
        }
    }

    /// Number of cell columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of cell rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Edge length of a single square cell expressed in world units.
    #[must_use]
    pub const fn cell_length(&self) -> f32 {
        self.cell_length
    }

    /// Returns the cell at the provided coordinate, if it is in bounds.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&GridCell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Returns the classification of the provided cell, if it is in bounds.
    #[must_use]
    pub fn classification(&self, cell: CellCoord) -> Option<CellClassification> {
        self.cell(cell).map(|cell| cell.classification)
    }

    /// Reports whether a tower may be constructed on the provided cell.
    ///
    /// Out-of-bounds coordinates are never buildable.
    #[must_use]
    pub fn is_buildable(&self, cell: CellCoord) -> bool {
        self.classification(cell)
            .is_some_and(CellClassification::is_buildable)
    }

    /// Converts a world-space position to the grid cell containing it.
    ///
    /// Positions outside the grid, including negative coordinates, yield
    /// `None` rather than a fault.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec2) -> Option<CellCoord> {
        if self.cell_length <= 0.0 || !position.x.is_finite() || !position.y.is_finite() {
            return None;
        }
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }

        let column = (position.x / self.cell_length) as u32;
        let row = (position.y / self.cell_length) as u32;
        let cell = CellCoord::new(column, row);
        if column < self.columns && row < self.rows {
            Some(cell)
        } else {
            None
        }
    }

    /// Converts a grid cell to the world-space position of its centre.
    #[must_use]
    pub fn grid_to_world(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.cell_length,
            (cell.row() as f32 + 0.5) * self.cell_length,
        )
    }

    /// Cells composing the enemy spawn zone.
    #[must_use]
    pub fn spawn_cells(&self) -> &[CellCoord] {
        &self.spawn_cells
    }

    /// Cells composing the defended destination zone.
    #[must_use]
    pub fn destination_cells(&self) -> &[CellCoord] {
        &self.destination_cells
    }

    /// Designated route waypoints between the spawn and destination zones.
    #[must_use]
    pub fn waypoints(&self) -> &[CellCoord] {
        &self.waypoints
    }

    fn set_classification(&mut self, cell: CellCoord, classification: CellClassification) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };
        match self.cells.get_mut(index) {
            Some(slot) => {
                slot.classification = classification;
                true
            }
            None => false,
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }

    pub(crate) fn cells(&self) -> &[GridCell] {
        &self.cells
    }
}

/// Represents the authoritative Rampart Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: TerrainGrid,
    towers: TowerRegistry,
}

impl World {
    /// Creates a new world with the default terrain layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid: terrain::generate(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS, DEFAULT_CELL_LENGTH),
            towers: TowerRegistry::new(),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejections are reported as events carrying typed reasons; a rejected
/// command mutates nothing.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            columns,
            rows,
            cell_length,
        } => {
            world.grid = terrain::generate(columns, rows, cell_length);
            world.towers.clear();
            out_events.push(Event::GridConfigured {
                columns,
                rows,
                cell_length,
            });
        }
        Command::SetClassification {
            cell,
            classification,
        } => {
            // Out-of-bounds mutation requests are dropped without an event.
            if world.grid.set_classification(cell, classification) {
                out_events.push(Event::ClassificationChanged {
                    cell,
                    classification,
                });
            }
        }
        Command::PlaceTower { cell } => match validate_placement(world, cell) {
            Ok(displaced) => {
                world.towers.record(cell, displaced);
                let _ = world.grid.set_classification(cell, CellClassification::Tower);
                out_events.push(Event::TowerPlaced { cell, displaced });
            }
            Err(reason) => {
                out_events.push(Event::TowerPlacementRejected { cell, reason });
            }
        },
        Command::RemoveTower { cell } => match validate_removal(world, cell) {
            Ok(()) => {
                let restored = world
                    .towers
                    .withdraw(cell)
                    .unwrap_or(CellClassification::Empty);
                let _ = world.grid.set_classification(cell, restored);
                out_events.push(Event::TowerRemoved { cell, restored });
            }
            Err(reason) => {
                out_events.push(Event::TowerRemovalRejected { cell, reason });
            }
        },
    }
}

fn validate_placement(world: &World, cell: CellCoord) -> Result<CellClassification, PlacementError> {
    let Some(classification) = world.grid.classification(cell) else {
        return Err(PlacementError::OutOfBounds);
    };
    if !classification.is_buildable() {
        return Err(PlacementError::NotBuildable);
    }
    Ok(classification)
}

fn validate_removal(world: &World, cell: CellCoord) -> Result<(), RemovalError> {
    match world.grid.classification(cell) {
        None => Err(RemovalError::OutOfBounds),
        Some(CellClassification::Tower) => Ok(()),
        Some(_) => Err(RemovalError::NoTower),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use rampart_core::{CellCoord, TerrainView};

    use super::{TerrainGrid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the world's terrain grid.
    #[must_use]
    pub fn terrain_grid(world: &World) -> &TerrainGrid {
        &world.grid
    }

    /// Captures a dense read-only snapshot of the terrain for path search.
    #[must_use]
    pub fn terrain_view(world: &World) -> TerrainView<'_> {
        TerrainView::new(world.grid.cells(), world.grid.columns(), world.grid.rows())
    }

    /// World-space centre positions of the spawn zone cells, in grid order.
    #[must_use]
    pub fn spawn_positions(world: &World) -> Vec<Vec2> {
        world
            .grid
            .spawn_cells()
            .iter()
            .map(|cell| world.grid.grid_to_world(*cell))
            .collect()
    }

    /// Cells composing the defended destination zone.
    #[must_use]
    pub fn destination_cells(world: &World) -> &[CellCoord] {
        world.grid.destination_cells()
    }

    /// Number of towers currently standing in the world.
    #[must_use]
    pub fn tower_count(world: &World) -> usize {
        world.towers.len()
    }
}
