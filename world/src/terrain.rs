//! Seeded terrain layout synthesis for the world crate.
//!
//! Grid generation is fully deterministic: the same dimensions always produce
//! the same layout, which keeps replay tests stable. The synthesized layout
//! guarantees the grid invariant for non-degenerate dimensions: at least one
//! spawn cell, at least one destination cell, and a clear route between them
//! along the central lane. Reachability is established here, at generation
//! time, and is not re-validated per path query.

use rampart_core::{BiomeVariant, CellClassification, CellCoord, GridCell};

use crate::TerrainGrid;

const TERRAIN_GENERATION_SEED: u64 = 0x7c3a_9f24_11d8_6e55;

/// Share of interior cells classified as rough terrain, in percent.
const ROUGH_PERCENT: u64 = 8;
/// Additional share of interior cells classified as obstacles, in percent.
const OBSTACLE_PERCENT: u64 = 3;
/// Minimum column count before a water ribbon is carved.
const WATER_RIBBON_MIN_COLUMNS: u32 = 8;

pub(crate) fn generate(columns: u32, rows: u32, cell_length: f32) -> TerrainGrid {
    let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
    if columns < 2 || rows == 0 || cell_count == 0 {
        return TerrainGrid::new(
            columns,
            rows,
            cell_length,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
    }

    let mut cells = vec![GridCell::flat(CellClassification::Empty); cell_count];
    let width = columns as usize;
    let lane_row = rows / 2;
    let mut state = TERRAIN_GENERATION_SEED;

    // Rough and obstacle scatter over the interior, keeping the lane clear.
    for row in 0..rows {
        for column in 1..columns.saturating_sub(1) {
            state = next_random(state);
            if row == lane_row {
                continue;
            }
            let roll = (state >> 33) % 100;
            let index = row as usize * width + column as usize;
            if roll < ROUGH_PERCENT {
                cells[index].classification = CellClassification::Rough;
            } else if roll < ROUGH_PERCENT + OBSTACLE_PERCENT {
                cells[index].classification = CellClassification::Obstacle;
            }
        }
    }

    // Vertical water ribbon on wide grids, bridged where the lane crosses it.
    let water_column = if columns >= WATER_RIBBON_MIN_COLUMNS {
        let column = columns * 2 / 3;
        for row in 0..rows {
            let index = row as usize * width + column as usize;
            cells[index].classification = if row == lane_row {
                CellClassification::Bridge
            } else {
                CellClassification::Water
            };
        }
        Some(column)
    } else {
        None
    };

    // Central lane connecting the spawn zone to the destination.
    for column in 1..columns.saturating_sub(1) {
        if Some(column) == water_column {
            continue;
        }
        let index = lane_row as usize * width + column as usize;
        cells[index].classification = CellClassification::Path;
    }

    let spawn_cells = spawn_zone(rows, lane_row);
    for cell in &spawn_cells {
        cells[cell.row() as usize * width].classification = CellClassification::Spawn;
    }

    let destination = CellCoord::new(columns - 1, lane_row);
    cells[lane_row as usize * width + (columns - 1) as usize].classification =
        CellClassification::Destination;

    // Heights and biome variants; water stays flat and unadorned.
    for cell in &mut cells {
        state = next_random(state);
        if cell.classification == CellClassification::Water {
            continue;
        }
        cell.height = ((state >> 32) % 101) as f32 / 100.0;
        cell.biome = Some(match (state >> 16) % 4 {
            0 => BiomeVariant::Meadow,
            1 => BiomeVariant::Forest,
            2 => BiomeVariant::Tundra,
            _ => BiomeVariant::Ashland,
        });
    }

    let waypoints = lane_waypoints(columns, lane_row, &spawn_cells, destination);

    TerrainGrid::new(
        columns,
        rows,
        cell_length,
        cells,
        spawn_cells,
        vec![destination],
        waypoints,
    )
}

fn spawn_zone(rows: u32, lane_row: u32) -> Vec<CellCoord> {
    let mut zone = Vec::with_capacity(3);
    if let Some(above) = lane_row.checked_sub(1) {
        zone.push(CellCoord::new(0, above));
    }
    zone.push(CellCoord::new(0, lane_row));
    if lane_row + 1 < rows {
        zone.push(CellCoord::new(0, lane_row + 1));
    }
    zone
}

fn lane_waypoints(
    columns: u32,
    lane_row: u32,
    spawn_cells: &[CellCoord],
    destination: CellCoord,
) -> Vec<CellCoord> {
    let mut waypoints = Vec::with_capacity(4);
    if let Some(first) = spawn_cells.first() {
        waypoints.push(*first);
    }
    if columns > 2 {
        waypoints.push(CellCoord::new(1, lane_row));
        waypoints.push(CellCoord::new(columns - 2, lane_row));
    }
    waypoints.push(destination);
    waypoints
}

fn next_random(state: u64) -> u64 {
    state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407)
}
