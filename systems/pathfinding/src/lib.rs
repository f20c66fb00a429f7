#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic A* path search over immutable terrain snapshots.
//!
//! Every query treats the provided [`TerrainView`] as a snapshot: the search
//! holds no reference to the world between calls and caches nothing across
//! grid mutations. A full re-search per query is acceptable at the grid sizes
//! this simulation uses.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rampart_core::{CellCoord, ClassificationSet, TerrainView};

const NO_PARENT: u32 = u32::MAX;
const UNVISITED: u32 = u32::MAX;

/// Cost of a cardinal step over ground with a traversal cost of ten.
const CARDINAL_SCALE: u32 = 10;
/// Numerator applied to diagonal steps, approximating sqrt(2) as 14/10.
const DIAGONAL_NUMERATOR: u32 = 14;

/// Neighbourhood connectivity used by the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
    /// Cardinal neighbours only.
    Four,
    /// Cardinal and diagonal neighbours.
    Eight,
}

/// Configuration of one path search instance.
#[derive(Clone, Copy, Debug)]
pub struct SearchConfig {
    /// Neighbourhood shape explored by the search.
    pub connectivity: Connectivity,
    /// Classifications treated as impassable.
    pub impassable: ClassificationSet,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Four,
            impassable: ClassificationSet::default_impassable(),
        }
    }
}

/// A*-based shortest-route finder over a terrain grid.
///
/// Step costs come from the per-classification traversal table, so rough
/// terrain is crossed only when a detour would cost more. The heuristic is
/// Manhattan distance for four-connected searches and octile distance for
/// eight-connected ones; both are admissible and consistent under the cost
/// table, so returned paths are optimal.
///
/// Tie-break among equal f-score nodes is fixed: the node with the lower
/// heuristic wins, and among those the most recently discovered one. Path
/// choice is therefore deterministic for identical grids.
#[derive(Debug, Default)]
pub struct PathSearch {
    config: SearchConfig,
    g_scores: Vec<u32>,
    parents: Vec<u32>,
    closed: Vec<bool>,
    open: BinaryHeap<OpenNode>,
}

impl PathSearch {
    /// Creates a search instance with the provided configuration.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            g_scores: Vec::new(),
            parents: Vec::new(),
            closed: Vec::new(),
            open: BinaryHeap::new(),
        }
    }

    /// Configuration the search was constructed with.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Finds the cheapest route from `origin` to `destination`.
    ///
    /// Returns the ordered cell sequence including both endpoints, or `None`
    /// when no route exists. An unreachable destination is a normal outcome:
    /// the open set is exhausted within at most `columns * rows` node
    /// expansions and the search reports `None` without failing.
    ///
    /// Out-of-bounds or impassable endpoints yield `None`. When the origin
    /// equals the destination the path is the single shared cell.
    pub fn find_path(
        &mut self,
        view: &TerrainView<'_>,
        origin: CellCoord,
        destination: CellCoord,
    ) -> Option<Vec<CellCoord>> {
        let (columns, rows) = view.dimensions();
        let node_count = usize::try_from(u64::from(columns) * u64::from(rows)).ok()?;
        if node_count == 0 {
            return None;
        }

        let _ = self.step_cost(view, origin)?;
        let _ = self.step_cost(view, destination)?;

        if origin == destination {
            return Some(vec![origin]);
        }

        self.prepare_workspace(node_count);

        let origin_index = index_of(origin, columns);
        let destination_index = index_of(destination, columns);
        let mut sequence: u64 = 0;

        self.g_scores[origin_index] = 0;
        let origin_h = self.heuristic(origin, destination);
        self.open.push(OpenNode {
            f_score: origin_h,
            h_score: origin_h,
            sequence,
            index: origin_index as u32,
        });

        let mut expansions = 0usize;

        while let Some(node) = self.open.pop() {
            let current_index = node.index as usize;
            if self.closed[current_index] {
                continue;
            }
            self.closed[current_index] = true;

            if current_index == destination_index {
                return Some(self.reconstruct(destination_index, columns));
            }

            // Each cell is expanded at most once, so the search terminates
            // after at most columns * rows expansions on any grid.
            expansions += 1;
            if expansions >= node_count {
                break;
            }

            let current = coord_of(current_index, columns);
            let current_g = self.g_scores[current_index];

            for (neighbor, diagonal) in neighbors(current, columns, rows, self.config.connectivity)
            {
                let neighbor_index = index_of(neighbor, columns);
                if self.closed[neighbor_index] {
                    continue;
                }
                let Some(base_cost) = self.step_cost(view, neighbor) else {
                    continue;
                };
                let step = if diagonal {
                    base_cost * DIAGONAL_NUMERATOR / CARDINAL_SCALE
                } else {
                    base_cost
                };

                let tentative = current_g.saturating_add(step);
                if tentative >= self.g_scores[neighbor_index] {
                    continue;
                }

                self.g_scores[neighbor_index] = tentative;
                self.parents[neighbor_index] = current_index as u32;
                sequence += 1;
                let h_score = self.heuristic(neighbor, destination);
                self.open.push(OpenNode {
                    f_score: tentative.saturating_add(h_score),
                    h_score,
                    sequence,
                    index: neighbor_index as u32,
                });
            }
        }

        None
    }

    fn step_cost(&self, view: &TerrainView<'_>, cell: CellCoord) -> Option<u32> {
        let classification = view.classification(cell)?;
        if self.config.impassable.contains(classification) {
            return None;
        }
        Some(classification.traversal_cost())
    }

    fn heuristic(&self, from: CellCoord, to: CellCoord) -> u32 {
        match self.config.connectivity {
            Connectivity::Four => CARDINAL_SCALE * from.manhattan_distance(to),
            Connectivity::Eight => {
                let column_diff = from.column().abs_diff(to.column());
                let row_diff = from.row().abs_diff(to.row());
                let long = column_diff.max(row_diff);
                let short = column_diff.min(row_diff);
                CARDINAL_SCALE * long + (DIAGONAL_NUMERATOR - CARDINAL_SCALE) * short
            }
        }
    }

    fn prepare_workspace(&mut self, node_count: usize) {
        if self.g_scores.len() != node_count {
            self.g_scores = vec![UNVISITED; node_count];
            self.parents = vec![NO_PARENT; node_count];
            self.closed = vec![false; node_count];
        } else {
            self.g_scores.fill(UNVISITED);
            self.parents.fill(NO_PARENT);
            self.closed.fill(false);
        }
        self.open.clear();
    }

    fn reconstruct(&self, destination_index: usize, columns: u32) -> Vec<CellCoord> {
        let mut path = Vec::new();
        let mut cursor = destination_index;
        loop {
            path.push(coord_of(cursor, columns));
            let parent = self.parents[cursor];
            if parent == NO_PARENT {
                break;
            }
            cursor = parent as usize;
        }
        path.reverse();
        path
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    f_score: u32,
    h_score: u32,
    sequence: u64,
    index: u32,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: invert f and h so the cheapest node wins,
        // then prefer the most recently discovered entry.
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.h_score.cmp(&self.h_score))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn index_of(cell: CellCoord, columns: u32) -> usize {
    cell.row() as usize * columns as usize + cell.column() as usize
}

fn coord_of(index: usize, columns: u32) -> CellCoord {
    let width = columns as usize;
    CellCoord::new((index % width) as u32, (index / width) as u32)
}

fn neighbors(
    cell: CellCoord,
    columns: u32,
    rows: u32,
    connectivity: Connectivity,
) -> NeighborIter {
    let mut neighbors = NeighborIter::default();
    let column = cell.column();
    let row = cell.row();

    let west = column.checked_sub(1);
    let north = row.checked_sub(1);
    let east = (column + 1 < columns).then_some(column + 1);
    let south = (row + 1 < rows).then_some(row + 1);

    if let Some(north) = north {
        neighbors.push(CellCoord::new(column, north), false);
    }
    if let Some(west) = west {
        neighbors.push(CellCoord::new(west, row), false);
    }
    if let Some(east) = east {
        neighbors.push(CellCoord::new(east, row), false);
    }
    if let Some(south) = south {
        neighbors.push(CellCoord::new(column, south), false);
    }

    if connectivity == Connectivity::Eight {
        if let (Some(west), Some(north)) = (west, north) {
            neighbors.push(CellCoord::new(west, north), true);
        }
        if let (Some(east), Some(north)) = (east, north) {
            neighbors.push(CellCoord::new(east, north), true);
        }
        if let (Some(west), Some(south)) = (west, south) {
            neighbors.push(CellCoord::new(west, south), true);
        }
        if let (Some(east), Some(south)) = (east, south) {
            neighbors.push(CellCoord::new(east, south), true);
        }
    }

    neighbors
}

#[derive(Clone, Debug, Default)]
struct NeighborIter {
    buffer: [Option<(CellCoord, bool)>; 8],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    fn push(&mut self, cell: CellCoord, diagonal: bool) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some((cell, diagonal));
            self.len += 1;
        }
    }
}

impl Iterator for NeighborIter {
    type Item = (CellCoord, bool);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }
        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{CellClassification, GridCell};

    fn open_cells(columns: u32, rows: u32) -> Vec<GridCell> {
        vec![GridCell::flat(CellClassification::Empty); (columns * rows) as usize]
    }

    fn classify(cells: &mut [GridCell], columns: u32, cell: CellCoord, value: CellClassification) {
        cells[(cell.row() * columns + cell.column()) as usize].classification = value;
    }

    #[test]
    fn unobstructed_path_length_matches_grid_distance() {
        let cells = open_cells(8, 6);
        let view = TerrainView::new(&cells, 8, 6);
        let mut search = PathSearch::default();

        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(6, 4);
        let path = search.find_path(&view, origin, destination).expect("path");

        assert_eq!(
            path.len() as u32,
            origin.manhattan_distance(destination) + 1
        );
        assert_eq!(path.first(), Some(&origin));
        assert_eq!(path.last(), Some(&destination));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn eight_connected_path_length_matches_chebyshev_distance() {
        let cells = open_cells(8, 8);
        let view = TerrainView::new(&cells, 8, 8);
        let mut search = PathSearch::new(SearchConfig {
            connectivity: Connectivity::Eight,
            ..SearchConfig::default()
        });

        let origin = CellCoord::new(0, 0);
        let destination = CellCoord::new(5, 3);
        let path = search.find_path(&view, origin, destination).expect("path");

        assert_eq!(
            path.len() as u32,
            origin.chebyshev_distance(destination) + 1
        );
    }

    #[test]
    fn identical_endpoints_yield_single_cell_path() {
        let cells = open_cells(4, 4);
        let view = TerrainView::new(&cells, 4, 4);
        let mut search = PathSearch::default();
        let cell = CellCoord::new(2, 2);

        assert_eq!(search.find_path(&view, cell, cell), Some(vec![cell]));
    }

    #[test]
    fn out_of_bounds_endpoints_yield_no_path() {
        let cells = open_cells(4, 4);
        let view = TerrainView::new(&cells, 4, 4);
        let mut search = PathSearch::default();

        assert!(search
            .find_path(&view, CellCoord::new(9, 0), CellCoord::new(1, 1))
            .is_none());
        assert!(search
            .find_path(&view, CellCoord::new(1, 1), CellCoord::new(0, 9))
            .is_none());
    }

    #[test]
    fn impassable_endpoint_yields_no_path() {
        let mut cells = open_cells(4, 4);
        classify(&mut cells, 4, CellCoord::new(3, 3), CellClassification::Tower);
        let view = TerrainView::new(&cells, 4, 4);
        let mut search = PathSearch::default();

        assert!(search
            .find_path(&view, CellCoord::new(0, 0), CellCoord::new(3, 3))
            .is_none());
    }

    #[test]
    fn enclosed_destination_yields_no_path() {
        let mut cells = open_cells(5, 5);
        let destination = CellCoord::new(2, 2);
        for cell in [
            CellCoord::new(1, 1),
            CellCoord::new(2, 1),
            CellCoord::new(3, 1),
            CellCoord::new(1, 2),
            CellCoord::new(3, 2),
            CellCoord::new(1, 3),
            CellCoord::new(2, 3),
            CellCoord::new(3, 3),
        ] {
            classify(&mut cells, 5, cell, CellClassification::Blocked);
        }
        let view = TerrainView::new(&cells, 5, 5);
        let mut search = PathSearch::default();

        assert!(search
            .find_path(&view, CellCoord::new(0, 0), destination)
            .is_none());
    }

    #[test]
    fn weighted_search_detours_around_rough_terrain() {
        // The straight diagonal crosses rough ground; the optimal route takes
        // one extra cell over open ground instead.
        let mut cells = open_cells(3, 3);
        classify(&mut cells, 3, CellCoord::new(1, 1), CellClassification::Rough);
        let view = TerrainView::new(&cells, 3, 3);
        let mut search = PathSearch::new(SearchConfig {
            connectivity: Connectivity::Eight,
            ..SearchConfig::default()
        });

        let path = search
            .find_path(&view, CellCoord::new(0, 0), CellCoord::new(2, 2))
            .expect("path");

        assert_eq!(path.len(), 4);
        assert!(!path.contains(&CellCoord::new(1, 1)));
    }

    #[test]
    fn rough_terrain_is_crossed_when_detours_cost_more() {
        // A full wall of rough ground: going around is impossible, so the
        // search pays the higher step cost.
        let mut cells = open_cells(3, 3);
        for row in 0..3 {
            classify(&mut cells, 3, CellCoord::new(1, row), CellClassification::Rough);
        }
        let view = TerrainView::new(&cells, 3, 3);
        let mut search = PathSearch::default();

        let path = search
            .find_path(&view, CellCoord::new(0, 1), CellCoord::new(2, 1))
            .expect("path");

        assert_eq!(
            path,
            vec![
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
                CellCoord::new(2, 1),
            ]
        );
    }

    #[test]
    fn repeated_queries_return_identical_paths() {
        let mut cells = open_cells(7, 7);
        classify(&mut cells, 7, CellCoord::new(3, 3), CellClassification::Blocked);
        classify(&mut cells, 7, CellCoord::new(3, 4), CellClassification::Blocked);
        let view = TerrainView::new(&cells, 7, 7);

        let origin = CellCoord::new(0, 3);
        let destination = CellCoord::new(6, 3);

        let mut first_search = PathSearch::default();
        let first = first_search.find_path(&view, origin, destination);
        let repeat = first_search.find_path(&view, origin, destination);
        let mut second_search = PathSearch::default();
        let second = second_search.find_path(&view, origin, destination);

        assert!(first.is_some());
        assert_eq!(first, repeat, "same instance diverged between queries");
        assert_eq!(first, second, "fresh instance diverged from first");
    }

    #[test]
    fn custom_impassable_set_opens_water_crossings() {
        let mut cells = open_cells(3, 1);
        classify(&mut cells, 3, CellCoord::new(1, 0), CellClassification::Water);
        let view = TerrainView::new(&cells, 3, 1);

        let mut default_search = PathSearch::default();
        assert!(default_search
            .find_path(&view, CellCoord::new(0, 0), CellCoord::new(2, 0))
            .is_none());

        let amphibious = ClassificationSet::NONE
            .with(CellClassification::Blocked)
            .with(CellClassification::Tower)
            .with(CellClassification::Obstacle);
        let mut search = PathSearch::new(SearchConfig {
            connectivity: Connectivity::Four,
            impassable: amphibious,
        });
        let path = search
            .find_path(&view, CellCoord::new(0, 0), CellCoord::new(2, 0))
            .expect("water is passable for this configuration");
        assert_eq!(path.len(), 3);
    }
}
