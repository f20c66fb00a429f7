use rampart_core::{CellClassification, CellCoord, Command};
use rampart_system_pathfinding::PathSearch;
use rampart_world::{self as world, query, World};

fn configured_world(columns: u32, rows: u32) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureGrid {
            columns,
            rows,
            cell_length: 16.0,
        },
        &mut events,
    );
    world
}

#[test]
fn generated_world_routes_spawn_to_destination() {
    let world = configured_world(24, 16);
    let grid = query::terrain_grid(&world);
    let origin = grid.spawn_cells()[0];
    let destination = grid.destination_cells()[0];

    let mut search = PathSearch::default();
    let path = search
        .find_path(&query::terrain_view(&world), origin, destination)
        .expect("generated layouts keep the destination reachable");

    assert_eq!(path.first(), Some(&origin));
    assert_eq!(path.last(), Some(&destination));
    for pair in path.windows(2) {
        assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
    }
}

#[test]
fn blocking_every_route_yields_no_path() {
    let mut world = configured_world(12, 6);
    let mut events = Vec::new();

    // A full blocked column severs the map in two.
    for row in 0..6 {
        world::apply(
            &mut world,
            Command::SetClassification {
                cell: CellCoord::new(5, row),
                classification: CellClassification::Blocked,
            },
            &mut events,
        );
    }

    let grid = query::terrain_grid(&world);
    let origin = grid.spawn_cells()[0];
    let destination = grid.destination_cells()[0];

    let mut search = PathSearch::default();
    assert!(search
        .find_path(&query::terrain_view(&world), origin, destination)
        .is_none());
}

#[test]
fn reclassification_changes_the_returned_route() {
    let mut world = configured_world(12, 6);
    let grid = query::terrain_grid(&world);
    let origin = grid.spawn_cells()[0];
    let destination = grid.destination_cells()[0];

    let mut search = PathSearch::default();
    let before = search
        .find_path(&query::terrain_view(&world), origin, destination)
        .expect("route exists before mutation");

    // Drop an obstacle onto the old route; the next query must avoid it.
    let obstacle = before[before.len() / 2];
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetClassification {
            cell: obstacle,
            classification: CellClassification::Obstacle,
        },
        &mut events,
    );

    let after = search
        .find_path(&query::terrain_view(&world), origin, destination)
        .expect("a detour exists around a single obstacle");
    assert!(!after.contains(&obstacle));
}
