//! Build navmeshes from small levels and query paths through them.

use approx::assert_relative_eq;
use glam::Vec2;
use tilenav::{
    FixtureId, FixtureKind, FixturePalette, NavmeshConfig, RectilinearClipper, TileFlags, TileMap,
    build_navmesh, find_path, find_path_between_points,
};

const GRID: u32 = 10;

/// Builds a tile map from rows of `.` (floor) and ` ` (nothing).
fn level(rows: &[&str]) -> TileMap {
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0) as u32;
    let mut map = TileMap::new(width, rows.len() as u32, GRID);
    for (row, line) in rows.iter().enumerate() {
        for (col, c) in line.chars().enumerate() {
            if c == '.' {
                map.set(row as i32, col as i32, TileFlags::FLOOR);
            }
        }
    }
    map
}

fn config(obstacle_extents: f32) -> NavmeshConfig {
    NavmeshConfig { obstacle_extents }
}

fn path_length(path: &[Vec2]) -> f32 {
    path.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
}

#[test]
fn strip_becomes_one_rectangle() {
    let map = level(&["..."]);
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(1.0), &RectilinearClipper)
        .unwrap();

    assert_eq!(navmesh.regions.region_count(), 1);
    assert_eq!(navmesh.rooms.len(), 1);
    assert_eq!(navmesh.rooms[0].triangles.len(), 2);
    let area: f32 = navmesh.rooms[0].triangles.iter().map(|t| t.area()).sum();
    assert_relative_eq!(area, 300.0);

    let graph = &navmesh.graph;
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);

    let start = Vec2::new(2.0, 5.0);
    let end = Vec2::new(28.0, 5.0);
    assert_eq!(find_path_between_points(graph, start, end), [start, end]);
}

#[test]
fn l_corridor_turns_at_inner_corner() {
    let map = level(&["..", " ."]);
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(1.0), &RectilinearClipper)
        .unwrap();
    assert_eq!(navmesh.rooms.len(), 1);
    assert_eq!(navmesh.rooms[0].triangles.len(), 4);

    let start = Vec2::new(2.0, 5.0);
    let end = Vec2::new(15.0, 18.0);
    let path = find_path_between_points(&navmesh.graph, start, end);
    assert_eq!(path.len(), 3);
    assert_eq!(path[0], start);
    assert_relative_eq!(path[1].x, 10.0);
    assert_relative_eq!(path[1].y, 10.0);
    assert_eq!(path[2], end);
}

#[test]
fn wall_splits_regions() {
    let mut map = level(&[".."]);
    map.set(0, 0, TileFlags::WALL_EAST);
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(1.0), &RectilinearClipper)
        .unwrap();
    assert_eq!(navmesh.regions.region_count(), 2);
    assert_eq!(navmesh.rooms.len(), 2);
    assert_eq!(navmesh.graph.edges.len(), 2);

    let path = find_path_between_points(&navmesh.graph, Vec2::new(5.0, 5.0), Vec2::new(15.0, 5.0));
    assert!(path.is_empty());

    map.clear(0, 0, TileFlags::WALL_EAST);
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(1.0), &RectilinearClipper)
        .unwrap();
    assert_eq!(navmesh.regions.region_count(), 1);
}

/// Two 2x2 halves separated by a wall with a door in the top row.
fn door_level() -> TileMap {
    let mut map = level(&["....", "...."]);
    map.set(0, 1, TileFlags::DOOR_EAST);
    map.set(1, 1, TileFlags::WALL_EAST);
    map
}

#[test]
fn path_is_pulled_through_door_center() {
    let map = door_level();
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(1.0), &RectilinearClipper)
        .unwrap();
    let graph = &navmesh.graph;

    assert_eq!(navmesh.regions.region_count(), 1);
    assert_eq!(navmesh.obstacles.doors.len(), 1);
    assert_eq!(graph.nodes.iter().filter(|node| node.is_door()).count(), 2);

    let start = Vec2::new(5.0, 5.0);
    let end = Vec2::new(35.0, 5.0);
    let path = find_path_between_points(graph, start, end);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&end));
    assert!(path.contains(&Vec2::new(20.0, 5.0)));
    assert_relative_eq!(path_length(&path), 30.0);

    // The bottom half is only reachable through the door as well.
    let below = find_path_between_points(graph, Vec2::new(5.0, 15.0), Vec2::new(35.0, 15.0));
    assert!(below.contains(&Vec2::new(20.0, 5.0)));
}

#[test]
fn diagonal_path_through_door_stays_taut() {
    let map = door_level();
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(1.0), &RectilinearClipper)
        .unwrap();
    let start = Vec2::new(5.0, 5.0);
    let end = Vec2::new(35.0, 15.0);
    let center = Vec2::new(20.0, 5.0);

    assert_eq!(find_path_between_points(&navmesh.graph, start, end), [start, center, end]);
    assert_eq!(find_path_between_points(&navmesh.graph, end, start), [end, center, start]);
}

#[test]
fn path_through_two_doors_visits_both_centers() {
    let mut map = level(&["......", "......"]);
    map.set(0, 1, TileFlags::DOOR_EAST);
    map.set(1, 1, TileFlags::WALL_EAST);
    map.set(0, 3, TileFlags::WALL_EAST);
    map.set(1, 3, TileFlags::DOOR_EAST);
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(1.0), &RectilinearClipper)
        .unwrap();
    assert_eq!(navmesh.obstacles.doors.len(), 2);

    let start = Vec2::new(5.0, 5.0);
    let end = Vec2::new(55.0, 15.0);
    let path = find_path_between_points(&navmesh.graph, start, end);
    assert_eq!(
        path,
        [start, Vec2::new(20.0, 5.0), Vec2::new(40.0, 15.0), end]
    );
}

#[test]
fn wall_stubs_keep_room_connected() {
    // One room wrapping around two empty tiles, with a wall stub below (1, 1)
    // and another left of (3, 1). Their clearance ends halfway along shared piece edges.
    let mut map = level(&["..", "...", "..", "..."]);
    map.set(1, 1, TileFlags::WALL_SOUTH);
    map.set(3, 1, TileFlags::WALL_WEST);
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(2.5), &RectilinearClipper)
        .unwrap();
    assert_eq!(navmesh.regions.region_count(), 1);
    let graph = &navmesh.graph;

    let goal = Vec2::new(5.0, 5.0);
    for start in [
        Vec2::new(25.0, 35.0),
        Vec2::new(25.0, 15.0),
        Vec2::new(15.0, 35.0),
        Vec2::new(5.0, 35.0),
    ] {
        let path = find_path_between_points(graph, start, goal);
        assert_eq!(path.first(), Some(&start), "no path from {start}");
        assert_eq!(path.last(), Some(&goal));
    }

    // Every floor node can reach every other one.
    let first = graph.node_at(goal).unwrap();
    for node in &graph.nodes {
        assert!(
            graph.find_node_path(first, node.id).is_some(),
            "node {:?} is cut off",
            node.id
        );
    }
}

#[test]
fn closed_door_blocks_path() {
    let map = door_level();
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(1.0), &RectilinearClipper)
        .unwrap();
    let graph = &navmesh.graph;
    let from = graph.node_at(Vec2::new(5.0, 5.0)).unwrap();
    let to = graph.node_at(Vec2::new(35.0, 5.0)).unwrap();

    assert!(graph.find_node_path(from, to).is_some());
    let closed = graph.find_node_path_filtered(from, to, |_, next| !graph.nodes[next.index()].is_door());
    assert_eq!(closed, None);
}

#[test]
fn fixture_in_room_is_walked_around() {
    let mut map = level(&["...", "...", "..."]);
    let fixture = FixtureId::new(7).unwrap();
    map.set_fixture(1, 1, Some(fixture));
    let mut palette = FixturePalette::new();
    palette.insert(
        fixture,
        FixtureKind {
            width: 1,
            height: 1,
        },
    );
    let navmesh = build_navmesh(&map, &palette, &config(1.0), &RectilinearClipper).unwrap();
    let graph = &navmesh.graph;

    let area: f32 = navmesh.rooms[0].triangles.iter().map(|t| t.area()).sum();
    assert_relative_eq!(area, 900.0 - 144.0);
    assert_eq!(graph.node_at(Vec2::new(15.0, 15.0)), None);

    let start = Vec2::new(5.0, 15.0);
    let end = Vec2::new(25.0, 15.0);
    let path = find_path_between_points(graph, start, end);
    assert!(path.len() >= 3);
    let inside_obstacle = |p: Vec2| p.x > 9.0 && p.x < 21.0 && p.y > 9.0 && p.y < 21.0;
    for pair in path.windows(2) {
        assert!(!inside_obstacle((pair[0] + pair[1]) * 0.5));
    }
    assert!(path_length(&path) > 20.0);
}

#[test]
fn node_paths_and_unknown_nodes() {
    let map = level(&["..."]);
    let navmesh = build_navmesh(&map, &FixturePalette::new(), &config(0.0), &RectilinearClipper)
        .unwrap();
    let graph = &navmesh.graph;
    let start = Vec2::new(1.0, 1.0);
    let end = Vec2::new(29.0, 9.0);
    let from = graph.node_at(start).unwrap();
    let to = graph.node_at(end).unwrap();
    assert_eq!(find_path(graph, from, to, start, end), [start, end]);
    assert!(find_path(graph, from, tilenav::NodeId(99), start, end).is_empty());
}
