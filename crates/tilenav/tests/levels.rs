//! Builds the levels described in `tests/data/levels.json` and checks their navmeshes.

use anyhow::{Context as _, bail};
use glam::Vec2;
use serde::Deserialize;
use tilenav::{
    Direction, FixtureId, FixtureKind, FixturePalette, NavmeshConfig, RectilinearClipper, TileFlags,
    TileMap, build_navmesh, find_path_between_points,
};

const GRID: u32 = 10;

#[test]
fn levels_build_as_expected() -> anyhow::Result<()> {
    let levels: LevelFile = serde_json::from_str(include_str!("data/levels.json"))?;
    assert!(!levels.levels.is_empty());
    for level in &levels.levels {
        check_level(level).with_context(|| format!("level \"{}\"", level.name))?;
    }
    Ok(())
}

fn check_level(level: &Level) -> anyhow::Result<()> {
    let (map, palette) = level.tile_map()?;
    let config = NavmeshConfig {
        obstacle_extents: level.obstacle_extents,
    };
    let navmesh = build_navmesh(&map, &palette, &config, &RectilinearClipper)?;
    let expect = &level.expect;

    assert_eq!(navmesh.regions.region_count(), expect.regions, "regions");
    assert_eq!(navmesh.rooms.len(), expect.rooms, "rooms");
    assert_eq!(navmesh.obstacles.walls.len(), expect.walls, "walls");
    assert_eq!(navmesh.obstacles.doors.len(), expect.doors, "doors");
    if let Some(triangles) = expect.triangles {
        let actual: usize = navmesh.rooms.iter().map(|room| room.triangles.len()).sum();
        assert_eq!(actual, triangles, "triangles");
    }

    for query in &expect.paths {
        let start = Vec2::from(query.start);
        let end = Vec2::from(query.end);
        let path = find_path_between_points(&navmesh.graph, start, end);
        assert_eq!(!path.is_empty(), query.reachable, "path from {start} to {end}");
        if query.reachable {
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&end));
        }
        if let Some(waypoints) = &query.waypoints {
            let expected: Vec<Vec2> = waypoints.iter().copied().map(Vec2::from).collect();
            let matches = path.len() == expected.len()
                && path.iter().zip(&expected).all(|(a, b)| a.abs_diff_eq(*b, 1.0e-3));
            assert!(matches, "path from {start} to {end}: {path:?}, expected {expected:?}");
        }
    }
    for point in &expect.off_mesh {
        let point = Vec2::from(*point);
        assert_eq!(navmesh.graph.node_at(point), None, "{point} should be off the navmesh");
    }
    Ok(())
}

#[derive(Deserialize)]
struct LevelFile {
    levels: Vec<Level>,
}

#[derive(Deserialize)]
struct Level {
    name: String,
    rows: Vec<String>,
    #[serde(default = "default_extents")]
    obstacle_extents: f32,
    #[serde(default)]
    walls: Vec<Side>,
    #[serde(default)]
    doors: Vec<Side>,
    #[serde(default)]
    fixtures: Vec<Fixture>,
    #[serde(default)]
    palette: Vec<PaletteEntry>,
    expect: Expect,
}

#[derive(Deserialize)]
struct Side {
    row: i32,
    col: i32,
    side: SideName,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum SideName {
    North,
    East,
    South,
    West,
}

impl From<SideName> for Direction {
    fn from(side: SideName) -> Self {
        match side {
            SideName::North => Direction::North,
            SideName::East => Direction::East,
            SideName::South => Direction::South,
            SideName::West => Direction::West,
        }
    }
}

#[derive(Deserialize)]
struct Fixture {
    row: i32,
    col: i32,
    id: u32,
}

#[derive(Deserialize)]
struct PaletteEntry {
    id: u32,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct Expect {
    regions: usize,
    rooms: usize,
    #[serde(default)]
    walls: usize,
    #[serde(default)]
    doors: usize,
    triangles: Option<usize>,
    #[serde(default)]
    paths: Vec<PathQuery>,
    #[serde(default)]
    off_mesh: Vec<[f32; 2]>,
}

#[derive(Deserialize)]
struct PathQuery {
    start: [f32; 2],
    end: [f32; 2],
    reachable: bool,
    /// The exact smoothed path, if it matters.
    #[serde(default)]
    waypoints: Option<Vec<[f32; 2]>>,
}

fn default_extents() -> f32 {
    1.0
}

impl Level {
    fn tile_map(&self) -> anyhow::Result<(TileMap, FixturePalette)> {
        let width = self.rows.iter().map(|row| row.len()).max().unwrap_or(0) as u32;
        let mut map = TileMap::new(width, self.rows.len() as u32, GRID);
        for (row, line) in self.rows.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                match c {
                    '.' => map.set(row as i32, col as i32, TileFlags::FLOOR),
                    ' ' => {}
                    other => bail!("unknown tile {other:?} at ({row}, {col})"),
                }
            }
        }
        for wall in &self.walls {
            map.set(wall.row, wall.col, Direction::from(wall.side).wall());
        }
        for door in &self.doors {
            map.set(door.row, door.col, Direction::from(door.side).door());
        }
        for fixture in &self.fixtures {
            let id = FixtureId::new(fixture.id).context("fixture id 0 is reserved")?;
            map.set_fixture(fixture.row, fixture.col, Some(id));
        }
        let palette = self
            .palette
            .iter()
            .map(|entry| {
                let id = FixtureId::new(entry.id).context("fixture id 0 is reserved")?;
                let kind = FixtureKind {
                    width: entry.width,
                    height: entry.height,
                };
                Ok((id, kind))
            })
            .collect::<anyhow::Result<FixturePalette>>()?;
        Ok((map, palette))
    }
}
