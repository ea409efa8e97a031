//! Human-editable level descriptions that can be imported into the binary tile map format.

use anyhow::{Context as _, Result, bail};
use serde::{Deserialize, Serialize};
use tilenav::{Direction, FixtureId, FixtureKind, FixturePalette, TileFlags, TileMap};

/// A level as written by hand or exported from the editor.
///
/// `rows` uses `.` for floor and a space for empty cells.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct LevelDescription {
    pub(crate) grid_size: u32,
    pub(crate) rows: Vec<String>,
    #[serde(default)]
    pub(crate) walls: Vec<CellSide>,
    #[serde(default)]
    pub(crate) exterior_walls: Vec<CellSide>,
    #[serde(default)]
    pub(crate) doors: Vec<CellSide>,
    #[serde(default)]
    pub(crate) fixtures: Vec<FixturePlacement>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct CellSide {
    pub(crate) row: i32,
    pub(crate) col: i32,
    pub(crate) side: Side,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Side {
    North,
    East,
    South,
    West,
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::North => Direction::North,
            Side::East => Direction::East,
            Side::South => Direction::South,
            Side::West => Direction::West,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct FixturePlacement {
    pub(crate) row: i32,
    pub(crate) col: i32,
    pub(crate) id: u32,
}

/// One entry of a palette file: `[{ "id": 1, "width": 2, "height": 1 }]`.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct PaletteEntry {
    pub(crate) id: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl LevelDescription {
    pub(crate) fn to_tile_map(&self) -> Result<TileMap> {
        if self.grid_size == 0 {
            bail!("grid size must be positive");
        }
        let width = self.rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        if width == 0 {
            bail!("level has no columns");
        }
        let mut map = TileMap::new(width as u32, self.rows.len() as u32, self.grid_size);
        for (row, line) in self.rows.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                match c {
                    '.' => map.set(row as i32, col as i32, TileFlags::FLOOR),
                    ' ' => {}
                    other => bail!("unknown tile {other:?} at row {row}, column {col}"),
                }
            }
        }
        for wall in &self.walls {
            map.set(wall.row, wall.col, Direction::from(wall.side).wall());
        }
        for wall in &self.exterior_walls {
            map.set(wall.row, wall.col, Direction::from(wall.side).exterior_wall());
        }
        for door in &self.doors {
            map.set(door.row, door.col, Direction::from(door.side).door());
        }
        for fixture in &self.fixtures {
            let id = FixtureId::new(fixture.id)
                .with_context(|| format!("fixture at ({}, {}) has the reserved id 0", fixture.row, fixture.col))?;
            map.set_fixture(fixture.row, fixture.col, Some(id));
        }
        Ok(map)
    }
}

pub(crate) fn palette_from_entries(entries: Vec<PaletteEntry>) -> Result<FixturePalette> {
    entries
        .into_iter()
        .map(|entry| {
            let id = FixtureId::new(entry.id).context("palette entry uses the reserved id 0")?;
            Ok((
                id,
                FixtureKind {
                    width: entry.width,
                    height: entry.height,
                },
            ))
        })
        .collect()
}
