use std::{collections::HashMap, num::NonZeroU32};

use glam::Vec2;

use crate::math::Aabb2d;

/// Identifies a kind of fixture in a [`FixturePalette`]. Stored in the high bits of a tile map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FixtureId(NonZeroU32);

impl FixtureId {
    /// `None` for `0`, which marks a cell without a fixture.
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// The raw id.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// The footprint of a fixture kind, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FixtureKind {
    /// Number of columns covered.
    pub width: u32,
    /// Number of rows covered.
    pub height: u32,
}

impl Default for FixtureKind {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

/// Tile dimensions per fixture kind. Materialized by the level loader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FixturePalette {
    kinds: HashMap<FixtureId, FixtureKind>,
}

impl FixturePalette {
    /// Creates an empty palette.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the footprint of a fixture kind, replacing any previous entry.
    pub fn insert(&mut self, id: FixtureId, kind: FixtureKind) -> &mut Self {
        self.kinds.insert(id, kind);
        self
    }

    /// Returns the footprint of a fixture kind.
    pub fn get(&self, id: FixtureId) -> Option<FixtureKind> {
        self.kinds.get(&id).copied()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl FromIterator<(FixtureId, FixtureKind)> for FixturePalette {
    fn from_iter<T: IntoIterator<Item = (FixtureId, FixtureKind)>>(iter: T) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}

/// A fixture anchored on a tile map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacedFixture {
    /// The fixture kind.
    pub id: FixtureId,
    /// Row of the anchor (top-left) tile.
    pub row: i32,
    /// Column of the anchor (top-left) tile.
    pub col: i32,
    /// Number of columns covered.
    pub width: u32,
    /// Number of rows covered.
    pub height: u32,
}

impl PlacedFixture {
    /// The world-space footprint spanning the fixture's tiles.
    pub fn footprint(&self, grid_size: u32) -> Aabb2d {
        let grid = grid_size as f32;
        let min = Vec2::new(self.col as f32, self.row as f32) * grid;
        let size = Vec2::new(self.width as f32, self.height as f32) * grid;
        Aabb2d::new(min, min + size)
    }
}
