//! Tile maps, their flags, and the wall and door edges extracted from them.

use glam::Vec2;

use crate::fixture::{FixtureId, FixturePalette, PlacedFixture};

bitflags::bitflags! {
    /// Per-cell flags of a [`TileMap`].
    ///
    /// Only [`TileFlags::FLOOR`], the wall bits and the door bits influence navigation.
    /// Corner and terminus bits are carried for the renderer and the level editor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[repr(transparent)]
    pub struct TileFlags: u64 {
        /// The cell is walkable floor.
        const FLOOR = 1 << 0;

        /// Interior wall on the north side of the cell.
        const WALL_NORTH = 1 << 1;
        /// Interior wall on the east side of the cell.
        const WALL_EAST = 1 << 2;
        /// Interior wall on the south side of the cell.
        const WALL_SOUTH = 1 << 3;
        /// Interior wall on the west side of the cell.
        const WALL_WEST = 1 << 4;

        /// Exterior wall on the north side of the cell.
        const EXTERIOR_NORTH = 1 << 5;
        /// Exterior wall on the east side of the cell.
        const EXTERIOR_EAST = 1 << 6;
        /// Exterior wall on the south side of the cell.
        const EXTERIOR_SOUTH = 1 << 7;
        /// Exterior wall on the west side of the cell.
        const EXTERIOR_WEST = 1 << 8;

        /// Inner corner piece in the north-east corner.
        const CORNER_INNER_NE = 1 << 9;
        /// Inner corner piece in the south-east corner.
        const CORNER_INNER_SE = 1 << 10;
        /// Inner corner piece in the south-west corner.
        const CORNER_INNER_SW = 1 << 11;
        /// Inner corner piece in the north-west corner.
        const CORNER_INNER_NW = 1 << 12;
        /// Outer corner piece in the north-east corner.
        const CORNER_OUTER_NE = 1 << 13;
        /// Outer corner piece in the south-east corner.
        const CORNER_OUTER_SE = 1 << 14;
        /// Outer corner piece in the south-west corner.
        const CORNER_OUTER_SW = 1 << 15;
        /// Outer corner piece in the north-west corner.
        const CORNER_OUTER_NW = 1 << 16;

        /// A wall run ends at the north side.
        const TERMINUS_NORTH = 1 << 17;
        /// A wall run ends at the east side.
        const TERMINUS_EAST = 1 << 18;
        /// A wall run ends at the south side.
        const TERMINUS_SOUTH = 1 << 19;
        /// A wall run ends at the west side.
        const TERMINUS_WEST = 1 << 20;

        /// Door on the north side of the cell.
        const DOOR_NORTH = 1 << 21;
        /// Door on the east side of the cell.
        const DOOR_EAST = 1 << 22;
        /// Door on the south side of the cell.
        const DOOR_SOUTH = 1 << 23;
        /// Door on the west side of the cell.
        const DOOR_WEST = 1 << 24;
    }
}

/// A side of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Towards row - 1.
    North,
    /// Towards col + 1.
    East,
    /// Towards row + 1.
    South,
    /// Towards col - 1.
    West,
}

impl Direction {
    /// All directions in flag order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The `(row, col)` offset to the neighbouring cell.
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }

    /// The direction pointing back.
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// The interior wall bit for this side.
    #[inline]
    pub fn wall(self) -> TileFlags {
        match self {
            Direction::North => TileFlags::WALL_NORTH,
            Direction::East => TileFlags::WALL_EAST,
            Direction::South => TileFlags::WALL_SOUTH,
            Direction::West => TileFlags::WALL_WEST,
        }
    }

    /// The exterior wall bit for this side.
    #[inline]
    pub fn exterior_wall(self) -> TileFlags {
        match self {
            Direction::North => TileFlags::EXTERIOR_NORTH,
            Direction::East => TileFlags::EXTERIOR_EAST,
            Direction::South => TileFlags::EXTERIOR_SOUTH,
            Direction::West => TileFlags::EXTERIOR_WEST,
        }
    }

    /// The door bit for this side.
    #[inline]
    pub fn door(self) -> TileFlags {
        match self {
            Direction::North => TileFlags::DOOR_NORTH,
            Direction::East => TileFlags::DOOR_EAST,
            Direction::South => TileFlags::DOOR_SOUTH,
            Direction::West => TileFlags::DOOR_WEST,
        }
    }

    /// The side of the cell at `(row, col)` in grid units, from the lower coordinate to the higher one.
    fn side(self, row: i32, col: i32) -> ((i32, i32), (i32, i32)) {
        // (x, y) pairs
        match self {
            Direction::North => ((col, row), (col + 1, row)),
            Direction::East => ((col + 1, row), (col + 1, row + 1)),
            Direction::South => ((col, row + 1), (col + 1, row + 1)),
            Direction::West => ((col, row), (col, row + 1)),
        }
    }
}

/// What an [`Edge`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    /// Blocks connectivity and is a clearance obstacle.
    Wall,
    /// Topologically open, but a clearance obstacle.
    Door,
}

/// An axis-aligned wall or door segment in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// Start point, the lower coordinate for extracted edges.
    pub from: Vec2,
    /// End point.
    pub to: Vec2,
    /// Whether this is a wall or a door.
    pub kind: EdgeKind,
}

impl Edge {
    /// Whether the segment runs along the x- or y-axis.
    pub fn is_axis_aligned(&self) -> bool {
        crate::math::is_axis_aligned(self.from, self.to)
    }

    /// The midpoint of the segment.
    pub fn center(&self) -> Vec2 {
        (self.from + self.to) * 0.5
    }

    /// Whether the segment `a`-`b` is this edge, in either orientation.
    pub fn coincides(&self, a: Vec2, b: Vec2) -> bool {
        use crate::math::approx_eq;
        (approx_eq(self.from, a) && approx_eq(self.to, b))
            || (approx_eq(self.from, b) && approx_eq(self.to, a))
    }

    /// Whether the segment `a`-`b` lies on this edge's line within its extent.
    pub fn contains_segment(&self, a: Vec2, b: Vec2) -> bool {
        match crate::math::collinear_overlap((self.from, self.to), (a, b)) {
            Some((lo, hi)) => {
                let overlap = lo.distance(hi);
                crate::math::approx_eq_f32(overlap, a.distance(b))
            }
            None => false,
        }
    }
}

/// Walls and doors of a [`TileMap`], as extracted by [`TileMap::extract_walls_and_doors`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ObstacleEdges {
    /// Interior wall segments.
    pub walls: Vec<Edge>,
    /// Door segments.
    pub doors: Vec<Edge>,
}

impl ObstacleEdges {
    /// Iterates over walls and doors.
    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.walls.iter().chain(self.doors.iter())
    }

    /// Whether the segment `a`-`b` is exactly a wall or a door segment.
    pub fn blocks(&self, a: Vec2, b: Vec2) -> bool {
        self.iter().any(|edge| edge.coincides(a, b))
    }
}

/// A grid of tiles.
///
/// Every cell is a 64-bit word. The low bits are [`TileFlags`],
/// the high 32 bits hold the [`FixtureId`] of a fixture anchored at that cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TileMap {
    /// Number of columns.
    width: u32,
    /// Number of rows.
    height: u32,
    /// Edge length of a tile in world units.
    grid_size: u32,
    /// The cells in row-major order. [Size: `width * height`]
    cells: Vec<u64>,
}

impl TileMap {
    const FLAGS_MASK: u64 = 0xFFFF_FFFF;
    const FIXTURE_SHIFT: u32 = 32;

    /// Creates an empty tile map.
    pub fn new(width: u32, height: u32, grid_size: u32) -> Self {
        Self {
            width,
            height,
            grid_size,
            cells: vec![0; width as usize * height as usize],
        }
    }

    /// Creates a tile map from raw cell words in row-major order.
    /// Returns `None` if the number of cells does not match the dimensions.
    pub fn from_cells(width: u32, height: u32, grid_size: u32, cells: Vec<u64>) -> Option<Self> {
        (cells.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            grid_size,
            cells,
        })
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Edge length of a tile in world units.
    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// The raw cell words in row-major order.
    #[inline]
    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    #[inline]
    fn cell_index(&self, row: i32, col: i32) -> Option<usize> {
        let in_bounds =
            row >= 0 && col >= 0 && (row as u32) < self.height && (col as u32) < self.width;
        in_bounds.then(|| row as usize * self.width as usize + col as usize)
    }

    /// Returns the raw 64-bit word of a cell. Out-of-range cells read as `0`.
    #[inline]
    pub fn raw(&self, row: i32, col: i32) -> u64 {
        self.cell_index(row, col).map_or(0, |i| self.cells[i])
    }

    /// Returns the flags of a cell. Out-of-range cells have no flags set.
    #[inline]
    pub fn flags(&self, row: i32, col: i32) -> TileFlags {
        TileFlags::from_bits_retain(self.raw(row, col) & Self::FLAGS_MASK)
    }

    /// Whether all of `flags` are set on the cell.
    #[inline]
    pub fn has(&self, row: i32, col: i32, flags: TileFlags) -> bool {
        self.flags(row, col).contains(flags)
    }

    /// Whether the cell is floor.
    #[inline]
    pub fn is_floor(&self, row: i32, col: i32) -> bool {
        self.has(row, col, TileFlags::FLOOR)
    }

    /// Sets `flags` on the cell. Writes outside the map are ignored.
    pub fn set(&mut self, row: i32, col: i32, flags: TileFlags) {
        let Some(i) = self.cell_index(row, col) else {
            tracing::warn!("Ignoring flag write outside of the tile map at ({row}, {col})");
            return;
        };
        self.cells[i] |= flags.bits();
    }

    /// Clears `flags` on the cell. Writes outside the map are ignored.
    pub fn clear(&mut self, row: i32, col: i32, flags: TileFlags) {
        let Some(i) = self.cell_index(row, col) else {
            tracing::warn!("Ignoring flag clear outside of the tile map at ({row}, {col})");
            return;
        };
        self.cells[i] &= !flags.bits();
    }

    /// Returns the fixture anchored at the cell, if any.
    pub fn fixture(&self, row: i32, col: i32) -> Option<FixtureId> {
        FixtureId::new((self.raw(row, col) >> Self::FIXTURE_SHIFT) as u32)
    }

    /// Anchors a fixture at the cell, or removes it with `None`.
    pub fn set_fixture(&mut self, row: i32, col: i32, fixture: Option<FixtureId>) {
        let Some(i) = self.cell_index(row, col) else {
            tracing::warn!("Ignoring fixture write outside of the tile map at ({row}, {col})");
            return;
        };
        let id = fixture.map_or(0, FixtureId::get) as u64;
        self.cells[i] = (self.cells[i] & Self::FLAGS_MASK) | (id << Self::FIXTURE_SHIFT);
    }

    /// Whether a wall separates the cell from its neighbour in `direction`.
    /// Both interior and exterior wall bits on either side count.
    pub fn wall_between(&self, row: i32, col: i32, direction: Direction) -> bool {
        let (d_row, d_col) = direction.offset();
        let here = self.flags(row, col);
        let there = self.flags(row + d_row, col + d_col);
        let back = direction.opposite();
        here.intersects(direction.wall() | direction.exterior_wall())
            || there.intersects(back.wall() | back.exterior_wall())
    }

    /// Converts a grid corner `(x, y)` into world space.
    #[inline]
    pub fn corner_to_world(&self, x: i32, y: i32) -> Vec2 {
        Vec2::new(x as f32, y as f32) * self.grid_size as f32
    }

    /// Converts a world position into the `(row, col)` of the containing cell.
    pub fn world_to_cell(&self, position: Vec2) -> (i32, i32) {
        let cell = (position / self.grid_size as f32).floor();
        (cell.y as i32, cell.x as i32)
    }

    /// Scans all cells and emits one [`Edge`] per set interior wall or door bit.
    ///
    /// Edges point from the lower coordinate to the higher one. A side flagged
    /// by both neighbouring cells is emitted once.
    pub fn extract_walls_and_doors(&self) -> ObstacleEdges {
        let mut seen = std::collections::HashSet::new();
        let mut obstacles = ObstacleEdges::default();
        for row in 0..self.height as i32 {
            for col in 0..self.width as i32 {
                let flags = self.flags(row, col);
                for direction in Direction::ALL {
                    let kind = if flags.contains(direction.wall()) {
                        EdgeKind::Wall
                    } else if flags.contains(direction.door()) {
                        EdgeKind::Door
                    } else {
                        continue;
                    };
                    let (from, to) = direction.side(row, col);
                    if !seen.insert((from, to, kind)) {
                        continue;
                    }
                    let edge = Edge {
                        from: self.corner_to_world(from.0, from.1),
                        to: self.corner_to_world(to.0, to.1),
                        kind,
                    };
                    match kind {
                        EdgeKind::Wall => obstacles.walls.push(edge),
                        EdgeKind::Door => obstacles.doors.push(edge),
                    }
                }
            }
        }
        obstacles
    }

    /// The `(row, col)` of the floor cell owning a door edge: the cell whose side the door is on.
    /// Prefers the cell below/right of the segment when both sides are floor.
    pub fn door_cell(&self, door: &Edge) -> Option<(i32, i32)> {
        let (row, col) = self.world_to_cell(door.from);
        let horizontal = crate::math::approx_eq_f32(door.from.y, door.to.y);
        let candidates = if horizontal {
            [(row, col), (row - 1, col)]
        } else {
            [(row, col), (row, col - 1)]
        };
        candidates.into_iter().find(|(r, c)| self.is_floor(*r, *c))
    }

    /// Enumerates the fixtures placed on the map. Fixture ids missing from the
    /// palette are treated as a single tile.
    pub fn fixtures(&self, palette: &FixturePalette) -> Vec<PlacedFixture> {
        let mut fixtures = Vec::new();
        for row in 0..self.height as i32 {
            for col in 0..self.width as i32 {
                let Some(id) = self.fixture(row, col) else {
                    continue;
                };
                let kind = palette.get(id).unwrap_or_else(|| {
                    tracing::warn!("Unknown fixture {id:?} at ({row}, {col}), assuming 1x1");
                    Default::default()
                });
                fixtures.push(PlacedFixture {
                    id,
                    row,
                    col,
                    width: kind.width,
                    height: kind.height,
                });
            }
        }
        fixtures
    }
}
