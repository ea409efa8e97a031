use std::{
    collections::VecDeque,
    ops::{Deref, DerefMut},
};

use crate::tile_map::{Direction, TileMap};

/// A connected floor region of a [`TileMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct RegionId(pub u32);

impl Deref for RegionId {
    type Target = u32;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RegionId {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<u32> for RegionId {
    fn from(value: u32) -> Self {
        RegionId(value)
    }
}

impl RegionId {
    /// Cells that are not floor.
    pub const NONE: Self = Self(0);
}

/// The region of every cell of a [`TileMap`], built with [`TileMap::traverse_regions`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionMap {
    width: u32,
    height: u32,
    /// Region per cell in row-major order. [Size: `width * height`]
    regions: Vec<RegionId>,
    /// Member cells per region, indexed by `region - 1`, in discovery order.
    members: Vec<Vec<(i32, i32)>>,
}

impl RegionMap {
    /// The region of the cell, [`RegionId::NONE`] for non-floor or out-of-range cells.
    pub fn region(&self, row: i32, col: i32) -> RegionId {
        let in_bounds =
            row >= 0 && col >= 0 && (row as u32) < self.height && (col as u32) < self.width;
        if !in_bounds {
            return RegionId::NONE;
        }
        self.regions[row as usize * self.width as usize + col as usize]
    }

    /// Number of regions found.
    pub fn region_count(&self) -> usize {
        self.members.len()
    }

    /// Iterates over all region ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        (1..=self.members.len() as u32).map(RegionId)
    }

    /// The `(row, col)` cells of a region in flood-fill order.
    pub fn members(&self, region: RegionId) -> &[(i32, i32)] {
        if region == RegionId::NONE {
            return &[];
        }
        self.members
            .get(*region as usize - 1)
            .map_or(&[], Vec::as_slice)
    }
}

impl TileMap {
    /// Flood-fills the floor tiles into connected regions.
    ///
    /// Two floor tiles belong to the same region iff they are 4-adjacent without a wall between them.
    /// Doors do not block connectivity.
    ///
    /// Cells are visited in column-major order and every unvisited floor cell seeds a breadth-first
    /// fill with the next region id, starting at 1.
    pub fn traverse_regions(&self) -> RegionMap {
        let width = self.width();
        let height = self.height();
        let mut regions = vec![RegionId::NONE; width as usize * height as usize];
        let mut members = Vec::new();
        let index = |row: i32, col: i32| row as usize * width as usize + col as usize;

        let mut queue = VecDeque::new();
        let mut next_region = RegionId::from(1);
        for col in 0..width as i32 {
            for row in 0..height as i32 {
                if !self.is_floor(row, col) || regions[index(row, col)] != RegionId::NONE {
                    continue;
                }
                let region = next_region;
                *next_region += 1;

                let mut cells = Vec::new();
                regions[index(row, col)] = region;
                queue.push_back((row, col));
                while let Some((row, col)) = queue.pop_front() {
                    cells.push((row, col));
                    for direction in Direction::ALL {
                        let (d_row, d_col) = direction.offset();
                        let (n_row, n_col) = (row + d_row, col + d_col);
                        if !self.is_floor(n_row, n_col)
                            || regions[index(n_row, n_col)] != RegionId::NONE
                            || self.wall_between(row, col, direction)
                        {
                            continue;
                        }
                        regions[index(n_row, n_col)] = region;
                        queue.push_back((n_row, n_col));
                    }
                }
                members.push(cells);
            }
        }
        tracing::debug!("Found {} regions", members.len());
        RegionMap {
            width,
            height,
            regions,
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileFlags;

    fn strip(len: u32) -> TileMap {
        let mut map = TileMap::new(len, 1, 1);
        for col in 0..len as i32 {
            map.set(0, col, TileFlags::FLOOR);
        }
        map
    }

    #[test]
    fn wall_splits_regions() {
        let mut map = strip(2);
        map.set(0, 0, TileFlags::WALL_EAST);
        let regions = map.traverse_regions();
        assert_eq!(regions.region_count(), 2);
        assert_eq!(regions.region(0, 0), RegionId(1));
        assert_eq!(regions.region(0, 1), RegionId(2));

        map.clear(0, 0, TileFlags::WALL_EAST);
        let regions = map.traverse_regions();
        assert_eq!(regions.region_count(), 1);
        assert_eq!(regions.region(0, 0), regions.region(0, 1));
    }

    #[test]
    fn doors_do_not_block() {
        let mut map = strip(3);
        map.set(0, 1, TileFlags::DOOR_EAST | TileFlags::DOOR_WEST);
        let regions = map.traverse_regions();
        assert_eq!(regions.region_count(), 1);
        assert_eq!(regions.members(RegionId(1)).len(), 3);
    }

    #[test]
    fn non_floor_is_region_none() {
        let mut map = TileMap::new(3, 1, 1);
        map.set(0, 0, TileFlags::FLOOR);
        map.set(0, 2, TileFlags::FLOOR);
        let regions = map.traverse_regions();
        assert_eq!(regions.region(0, 1), RegionId::NONE);
        assert_eq!(regions.region(0, 5), RegionId::NONE);
        assert_eq!(regions.region_count(), 2);
    }

    #[test]
    fn ids_follow_column_major_order() {
        // Two single-cell regions: (1, 0) comes before (0, 1) in column-major order.
        let mut map = TileMap::new(2, 2, 1);
        map.set(1, 0, TileFlags::FLOOR);
        map.set(0, 1, TileFlags::FLOOR);
        let regions = map.traverse_regions();
        assert_eq!(regions.region(1, 0), RegionId(1));
        assert_eq!(regions.region(0, 1), RegionId(2));
        assert_eq!(regions.ids().collect::<Vec<_>>(), [RegionId(1), RegionId(2)]);
    }
}
