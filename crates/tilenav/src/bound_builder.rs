use glam::Vec2;

use crate::{
    bound::{Bound, BoundIdAllocator},
    fixture::PlacedFixture,
    math::{Aabb2d, approx_eq_f32},
    region::{RegionId, RegionMap},
    tile_map::{Edge, ObstacleEdges, TileMap},
};

/// Index of a door in [`ObstacleEdges::doors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct DoorId(pub u32);

/// The footprint of a door, a [`Bound`] of its own that becomes door navigation nodes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorBound {
    /// The door.
    pub door: DoorId,
    /// The door segment.
    pub edge: Edge,
    /// The door segment expanded by the obstacle extents along its perpendicular.
    pub footprint: Aabb2d,
    /// The walkable parts of the footprint. A single rectangle until obstacles are subtracted.
    pub pieces: Vec<Bound>,
}

/// The polygons of one region as they move through the pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomBounds {
    /// The region this room was built from.
    pub region: RegionId,
    /// Walkable floor polygons.
    pub floor: Vec<Bound>,
    /// Footprints of fixtures anchored in the room.
    pub fixtures: Vec<Bound>,
    /// Footprints of doors on tiles of the room.
    pub doors: Vec<DoorBound>,
}

impl Edge {
    /// The segment expanded by `extents` along its perpendicular, i.e. a rectangle of half-width `extents`.
    /// Callers must ensure the edge is axis-aligned.
    pub fn expanded(&self, extents: f32) -> Aabb2d {
        let min = self.from.min(self.to);
        let max = self.from.max(self.to);
        if approx_eq_f32(self.from.y, self.to.y) {
            Aabb2d::new(
                Vec2::new(min.x, min.y - extents),
                Vec2::new(max.x, max.y + extents),
            )
        } else {
            Aabb2d::new(
                Vec2::new(min.x - extents, min.y),
                Vec2::new(max.x + extents, max.y),
            )
        }
    }
}

impl TileMap {
    /// Builds the unit bounds of every region: one square per floor tile,
    /// one rectangle per fixture anchored in the region, and one footprint per door on a tile of the region.
    ///
    /// Door footprints are only built for positive `obstacle_extents`.
    pub fn build_room_bounds(
        &self,
        regions: &RegionMap,
        obstacles: &ObstacleEdges,
        fixtures: &[PlacedFixture],
        obstacle_extents: f32,
        ids: &mut BoundIdAllocator,
    ) -> Vec<RoomBounds> {
        let mut rooms: Vec<RoomBounds> = regions
            .ids()
            .map(|region| RoomBounds {
                region,
                floor: regions
                    .members(region)
                    .iter()
                    .map(|&(row, col)| {
                        let min = self.corner_to_world(col, row);
                        let max = self.corner_to_world(col + 1, row + 1);
                        Bound::rectangle(ids, Aabb2d::new(min, max))
                    })
                    .collect(),
                fixtures: Vec::new(),
                doors: Vec::new(),
            })
            .collect();

        let room_index = |region: RegionId| (region != RegionId::NONE).then(|| *region as usize - 1);

        for fixture in fixtures {
            let Some(index) = room_index(regions.region(fixture.row, fixture.col)) else {
                tracing::warn!(
                    "Fixture {:?} at ({}, {}) is not anchored on floor, ignoring it",
                    fixture.id,
                    fixture.row,
                    fixture.col
                );
                continue;
            };
            let footprint = fixture.footprint(self.grid_size());
            rooms[index].fixtures.push(Bound::rectangle(ids, footprint));
        }

        if obstacle_extents > 0.0 {
            for (i, edge) in obstacles.doors.iter().enumerate() {
                let Some(index) = self
                    .door_cell(edge)
                    .and_then(|(row, col)| room_index(regions.region(row, col)))
                else {
                    tracing::warn!("Door at {:?} has no floor on either side, ignoring it", edge.center());
                    continue;
                };
                let footprint = edge.expanded(obstacle_extents);
                rooms[index].doors.push(DoorBound {
                    door: DoorId(i as u32),
                    edge: *edge,
                    footprint,
                    pieces: vec![Bound::rectangle(ids, footprint)],
                });
            }
        }

        tracing::debug!(
            "Built {} unit bounds in {} rooms",
            ids.allocated(),
            rooms.len()
        );
        rooms
    }
}
