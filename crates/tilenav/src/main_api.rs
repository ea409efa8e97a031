use glam::Vec2;
use thiserror::Error;

use crate::{
    bound::{Bound, BoundIdAllocator},
    config::{ConfigError, NavmeshConfig},
    fixture::FixturePalette,
    nav_graph::{NavigationGraph, NodeId, RoomTriangles},
    path_smoother::Portal,
    region::{RegionId, RegionMap},
    subtract::{Difference, Subtrahends},
    tile_map::{ObstacleEdges, TileMap},
    triangulate::TriangulationError,
};

/// Errors that can occur when building a [`Navmesh`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// A wall or door segment runs diagonally.
    #[error("Obstacle edge from {from} to {to} is not axis-aligned")]
    NonAxisAlignedEdge {
        /// Start of the edge.
        from: Vec2,
        /// End of the edge.
        to: Vec2,
    },
    /// A polygon could not be triangulated.
    #[error("Failed to triangulate room polygon: {0}")]
    Triangulation(#[from] TriangulationError),
    /// The configuration does not fit the tile map.
    #[error("Invalid navmesh config: {0}")]
    Config(#[from] ConfigError),
}

/// The triangles of one connected floor region, for debug overlays.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    /// The region.
    pub region: RegionId,
    /// Floor triangles followed by the triangles of the doors on the room's tiles.
    pub triangles: Vec<Bound>,
}

impl From<&RoomTriangles> for Room {
    fn from(room: &RoomTriangles) -> Self {
        Self {
            region: room.region,
            triangles: room
                .floor
                .iter()
                .chain(room.doors.iter().flat_map(|door| &door.triangles))
                .cloned()
                .collect(),
        }
    }
}

/// The output of [`build_navmesh`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Navmesh {
    /// The regions of the tile map.
    pub regions: RegionMap,
    /// Walls and doors of the tile map.
    pub obstacles: ObstacleEdges,
    /// The triangles of every room.
    pub rooms: Vec<Room>,
    /// The graph to run path queries on.
    pub graph: NavigationGraph,
}

/// Builds the navigation mesh of a tile map.
///
/// Runs the whole pipeline: regions are flood-filled, every room's tiles are merged into polygons
/// which are simplified, split where they touch each other, cut back from the obstacles by the
/// configured clearance, split again where the cuts left new vertices on shared edges,
/// and finally triangulated and connected into a [`NavigationGraph`].
///
/// # Errors
///
/// Fails if the config does not fit the map, or if the geometry turns out to be inconsistent.
pub fn build_navmesh(
    tile_map: &TileMap,
    palette: &FixturePalette,
    config: &NavmeshConfig,
    clipper: &impl Difference,
) -> Result<Navmesh, BuildError> {
    config.validate(tile_map.grid_size())?;
    let extents = config.obstacle_extents;

    let regions = tile_map.traverse_regions();
    let obstacles = tile_map.extract_walls_and_doors();
    let fixtures = tile_map.fixtures(palette);
    let subtrahends = Subtrahends::new(&obstacles, &fixtures, tile_map.grid_size(), extents)?;

    let mut ids = BoundIdAllocator::new();
    let rooms = tile_map.build_room_bounds(&regions, &obstacles, &fixtures, extents, &mut ids);
    let mut triangulated = Vec::with_capacity(rooms.len());
    for mut room in rooms {
        room.merge_floor(&obstacles, &mut ids);
        for bound in &mut room.floor {
            bound.simplify();
        }
        room.split_at_intersections();
        room.subtract_obstacles(&subtrahends, clipper, &mut ids);
        // Clearance corners and cut lines can end on the boundary of a neighbouring piece.
        room.split_at_intersections();
        triangulated.push(room.triangulate(&mut ids)?);
    }

    let graph = NavigationGraph::build(&triangulated, &obstacles);
    tracing::debug!(
        "Built navmesh with {} rooms, {} walls and {} doors",
        triangulated.len(),
        obstacles.walls.len(),
        obstacles.doors.len()
    );
    Ok(Navmesh {
        regions,
        rooms: triangulated.iter().map(Room::from).collect(),
        obstacles,
        graph,
    })
}

/// Finds a smoothed path from `start` in node `from` to `end` in node `to`.
///
/// Returns an empty path if `to` is unreachable.
pub fn find_path(graph: &NavigationGraph, from: NodeId, to: NodeId, start: Vec2, end: Vec2) -> Vec<Vec2> {
    match graph.find_node_path(from, to) {
        Some(nodes) => graph.smooth_path(&nodes, start, end),
        None => Vec::new(),
    }
}

/// Like [`find_path`], but looks up the triangles containing `start` and `end` first.
///
/// Returns an empty path if either point is off the navmesh.
pub fn find_path_between_points(graph: &NavigationGraph, start: Vec2, end: Vec2) -> Vec<Vec2> {
    let (Some(from), Some(to)) = (graph.node_at(start), graph.node_at(end)) else {
        tracing::debug!("Path endpoint {start} or {end} is not on the navmesh");
        return Vec::new();
    };
    find_path(graph, from, to, start, end)
}

/// The portals a path from `from` to `to` passes through, for debug overlays.
pub fn portals_for_path(graph: &NavigationGraph, from: NodeId, to: NodeId) -> Vec<Portal> {
    graph
        .find_node_path(from, to)
        .map(|nodes| graph.portals(&nodes))
        .unwrap_or_default()
}
