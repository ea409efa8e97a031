#![doc = include_str!("../../../readme.md")]

mod bound;
mod bound_builder;
mod config;
mod fixture;
mod main_api;
pub(crate) mod math;
mod merge;
mod nav_graph;
mod path_finder;
mod path_smoother;
mod persistence;
mod region;
mod shared;
mod simplify;
mod split;
mod subtract;
mod tile_map;
mod triangulate;

pub use bound::{Bound, BoundId, BoundIdAllocator, DebugColor};
pub use bound_builder::{DoorBound, DoorId, RoomBounds};
pub use config::{ConfigError, NavmeshConfig, NavmeshConfigBuilder};
pub use fixture::{FixtureId, FixtureKind, FixturePalette, PlacedFixture};
pub use main_api::{
    BuildError, Navmesh, Room, build_navmesh, find_path, find_path_between_points,
    portals_for_path,
};
pub use math::Aabb2d;
pub use nav_graph::{
    DoorTriangles, NavigationEdge, NavigationGraph, NavigationNode, NodeId, RoomTriangles,
};
pub use path_smoother::{Portal, string_pull};
pub use persistence::TileMapReadError;
pub use region::{RegionId, RegionMap};
pub use shared::{SharedNavigationGraph, build_in_background};
pub use subtract::{Difference, RectilinearClipper, Subtrahends};
pub use tile_map::{Direction, Edge, EdgeKind, ObstacleEdges, TileFlags, TileMap};
pub use triangulate::TriangulationError;
