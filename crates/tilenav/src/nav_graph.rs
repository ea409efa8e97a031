//! The navigation graph: one node per triangle, edges between walkable neighbours.

use std::collections::{BTreeSet, HashMap};

use glam::Vec2;

use crate::{
    bound::Bound,
    bound_builder::DoorId,
    math::{Aabb2d, approx_eq, collinear_overlap},
    region::RegionId,
    tile_map::{Edge, ObstacleEdges},
};

/// Index of a [`NavigationNode`] in [`NavigationGraph::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The index into [`NavigationGraph::nodes`].
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A walkable triangle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationNode {
    /// The id of the node.
    pub id: NodeId,
    /// The room the triangle belongs to.
    pub region: RegionId,
    /// The triangle.
    pub triangle: Bound,
    /// The centroid of the triangle.
    pub centroid: Vec2,
    /// The door whose footprint this triangle covers, if any.
    pub door: Option<DoorId>,
}

impl NavigationNode {
    /// Whether the triangle is part of a door footprint.
    #[inline]
    pub fn is_door(&self) -> bool {
        self.door.is_some()
    }
}

/// An undirected edge between two nodes. Always stored with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationEdge {
    /// The node with the lower id.
    pub a: NodeId,
    /// The node with the higher id.
    pub b: NodeId,
}

impl NavigationEdge {
    /// Creates an edge between two distinct nodes in canonical order.
    pub fn new(a: NodeId, b: NodeId) -> Self {
        Self {
            a: a.min(b),
            b: a.max(b),
        }
    }
}

/// Triangles of one room, as produced by the triangulation stage.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomTriangles {
    /// The room.
    pub region: RegionId,
    /// Floor triangles.
    pub floor: Vec<Bound>,
    /// Door triangles, grouped by door.
    pub doors: Vec<DoorTriangles>,
}

/// The triangles covering one door footprint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorTriangles {
    /// The door.
    pub door: DoorId,
    /// The door footprint, see [`DoorBound::footprint`](crate::DoorBound::footprint).
    pub footprint: Aabb2d,
    /// The triangles.
    pub triangles: Vec<Bound>,
}

/// An immutable graph of walkable triangles. Rebuilt wholesale when the level changes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationGraph {
    /// Nodes, indexed by [`NodeId::index`].
    pub nodes: Vec<NavigationNode>,
    /// Deduplicated edges, sorted.
    pub edges: Vec<NavigationEdge>,
    /// Neighbours of every node, sorted by id.
    pub adjacency: Vec<Vec<NodeId>>,
    /// Door segments, indexed by [`DoorId`].
    pub doors: Vec<Edge>,
}

impl NavigationGraph {
    /// Builds the graph from the triangulated rooms.
    ///
    /// Node ids are assigned room by room: first all floor triangles, then all door triangles.
    /// Triangles of the same room are connected when they share a full edge that is not on a wall.
    /// Door triangles are additionally connected to every triangle with an edge overlapping
    /// one of their edges on a side of the door footprint.
    pub fn build(rooms: &[RoomTriangles], obstacles: &ObstacleEdges) -> Self {
        let mut nodes = Vec::new();
        let mut push = |region: RegionId, triangle: &Bound, door: Option<DoorId>| {
            let id = NodeId(nodes.len() as u32);
            nodes.push(NavigationNode {
                id,
                region,
                centroid: triangle.centroid(),
                triangle: triangle.clone(),
                door,
            });
        };
        for room in rooms {
            for triangle in &room.floor {
                push(room.region, triangle, None);
            }
        }
        let mut footprints: HashMap<DoorId, Aabb2d> = HashMap::new();
        for room in rooms {
            for door in &room.doors {
                footprints.insert(door.door, door.footprint);
                for triangle in &door.triangles {
                    push(room.region, triangle, Some(door.door));
                }
            }
        }

        let mut edges = BTreeSet::new();
        connect_shared_edges(&nodes, obstacles, &mut edges);
        connect_doors(&nodes, &footprints, &mut edges);

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for edge in &edges {
            adjacency[edge.a.index()].push(edge.b);
            adjacency[edge.b.index()].push(edge.a);
        }
        for neighbours in &mut adjacency {
            neighbours.sort_unstable();
        }

        tracing::debug!(
            "Built navigation graph with {} nodes and {} edges",
            nodes.len(),
            edges.len()
        );
        Self {
            nodes,
            edges: edges.into_iter().collect(),
            adjacency,
            doors: obstacles.doors.clone(),
        }
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Option<&NavigationNode> {
        self.nodes.get(id.index())
    }

    /// Returns the sorted neighbours of a node. Empty for unknown ids.
    pub fn neighbours(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(id.index()).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `a` and `b` are connected by an edge.
    pub fn are_neighbours(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbours(a).binary_search(&b).is_ok()
    }

    /// Returns the door segment with the given id.
    pub fn door(&self, door: DoorId) -> Option<&Edge> {
        self.doors.get(door.0 as usize)
    }

    /// Finds the node whose triangle contains `point`. Points on shared edges resolve to the lower id.
    pub fn node_at(&self, point: Vec2) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| node.triangle.contains(point))
            .map(|node| node.id)
    }

    /// The segment shared by two neighbouring triangles: a common edge,
    /// or the overlap of two collinear axis-aligned edges.
    pub fn shared_segment(&self, a: NodeId, b: NodeId) -> Option<(Vec2, Vec2)> {
        let (a, b) = (self.node(a)?, self.node(b)?);
        a.triangle.edges().find_map(|(p, q)| {
            b.triangle.edges().find_map(|(r, s)| {
                let coincident =
                    (approx_eq(p, r) && approx_eq(q, s)) || (approx_eq(p, s) && approx_eq(q, r));
                if coincident {
                    Some((p, q))
                } else {
                    collinear_overlap((p, q), (r, s))
                }
            })
        })
    }
}

/// Quantized, orientation-independent key of a segment.
type EdgeKey = ((i64, i64), (i64, i64));

fn edge_key(a: Vec2, b: Vec2) -> EdgeKey {
    const SCALE: f32 = 1024.0;
    let quantize = |p: Vec2| ((p.x * SCALE).round() as i64, (p.y * SCALE).round() as i64);
    let (a, b) = (quantize(a), quantize(b));
    if a <= b { (a, b) } else { (b, a) }
}

fn connect_shared_edges(
    nodes: &[NavigationNode],
    obstacles: &ObstacleEdges,
    edges: &mut BTreeSet<NavigationEdge>,
) {
    let mut by_edge: HashMap<EdgeKey, Vec<NodeId>> = HashMap::new();
    for node in nodes {
        for (a, b) in node.triangle.edges() {
            by_edge.entry(edge_key(a, b)).or_default().push(node.id);
        }
    }
    for node in nodes {
        for (a, b) in node.triangle.edges() {
            let Some(others) = by_edge.get(&edge_key(a, b)) else {
                continue;
            };
            for &other in others {
                if other <= node.id || nodes[other.index()].region != node.region {
                    continue;
                }
                if obstacles.walls.iter().any(|wall| wall.contains_segment(a, b)) {
                    continue;
                }
                edges.insert(NavigationEdge::new(node.id, other));
            }
        }
    }
}

fn connect_doors(
    nodes: &[NavigationNode],
    footprints: &HashMap<DoorId, Aabb2d>,
    edges: &mut BTreeSet<NavigationEdge>,
) {
    for node in nodes {
        let Some(footprint) = node.door.and_then(|door| footprints.get(&door)) else {
            continue;
        };
        let corners = footprint.corners();
        let sides: Vec<(Vec2, Vec2)> = (0..4).map(|i| (corners[i], corners[(i + 1) % 4])).collect();
        let on_side: Vec<(Vec2, Vec2)> = node
            .triangle
            .edges()
            .filter(|&edge| sides.iter().any(|&side| collinear_overlap(edge, side).is_some()))
            .collect();
        if on_side.is_empty() {
            continue;
        }
        let Some(reach) = node.triangle.aabb() else {
            continue;
        };
        for other in nodes {
            if other.id == node.id {
                continue;
            }
            let touches = other.triangle.aabb().is_some_and(|aabb| aabb.touches(&reach));
            if !touches {
                continue;
            }
            let overlaps = on_side.iter().any(|&edge| {
                other
                    .triangle
                    .edges()
                    .any(|other_edge| collinear_overlap(edge, other_edge).is_some())
            });
            if overlaps {
                edges.insert(NavigationEdge::new(node.id, other.id));
            }
        }
    }
}
