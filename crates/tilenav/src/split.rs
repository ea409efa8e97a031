use std::collections::VecDeque;

use glam::Vec2;

use crate::{
    bound_builder::RoomBounds,
    math::{approx_eq, collinear_overlap, strictly_inside_segment},
};

impl RoomBounds {
    /// Inserts vertices into every floor bound where its outline overlaps the edge of
    /// a door footprint, a fixture, or another floor bound of the room.
    ///
    /// Afterwards, bounds that touch along a segment share the segment's endpoints as vertices.
    pub fn split_at_intersections(&mut self) {
        let mut inserted = 0_usize;
        for index in 0..self.floor.len() {
            let footprint_edges = self.doors.iter().flat_map(|door| {
                let corners = door.footprint.corners();
                (0..4).map(move |i| (corners[i], corners[(i + 1) % 4]))
            });
            let foreign: Vec<(Vec2, Vec2)> = self
                .fixtures
                .iter()
                .chain(
                    self.floor
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != index)
                        .map(|(_, bound)| bound),
                )
                .flat_map(|bound| bound.edges())
                .chain(footprint_edges)
                .collect();
            let before = self.floor[index].vertices.len();
            self.floor[index].vertices = split_polygon(&self.floor[index].vertices, foreign);
            inserted += self.floor[index].vertices.len() - before;
        }
        tracing::debug!("Room {:?}: inserted {inserted} split vertices", self.region);
    }
}

/// Splits the edges of `vertices` at the endpoints of the overlapping `foreign` edges.
///
/// Each pass inserts at most one vertex and re-queues the foreign edge that caused it,
/// so an edge crossing several polygon edges is handled over several passes.
pub(crate) fn split_polygon(
    vertices: &[Vec2],
    foreign: impl IntoIterator<Item = (Vec2, Vec2)>,
) -> Vec<Vec2> {
    let mut vertices = vertices.to_vec();
    let mut queue: VecDeque<(Vec2, Vec2)> = foreign.into_iter().collect();
    while let Some(edge) = queue.pop_front() {
        if let Some(split) = insert_split_vertex(&vertices, edge) {
            vertices = split;
            queue.push_back(edge);
        }
    }
    vertices
}

/// Inserts the first endpoint of `edge` that lies strictly inside an overlapping polygon edge
/// and is not a vertex yet. Returns `None` if nothing was inserted.
fn insert_split_vertex(vertices: &[Vec2], edge: (Vec2, Vec2)) -> Option<Vec<Vec2>> {
    let n = vertices.len();
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[(i + 1) % n]);
        if collinear_overlap((a, b), edge).is_none() {
            continue;
        }
        let is_vertex = |p: Vec2| vertices.iter().any(|v| approx_eq(*v, p));
        let Some(point) = [edge.0, edge.1]
            .into_iter()
            .find(|p| !is_vertex(*p) && strictly_inside_segment(*p, a, b))
        else {
            continue;
        };
        return Some([&vertices[..=i], &[point], &vertices[i + 1..]].concat());
    }
    None
}
