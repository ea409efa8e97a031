use glam::Vec2;
use thiserror::Error;

use crate::{
    bound::{Bound, BoundIdAllocator},
    bound_builder::RoomBounds,
    math::{EPSILON, approx_eq, cross, point_strictly_in_triangle, strictly_inside_segment},
    nav_graph::{DoorTriangles, RoomTriangles},
};

/// Errors that can occur when triangulating a [`Bound`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriangulationError {
    /// No ear could be clipped. The polygon is either degenerate or not simple.
    #[error("Found no ear to clip in a polygon with {vertices} remaining vertices")]
    NoEar {
        /// The number of vertices that were left when clipping stopped.
        vertices: usize,
    },
}

impl Bound {
    /// Triangulates the bound by ear clipping. Every triangle gets a fresh id.
    ///
    /// A polygon with `n` vertices yields `n - 2` triangles.
    pub fn triangulate(&self, ids: &mut BoundIdAllocator) -> Result<Vec<Bound>, TriangulationError> {
        Ok(triangulate_polygon(&self.vertices)?
            .into_iter()
            .map(|triangle| Bound::new(ids, triangle.to_vec()))
            .collect())
    }
}

impl RoomBounds {
    /// Triangulates the floor and door pieces of the room.
    pub fn triangulate(&self, ids: &mut BoundIdAllocator) -> Result<RoomTriangles, TriangulationError> {
        let mut floor = Vec::new();
        for bound in &self.floor {
            floor.extend(bound.triangulate(ids)?);
        }
        let mut doors = Vec::with_capacity(self.doors.len());
        for door in &self.doors {
            let mut triangles = Vec::new();
            for piece in &door.pieces {
                triangles.extend(piece.triangulate(ids)?);
            }
            doors.push(DoorTriangles {
                door: door.door,
                footprint: door.footprint,
                triangles,
            });
        }
        tracing::debug!(
            "Room {:?}: {} floor and {} door triangles",
            self.region,
            floor.len(),
            doors.iter().map(|door| door.triangles.len()).sum::<usize>()
        );
        Ok(RoomTriangles {
            region: self.region,
            floor,
            doors,
        })
    }
}

/// Clips the first ear of the polygon until three vertices remain.
///
/// `b` with neighbours `a` and `c` is an ear if the turn `a -> b -> c` is strictly convex and
/// no other remaining vertex lies inside the triangle `abc` or on the open diagonal `a-c`.
pub(crate) fn triangulate_polygon(vertices: &[Vec2]) -> Result<Vec<[Vec2; 3]>, TriangulationError> {
    if vertices.len() < 3 {
        return Err(TriangulationError::NoEar {
            vertices: vertices.len(),
        });
    }
    let mut remaining = vertices.to_vec();
    let mut triangles = Vec::with_capacity(vertices.len() - 2);
    while remaining.len() > 3 {
        let n = remaining.len();
        let Some(ear) = (0..n).find(|&i| is_ear(&remaining, i)) else {
            tracing::warn!("Could not triangulate polygon ({n} verts)");
            return Err(TriangulationError::NoEar { vertices: n });
        };
        let (a, b, c) = (remaining[(ear + n - 1) % n], remaining[ear], remaining[(ear + 1) % n]);
        triangles.push([a, b, c]);
        remaining.remove(ear);
    }
    triangles.push([remaining[0], remaining[1], remaining[2]]);
    Ok(triangles)
}

fn is_ear(polygon: &[Vec2], i: usize) -> bool {
    let n = polygon.len();
    let (a, b, c) = (polygon[(i + n - 1) % n], polygon[i], polygon[(i + 1) % n]);
    if cross(b - a, c - b) <= EPSILON {
        return false;
    }
    polygon
        .iter()
        .filter(|&&p| !approx_eq(p, a) && !approx_eq(p, b) && !approx_eq(p, c))
        .all(|&p| !point_strictly_in_triangle(p, a, b, c) && !strictly_inside_segment(p, a, c))
}
