use glam::Vec2;

use crate::math::{self, Aabb2d};

/// Unique id of a [`Bound`] within one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct BoundId(pub u32);

/// Hands out [`BoundId`]s. One allocator is threaded through a single build,
/// so rebuilding a level never collides with ids of a previous build.
#[derive(Debug, Default)]
pub struct BoundIdAllocator {
    next: u32,
}

impl BoundIdAllocator {
    /// Creates an allocator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id.
    pub fn allocate(&mut self) -> BoundId {
        let id = BoundId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }
}

/// A cosmetic color for debug overlays. Derived deterministically from the [`BoundId`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugColor {
    /// Red in `[0, 1]`.
    pub r: f32,
    /// Green in `[0, 1]`.
    pub g: f32,
    /// Blue in `[0, 1]`.
    pub b: f32,
}

impl DebugColor {
    /// Spreads hues by the golden ratio so that neighbouring ids get distinct colors.
    pub fn from_id(id: BoundId) -> Self {
        const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;
        let hue = (id.0 as f32 * GOLDEN_RATIO_CONJUGATE).fract() * 6.0;
        let x = 1.0 - (hue % 2.0 - 1.0).abs();
        let (r, g, b) = match hue as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        Self { r, g, b }
    }
}

/// A simple polygon tracked through the pipeline.
///
/// Vertices are clockwise when y grows downward, i.e. [`Bound::area`] is positive.
/// Until triangulation all edges are axis-aligned.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Bound {
    /// The id of the bound.
    pub id: BoundId,
    /// Debug overlay color.
    pub color: DebugColor,
    /// The polygon outline.
    pub vertices: Vec<Vec2>,
}

impl Bound {
    /// Creates a bound with a fresh id.
    pub fn new(ids: &mut BoundIdAllocator, vertices: Vec<Vec2>) -> Self {
        let id = ids.allocate();
        Self {
            id,
            color: DebugColor::from_id(id),
            vertices,
        }
    }

    /// Creates a rectangular bound.
    pub fn rectangle(ids: &mut BoundIdAllocator, aabb: Aabb2d) -> Self {
        Self::new(ids, aabb.corners().to_vec())
    }

    /// Iterates over the edges as `(from, to)` pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[math::next(i, n)]))
    }

    /// Polygon area. Positive for correctly wound bounds.
    pub fn area(&self) -> f32 {
        math::signed_area(&self.vertices)
    }

    /// Area-weighted centroid.
    pub fn centroid(&self) -> Vec2 {
        math::centroid(&self.vertices)
    }

    /// Axis-aligned bounding box. Returns `None` for an empty bound.
    pub fn aabb(&self) -> Option<Aabb2d> {
        Aabb2d::from_points(&self.vertices)
    }

    /// Whether `point` is one of the vertices.
    pub fn has_vertex(&self, point: Vec2) -> bool {
        self.vertices.iter().any(|v| math::approx_eq(*v, point))
    }

    /// Whether `point` lies inside or on the polygon.
    pub fn contains(&self, point: Vec2) -> bool {
        if self.vertices.len() == 3 {
            let [a, b, c] = [self.vertices[0], self.vertices[1], self.vertices[2]];
            return math::point_in_triangle(point, a, b, c);
        }
        math::polygon_contains(&self.vertices, point)
            || self
                .edges()
                .any(|(a, b)| math::strictly_inside_segment(point, a, b) || math::approx_eq(a, point))
    }
}
