use glam::Vec2;

use crate::{
    bound::Bound,
    math::{axis_collinear, next, prev},
};

impl Bound {
    /// Removes every vertex that is axis-aligned collinear with both of its neighbours,
    /// including the wraparound at the start of the vertex list.
    pub fn simplify(&mut self) {
        self.vertices = simplify_polygon(&self.vertices);
    }
}

/// Returns `vertices` without axis-aligned collinear vertices.
pub(crate) fn simplify_polygon(vertices: &[Vec2]) -> Vec<Vec2> {
    let mut vertices = vertices.to_vec();
    loop {
        let n = vertices.len();
        if n <= 3 {
            return vertices;
        }
        let Some(i) = (0..n).find(|&i| {
            axis_collinear(vertices[prev(i, n)], vertices[i], vertices[next(i, n)])
        }) else {
            return vertices;
        };
        vertices.remove(i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_single_midpoint() {
        let polygon = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let simplified = simplify_polygon(&polygon);
        assert_eq!(
            simplified,
            [
                Vec2::new(0.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(2.0, 1.0),
                Vec2::new(0.0, 1.0),
            ]
        );
    }

    #[test]
    fn removes_wraparound_vertex() {
        // The first vertex sits in the middle of the closing edge.
        let polygon = [
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let simplified = simplify_polygon(&polygon);
        assert_eq!(simplified.len(), 4);
        assert!(!simplified.contains(&Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn convex_polygon_is_untouched() {
        let triangle = [Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(1.0, 3.0)];
        assert_eq!(simplify_polygon(&triangle), triangle);
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert_eq!(simplify_polygon(&square), square);
    }

    #[test]
    fn merged_squares_become_rectangle() {
        let mut ids = crate::BoundIdAllocator::new();
        let merged = crate::merge::merge_polygons(
            &crate::Aabb2d::new(Vec2::ZERO, Vec2::ONE).corners(),
            &crate::Aabb2d::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0)).corners(),
            |_, _| false,
        )
        .unwrap();
        let mut bound = Bound::new(&mut ids, merged);
        bound.simplify();
        assert_eq!(bound.vertices.len(), 4);
        assert_eq!(bound.area(), 2.0);
    }
}
