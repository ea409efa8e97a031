use glam::Vec2;

/// Tolerance used when comparing world-space coordinates.
///
/// All pipeline coordinates are tile multiples of the grid size offset by the
/// obstacle extents, so a loose tolerance is sufficient.
pub(crate) const EPSILON: f32 = 1.0e-4;

/// An axis-aligned rectangle on the xy-plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb2d {
    /// The minimum corner.
    pub min: Vec2,
    /// The maximum corner.
    pub max: Vec2,
}

impl Aabb2d {
    /// Creates a new AABB from its two corners.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Computes the AABB of a set of points.
    /// Returns `None` if `points` is empty.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self { min, max })
    }

    /// Returns the AABB grown by `amount` on all sides.
    pub fn expanded(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    /// Whether the two boxes overlap with a positive area.
    pub fn overlaps(&self, other: &Aabb2d) -> bool {
        self.min.x < other.max.x - EPSILON
            && other.min.x < self.max.x - EPSILON
            && self.min.y < other.max.y - EPSILON
            && other.min.y < self.max.y - EPSILON
    }

    /// Whether the two boxes overlap or touch.
    pub fn touches(&self, other: &Aabb2d) -> bool {
        self.min.x <= other.max.x + EPSILON
            && other.min.x <= self.max.x + EPSILON
            && self.min.y <= other.max.y + EPSILON
            && other.min.y <= self.max.y + EPSILON
    }

    /// The four corners in clockwise order (y grows downward).
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

/// 2D cross product (z component of the 3D cross product).
#[inline]
pub(crate) fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

#[inline]
pub(crate) fn approx_eq(a: Vec2, b: Vec2) -> bool {
    (a - b).abs().max_element() <= EPSILON
}

#[inline]
pub(crate) fn approx_eq_f32(a: f32, b: f32) -> bool {
    (a - b).abs() <= EPSILON
}

#[inline]
pub(crate) fn next(i: usize, n: usize) -> usize {
    if i + 1 >= n { 0 } else { i + 1 }
}

#[inline]
pub(crate) fn prev(i: usize, n: usize) -> usize {
    if i == 0 { n - 1 } else { i - 1 }
}

/// Signed shoelace area. Positive for polygons that are clockwise when y grows downward.
pub(crate) fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    let twice: f32 = (0..n)
        .map(|i| cross(points[i], points[next(i, n)]))
        .sum();
    twice * 0.5
}

/// Area-weighted centroid of a simple polygon.
/// Falls back to the vertex average for degenerate polygons.
pub(crate) fn centroid(points: &[Vec2]) -> Vec2 {
    let n = points.len();
    if n == 0 {
        return Vec2::ZERO;
    }
    let area = signed_area(points);
    if area.abs() <= EPSILON {
        return points.iter().copied().sum::<Vec2>() / n as f32;
    }
    let mut sum = Vec2::ZERO;
    for i in 0..n {
        let a = points[i];
        let b = points[next(i, n)];
        sum += (a + b) * cross(a, b);
    }
    sum / (6.0 * area)
}

#[inline]
pub(crate) fn is_axis_aligned(a: Vec2, b: Vec2) -> bool {
    approx_eq_f32(a.x, b.x) || approx_eq_f32(a.y, b.y)
}

/// Whether `a`, `b` and `c` lie on one horizontal or vertical line.
#[inline]
pub(crate) fn axis_collinear(a: Vec2, b: Vec2, c: Vec2) -> bool {
    (approx_eq_f32(a.x, b.x) && approx_eq_f32(b.x, c.x))
        || (approx_eq_f32(a.y, b.y) && approx_eq_f32(b.y, c.y))
}

/// Whether `p` lies on segment `a`-`b`, excluding both endpoints.
pub(crate) fn strictly_inside_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    if approx_eq(p, a) || approx_eq(p, b) {
        return false;
    }
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= EPSILON * EPSILON {
        return false;
    }
    if cross(ab, p - a).abs() / len_sq.sqrt() > EPSILON {
        return false;
    }
    let t = (p - a).dot(ab) / len_sq;
    t > 0.0 && t < 1.0
}

/// Whether `p` lies on segment `a`-`b`, endpoints included.
pub(crate) fn on_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    approx_eq(p, a) || approx_eq(p, b) || strictly_inside_segment(p, a, b)
}

/// Returns the overlapping part of two collinear axis-aligned segments,
/// or `None` if they are not on the same line or only touch at a point.
pub(crate) fn collinear_overlap(a: (Vec2, Vec2), b: (Vec2, Vec2)) -> Option<(Vec2, Vec2)> {
    let horizontal = |s: (Vec2, Vec2)| approx_eq_f32(s.0.y, s.1.y);
    let vertical = |s: (Vec2, Vec2)| approx_eq_f32(s.0.x, s.1.x);

    if horizontal(a) && horizontal(b) && approx_eq_f32(a.0.y, b.0.y) {
        let lo = a.0.x.min(a.1.x).max(b.0.x.min(b.1.x));
        let hi = a.0.x.max(a.1.x).min(b.0.x.max(b.1.x));
        (hi - lo > EPSILON).then(|| (Vec2::new(lo, a.0.y), Vec2::new(hi, a.0.y)))
    } else if vertical(a) && vertical(b) && approx_eq_f32(a.0.x, b.0.x) {
        let lo = a.0.y.min(a.1.y).max(b.0.y.min(b.1.y));
        let hi = a.0.y.max(a.1.y).min(b.0.y.max(b.1.y));
        (hi - lo > EPSILON).then(|| (Vec2::new(a.0.x, lo), Vec2::new(a.0.x, hi)))
    } else {
        None
    }
}

/// Even-odd point in polygon test.
pub(crate) fn polygon_contains(points: &[Vec2], p: Vec2) -> bool {
    let n = points.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let a = points[i];
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Barycentric point-in-triangle test that excludes the triangle's boundary.
pub(crate) fn point_strictly_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;
    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);
    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() <= f32::EPSILON {
        return false;
    }
    let inv = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv;
    let v = (dot00 * dot12 - dot01 * dot02) * inv;
    const BARY_EPSILON: f32 = 1.0e-6;
    u > BARY_EPSILON && v > BARY_EPSILON && u + v < 1.0 - BARY_EPSILON
}

/// Point-in-triangle test that includes the boundary.
pub(crate) fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = cross(b - a, p - a);
    let d2 = cross(c - b, p - b);
    let d3 = cross(a - c, p - c);
    let has_neg = d1 < -EPSILON || d2 < -EPSILON || d3 < -EPSILON;
    let has_pos = d1 > EPSILON || d2 > EPSILON || d3 > EPSILON;
    !(has_neg && has_pos)
}
