//! Carving obstacle clearance out of the room polygons.
//!
//! Walls, doors and fixtures are turned into axis-aligned rectangles grown by the
//! obstacle extents, which are then removed from the floor polygons through a
//! [`Difference`] implementation. The crate ships [`RectilinearClipper`], which is exact
//! for axis-aligned input.

use std::collections::HashMap;

use glam::Vec2;

use crate::{
    bound::{Bound, BoundIdAllocator},
    bound_builder::RoomBounds,
    fixture::PlacedFixture,
    main_api::BuildError,
    math::{Aabb2d, EPSILON, approx_eq, polygon_contains, signed_area},
    tile_map::ObstacleEdges,
};

/// Polygon boolean difference.
///
/// Implementations receive two simple polygons with positive [`signed area`](crate::Bound::area)
/// and return the parts of `subject` outside of `clip`, each again a simple polygon with positive area.
/// An empty result means the subject was fully consumed.
pub trait Difference {
    /// Computes `subject - clip`.
    fn difference(&self, subject: &[Vec2], clip: &[Vec2]) -> Vec<Vec<Vec2>>;
}

impl<F> Difference for F
where
    F: Fn(&[Vec2], &[Vec2]) -> Vec<Vec<Vec2>>,
{
    fn difference(&self, subject: &[Vec2], clip: &[Vec2]) -> Vec<Vec<Vec2>> {
        self(subject, clip)
    }
}

/// The rectangles removed from the room polygons.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Subtrahends {
    /// Wall segments grown along their perpendicular.
    pub walls: Vec<Aabb2d>,
    /// Door segments grown along their perpendicular.
    pub doors: Vec<Aabb2d>,
    /// Fixture footprints grown on all sides.
    pub fixtures: Vec<Aabb2d>,
}

impl Subtrahends {
    /// Builds the subtrahends for the given obstacles.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NonAxisAlignedEdge`] for a wall or door that is not axis-aligned.
    pub fn new(
        obstacles: &ObstacleEdges,
        fixtures: &[PlacedFixture],
        grid_size: u32,
        obstacle_extents: f32,
    ) -> Result<Self, BuildError> {
        let grow = |edge: &crate::Edge| {
            if edge.is_axis_aligned() {
                Ok(edge.expanded(obstacle_extents))
            } else {
                Err(BuildError::NonAxisAlignedEdge {
                    from: edge.from,
                    to: edge.to,
                })
            }
        };
        Ok(Self {
            walls: obstacles.walls.iter().map(grow).collect::<Result<_, _>>()?,
            doors: obstacles.doors.iter().map(grow).collect::<Result<_, _>>()?,
            fixtures: fixtures
                .iter()
                .map(|fixture| fixture.footprint(grid_size).expanded(obstacle_extents))
                .collect(),
        })
    }
}

impl RoomBounds {
    /// Removes the subtrahends from the room.
    ///
    /// Floor bounds lose every subtrahend, door footprints lose walls and fixtures.
    /// Each subtrahend is applied to all pieces left over by the previous one;
    /// pieces that are consumed entirely disappear. Changed pieces get fresh ids.
    pub fn subtract_obstacles(
        &mut self,
        subtrahends: &Subtrahends,
        clipper: &impl Difference,
        ids: &mut BoundIdAllocator,
    ) {
        let floor_clips: Vec<Aabb2d> = subtrahends
            .walls
            .iter()
            .chain(&subtrahends.doors)
            .chain(&subtrahends.fixtures)
            .copied()
            .collect();
        let before = self.floor.len();
        self.floor = subtract_all(std::mem::take(&mut self.floor), &floor_clips, clipper, ids);

        let door_clips: Vec<Aabb2d> = subtrahends
            .walls
            .iter()
            .chain(&subtrahends.fixtures)
            .copied()
            .collect();
        for door in &mut self.doors {
            door.pieces = subtract_all(std::mem::take(&mut door.pieces), &door_clips, clipper, ids);
        }

        tracing::debug!(
            "Room {:?}: {before} floor bounds became {} pieces after subtraction",
            self.region,
            self.floor.len()
        );
    }
}

fn subtract_all(
    mut pieces: Vec<Bound>,
    clips: &[Aabb2d],
    clipper: &impl Difference,
    ids: &mut BoundIdAllocator,
) -> Vec<Bound> {
    for clip in clips {
        let clip_polygon = clip.corners();
        let mut remaining = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let Some(aabb) = piece.aabb() else {
                continue;
            };
            if !aabb.overlaps(clip) {
                remaining.push(piece);
                continue;
            }
            let mut result = clipper.difference(&piece.vertices, &clip_polygon);
            if result.len() == 1 && result[0] == piece.vertices {
                remaining.push(piece);
                continue;
            }
            remaining.extend(
                result
                    .drain(..)
                    .filter(|polygon| polygon.len() >= 3)
                    .map(|polygon| Bound::new(ids, polygon)),
            );
        }
        pieces = remaining;
    }
    pieces
}

/// An exact [`Difference`] for polygons whose edges all run along the x- or y-axis.
///
/// The plane is cut into cells along every x and y coordinate of both polygons. Cells inside the
/// subject and outside the clip are kept and their outline is traced back into polygons.
/// Outlines that would enclose a hole are cut along a vertical line through the hole's left side,
/// so every output polygon is simple and hole-free. Subject vertices on the output outline are
/// preserved, as are the vertices along such cuts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectilinearClipper;

impl Difference for RectilinearClipper {
    fn difference(&self, subject: &[Vec2], clip: &[Vec2]) -> Vec<Vec<Vec2>> {
        let (Some(subject_aabb), Some(clip_aabb)) =
            (Aabb2d::from_points(subject), Aabb2d::from_points(clip))
        else {
            return vec![subject.to_vec()];
        };
        if subject.len() < 3 || clip.len() < 3 || !subject_aabb.overlaps(&clip_aabb) {
            return vec![subject.to_vec()];
        }

        let grid = CellGrid::new(subject, clip);
        if !grid.removed_any {
            return vec![subject.to_vec()];
        }
        if !grid.kept.iter().any(|&kept| kept) {
            return Vec::new();
        }
        grid.trace(subject)
    }
}

type GridPoint = (usize, usize);

/// Coordinate-compressed cells of the union of subject and clip.
struct CellGrid {
    xs: Vec<f32>,
    ys: Vec<f32>,
    /// Row-major, `(xs.len() - 1) * (ys.len() - 1)` cells.
    kept: Vec<bool>,
    removed_any: bool,
}

impl CellGrid {
    fn new(subject: &[Vec2], clip: &[Vec2]) -> Self {
        let axis = |f: fn(&Vec2) -> f32| {
            let mut values: Vec<f32> = subject.iter().chain(clip).map(f).collect();
            values.sort_by(f32::total_cmp);
            values.dedup_by(|a, b| (*a - *b).abs() <= EPSILON);
            values
        };
        let xs = axis(|p| p.x);
        let ys = axis(|p| p.y);
        let (nx, ny) = (xs.len() - 1, ys.len() - 1);

        let mut kept = vec![false; nx * ny];
        let mut removed_any = false;
        for j in 0..ny {
            for i in 0..nx {
                let center = Vec2::new((xs[i] + xs[i + 1]) * 0.5, (ys[j] + ys[j + 1]) * 0.5);
                if !polygon_contains(subject, center) {
                    continue;
                }
                if polygon_contains(clip, center) {
                    removed_any = true;
                } else {
                    kept[j * nx + i] = true;
                }
            }
        }
        Self {
            xs,
            ys,
            kept,
            removed_any,
        }
    }

    fn nx(&self) -> usize {
        self.xs.len() - 1
    }

    fn ny(&self) -> usize {
        self.ys.len() - 1
    }

    fn is_kept(&self, i: isize, j: isize) -> bool {
        if i < 0 || j < 0 || i as usize >= self.nx() || j as usize >= self.ny() {
            return false;
        }
        self.kept[j as usize * self.nx() + i as usize]
    }

    fn point(&self, (i, j): GridPoint) -> Vec2 {
        Vec2::new(self.xs[i], self.ys[j])
    }

    /// Traces the outline of the kept cells, cutting away holes until none are left.
    fn trace(&self, subject: &[Vec2]) -> Vec<Vec<Vec2>> {
        // `cuts[i]` separates cell column `i - 1` from column `i`.
        let mut cuts = vec![false; self.nx() + 1];
        loop {
            let loops = self.trace_loops(&cuts);
            let mut new_cut = false;
            for lp in loops.iter().filter(|lp| self.loop_area(lp) < 0.0) {
                let Some(column) = lp.iter().map(|&(i, _)| i).min() else {
                    continue;
                };
                if !cuts[column] {
                    cuts[column] = true;
                    new_cut = true;
                }
            }
            if !new_cut {
                return loops
                    .iter()
                    .filter(|lp| self.loop_area(lp) > 0.0)
                    .map(|lp| self.to_polygon(lp, subject, &cuts))
                    .collect();
            }
        }
    }

    fn loop_area(&self, lp: &[GridPoint]) -> f32 {
        let points: Vec<Vec2> = lp.iter().map(|&p| self.point(p)).collect();
        signed_area(&points)
    }

    /// Emits the directed outline edges of every kept cell, clockwise when y grows downward,
    /// and links them into closed loops.
    fn trace_loops(&self, cuts: &[bool]) -> Vec<Vec<GridPoint>> {
        let mut edges: Vec<(GridPoint, GridPoint)> = Vec::new();
        for j in 0..self.ny() {
            for i in 0..self.nx() {
                let (ii, jj) = (i as isize, j as isize);
                if !self.is_kept(ii, jj) {
                    continue;
                }
                if !self.is_kept(ii, jj - 1) {
                    edges.push(((i, j), (i + 1, j)));
                }
                if !self.is_kept(ii + 1, jj) || cuts[i + 1] {
                    edges.push(((i + 1, j), (i + 1, j + 1)));
                }
                if !self.is_kept(ii, jj + 1) {
                    edges.push(((i + 1, j + 1), (i, j + 1)));
                }
                if !self.is_kept(ii - 1, jj) || cuts[i] {
                    edges.push(((i, j + 1), (i, j)));
                }
            }
        }

        let mut outgoing: HashMap<GridPoint, Vec<usize>> = HashMap::new();
        for (index, (from, _)) in edges.iter().enumerate() {
            outgoing.entry(*from).or_default().push(index);
        }

        let mut used = vec![false; edges.len()];
        let mut loops = Vec::new();
        for first in 0..edges.len() {
            if used[first] {
                continue;
            }
            let mut lp = Vec::new();
            let mut current = first;
            loop {
                used[current] = true;
                let (from, to) = edges[current];
                lp.push(from);
                let candidates = outgoing.get(&to).map(Vec::as_slice).unwrap_or_default();
                let Some(&next) = candidates
                    .iter()
                    .filter(|&&e| !used[e] || e == first)
                    .min_by_key(|&&e| turn_rank((from, to), edges[e]))
                else {
                    tracing::warn!("Open outline at {:?} while clipping, dropping it", self.point(to));
                    lp.clear();
                    break;
                };
                if next == first {
                    break;
                }
                current = next;
            }
            if lp.len() >= 4 {
                loops.push(lp);
            }
        }
        loops
    }

    /// Converts a loop of unit grid steps into world space, dropping straight-through vertices
    /// unless they are subject vertices or lie on a cut.
    fn to_polygon(&self, lp: &[GridPoint], subject: &[Vec2], cuts: &[bool]) -> Vec<Vec2> {
        let n = lp.len();
        (0..n)
            .filter(|&k| {
                let (prev, here, next) = (lp[(k + n - 1) % n], lp[k], lp[(k + 1) % n]);
                let straight = direction(prev, here) == direction(here, next);
                if !straight {
                    return true;
                }
                let point = self.point(here);
                let on_vertical_cut = cuts[here.0] && prev.0 == here.0;
                on_vertical_cut || subject.iter().any(|v| approx_eq(*v, point))
            })
            .map(|k| self.point(lp[k]))
            .collect()
    }
}

fn direction(from: GridPoint, to: GridPoint) -> (isize, isize) {
    (
        (to.0 as isize - from.0 as isize).signum(),
        (to.1 as isize - from.1 as isize).signum(),
    )
}

/// Preference when an outline vertex has two outgoing edges: turn right (y grows downward),
/// then go straight, then turn left. Turning back is a last resort.
fn turn_rank(incoming: (GridPoint, GridPoint), outgoing: (GridPoint, GridPoint)) -> u8 {
    let (dx, dy) = direction(incoming.0, incoming.1);
    let out = direction(outgoing.0, outgoing.1);
    if out == (-dy, dx) {
        0
    } else if out == (dx, dy) {
        1
    } else if out == (dy, -dx) {
        2
    } else {
        3
    }
}
