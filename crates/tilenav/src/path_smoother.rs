//! Turning a node path into a taut polyline with the funnel algorithm.

use glam::Vec2;

use crate::{
    math::{approx_eq, cross, on_segment},
    nav_graph::{NavigationGraph, NodeId},
};

/// The segment shared by two consecutive triangles of a path, as seen when walking from the first
/// into the second. `left` is on the counter-clockwise side of the walking direction when y grows upward.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Portal {
    /// Left endpoint.
    pub left: Vec2,
    /// Right endpoint.
    pub right: Vec2,
}

impl Portal {
    /// A portal collapsed to a single point.
    pub fn point(point: Vec2) -> Self {
        Self {
            left: point,
            right: point,
        }
    }
}

impl NavigationGraph {
    /// The portals between consecutive nodes of `path`.
    ///
    /// Pairs that are not neighbours are skipped with a warning.
    pub fn portals(&self, path: &[NodeId]) -> Vec<Portal> {
        path.windows(2)
            .filter_map(|pair| {
                let (a, b) = (pair[0], pair[1]);
                let Some((p, q)) = self.shared_segment(a, b) else {
                    tracing::warn!("Nodes {a:?} and {b:?} share no edge, skipping portal");
                    return None;
                };
                let heading = self.nodes[b.index()].centroid - self.nodes[a.index()].centroid;
                Some(if cross(heading, q - p) > 0.0 {
                    Portal { left: q, right: p }
                } else {
                    Portal { left: p, right: q }
                })
            })
            .collect()
    }

    /// Smooths a node path from [`Self::find_node_path`] into waypoints from `start` to `end`.
    ///
    /// Paths through doors are pulled through the center of every door they enter,
    /// so agents never cut diagonally through a doorway.
    pub fn smooth_path(&self, path: &[NodeId], start: Vec2, end: Vec2) -> Vec<Vec2> {
        let Some(&head) = path.first() else {
            return Vec::new();
        };
        let head_door = self.node(head).and_then(|node| node.door);
        let split = path.iter().enumerate().skip(1).find_map(|(i, id)| {
            let door = self.node(*id)?.door?;
            (Some(door) != head_door).then_some((i, door))
        });
        let Some((i, door)) = split else {
            return string_pull(start, &self.portals(path), end);
        };
        let Some(center) = self.door(door).map(|edge| edge.center()) else {
            tracing::warn!("Unknown door {door:?} on path, ignoring it");
            return string_pull(start, &self.portals(path), end);
        };

        let mut waypoints = string_pull(start, &self.portals(&path[..=i]), center);
        let rest = self.smooth_path(&path[i..], center, end);
        waypoints.extend(rest.into_iter().skip(1));
        waypoints
    }
}

fn push_waypoint(waypoints: &mut Vec<Vec2>, point: Vec2) {
    if !waypoints.last().is_some_and(|last| approx_eq(*last, point)) {
        waypoints.push(point);
    }
}

/// Twice the signed area of triangle `abc`, in the sign convention of the funnel.
#[inline]
fn triarea2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    let ab = b - a;
    let ac = c - a;
    ac.x * ab.y - ab.x * ac.y
}

/// Pulls a string from `start` to `end` through `portals`.
///
/// The funnel is narrowed portal by portal. When one side crosses over the other,
/// the crossed side's point becomes a waypoint and the new apex, and the scan restarts right after it.
/// Portals that pass through the apex of a fresh funnel are already crossed and are skipped,
/// so `start` may lie on the first portals, as a door center does.
pub fn string_pull(start: Vec2, portals: &[Portal], end: Vec2) -> Vec<Vec2> {
    let mut corridor = Vec::with_capacity(portals.len() + 2);
    corridor.push(Portal::point(start));
    corridor.extend_from_slice(portals);
    corridor.push(Portal::point(end));

    let mut waypoints = vec![start];

    let (mut apex, mut left, mut right) = (start, start, start);
    let (mut left_index, mut right_index) = (0, 0);
    let mut i = 1;
    while i < corridor.len() {
        let portal = corridor[i];

        if approx_eq(apex, left)
            && approx_eq(apex, right)
            && on_segment(apex, portal.left, portal.right)
        {
            i += 1;
            continue;
        }

        if triarea2(apex, right, portal.right) <= 0.0 {
            if approx_eq(apex, right) || triarea2(apex, left, portal.right) > 0.0 {
                right = portal.right;
                right_index = i;
            } else {
                // Right crossed over left, left becomes a corner.
                push_waypoint(&mut waypoints, left);
                apex = left;
                let apex_index = left_index;
                (left, right) = (apex, apex);
                (left_index, right_index) = (apex_index, apex_index);
                i = apex_index + 1;
                continue;
            }
        }

        if triarea2(apex, left, portal.left) >= 0.0 {
            if approx_eq(apex, left) || triarea2(apex, right, portal.left) < 0.0 {
                left = portal.left;
                left_index = i;
            } else {
                push_waypoint(&mut waypoints, right);
                apex = right;
                let apex_index = right_index;
                (left, right) = (apex, apex);
                (left_index, right_index) = (apex_index, apex_index);
                i = apex_index + 1;
                continue;
            }
        }

        i += 1;
    }
    push_waypoint(&mut waypoints, end);
    waypoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn no_portals_is_a_straight_line() {
        let path = string_pull(Vec2::ZERO, &[], Vec2::new(3.0, 0.0));
        assert_eq!(path, [Vec2::ZERO, Vec2::new(3.0, 0.0)]);
        assert_eq!(string_pull(Vec2::ONE, &[], Vec2::ONE), [Vec2::ONE]);
    }

    #[test]
    fn straight_corridor() {
        let portals = [
            Portal {
                left: Vec2::new(1.0, 1.0),
                right: Vec2::new(1.0, -1.0),
            },
            Portal {
                left: Vec2::new(2.0, 1.0),
                right: Vec2::new(2.0, -1.0),
            },
        ];
        let path = string_pull(Vec2::ZERO, &portals, Vec2::new(3.0, 0.0));
        assert_eq!(path, [Vec2::ZERO, Vec2::new(3.0, 0.0)]);
    }

    #[test]
    fn corridor_with_turn_hugs_corner() {
        // Walking along +x, then turning towards +y around the corner at (1, 0.5).
        let portals = [
            Portal {
                left: Vec2::new(1.0, 0.5),
                right: Vec2::new(1.0, -0.5),
            },
            Portal {
                left: Vec2::new(2.0, 2.0),
                right: Vec2::new(2.0, 0.5),
            },
        ];
        let path = string_pull(Vec2::ZERO, &portals, Vec2::new(3.0, 1.5));
        assert_eq!(path.len(), 3);
        assert_relative_eq!(path[1].x, 1.0);
        assert_relative_eq!(path[1].y, 0.5);
    }

    #[test]
    fn start_on_first_portal_goes_straight() {
        // Leaving a door center that lies on the diagonal between the two door triangles.
        let portals = [
            Portal {
                left: Vec2::new(19.0, 10.0),
                right: Vec2::new(21.0, 0.0),
            },
            Portal {
                left: Vec2::new(21.0, 10.0),
                right: Vec2::new(21.0, 0.0),
            },
        ];
        let start = Vec2::new(20.0, 5.0);
        let end = Vec2::new(35.0, 15.0);
        assert_eq!(string_pull(start, &portals, end), [start, end]);
    }

    #[test]
    fn portal_sides_follow_heading() {
        use crate::{Bound, BoundIdAllocator, NavigationGraph, RegionId, RoomTriangles};
        use crate::tile_map::ObstacleEdges;

        let mut ids = BoundIdAllocator::new();
        let [a, b, c, d] = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
        let room = RoomTriangles {
            region: RegionId(1),
            floor: vec![
                Bound::new(&mut ids, vec![d, a, b]),
                Bound::new(&mut ids, vec![b, c, d]),
            ],
            doors: Vec::new(),
        };
        let graph = NavigationGraph::build(&[room], &ObstacleEdges::default());
        let forward = graph.portals(&[NodeId(0), NodeId(1)]);
        let backward = graph.portals(&[NodeId(1), NodeId(0)]);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].left, backward[0].right);
        assert_eq!(forward[0].right, backward[0].left);
        let heading = graph.nodes[1].centroid - graph.nodes[0].centroid;
        assert!(cross(heading, forward[0].left - forward[0].right) > 0.0);
    }
}
