//! Fusing the unit bounds of a room into larger polygons.

use glam::Vec2;
use slotmap::SlotMap;

use crate::{
    bound::{Bound, BoundIdAllocator},
    bound_builder::RoomBounds,
    math::{approx_eq, next, prev},
    tile_map::ObstacleEdges,
};

slotmap::new_key_type! {
    /// A key for a bound in the merge work set.
    struct MergeKey;
}

impl RoomBounds {
    /// Repeatedly merges pairs of floor bounds until no pair can be merged.
    ///
    /// Two bounds merge iff they share exactly one contiguous run of at least two vertices and
    /// none of the run's edges is a wall or a door. After each merge the scan restarts.
    /// Merged bounds get fresh ids.
    pub fn merge_floor(&mut self, obstacles: &ObstacleEdges, ids: &mut BoundIdAllocator) {
        let mut work: SlotMap<MergeKey, Bound> = SlotMap::with_capacity_and_key(self.floor.len());
        for bound in self.floor.drain(..) {
            work.insert(bound);
        }

        let mut merges = 0_usize;
        'scan: loop {
            let keys: Vec<MergeKey> = work.keys().collect();
            for (i, &a_key) in keys.iter().enumerate() {
                for &b_key in &keys[i + 1..] {
                    let (a, b) = (&work[a_key], &work[b_key]);
                    let (Some(a_aabb), Some(b_aabb)) = (a.aabb(), b.aabb()) else {
                        continue;
                    };
                    if !a_aabb.touches(&b_aabb) {
                        continue;
                    }
                    let Some(vertices) =
                        merge_polygons(&a.vertices, &b.vertices, |p, q| obstacles.blocks(p, q))
                    else {
                        continue;
                    };
                    work.remove(a_key);
                    work.remove(b_key);
                    work.insert(Bound::new(ids, vertices));
                    merges += 1;
                    continue 'scan;
                }
            }
            break;
        }

        self.floor = work.into_iter().map(|(_, bound)| bound).collect();
        tracing::debug!(
            "Room {:?}: {merges} merges left {} floor bounds",
            self.region,
            self.floor.len()
        );
    }
}

/// Merges two clockwise polygons sharing a single contiguous vertex run.
///
/// The run must appear forward in `a` and backward in `b`. Returns `None` if there are fewer than
/// two shared vertices, more than one disjoint run, or if `blocked` rejects one of the run's edges.
/// The result is a new clockwise vertex list; the shared run's inner vertices are dropped.
pub(crate) fn merge_polygons(
    a: &[Vec2],
    b: &[Vec2],
    blocked: impl Fn(Vec2, Vec2) -> bool,
) -> Option<Vec<Vec2>> {
    let (n_a, n_b) = (a.len(), b.len());
    if n_a < 3 || n_b < 3 {
        return None;
    }

    let shared: Vec<Option<usize>> = a
        .iter()
        .map(|p| b.iter().position(|q| approx_eq(*p, *q)))
        .collect();
    let shared_count = shared.iter().filter(|s| s.is_some()).count();
    if shared_count < 2 || shared_count >= n_a || shared_count >= n_b {
        return None;
    }

    // A run starts at a shared vertex whose predecessor is not shared.
    let mut run_starts =
        (0..n_a).filter(|&i| shared[i].is_some() && shared[prev(i, n_a)].is_none());
    let start = run_starts.next()?;
    if run_starts.next().is_some() {
        return None;
    }

    // Walk the run in `a` and make sure it runs backward through `b`.
    let mut i = start;
    for _ in 0..shared_count - 1 {
        let j = next(i, n_a);
        let (b_i, b_j) = (shared[i]?, shared[j]?);
        if b_j != prev(b_i, n_b) || blocked(a[i], a[j]) {
            return None;
        }
        i = j;
    }
    let end = i;

    // a[end] .. a[start] is the part of `a` that stays, b[after start] .. b[before end] is spliced in.
    let b_start = shared[start]?;
    let b_end = shared[end]?;
    let mut merged = Vec::with_capacity(n_a + n_b - 2 * shared_count + 2);
    let mut i = end;
    loop {
        merged.push(a[i]);
        if i == start {
            break;
        }
        i = next(i, n_a);
    }
    let mut j = next(b_start, n_b);
    while j != b_end {
        merged.push(b[j]);
        j = next(j, n_b);
    }
    Some(merged)
}
