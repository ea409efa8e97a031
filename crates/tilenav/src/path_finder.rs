use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};

use crate::nav_graph::{NavigationGraph, NodeId};

/// Entry of the open list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapNode {
    node: NodeId,
    /// Total cost (g + h)
    f: u32,
}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap: lowest f first, then lowest node id.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl NavigationGraph {
    /// Finds a sequence of neighbouring nodes from `start` to `goal`, both included.
    ///
    /// Every edge costs 1 and the heuristic is a constant 1, so the result has the fewest possible hops.
    /// Ties are broken towards the lowest node id, which makes the result deterministic.
    /// Returns `None` if either id is unknown or `goal` is unreachable.
    pub fn find_node_path(&self, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
        self.find_node_path_filtered(start, goal, |_, _| true)
    }

    /// Like [`Self::find_node_path`], but only walks edges for which `passable(from, to)` holds.
    ///
    /// Use this to close doors at query time without rebuilding the graph.
    pub fn find_node_path_filtered(
        &self,
        start: NodeId,
        goal: NodeId,
        passable: impl Fn(NodeId, NodeId) -> bool,
    ) -> Option<Vec<NodeId>> {
        for id in [start, goal] {
            if self.node(id).is_none() {
                tracing::warn!("Path query with unknown node {id:?}");
                return None;
            }
        }
        if start == goal {
            return Some(vec![start]);
        }

        const HEURISTIC: u32 = 1;
        let mut open = BinaryHeap::new();
        let mut g_score: HashMap<NodeId, u32> = HashMap::new();
        let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
        let mut closed: HashSet<NodeId> = HashSet::new();

        g_score.insert(start, 0);
        open.push(HeapNode {
            node: start,
            f: HEURISTIC,
        });

        while let Some(HeapNode { node, .. }) = open.pop() {
            if node == goal {
                return Some(reconstruct_path(&came_from, goal));
            }
            if !closed.insert(node) {
                continue;
            }
            let g = g_score[&node];
            for &neighbour in self.neighbours(node) {
                if closed.contains(&neighbour) || !passable(node, neighbour) {
                    continue;
                }
                let tentative = g + 1;
                if g_score.get(&neighbour).is_some_and(|&known| known <= tentative) {
                    continue;
                }
                g_score.insert(neighbour, tentative);
                came_from.insert(neighbour, node);
                open.push(HeapNode {
                    node: neighbour,
                    f: tentative + HEURISTIC,
                });
            }
        }
        None
    }
}

fn reconstruct_path(came_from: &HashMap<NodeId, NodeId>, goal: NodeId) -> Vec<NodeId> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&previous) = came_from.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}
