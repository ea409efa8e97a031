//! Sharing a navigation graph between a builder thread and path queries.

use std::{
    sync::{Arc, PoisonError, RwLock},
    thread::{self, JoinHandle},
};

use crate::{
    config::NavmeshConfig,
    fixture::FixturePalette,
    main_api::{BuildError, Navmesh, build_navmesh},
    nav_graph::NavigationGraph,
    subtract::RectilinearClipper,
    tile_map::TileMap,
};

/// A cheaply cloneable handle to the current [`NavigationGraph`].
///
/// Readers take a snapshot with [`Self::load`] and query it without holding any lock.
/// A rebuilt graph replaces the old one with [`Self::publish`]; snapshots taken before keep
/// pointing at the old graph until they are dropped.
#[derive(Debug, Clone, Default)]
pub struct SharedNavigationGraph {
    current: Arc<RwLock<Arc<NavigationGraph>>>,
}

impl SharedNavigationGraph {
    /// Creates a handle publishing `graph`.
    pub fn new(graph: NavigationGraph) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(graph))),
        }
    }

    /// The most recently published graph.
    pub fn load(&self) -> Arc<NavigationGraph> {
        // The lock only guards a pointer swap, a poisoned lock still holds a valid graph.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the current graph.
    pub fn publish(&self, graph: NavigationGraph) {
        let graph = Arc::new(graph);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = graph;
    }
}

/// Builds the navmesh of `tile_map` on a new thread with the [`RectilinearClipper`].
///
/// The returned handle doubles as the completion signal. If `shared` is given,
/// the resulting graph is published to it before the thread finishes.
pub fn build_in_background(
    tile_map: TileMap,
    palette: FixturePalette,
    config: NavmeshConfig,
    shared: Option<SharedNavigationGraph>,
) -> JoinHandle<Result<Navmesh, BuildError>> {
    thread::spawn(move || {
        let navmesh = build_navmesh(&tile_map, &palette, &config, &RectilinearClipper)?;
        if let Some(shared) = shared {
            shared.publish(navmesh.graph.clone());
            tracing::debug!("Published navigation graph with {} nodes", navmesh.graph.nodes.len());
        }
        Ok(navmesh)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileFlags;

    #[test]
    fn snapshots_survive_publish() {
        let shared = SharedNavigationGraph::default();
        let before = shared.load();
        assert!(before.nodes.is_empty());

        let mut map = TileMap::new(2, 1, 10);
        map.set(0, 0, TileFlags::FLOOR);
        map.set(0, 1, TileFlags::FLOOR);
        let handle = build_in_background(
            map,
            FixturePalette::new(),
            NavmeshConfig::default(),
            Some(shared.clone()),
        );
        let navmesh = handle.join().unwrap().unwrap();

        assert!(before.nodes.is_empty());
        let after = shared.load();
        assert_eq!(after.nodes.len(), navmesh.graph.nodes.len());
        assert_eq!(after.nodes.len(), 2);
    }

    #[test]
    fn graph_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NavigationGraph>();
        assert_send_sync::<SharedNavigationGraph>();
    }
}
