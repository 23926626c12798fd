//! Source-route resolution over the parent table
//!
//! A source route lists the hops from a destination up to the root by
//! following each node's preferred parent (the first entry of its record).
//! The walk is iterative and stops before any node would repeat, so cyclic
//! parent sets still produce a finite, loop-free prefix.

use meshtopo_core::NodeAddress;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::TopologyResult;
use crate::parent_table::{ParentTable, ParentTableStore};

/// Walk preferred parents from `dest` toward the root.
///
/// - a null `dest` yields an empty route;
/// - a `dest` without a record yields an empty route;
/// - a node whose record holds no parents ends the route at that node;
/// - the walk stops before re-entering any node already on the route.
///
/// A null preferred parent is treated like a missing parent.
pub fn resolve_source_route(dest: &NodeAddress, parents: &ParentTable) -> Vec<NodeAddress> {
    let mut route: Vec<NodeAddress> = Vec::new();
    let mut visited: HashSet<&NodeAddress> = HashSet::new();
    let mut current = dest;

    while !current.is_empty() {
        let Some(record) = parents.get(current) else {
            break;
        };

        if route.last() != Some(current) {
            route.push(current.clone());
            visited.insert(current);
        }

        let Some(parent) = record.preferred_parent() else {
            break;
        };

        if parent.is_empty() || visited.contains(parent) {
            break;
        }

        route.push(parent.clone());
        visited.insert(parent);
        current = parent;
    }

    route
}

/// Resolves source routes against snapshots of a shared store
#[derive(Debug, Clone)]
pub struct SourceRouteResolver {
    store: Arc<ParentTableStore>,
}

impl SourceRouteResolver {
    /// Create a resolver reading from `store`
    pub fn new(store: Arc<ParentTableStore>) -> Self {
        Self { store }
    }

    /// Take one snapshot of the store and resolve the route to `dest` on it.
    ///
    /// The walk itself runs without holding the table lock.
    pub fn resolve(&self, dest: &NodeAddress) -> TopologyResult<Vec<NodeAddress>> {
        let snapshot = self.store.snapshot_parents()?;
        let route = resolve_source_route(dest, &snapshot);

        debug!(
            dest = %dest,
            hops = route.len(),
            table_size = snapshot.len(),
            "Resolved source route"
        );

        Ok(route)
    }
}
