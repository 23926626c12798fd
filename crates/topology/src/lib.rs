//! meshtopo Topology - parent tables and source routes for low-power meshes
//!
//! Tracks, for every node of a tree-forming wireless mesh, the parents it has
//! advertised toward the root, and derives the topology graph and loop-free
//! source routes from that table.
//!
//! # Core Components
//!
//! - **Parent Table Store**: merges advertisements, ages out stale parents,
//!   hands out consistent snapshots
//! - **Graph View**: nodes and child→parent edges for visualization
//! - **Source-Route Resolver**: iterative preferred-parent walk with loop avoidance
//! - **Sweeper**: background eviction for tables nobody is reading
//!
//! # Example Usage
//!
//! ```rust
//! use meshtopo_core::{NodeAddress, TopologyConfig};
//! use meshtopo_topology::{AdvertisedParent, ManualClock, ParentTableStore, SourceRouteResolver};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = Arc::new(ManualClock::new(100));
//! let store = Arc::new(ParentTableStore::with_clock(&TopologyConfig::default(), clock));
//!
//! let (a, b, root) = (
//!     NodeAddress::from_bytes(vec![0x01]),
//!     NodeAddress::from_bytes(vec![0x02]),
//!     NodeAddress::from_bytes(vec![0x03]),
//! );
//! store.record_parent_advertisement(a.clone(), vec![AdvertisedParent::new(b.clone(), 100)])?;
//! store.record_parent_advertisement(b.clone(), vec![AdvertisedParent::new(root.clone(), 100)])?;
//!
//! let route = SourceRouteResolver::new(store.clone()).resolve(&a)?;
//! assert_eq!(route, vec![a, b, root]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod graph;
pub mod parent_table;
pub mod source_route;
pub mod sweeper;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{TopologyError, TopologyResult};
pub use graph::{DagEdge, DagLabel, DagNode, DagView, Edge, GraphView};
pub use parent_table::{
    is_stale, AdvertisedParent, AdvertisementOutcome, EvictionReport, MergeCounts, ParentEntry,
    ParentRecord, ParentTable, ParentTableStore, TableStats,
};
pub use source_route::{resolve_source_route, SourceRouteResolver};
pub use sweeper::{spawn_sweeper, SweeperHandle};
