//! Topology graph materialized from a parent table snapshot.

use meshtopo_core::NodeAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::parent_table::ParentTable;

/// Directed edge from a node to one of its parents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Advertising node
    pub from: NodeAddress,
    /// Parent it advertised
    pub to: NodeAddress,
}

/// Nodes and child→parent edges of the mesh.
///
/// Edges follow owner address order, then each owner's parent order.
/// Self-loops are reported as advertised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    /// Every address seen as an owner or a parent
    pub nodes: BTreeSet<NodeAddress>,
    /// One edge per (owner, parent entry)
    pub edges: Vec<Edge>,
}

impl GraphView {
    /// Build the graph of `table`
    pub fn from_table(table: &ParentTable) -> Self {
        let mut view = Self::default();

        for record in table.records() {
            view.nodes.insert(record.owner.clone());
            for entry in &record.parents {
                view.nodes.insert(entry.parent_address.clone());
                view.edges.push(Edge {
                    from: record.owner.clone(),
                    to: entry.parent_address.clone(),
                });
            }
        }

        view
    }

    /// Edges leaving `node`
    pub fn edges_from<'a>(&'a self, node: &'a NodeAddress) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| &edge.from == node)
    }

    /// Render with two-byte labels, the shape DAG visualizers consume
    pub fn to_dag(&self) -> DagView {
        let labels: BTreeSet<String> = self.nodes.iter().map(NodeAddress::short_label).collect();

        DagView {
            states: labels
                .into_iter()
                .map(|label| DagNode {
                    id: label.clone(),
                    value: DagLabel { label },
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|edge| DagEdge {
                    u: edge.from.short_label(),
                    v: edge.to.short_label(),
                })
                .collect(),
        }
    }
}

/// Visualizer node label wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagLabel {
    /// Displayed text
    pub label: String,
}

/// Visualizer node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagNode {
    /// Short node id
    pub id: String,
    /// Display attributes
    pub value: DagLabel,
}

/// Visualizer edge, child `u` to parent `v`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagEdge {
    /// Child short id
    pub u: String,
    /// Parent short id
    pub v: String,
}

/// Label-based DAG payload for rendering layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagView {
    /// Nodes, one per distinct label
    pub states: Vec<DagNode>,
    /// Edges in graph order
    pub edges: Vec<DagEdge>,
}
