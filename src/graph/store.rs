//! Id-keyed node and edge store with first-write-wins insertion.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::{Edge, Node};
use crate::association::AssociationRecord;

/// Deduplicated working set of nodes and edges.
///
/// Inserting an id that is already present is a no-op: the first payload
/// stored for an id is kept and later ones are discarded. There is no
/// update path.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<String, Edge>,
}

impl KnowledgeGraph {
    /// Build a graph from association records.
    pub fn new(records: &[AssociationRecord]) -> Self {
        let mut graph = Self::default();
        graph.add_records(records);
        super::summarize(&graph);
        graph
    }

    /// Unpack each record into subject node, object node and edge.
    ///
    /// Returns the number of nodes and edges that were actually added.
    pub fn add_records(&mut self, records: &[AssociationRecord]) -> (usize, usize) {
        let mut added_nodes = 0;
        let mut added_edges = 0;

        for record in records {
            if self.insert_edge(Edge::from_association(record)) {
                added_edges += 1;
            }
            for endpoint in record.endpoints() {
                if self.insert_node(Node::from_endpoint(endpoint)) {
                    added_nodes += 1;
                }
            }
        }

        log::debug!(
            "Added {} nodes and {} edges from {} records",
            added_nodes,
            added_edges,
            records.len()
        );
        (added_nodes, added_edges)
    }

    /// Insert unless the id is taken. Returns true when the node was stored.
    pub fn insert_node(&mut self, node: Node) -> bool {
        match self.nodes.entry(node.id.clone()) {
            Entry::Occupied(existing) => {
                debug_assert_eq!(existing.key(), &existing.get().id);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
        }
    }

    /// Insert unless the id is taken. Returns true when the edge was stored.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        match self.edges.entry(edge.id.clone()) {
            Entry::Occupied(existing) => {
                debug_assert_eq!(existing.key(), &existing.get().id);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(edge);
                true
            }
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, ordered by id.
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// All edges, ordered by id.
    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
