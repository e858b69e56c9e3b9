//! Restructuring pass: derive taxon nodes and gene -> taxon edges.

use super::{Edge, KnowledgeGraph, Node};
use crate::config::Vocabulary;

/// Build a new graph from `source` with taxon concepts made explicit.
///
/// Every source node and edge is carried over, then each gene with a
/// taxon id gains a taxon node and a `found in` edge whose id is a
/// content hash, so repeated runs converge on the same edge set.
pub fn restructure(source: &KnowledgeGraph, vocabulary: &Vocabulary) -> KnowledgeGraph {
    let mut destination = KnowledgeGraph::default();
    restructure_into(source, &mut destination, vocabulary);
    destination
}

/// Restructure `source` into an existing graph under its dedup rule.
///
/// Returns the number of taxon edges newly added to `destination`.
pub fn restructure_into(
    source: &KnowledgeGraph,
    destination: &mut KnowledgeGraph,
    vocabulary: &Vocabulary,
) -> usize {
    // Source payloads take precedence over derived taxon nodes with the same id
    for node in source.all_nodes() {
        destination.insert_node(node.clone());
    }
    for edge in source.all_edges() {
        destination.insert_edge(edge.clone());
    }

    let mut added_taxon_edges = 0;
    for node in source.all_nodes() {
        if !node.in_group(&vocabulary.gene) {
            continue;
        }
        let taxon_id = match node.taxon_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id,
            _ => continue,
        };

        let taxon = Node::derived(taxon_id, node.taxon_label.clone(), &vocabulary.taxon);
        let edge = Edge::derived(&vocabulary.found_in, &node.id, taxon_id);

        destination.insert_node(taxon);
        if destination.insert_edge(edge) {
            added_taxon_edges += 1;
        }
    }

    log::info!(
        "Restructured graph: {} taxon edges added, {} nodes and {} edges in total",
        added_taxon_edges,
        destination.node_count(),
        destination.edge_count()
    );
    added_taxon_edges
}
