//! Read-only queries over a `KnowledgeGraph`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{KnowledgeGraph, Node};

/// Aggregate counts of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    /// Distinct stored semantic groups; unknown group counts as one.
    pub distinct_semantic_groups: usize,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Nodes whose single stored semantic group is one of `groups`.
///
/// Nodes with unknown group never match.
pub fn extract_nodes<'a>(graph: &'a KnowledgeGraph, groups: &[String]) -> Vec<&'a Node> {
    let extracted: Vec<&Node> = graph
        .all_nodes()
        .filter(|node| {
            node.semantic_group
                .as_ref()
                .map_or(false, |group| groups.contains(group))
        })
        .collect();

    log::info!(
        "Extracted a total of {} nodes that belong to one of the semantic groups {:?}",
        extracted.len(),
        groups
    );
    extracted
}

/// Relations whose label contains `substring` (case-sensitive).
///
/// Returns relation id -> label. Edges without a label never match.
pub fn find_relations(graph: &KnowledgeGraph, substring: &str) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();

    for edge in graph.all_edges() {
        if let Some(label) = edge.relation.label.as_deref() {
            if label.contains(substring) {
                found.insert(edge.relation.id.clone(), label.to_string());
            }
        }
    }

    log::info!(
        "Found {} relations with substring \"{}\": {:?}",
        found.len(),
        substring,
        found
    );
    found
}

/// Count semantic groups, nodes and edges, and log the result.
pub fn summarize(graph: &KnowledgeGraph) -> GraphSummary {
    let groups: BTreeSet<Option<&str>> = graph
        .all_nodes()
        .map(|node| node.semantic_group.as_deref())
        .collect();

    let summary = GraphSummary {
        distinct_semantic_groups: groups.len(),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
    };

    log::info!(
        "The graph contains {} different semantic groups: {:?}",
        summary.distinct_semantic_groups,
        groups
    );
    log::info!(
        "For the graph, a total of {} edges and {} nodes have been generated.",
        summary.edge_count,
        summary.node_count
    );
    summary
}

/// `(subject group, relation label, object group)` of an edge.
pub type ConnectionTriplet = (Option<String>, Option<String>, Option<String>);

/// Distinct relation labels of the graph's edges; an unlabelled edge
/// contributes `None`.
pub fn relation_labels(graph: &KnowledgeGraph) -> BTreeSet<Option<String>> {
    let labels: BTreeSet<Option<String>> = graph
        .all_edges()
        .map(|edge| edge.relation.label.clone())
        .collect();

    log::info!("There are {} relation labels: {:?}", labels.len(), labels);
    labels
}

/// How semantic groups are connected: distinct triplets of subject group,
/// relation label and object group.
///
/// Endpoints are resolved through the node map; an edge with an endpoint
/// that is not a node of the graph is left out.
pub fn connection_summary(graph: &KnowledgeGraph) -> BTreeSet<ConnectionTriplet> {
    let mut triplets = BTreeSet::new();
    let mut unresolved = 0;

    for edge in graph.all_edges() {
        match (graph.node(&edge.subject_id), graph.node(&edge.object_id)) {
            (Some(subject), Some(object)) => {
                triplets.insert((
                    subject.semantic_group.clone(),
                    edge.relation.label.clone(),
                    object.semantic_group.clone(),
                ));
            }
            _ => unresolved += 1,
        }
    }

    if unresolved > 0 {
        log::warn!("{} edges have an endpoint outside the node set", unresolved);
    }
    log::info!(
        "The graph connects its semantic groups through {} distinct triplets",
        triplets.len()
    );
    triplets
}
