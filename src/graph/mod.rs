//! Knowledge graph module: node/edge identity model, the deduplicating
//! store, read-only analysis queries and the restructuring pass.
//!
//! Nodes and edges are identified by their `id` alone. Every other field is
//! payload: the store keeps whichever payload was inserted first.

mod analysis;
mod restructure;
mod shared;
mod store;

pub use analysis::{
    connection_summary, extract_nodes, find_relations, relation_labels, summarize,
    ConnectionTriplet, GraphSummary,
};
pub use restructure::{restructure, restructure_into};
pub use shared::SharedKnowledgeGraph;
pub use store::KnowledgeGraph;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::association::{AssociationRecord, Endpoint, RelationRef};

/// A graph vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: Option<String>,
    pub iri: Option<String>,
    pub semantic_group: Option<String>,
    pub taxon_id: Option<String>,
    pub taxon_label: Option<String>,
}

impl Node {
    pub fn from_endpoint(endpoint: &Endpoint) -> Self {
        Self {
            id: endpoint.id.clone(),
            label: endpoint.label.clone(),
            iri: endpoint.iri.clone(),
            semantic_group: endpoint.category.clone(),
            taxon_id: endpoint.taxon_id.clone(),
            taxon_label: endpoint.taxon_label.clone(),
        }
    }

    /// Node synthesized by a graph transform (no taxon, no iri).
    pub fn derived(id: impl Into<String>, label: Option<String>, semantic_group: &str) -> Self {
        Self {
            id: id.into(),
            label,
            iri: None,
            semantic_group: Some(semantic_group.to_string()),
            taxon_id: None,
            taxon_label: None,
        }
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.semantic_group.as_deref() == Some(group)
    }
}

/// A directed graph edge between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub subject_id: String,
    pub object_id: String,
    pub relation: RelationRef,
}

impl Edge {
    /// Edge carried by an association; relation labels use spaces, not underscores.
    pub fn from_association(association: &AssociationRecord) -> Self {
        let mut relation = association.relation.clone();
        relation.label = relation.label.map(|label| label.replace('_', " "));

        Self {
            id: association.id.clone(),
            subject_id: association.subject.id.clone(),
            object_id: association.object.id.clone(),
            relation,
        }
    }

    /// Edge with a content-derived id, stable across runs.
    pub fn derived(relation: &RelationRef, subject_id: &str, object_id: &str) -> Self {
        Self {
            id: derive_edge_id(&relation.id, subject_id, object_id),
            subject_id: subject_id.to_string(),
            object_id: object_id.to_string(),
            relation: relation.clone(),
        }
    }
}

/// SHA256 over `(relation_id, subject_id, object_id)`, hex encoded.
pub fn derive_edge_id(relation_id: &str, subject_id: &str, object_id: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [relation_id, subject_id, object_id] {
        hasher.update(part.as_bytes());
        // ("ab", "c") and ("a", "bc") must not collide
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
