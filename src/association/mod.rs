//! Association model: one subject --relation--> object triple with provenance.
//!
//! Raw API payloads are reduced to `AssociationRecord` values by [`parse`].
//! Records are immutable and content-comparable, so sets of records
//! deduplicate associations reported by both endpoints of a query.

pub mod filter;
mod raw;

pub use filter::{exclude_categories, filter_by_relations, neighbour_ids, within_ids};
pub use raw::{parse, parse_all, RawAssociation, RawEndpoint, RawRelation, RawTaxon};

use serde::{Deserialize, Serialize};

/// One side of an association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub label: Option<String>,
    pub iri: Option<String>,
    /// Single semantic group; multi-category payloads keep only the first.
    pub category: Option<String>,
    pub taxon_id: Option<String>,
    pub taxon_label: Option<String>,
}

impl Endpoint {
    /// Endpoint with only an identifier and an optional category.
    pub fn bare(id: impl Into<String>, category: Option<&str>) -> Self {
        Self {
            id: id.into(),
            label: None,
            iri: None,
            category: category.map(str::to_string),
            taxon_id: None,
            taxon_label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_taxon(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.taxon_id = Some(id.into());
        self.taxon_label = Some(label.into());
        self
    }
}

/// Relation descriptor shared by associations and graph edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: String,
    pub label: Option<String>,
    pub iri: Option<String>,
}

impl RelationRef {
    pub fn new(id: impl Into<String>, label: Option<&str>, iri: Option<&str>) -> Self {
        Self {
            id: id.into(),
            label: label.map(str::to_string),
            iri: iri.map(str::to_string),
        }
    }
}

/// A validated association (source-provided or derived id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssociationRecord {
    pub id: String,
    pub subject: Endpoint,
    pub object: Endpoint,
    pub relation: RelationRef,
}

impl AssociationRecord {
    pub fn new(
        id: impl Into<String>,
        subject: Endpoint,
        relation: RelationRef,
        object: Endpoint,
    ) -> Self {
        Self {
            id: id.into(),
            subject,
            object,
            relation,
        }
    }

    /// Both endpoints, subject first.
    pub fn endpoints(&self) -> [&Endpoint; 2] {
        [&self.subject, &self.object]
    }
}
