//! In-memory association source for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{AssociationSource, CancellationToken, SourceResponse};
use crate::association::{RawAssociation, RawEndpoint, RawRelation, RawTaxon};

/// Serves a fixed association list; a node sees the associations it is the
/// subject of as outgoing and those it is the object of as incoming.
#[derive(Default)]
pub struct MockSource {
    associations: Vec<RawAssociation>,
    delays: HashMap<String, Duration>,
    failing: Vec<String>,
    cancel_on: Option<(String, CancellationToken)>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockSource {
    pub fn new(associations: Vec<RawAssociation>) -> Self {
        Self {
            associations,
            ..Default::default()
        }
    }

    /// Delay responses for `node_id`.
    pub fn with_delay(mut self, node_id: &str, delay: Duration) -> Self {
        self.delays.insert(node_id.to_string(), delay);
        self
    }

    /// Answer `node_id` with nothing, as an exhausted transport would.
    pub fn failing(mut self, node_id: &str) -> Self {
        self.failing.push(node_id.to_string());
        self
    }

    /// Cancel `token` once `node_id` has been queried.
    pub fn cancel_on_query(mut self, node_id: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((node_id.to_string(), token));
        self
    }

    /// `(node_id, relation)` of every call, in completion order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn queried_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl AssociationSource for MockSource {
    async fn associations_for(
        &self,
        node_id: &str,
        relation: Option<&str>,
        _rows: usize,
    ) -> SourceResponse {
        if let Some(delay) = self.delays.get(node_id) {
            tokio::time::sleep(*delay).await;
        }
        self.calls
            .lock()
            .unwrap()
            .push((node_id.to_string(), relation.map(str::to_string)));
        if let Some((id, token)) = &self.cancel_on {
            if id == node_id {
                token.cancel();
            }
        }

        if self.failing.iter().any(|id| id == node_id) {
            return SourceResponse::default();
        }

        let matches_relation = |a: &&RawAssociation| match relation {
            Some(rel) => a.relation.as_ref().and_then(|r| r.id.as_deref()) == Some(rel),
            None => true,
        };
        let endpoint_id = |e: &Option<RawEndpoint>| e.as_ref().and_then(|e| e.id.clone());

        SourceResponse {
            outgoing: self
                .associations
                .iter()
                .filter(matches_relation)
                .filter(|a| endpoint_id(&a.subject).as_deref() == Some(node_id))
                .cloned()
                .collect(),
            incoming: self
                .associations
                .iter()
                .filter(matches_relation)
                .filter(|a| endpoint_id(&a.object).as_deref() == Some(node_id))
                .cloned()
                .collect(),
        }
    }
}

pub fn raw_endpoint(id: &str, category: &str) -> RawEndpoint {
    RawEndpoint {
        id: Some(id.to_string()),
        label: Some(format!("{} label", id)),
        iri: None,
        category: Some(vec![category.to_string()]),
        taxon: None,
    }
}

pub fn raw_gene(id: &str, taxon_id: &str) -> RawEndpoint {
    RawEndpoint {
        taxon: Some(RawTaxon {
            id: Some(taxon_id.to_string()),
            label: Some(format!("{} label", taxon_id)),
        }),
        ..raw_endpoint(id, "gene")
    }
}

pub fn raw_association(
    id: &str,
    subject: RawEndpoint,
    relation: &str,
    object: RawEndpoint,
) -> RawAssociation {
    RawAssociation {
        id: Some(id.to_string()),
        subject: Some(subject),
        object: Some(object),
        relation: Some(RawRelation {
            id: Some(relation.to_string()),
            label: Some(relation.to_lowercase()),
            iri: None,
        }),
    }
}
