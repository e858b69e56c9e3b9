//! Frontier traversal over a remote association source.
//!
//! [`Traversal::fetch_neighbours`] is the primitive: it queries every id of a
//! set (outgoing and incoming, optionally once per relation id) through a
//! bounded worker pool and merges the answers into one deduplicated set.
//! Because the merge is a set union, completion order never changes the
//! result. Two discovery modes are built on top of it:
//!
//! - [`Traversal::seed_neighbour_ids`]: one-hop neighbours of the seeds.
//! - [`Traversal::orthopheno_ids`]: depth-limited discovery of orthologous
//!   genes and their phenotypes.

mod cancel;
#[cfg(test)]
pub(crate) mod mock;

pub use cancel::CancellationToken;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};

use crate::association::{
    exclude_categories, filter_by_relations, neighbour_ids, parse_all, within_ids,
    AssociationRecord, RawAssociation,
};
use crate::config::Vocabulary;
use crate::error::{BiokgError, Result};

/// Answer of the association source for one node.
#[derive(Debug, Clone, Default)]
pub struct SourceResponse {
    pub outgoing: Vec<RawAssociation>,
    pub incoming: Vec<RawAssociation>,
}

impl SourceResponse {
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }
}

/// Remote provider of associations.
///
/// Implementations own retries. A node whose lookup ultimately fails is
/// answered with an empty response, which callers read as "no known
/// associations".
#[async_trait]
pub trait AssociationSource: Send + Sync {
    async fn associations_for(
        &self,
        node_id: &str,
        relation: Option<&str>,
        rows: usize,
    ) -> SourceResponse;
}

/// Options of a single `fetch_neighbours` call.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum rows per request
    pub rows: usize,
    /// When non-empty, one request pair per relation id instead of one unscoped pair
    pub relations: Vec<String>,
    /// Keep only associations whose endpoints are both in the queried set
    pub within_ids: bool,
}

impl FetchOptions {
    pub fn rows(rows: usize) -> Self {
        Self {
            rows,
            relations: Vec::new(),
            within_ids: false,
        }
    }

    pub fn with_relations(mut self, relations: Vec<String>) -> Self {
        self.relations = relations;
        self
    }

    pub fn within_ids(mut self) -> Self {
        self.within_ids = true;
        self
    }
}

/// Traversal engine bound to one association source and vocabulary.
#[derive(Clone)]
pub struct Traversal {
    source: Arc<dyn AssociationSource>,
    vocabulary: Vocabulary,
    concurrency: usize,
}

impl Traversal {
    pub fn new(source: Arc<dyn AssociationSource>, vocabulary: Vocabulary, concurrency: usize) -> Self {
        Self {
            source,
            vocabulary,
            concurrency: concurrency.max(1),
        }
    }

    /// Associations touching any id of `ids`, publications excluded.
    pub async fn fetch_neighbours(
        &self,
        ids: &BTreeSet<String>,
        options: &FetchOptions,
    ) -> Vec<AssociationRecord> {
        let relations: Vec<Option<String>> = if options.relations.is_empty() {
            vec![None]
        } else {
            options.relations.iter().cloned().map(Some).collect()
        };

        let requests: Vec<(String, Option<String>)> = ids
            .iter()
            .flat_map(|id| relations.iter().map(move |rel| (id.clone(), rel.clone())))
            .collect();
        let request_count = requests.len();
        let rows = options.rows;

        let responses: Vec<(String, SourceResponse)> = stream::iter(requests)
            .map(|(id, relation)| {
                let source = Arc::clone(&self.source);
                async move {
                    let response = source.associations_for(&id, relation.as_deref(), rows).await;
                    (id, response)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut merged = BTreeSet::new();
        let mut empty = 0;
        for (id, response) in &responses {
            if response.is_empty() {
                empty += 1;
                log::debug!("No associations for {}", id);
            }
            merged.extend(parse_all(&response.outgoing));
            merged.extend(parse_all(&response.incoming));
        }

        let merged: Vec<AssociationRecord> = if options.within_ids {
            within_ids(merged, ids)
        } else {
            merged.into_iter().collect()
        };
        let associations = exclude_categories(merged, &self.vocabulary.excluded_groups());

        log::debug!(
            "{} requests for {} ids ({} empty) yielded {} associations",
            request_count,
            ids.len(),
            empty,
            associations.len()
        );
        associations
    }

    /// Ids introduced by the seeds' associations that are not seeds themselves.
    pub async fn seed_neighbour_ids(&self, seeds: &[String], rows: usize) -> BTreeSet<String> {
        log::info!("Neighbours of seeds retrieval has started...");
        let seed_set: BTreeSet<String> = seeds.iter().cloned().collect();

        let associations = self.fetch_neighbours(&seed_set, &FetchOptions::rows(rows)).await;
        log::info!(
            "A total of {} associations have been found between seeds and their neighbours.",
            associations.len()
        );

        let neighbours = neighbour_ids(&seed_set, &associations, &[]);
        log::info!(
            "A total of {} neighbour nodes have been found for the {} given seeds.",
            neighbours.len(),
            seed_set.len()
        );
        neighbours
    }

    /// Orthologous genes of the frontier and the phenotypes of those genes,
    /// accumulated over `depth` iterations.
    ///
    /// After each iteration the frontier becomes all one-hop neighbours of
    /// the previous frontier, not the orthologs found in it, so a depth above
    /// one widens the search around the seeds rather than following
    /// ortholog-of-ortholog chains.
    ///
    /// `cancel` is checked before each iteration; a cancelled run returns
    /// `BiokgError::Cancelled` and discards partial results.
    pub async fn orthopheno_ids(
        &self,
        seeds: &[String],
        depth: usize,
        rows: usize,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<String>> {
        log::info!("Orthologs/phenotypes retrieval has started...");
        let options = FetchOptions::rows(rows);
        let gene = [self.vocabulary.gene.clone()];
        let phenotype = [self.vocabulary.phenotype.clone()];

        let mut frontier: BTreeSet<String> = seeds.iter().cloned().collect();
        let mut found = BTreeSet::new();

        for d in 0..depth {
            if cancel.is_cancelled() {
                log::warn!("Orthologs/phenotypes retrieval cancelled before depth {}", d + 1);
                return Err(BiokgError::Cancelled);
            }
            log::info!("For depth {} seed list contains {} ids", d + 1, frontier.len());

            let associations = self.fetch_neighbours(&frontier, &options).await;
            let next_frontier = neighbour_ids(&frontier, &associations, &[]);
            log::info!("{} neighbours of given seeds", next_frontier.len());

            let orthology = filter_by_relations(&associations, &self.vocabulary.orthology_relations);
            drop(associations);
            let orthologs = neighbour_ids(&frontier, &orthology, &gene);
            log::info!("{} orthologous genes of given seeds", orthologs.len());

            let ortholog_associations = self.fetch_neighbours(&orthologs, &options).await;
            let phenotypes = neighbour_ids(&orthologs, &ortholog_associations, &phenotype);
            log::info!("{} phenotypes of orthologous genes", phenotypes.len());

            log::info!("{} orthologs/phenotypes", orthologs.len() + phenotypes.len());
            found.extend(orthologs);
            found.extend(phenotypes);

            frontier = next_frontier;
        }

        log::info!(
            "{} orthologs/phenotypes have been found using a depth of {}",
            found.len(),
            depth
        );
        Ok(found)
    }

    /// Associations among `ids` only (no new ids introduced).
    pub async fn closed_associations(&self, ids: &BTreeSet<String>, rows: usize) -> Vec<AssociationRecord> {
        log::info!("Associations of {} nodes retrieval has started...", ids.len());
        let associations = self
            .fetch_neighbours(ids, &FetchOptions::rows(rows).within_ids())
            .await;
        log::info!(
            "A total of {} associations have been found between the given nodes.",
            associations.len()
        );
        associations
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{raw_association, raw_endpoint, raw_gene, MockSource};
    use super::*;
    use std::time::Duration;

    const ORTH_A: &str = "RO:HOM0000017";
    const ORTH_B: &str = "RO:HOM0000020";

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn seeds(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    /// n1 -orth-> n2, n1 -> n3, n2 -> p1, n3 -orth-> n2, n3 -> p2
    fn five_node_graph() -> Vec<RawAssociation> {
        vec![
            raw_association("A1", raw_gene("n1", "NCBITaxon:9606"), ORTH_A, raw_gene("n2", "NCBITaxon:10090")),
            raw_association("A2", raw_gene("n1", "NCBITaxon:9606"), "RO:0002434", raw_gene("n3", "NCBITaxon:7955")),
            raw_association("A3", raw_gene("n2", "NCBITaxon:10090"), "RO:0002200", raw_endpoint("p1", "phenotype")),
            raw_association("A4", raw_gene("n3", "NCBITaxon:7955"), ORTH_B, raw_gene("n2", "NCBITaxon:10090")),
            raw_association("A5", raw_gene("n3", "NCBITaxon:7955"), "RO:0002200", raw_endpoint("p2", "phenotype")),
        ]
    }

    fn traversal(source: Arc<MockSource>) -> Traversal {
        Traversal::new(source, Vocabulary::default(), 4)
    }

    #[tokio::test]
    async fn test_fetch_merges_outgoing_and_incoming() {
        let source = Arc::new(MockSource::new(five_node_graph()));
        let t = traversal(source.clone());

        let found = t.fetch_neighbours(&ids(&["n2"]), &FetchOptions::rows(10)).await;
        let found_ids: Vec<_> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(found_ids, vec!["A1", "A3", "A4"]);
        assert_eq!(source.queried_ids(), vec!["n2".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_deduplicates_shared_associations() {
        let source = Arc::new(MockSource::new(five_node_graph()));
        let t = traversal(source);

        // A1 is outgoing for n1 and incoming for n2
        let found = t.fetch_neighbours(&ids(&["n1", "n2"]), &FetchOptions::rows(10)).await;
        assert_eq!(found.iter().filter(|a| a.id == "A1").count(), 1);
        assert_eq!(found.len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_is_order_independent() {
        let fast_a = Arc::new(
            MockSource::new(five_node_graph()).with_delay("n3", Duration::from_millis(30)),
        );
        let fast_b = Arc::new(
            MockSource::new(five_node_graph()).with_delay("n1", Duration::from_millis(30)),
        );

        let a = traversal(fast_a.clone())
            .fetch_neighbours(&ids(&["n1", "n3"]), &FetchOptions::rows(10))
            .await;
        let b = traversal(fast_b.clone())
            .fetch_neighbours(&ids(&["n1", "n3"]), &FetchOptions::rows(10))
            .await;

        assert_eq!(fast_a.queried_ids(), seeds(&["n1", "n3"]));
        assert_eq!(fast_b.queried_ids(), seeds(&["n3", "n1"]));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_fetch_excludes_publications() {
        let mut associations = five_node_graph();
        associations.push(raw_association(
            "PUB1",
            raw_gene("n1", "NCBITaxon:9606"),
            ORTH_A,
            raw_endpoint("PMID:123", "publication"),
        ));
        associations.push(raw_association(
            "PUB2",
            raw_endpoint("PMID:456", "publication"),
            "RO:0002200",
            raw_gene("n1", "NCBITaxon:9606"),
        ));
        let t = traversal(Arc::new(MockSource::new(associations)));

        let unfiltered = t.fetch_neighbours(&ids(&["n1"]), &FetchOptions::rows(10)).await;
        let scoped = t
            .fetch_neighbours(
                &ids(&["n1"]),
                &FetchOptions::rows(10).with_relations(vec![ORTH_A.to_string()]),
            )
            .await;

        for found in [&unfiltered, &scoped] {
            assert!(found.iter().all(|a| a.subject.category.as_deref() != Some("publication")
                && a.object.category.as_deref() != Some("publication")));
        }
        assert_eq!(unfiltered.len(), 2);
        assert_eq!(scoped.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_one_request_per_relation() {
        let source = Arc::new(MockSource::new(five_node_graph()));
        let t = traversal(source.clone());

        let found = t
            .fetch_neighbours(
                &ids(&["n2"]),
                &FetchOptions::rows(10).with_relations(vec![ORTH_A.to_string(), ORTH_B.to_string()]),
            )
            .await;

        assert_eq!(source.calls().len(), 2);
        let found_ids: Vec<_> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(found_ids, vec!["A1", "A4"]);
    }

    #[tokio::test]
    async fn test_fetch_within_ids_drops_new_ids() {
        let t = traversal(Arc::new(MockSource::new(five_node_graph())));
        let found = t.closed_associations(&ids(&["n1", "n2"]), 10).await;
        let found_ids: Vec<_> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(found_ids, vec!["A1"]);
    }

    #[tokio::test]
    async fn test_failed_id_contributes_nothing() {
        let source = Arc::new(MockSource::new(five_node_graph()).failing("n1"));
        let t = traversal(source);
        let found = t.fetch_neighbours(&ids(&["n1", "n2"]), &FetchOptions::rows(10)).await;
        let found_ids: Vec<_> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(found_ids, vec!["A1", "A3", "A4"]);
    }

    #[tokio::test]
    async fn test_malformed_associations_are_skipped() {
        let mut associations = five_node_graph();
        let mut broken = raw_association("BAD", raw_gene("n1", "x"), "r", raw_endpoint("z", "gene"));
        broken.object.as_mut().unwrap().id = None;
        associations.push(broken);

        let t = traversal(Arc::new(MockSource::new(associations)));
        let found = t.fetch_neighbours(&ids(&["n1"]), &FetchOptions::rows(10)).await;
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_seed_neighbour_ids() {
        let t = traversal(Arc::new(MockSource::new(five_node_graph())));
        let neighbours = t.seed_neighbour_ids(&seeds(&["n1"]), 10).await;
        assert_eq!(neighbours, ids(&["n2", "n3"]));

        let neighbours = t.seed_neighbour_ids(&seeds(&["n1", "n2"]), 10).await;
        assert_eq!(neighbours, ids(&["n3", "p1"]));
    }

    #[tokio::test]
    async fn test_orthopheno_depth_one() {
        let source = Arc::new(MockSource::new(five_node_graph()));
        let t = traversal(source.clone());

        let found = t
            .orthopheno_ids(&seeds(&["n1"]), 1, 10, &CancellationToken::new())
            .await
            .unwrap();

        // n2 is n1's ortholog, p1 is n2's phenotype
        assert_eq!(found, ids(&["n2", "p1"]));
        assert_eq!(source.queried_ids(), seeds(&["n1", "n2"]));
    }

    #[tokio::test]
    async fn test_orthopheno_depth_two_advances_unfiltered_frontier() {
        let source = Arc::new(MockSource::new(five_node_graph()));
        let t = traversal(source.clone());

        let found = t
            .orthopheno_ids(&seeds(&["n1"]), 2, 10, &CancellationToken::new())
            .await
            .unwrap();

        // Depth 2 expands {n2, n3} (all one-hop neighbours of n1), not {n2}.
        // From that frontier the only ortholog outside it is n1, which has no
        // phenotypes. Following ortholog chains instead would have reached p2.
        assert_eq!(found, ids(&["n1", "n2", "p1"]));
        assert!(!found.contains("p2"));

        let queried = source.queried_ids();
        assert_eq!(queried.len(), 5);
        assert_eq!(&queried[..2], &seeds(&["n1", "n2"])[..]);
        let second_frontier: BTreeSet<String> = queried[2..4].iter().cloned().collect();
        assert_eq!(second_frontier, ids(&["n2", "n3"]));
        assert_eq!(queried[4], "n1");
    }

    #[tokio::test]
    async fn test_orthopheno_depth_zero_is_empty() {
        let source = Arc::new(MockSource::new(five_node_graph()));
        let t = traversal(source.clone());
        let found = t
            .orthopheno_ids(&seeds(&["n1"]), 0, 10, &CancellationToken::new())
            .await
            .unwrap();
        assert!(found.is_empty());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_orthopheno_cancelled_before_first_depth() {
        let source = Arc::new(MockSource::new(five_node_graph()));
        let t = traversal(source.clone());
        let token = CancellationToken::new();
        token.cancel();

        let result = t.orthopheno_ids(&seeds(&["n1"]), 2, 10, &token).await;
        assert!(matches!(result, Err(BiokgError::Cancelled)));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_orthopheno_cancelled_between_depths() {
        let token = CancellationToken::new();
        // n2 is only queried as n1's ortholog during depth 1
        let source = Arc::new(MockSource::new(five_node_graph()).cancel_on_query("n2", token.clone()));
        let t = traversal(source.clone());

        let result = t.orthopheno_ids(&seeds(&["n1"]), 2, 10, &token).await;
        assert!(matches!(result, Err(BiokgError::Cancelled)));
        // Depth 1 ran to completion, depth 2 (frontier {n2, n3}) never started
        assert_eq!(source.queried_ids(), seeds(&["n1", "n2"]));
        assert!(!source.queried_ids().contains(&"n3".to_string()));
    }
}
