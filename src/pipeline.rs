//! End-to-end graph build.
//!
//! seeds -> neighbour ids and orthologs/phenotypes (discovered concurrently)
//! -> closed fetch among the discovered ids -> knowledge graph -> secondary
//! joins -> restructured graph -> JSON export of both graphs.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::association::within_ids;
use crate::config::{Config, Vocabulary};
use crate::error::{BiokgError, Result};
use crate::export::{export_graph, ExportPaths};
use crate::graph::{restructure, summarize, GraphSummary, KnowledgeGraph, SharedKnowledgeGraph};
use crate::secondary::secondary_associations;
use crate::traversal::{AssociationSource, CancellationToken, FetchOptions, Traversal};

pub const GRAPH_PREFIX: &str = "monarch_orthopeno";
pub const RESTRUCTURED_PREFIX: &str = "monarch_orthopeno_restructured";

/// Result of a full run.
#[derive(Debug)]
pub struct PipelineOutput {
    pub graph: KnowledgeGraph,
    pub restructured: KnowledgeGraph,
    pub summary: GraphSummary,
    /// Export of `graph` followed by export of `restructured`
    pub exports: Vec<ExportPaths>,
}

/// Seeds, their neighbours and the orthologs/phenotypes found up to `depth`.
pub async fn discover_ids(
    traversal: &Traversal,
    seeds: &[String],
    depth: usize,
    rows: usize,
    cancel: &CancellationToken,
) -> Result<BTreeSet<String>> {
    let (neighbours, orthopheno) = tokio::join!(
        traversal.seed_neighbour_ids(seeds, rows),
        traversal.orthopheno_ids(seeds, depth, rows, cancel),
    );

    let mut ids: BTreeSet<String> = seeds.iter().cloned().collect();
    ids.extend(neighbours);
    ids.extend(orthopheno?);
    log::info!("A total of {} nodes have been discovered", ids.len());
    Ok(ids)
}

/// Associations among `ids`, committed into one graph by `workers` tasks.
///
/// The id set is split into one batch per worker; every worker queries its
/// batch sequentially and keeps associations whose endpoints are both in
/// `ids`. Payloads are identical per association id, so the commit order
/// does not change the resulting graph.
pub async fn closed_graph(
    source: Arc<dyn AssociationSource>,
    vocabulary: &Vocabulary,
    ids: &BTreeSet<String>,
    rows: usize,
    workers: usize,
) -> Result<KnowledgeGraph> {
    log::info!("Associations of {} nodes retrieval has started...", ids.len());
    let universe = Arc::new(ids.clone());
    let all: Vec<String> = ids.iter().cloned().collect();
    let workers = workers.max(1);
    let batch_size = ((all.len() + workers - 1) / workers).max(1);
    let shared = SharedKnowledgeGraph::new();

    let mut tasks = JoinSet::new();
    for batch in all.chunks(batch_size) {
        let batch: BTreeSet<String> = batch.iter().cloned().collect();
        let worker = Traversal::new(Arc::clone(&source), vocabulary.clone(), 1);
        let universe = Arc::clone(&universe);
        let shared = shared.clone();
        tasks.spawn(async move {
            let found = worker.fetch_neighbours(&batch, &FetchOptions::rows(rows)).await;
            let kept = within_ids(found, &universe);
            shared.add_records(&kept)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.map_err(|e| BiokgError::Transport(format!("closed fetch worker failed: {}", e)))?;
    }

    log::info!(
        "A total of {} associations have been found between {} of the given nodes.",
        shared.edge_count(),
        shared.node_count()
    );
    Ok(shared.into_graph())
}

/// Discovery, closed fetch and secondary joins.
pub async fn build_graph(
    config: &Config,
    source: Arc<dyn AssociationSource>,
    cancel: &CancellationToken,
) -> Result<KnowledgeGraph> {
    let vocabulary = &config.vocabulary;
    let traversal = Traversal::new(
        Arc::clone(&source),
        vocabulary.clone(),
        config.monarch.concurrency,
    );

    let ids = discover_ids(
        &traversal,
        &config.traversal.seeds,
        config.traversal.depth,
        config.monarch.rows,
        cancel,
    )
    .await?;
    if cancel.is_cancelled() {
        return Err(BiokgError::Cancelled);
    }

    let mut graph = closed_graph(
        source,
        vocabulary,
        &ids,
        config.monarch.closed_rows,
        config.monarch.concurrency,
    )
    .await?;
    summarize(&graph);

    let extra = secondary_associations(&graph, &config.secondary, vocabulary)?;
    if !extra.is_empty() {
        let (nodes, edges) = graph.add_records(&extra);
        log::info!(
            "Secondary sources added {} nodes and {} edges",
            nodes,
            edges
        );
    }
    Ok(graph)
}

/// Build, restructure and export both graphs into `config.output.folder`.
pub async fn run(
    config: &Config,
    source: Arc<dyn AssociationSource>,
    cancel: &CancellationToken,
) -> Result<PipelineOutput> {
    let graph = build_graph(config, source, cancel).await?;
    let summary = summarize(&graph);
    let restructured = restructure(&graph, &config.vocabulary);

    let folder = config.output_folder();
    let exports = vec![
        export_graph(&graph, folder, GRAPH_PREFIX)?,
        export_graph(&restructured, folder, RESTRUCTURED_PREFIX)?,
    ];

    Ok(PipelineOutput {
        graph,
        restructured,
        summary,
        exports,
    })
}
