use anyhow::Result;
use biokg::cache::ResponseCache;
use biokg::graph::{find_relations, KnowledgeGraph};
use biokg::monarch::MonarchClient;
use biokg::{pipeline, AssociationSource, CancellationToken, Config, Traversal};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Build a biomedical knowledge graph from the Monarch association API
#[derive(Debug, Parser)]
#[command(name = "biokg")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full pipeline and export both graphs
    Build {
        /// Seed identifiers (defaults to traversal.seeds)
        #[arg(long = "seed")]
        seeds: Vec<String>,
        /// Orthologs/phenotypes discovery depth (defaults to traversal.depth)
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Print the one-hop neighbour ids of the seeds
    Neighbours {
        #[arg(long = "seed", required = true)]
        seeds: Vec<String>,
    },
    /// Print orthologous genes and their phenotypes
    Orthopheno {
        #[arg(long = "seed", required = true)]
        seeds: Vec<String>,
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Print relation ids whose label contains a substring
    Relations {
        substring: String,
        #[arg(long = "seed")]
        seeds: Vec<String>,
    },
}

/// Monarch client with an optional response cache
fn build_source(config: &Config) -> Result<Arc<dyn AssociationSource>> {
    let cache = if config.monarch.cache_capacity > 0 {
        Some(Arc::new(ResponseCache::new(config.monarch.cache_capacity)))
    } else {
        None
    };
    Ok(Arc::new(MonarchClient::new_with_cache(&config.monarch, cache)?))
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping after the current depth");
            token.cancel();
        }
    });
}

fn apply_overrides(config: &mut Config, seeds: Vec<String>, depth: Option<usize>) -> Result<()> {
    if !seeds.is_empty() {
        config.traversal.seeds = seeds;
    }
    if let Some(depth) = depth {
        config.traversal.depth = depth;
    }
    config.validate()
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let source = build_source(&config)?;
    let traversal = Traversal::new(
        Arc::clone(&source),
        config.vocabulary.clone(),
        config.monarch.concurrency,
    );

    match cli.command {
        Command::Build { seeds, depth } => {
            apply_overrides(&mut config, seeds, depth)?;
            let output = pipeline::run(&config, source, &cancel).await?;
            println!(
                "{} nodes, {} edges, {} semantic groups",
                output.summary.node_count,
                output.summary.edge_count,
                output.summary.distinct_semantic_groups
            );
            for paths in &output.exports {
                println!("{}", paths.nodes.display());
                println!("{}", paths.edges.display());
            }
        }
        Command::Neighbours { seeds } => {
            for id in traversal.seed_neighbour_ids(&seeds, config.monarch.rows).await {
                println!("{}", id);
            }
        }
        Command::Orthopheno { seeds, depth } => {
            apply_overrides(&mut config, seeds, depth)?;
            let ids = traversal
                .orthopheno_ids(
                    &config.traversal.seeds,
                    config.traversal.depth,
                    config.monarch.rows,
                    &cancel,
                )
                .await?;
            for id in ids {
                println!("{}", id);
            }
        }
        Command::Relations { substring, seeds } => {
            apply_overrides(&mut config, seeds, None)?;
            let seeds = &config.traversal.seeds;
            let mut ids: BTreeSet<String> = seeds.iter().cloned().collect();
            ids.extend(traversal.seed_neighbour_ids(seeds, config.monarch.rows).await);

            let associations = traversal
                .closed_associations(&ids, config.monarch.closed_rows)
                .await;
            let graph = KnowledgeGraph::new(&associations);
            for (id, label) in find_relations(&graph, &substring) {
                println!("{}\t{}", id, label);
            }
        }
    }

    Ok(())
}
