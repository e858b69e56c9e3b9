//! Snapshots of a graph stamped with the export date: JSON files of nodes
//! and edges plus a CSV of its semantic-group connection triplets.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::graph::{connection_summary, relation_labels, KnowledgeGraph};

/// Files written by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub nodes: PathBuf,
    pub edges: PathBuf,
    pub triplets: PathBuf,
}

/// `<folder>/<prefix>_{nodes,edges}_<date>.json` and `<folder>/<prefix>_triplets_<date>.csv`
pub fn export_paths(folder: &Path, prefix: &str, date: NaiveDate) -> ExportPaths {
    let stamp = date.format("%Y-%m-%d");
    ExportPaths {
        nodes: folder.join(format!("{}_nodes_{}.json", prefix, stamp)),
        edges: folder.join(format!("{}_edges_{}.json", prefix, stamp)),
        triplets: folder.join(format!("{}_triplets_{}.csv", prefix, stamp)),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// `subject,relation,object` rows ordered by relation label.
fn write_triplets(path: &Path, graph: &KnowledgeGraph) -> Result<usize> {
    let mut triplets: Vec<_> = connection_summary(graph).into_iter().collect();
    triplets.sort_by(|a, b| a.1.cmp(&b.1));

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["subject", "relation", "object"])?;
    for (subject, relation, object) in &triplets {
        writer.write_record([
            subject.as_deref().unwrap_or(""),
            relation.as_deref().unwrap_or(""),
            object.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(triplets.len())
}

/// Write nodes and edges sorted by id, creating `folder` if needed.
pub fn export_graph_on(
    graph: &KnowledgeGraph,
    folder: &Path,
    prefix: &str,
    date: NaiveDate,
) -> Result<ExportPaths> {
    fs::create_dir_all(folder)?;
    let paths = export_paths(folder, prefix, date);

    let nodes: Vec<_> = graph.all_nodes().collect();
    let edges: Vec<_> = graph.all_edges().collect();
    write_json(&paths.nodes, &nodes)?;
    write_json(&paths.edges, &edges)?;
    relation_labels(graph);
    let triplets = write_triplets(&paths.triplets, graph)?;

    log::info!(
        "Exported {} nodes to {} and {} edges to {}",
        nodes.len(),
        paths.nodes.display(),
        edges.len(),
        paths.edges.display()
    );
    log::info!(
        "List of {} triplets saved to {}",
        triplets,
        paths.triplets.display()
    );
    Ok(paths)
}

/// [`export_graph_on`] stamped with today's local date.
pub fn export_graph(graph: &KnowledgeGraph, folder: &Path, prefix: &str) -> Result<ExportPaths> {
    export_graph_on(graph, folder, prefix, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::{AssociationRecord, Endpoint, RelationRef};
    use crate::graph::{Edge, Node};
    use tempfile::TempDir;

    #[test]
    fn test_export_paths() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let paths = export_paths(Path::new("out"), "monarch_orthopeno", date);
        assert_eq!(paths.nodes, Path::new("out/monarch_orthopeno_nodes_2024-03-07.json"));
        assert_eq!(paths.edges, Path::new("out/monarch_orthopeno_edges_2024-03-07.json"));
        assert_eq!(paths.triplets, Path::new("out/monarch_orthopeno_triplets_2024-03-07.csv"));
    }

    #[test]
    fn test_export_writes_sorted_json() {
        let graph = KnowledgeGraph::new(&[
            AssociationRecord::new(
                "e2",
                Endpoint::bare("b", Some("gene")),
                RelationRef::new("RO:1", Some("interacts_with"), None),
                Endpoint::bare("a", Some("gene")),
            ),
            AssociationRecord::new(
                "e1",
                Endpoint::bare("a", Some("gene")),
                RelationRef::new("RO:2", None, None),
                Endpoint::bare("c", Some("phenotype")),
            ),
        ]);

        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("nested");
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let paths = export_graph_on(&graph, &folder, "kg", date).unwrap();

        let nodes: Vec<Node> =
            serde_json::from_str(&fs::read_to_string(&paths.nodes).unwrap()).unwrap();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let edges: Vec<Edge> =
            serde_json::from_str(&fs::read_to_string(&paths.edges).unwrap()).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].id, "e1");
        assert_eq!(edges[1].relation.label.as_deref(), Some("interacts with"));

        // Unlabelled relation sorts first
        let triplets = fs::read_to_string(&paths.triplets).unwrap();
        assert_eq!(
            triplets,
            "subject,relation,object\ngene,,phenotype\ngene,interacts with,gene\n"
        );
    }

    #[test]
    fn test_export_empty_graph() {
        let dir = TempDir::new().unwrap();
        let paths = export_graph(&KnowledgeGraph::default(), dir.path(), "empty").unwrap();
        assert_eq!(fs::read_to_string(&paths.nodes).unwrap(), "[]");
        assert_eq!(fs::read_to_string(&paths.edges).unwrap(), "[]");
        assert_eq!(
            fs::read_to_string(&paths.triplets).unwrap(),
            "subject,relation,object\n"
        );
    }
}
