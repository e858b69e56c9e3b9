//! Secondary tabular sources joined onto an assembled graph.
//!
//! Each join reads its files, keeps only rows whose identifiers already
//! appear in the graph and maps them to fresh association records that the
//! caller adds to the graph.

pub mod drug_disease;
pub mod drug_target;

pub use drug_disease::{drug_disease_associations, DrugDiseaseEntry, PhenotypeMatch};
pub use drug_target::{drug_target_associations, DrugTarget};

use std::collections::{BTreeSet, HashMap};

use crate::association::AssociationRecord;
use crate::config::{SecondaryConfig, Vocabulary};
use crate::error::Result;
use crate::graph::{extract_nodes, KnowledgeGraph};

/// Run every configured join against `graph`.
///
/// The drug-disease join needs both `drug_disease` and `phenotype_matches`;
/// the drug-target join needs `drug_targets`. Unconfigured joins are skipped.
pub fn secondary_associations(
    graph: &KnowledgeGraph,
    config: &SecondaryConfig,
    vocabulary: &Vocabulary,
) -> Result<Vec<AssociationRecord>> {
    let mut records = Vec::new();

    match (&config.drug_disease, &config.phenotype_matches) {
        (Some(ttd_path), Some(matches_path)) => {
            let entries = drug_disease::load_drug_disease(ttd_path)?;
            let matches = drug_disease::load_phenotype_matches(matches_path)?;
            let drugs = extract_nodes(graph, std::slice::from_ref(&vocabulary.drug));
            let disease_ids: BTreeSet<String> = extract_nodes(
                graph,
                &[vocabulary.disease.clone(), vocabulary.phenotype.clone()],
            )
            .into_iter()
            .map(|node| node.id.clone())
            .collect();
            records.extend(drug_disease_associations(
                &entries,
                &matches,
                &drugs,
                &disease_ids,
                vocabulary,
            ));
        }
        (None, None) => {}
        _ => log::warn!("Drug-disease join needs both drug_disease and phenotype_matches, skipping"),
    }

    if let Some(targets_path) = &config.drug_targets {
        let targets = drug_target::load_drug_targets(targets_path)?;
        let id_map = match &config.target_id_map {
            Some(path) => drug_target::load_id_map(path)?,
            None => HashMap::new(),
        };
        let gene_ids: BTreeSet<String> =
            extract_nodes(graph, std::slice::from_ref(&vocabulary.gene))
                .into_iter()
                .map(|node| node.id.clone())
                .collect();
        records.extend(drug_target_associations(&targets, &id_map, &gene_ids, vocabulary));
    }

    Ok(records)
}
