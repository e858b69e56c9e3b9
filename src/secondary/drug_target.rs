//! Drug -> target interactions from a DrugCentral style TSV.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::association::{AssociationRecord, Endpoint};
use crate::config::Vocabulary;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DrugTarget {
    #[serde(rename = "DRUG_NAME")]
    pub drug_name: String,
    #[serde(rename = "STRUCT_ID")]
    pub struct_id: String,
    /// One or more `|`-separated accessions
    #[serde(rename = "ACCESSION")]
    pub accession: String,
    #[serde(rename = "ORGANISM", default)]
    pub organism: String,
}

impl DrugTarget {
    pub fn primary_accession(&self) -> Option<&str> {
        self.accession
            .split('|')
            .map(str::trim)
            .find(|a| !a.is_empty())
    }
}

#[derive(Deserialize)]
struct MappingRow {
    from: String,
    to: String,
}

fn tsv_reader<R: std::io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader)
}

pub fn read_drug_targets<R: std::io::Read>(reader: R) -> Result<Vec<DrugTarget>> {
    let mut targets = Vec::new();
    for row in tsv_reader(reader).deserialize::<DrugTarget>() {
        targets.push(row?);
    }
    log::info!("Loaded {} drug-target interactions", targets.len());
    Ok(targets)
}

pub fn load_drug_targets(path: &Path) -> Result<Vec<DrugTarget>> {
    read_drug_targets(std::fs::File::open(path)?)
}

/// Accession -> graph id table. The first mapping of an accession wins.
pub fn read_id_map<R: std::io::Read>(reader: R) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for row in tsv_reader(reader).deserialize::<MappingRow>() {
        let row = row?;
        map.entry(row.from).or_insert(row.to);
    }
    Ok(map)
}

pub fn load_id_map(path: &Path) -> Result<HashMap<String, String>> {
    read_id_map(std::fs::File::open(path)?)
}

/// Interactions whose target is one of `gene_ids`, numbered `TTD0`, `TTD1`, ...
///
/// The first accession of each row is translated through `id_map` when
/// present and used as-is otherwise.
pub fn drug_target_associations(
    targets: &[DrugTarget],
    id_map: &HashMap<String, String>,
    gene_ids: &BTreeSet<String>,
    vocabulary: &Vocabulary,
) -> Vec<AssociationRecord> {
    // (struct id, drug name, target id)
    let mut pairs: BTreeSet<(&str, &str, &str)> = BTreeSet::new();
    for target in targets {
        let Some(accession) = target.primary_accession() else {
            continue;
        };
        let target_id = id_map.get(accession).map(String::as_str).unwrap_or(accession);
        if gene_ids.contains(target_id) {
            pairs.insert((target.struct_id.as_str(), target.drug_name.as_str(), target_id));
        }
    }

    let records: Vec<AssociationRecord> = pairs
        .into_iter()
        .enumerate()
        .map(|(i, (struct_id, drug_name, target_id))| {
            AssociationRecord::new(
                format!("TTD{}", i),
                Endpoint::bare(struct_id, Some(&vocabulary.drug)).with_label(drug_name),
                vocabulary.drug_targets.clone(),
                Endpoint::bare(target_id, None),
            )
        })
        .collect();

    log::info!(
        "A total of {} drug-target pairs are matched with existing genes",
        records.len()
    );
    records
}
