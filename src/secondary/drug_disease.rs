//! Drug -> disease indications from a TTD flat file, resolved to ontology ids
//! through a phenotype name matcher export.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::association::{AssociationRecord, Endpoint};
use crate::config::Vocabulary;
use crate::error::{BiokgError, Result};
use crate::graph::Node;

const ID_LINE: &str = "TTDDRUID";
const NAME_LINE: &str = "DRUGNAME";
const INDICATION_LINE: &str = "INDICATI";

/// One indication of one drug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugDiseaseEntry {
    pub drug_id: String,
    /// Lower-cased drug name
    pub drug_name: String,
    /// Normalized disease name, see [`normalize_name`]
    pub disease_name: String,
    pub phase: String,
}

/// A disease name matched to an ontology term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhenotypeMatch {
    pub name: String,
    pub disease_id: String,
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "ontologyTermIRI")]
    ontology_term_iri: String,
    score: f64,
}

/// Lower-case alphanumeric words joined by single spaces.
pub fn normalize_name(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| BiokgError::InvalidInput(e.to_string()))
}

/// Matches runs of characters that separate the parts of an ontology id.
pub fn id_separators() -> Result<Regex> {
    compile(r"[^0-9a-zA-Z]+")
}

/// `http://purl.obolibrary.org/obo/HP_0001250` -> `HP:0001250`
pub fn curie_from_iri(iri: &str, separators: &Regex) -> Option<String> {
    let local = iri.split("/obo/").nth(1)?;
    let curie = separators.replace_all(local, ":").to_string();
    if curie.is_empty() {
        None
    } else {
        Some(curie)
    }
}

/// Parse the TTD drug-disease flat file.
///
/// Key/value lines are tab separated. A blank line ends the current drug;
/// indications seen before any drug id (the file header) are ignored.
/// An indication's disease name runs up to its last `[` and its phase
/// follows its last `]`.
pub fn parse_drug_disease(content: &str) -> Result<Vec<DrugDiseaseEntry>> {
    let disease = compile(r"^(.*)\[")?;
    let phase = compile(r"\]([^\]]*)$")?;

    let mut entries = Vec::new();
    let mut drug_id: Option<String> = None;
    let mut drug_name: Option<String> = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            drug_id = None;
            drug_name = None;
            continue;
        }
        let (key, value) = match line.split_once('\t') {
            Some((key, value)) => (key.trim(), value),
            None => continue,
        };

        match key {
            ID_LINE => drug_id = Some(value.trim().to_string()),
            NAME_LINE => drug_name = Some(value.trim().to_lowercase()),
            INDICATION_LINE => {
                let (Some(id), Some(name)) = (&drug_id, &drug_name) else {
                    continue;
                };
                let Some(disease_name) = disease.captures(value) else {
                    log::warn!("Unrecognized indication line for {}: {}", id, value);
                    continue;
                };
                let phase = phase
                    .captures(value)
                    .map(|caps| caps[1].trim().to_string())
                    .unwrap_or_default();
                entries.push(DrugDiseaseEntry {
                    drug_id: id.clone(),
                    drug_name: name.clone(),
                    disease_name: normalize_name(&disease_name[1]),
                    phase,
                });
            }
            _ => {}
        }
    }

    log::info!("Loaded {} drug-disease pairs", entries.len());
    Ok(entries)
}

pub fn load_drug_disease(path: &Path) -> Result<Vec<DrugDiseaseEntry>> {
    let content = std::fs::read_to_string(path)?;
    parse_drug_disease(&content)
}

/// Read a `;`-separated matcher export, keeping only exact (score 100) matches.
pub fn read_phenotype_matches<R: std::io::Read>(reader: R) -> Result<Vec<PhenotypeMatch>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let separators = id_separators()?;
    let mut matches = Vec::new();
    for row in csv_reader.deserialize::<MatchRow>() {
        let row = row?;
        if row.score != 100.0 {
            continue;
        }
        match curie_from_iri(&row.ontology_term_iri, &separators) {
            Some(disease_id) => matches.push(PhenotypeMatch {
                name: normalize_name(&row.name),
                disease_id,
            }),
            None => log::warn!("No ontology id in IRI {}", row.ontology_term_iri),
        }
    }

    log::info!("Loaded {} phenotypes with matching IDs scoring 100", matches.len());
    Ok(matches)
}

pub fn load_phenotype_matches(path: &Path) -> Result<Vec<PhenotypeMatch>> {
    let file = std::fs::File::open(path)?;
    read_phenotype_matches(file)
}

/// Join indications with matched ids and existing graph nodes.
///
/// A pair is kept when its disease id is one of `disease_ids` and its drug
/// name equals the (lower-cased) label of one of `drug_nodes`; the subject
/// id is that drug node's id. Records are numbered `DC0`, `DC1`, ...
pub fn drug_disease_associations(
    entries: &[DrugDiseaseEntry],
    matches: &[PhenotypeMatch],
    drug_nodes: &[&Node],
    disease_ids: &BTreeSet<String>,
    vocabulary: &Vocabulary,
) -> Vec<AssociationRecord> {
    let mut ids_by_name: HashMap<&str, Vec<&str>> = HashMap::new();
    for m in matches {
        ids_by_name.entry(m.name.as_str()).or_default().push(m.disease_id.as_str());
    }

    let mut drug_ids_by_label: HashMap<String, &str> = HashMap::new();
    for node in drug_nodes {
        if let Some(label) = &node.label {
            drug_ids_by_label
                .entry(label.to_lowercase())
                .or_insert(node.id.as_str());
        }
    }

    // (drug node id, drug name, disease id)
    let mut pairs: BTreeSet<(&str, &str, &str)> = BTreeSet::new();
    for entry in entries {
        let Some(&drug_id) = drug_ids_by_label.get(&entry.drug_name) else {
            continue;
        };
        for &disease_id in ids_by_name.get(entry.disease_name.as_str()).into_iter().flatten() {
            if disease_ids.contains(disease_id) {
                pairs.insert((drug_id, entry.drug_name.as_str(), disease_id));
            }
        }
    }

    let records: Vec<AssociationRecord> = pairs
        .into_iter()
        .enumerate()
        .map(|(i, (drug_id, drug_name, disease_id))| {
            AssociationRecord::new(
                format!("DC{}", i),
                Endpoint::bare(drug_id, Some(&vocabulary.drug)).with_label(drug_name),
                vocabulary.drug_treats.clone(),
                Endpoint::bare(disease_id, None),
            )
        })
        .collect();

    log::info!(
        "A total of {} drug-disease pairs are matched with existing drugs and diseases/phenotypes",
        records.len()
    );
    records
}
