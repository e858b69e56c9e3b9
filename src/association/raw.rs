//! Raw BioLink association payloads and their reduction to records.

use serde::{Deserialize, Serialize};

use super::{AssociationRecord, Endpoint, RelationRef};
use crate::error::ParseError;

/// Taxon block of a raw endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTaxon {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Subject or object of a raw association.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEndpoint {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub iri: Option<String>,
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(default)]
    pub taxon: Option<RawTaxon>,
}

/// Relation block of a raw association.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRelation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub iri: Option<String>,
}

/// One entry of the `associations` array returned by the association API.
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAssociation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subject: Option<RawEndpoint>,
    #[serde(default)]
    pub object: Option<RawEndpoint>,
    #[serde(default)]
    pub relation: Option<RawRelation>,
}

fn unpack_endpoint(
    raw: Option<&RawEndpoint>,
    role: &'static str,
    id_field: &'static str,
) -> Result<Endpoint, ParseError> {
    let raw = raw.ok_or(ParseError::MissingField(role))?;
    let id = raw.id.clone().ok_or(ParseError::MissingField(id_field))?;
    let taxon = raw.taxon.as_ref();

    Ok(Endpoint {
        id,
        label: raw.label.clone(),
        iri: raw.iri.clone(),
        // Only the first category survives; an empty list means unknown.
        category: raw
            .category
            .as_ref()
            .and_then(|categories| categories.first().cloned()),
        taxon_id: taxon.and_then(|t| t.id.clone()),
        taxon_label: taxon.and_then(|t| t.label.clone()),
    })
}

/// Reduce a raw association to an `AssociationRecord`.
pub fn parse(raw: &RawAssociation) -> Result<AssociationRecord, ParseError> {
    let id = raw.id.clone().ok_or(ParseError::MissingField("id"))?;
    let subject = unpack_endpoint(raw.subject.as_ref(), "subject", "subject.id")?;
    let object = unpack_endpoint(raw.object.as_ref(), "object", "object.id")?;

    let relation = raw
        .relation
        .as_ref()
        .ok_or(ParseError::MissingField("relation"))?;
    let relation = RelationRef {
        id: relation
            .id
            .clone()
            .ok_or(ParseError::MissingField("relation.id"))?,
        label: relation.label.clone(),
        iri: relation.iri.clone(),
    };

    Ok(AssociationRecord {
        id,
        subject,
        object,
        relation,
    })
}

/// Parse a batch, logging and dropping malformed entries.
pub fn parse_all(raws: &[RawAssociation]) -> Vec<AssociationRecord> {
    raws.iter()
        .filter_map(|raw| match parse(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!(
                    "Skipping malformed association {}: {}",
                    raw.id.as_deref().unwrap_or("<no id>"),
                    e
                );
                None
            }
        })
        .collect()
}
