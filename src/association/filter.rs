//! Filters over association batches.

use std::collections::BTreeSet;

use super::AssociationRecord;

/// Keep associations whose relation id is one of `relation_ids`.
pub fn filter_by_relations(
    associations: &[AssociationRecord],
    relation_ids: &[String],
) -> Vec<AssociationRecord> {
    associations
        .iter()
        .filter(|a| relation_ids.contains(&a.relation.id))
        .cloned()
        .collect()
}

/// Drop associations where either endpoint belongs to one of `groups`.
pub fn exclude_categories(
    associations: impl IntoIterator<Item = AssociationRecord>,
    groups: &[String],
) -> Vec<AssociationRecord> {
    associations
        .into_iter()
        .filter(|a| {
            !a.endpoints().iter().any(|e| {
                e.category
                    .as_ref()
                    .map_or(false, |category| groups.contains(category))
            })
        })
        .collect()
}

/// Keep associations whose endpoints are both members of `ids`.
pub fn within_ids(
    associations: impl IntoIterator<Item = AssociationRecord>,
    ids: &BTreeSet<String>,
) -> Vec<AssociationRecord> {
    associations
        .into_iter()
        .filter(|a| ids.contains(&a.subject.id) && ids.contains(&a.object.id))
        .collect()
}

/// Endpoint ids of `associations` that are not in `seeds`.
///
/// With a non-empty `include_groups`, an endpoint only counts when its own
/// category is one of those groups; endpoints with unknown category never do.
pub fn neighbour_ids(
    seeds: &BTreeSet<String>,
    associations: &[AssociationRecord],
    include_groups: &[String],
) -> BTreeSet<String> {
    let mut neighbours = BTreeSet::new();

    for association in associations {
        for endpoint in association.endpoints() {
            if seeds.contains(&endpoint.id) {
                continue;
            }
            let in_groups = include_groups.is_empty()
                || endpoint
                    .category
                    .as_ref()
                    .map_or(false, |category| include_groups.contains(category));
            if in_groups {
                neighbours.insert(endpoint.id.clone());
            }
        }
    }

    neighbours
}
