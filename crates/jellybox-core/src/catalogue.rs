//! Read-only views over a box and the species catalogue.

use std::collections::BTreeMap;

use jellybox_types::{BoxStatistics, CatalogueEntry, Group, JellyfishBox, SpeciesMeta, StatisticsEntry};

use crate::release::group_of;

/// Index species metadata by id.
pub fn index_species(species: &[SpeciesMeta]) -> BTreeMap<String, SpeciesMeta> {
    species
        .iter()
        .map(|meta| (meta.id.clone(), meta.clone()))
        .collect()
}

/// Per-group and per-species counts for `record`.
///
/// Entries are ordered rarest group first, then by species id.
pub fn statistics(
    record: &JellyfishBox,
    species: &BTreeMap<String, SpeciesMeta>,
    capacity: u32,
) -> BoxStatistics {
    let mut entries: Vec<StatisticsEntry> = record
        .inventory
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(id, count)| StatisticsEntry {
            species_id: id.clone(),
            name: species
                .get(id)
                .map_or_else(|| id.clone(), |meta| meta.name.clone()),
            group: group_of(id, species),
            count: *count,
        })
        .collect();
    entries.sort_by(|a, b| {
        a.group
            .cmp(&b.group)
            .then_with(|| a.species_id.cmp(&b.species_id))
    });

    let mut groups: BTreeMap<Group, u32> = BTreeMap::new();
    for entry in &entries {
        let total = groups.entry(entry.group).or_insert(0);
        *total = total.saturating_add(entry.count);
    }

    BoxStatistics {
        population: record.population(),
        capacity,
        groups,
        entries,
    }
}

/// Every known species with how many `record` holds.
///
/// Ordered like [`statistics`]. `owned` is zero when no box is given.
pub fn catalogue(species: &[SpeciesMeta], record: Option<&JellyfishBox>) -> Vec<CatalogueEntry> {
    let mut entries: Vec<CatalogueEntry> = species
        .iter()
        .map(|meta| CatalogueEntry {
            species_id: meta.id.clone(),
            name: meta.name.clone(),
            group: meta.group,
            description: meta.description.clone(),
            owned: record.map_or(0, |r| r.count_of(&meta.id)),
        })
        .collect();
    entries.sort_by(|a, b| {
        a.group
            .cmp(&b.group)
            .then_with(|| a.species_id.cmp(&b.species_id))
    });
    entries
}
