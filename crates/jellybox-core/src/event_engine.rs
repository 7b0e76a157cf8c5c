//! World events drawn from the event table during a settlement.
//!
//! The number of events is the summed per-tick probability of the table
//! times the number of ticks, realised like reproduction growth. Each
//! event slot is filled by one weighted draw over the table, using the
//! probabilities as relative weights.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use jellybox_types::{EventKind, EventMeta, SpeciesDelta, SpeciesMeta, WorldEvent};

use crate::inventory;
use crate::random::{self, ChoiceError};

/// Updated inventory and the events that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    /// Inventory after every effect was applied, in firing order.
    pub inventory: BTreeMap<String, u32>,
    /// Fired events in firing order.
    pub events: Vec<WorldEvent>,
}

/// Number of events to fire over `ticks`.
///
/// # Errors
///
/// Returns [`ChoiceError`] if the summed probability is negative or not
/// finite.
pub fn event_slots(
    table: &[EventMeta],
    ticks: u32,
    rng: &mut impl Rng,
) -> Result<u32, ChoiceError> {
    if table.is_empty() || ticks == 0 {
        return Ok(0);
    }
    let per_tick: f64 = table.iter().map(|event| event.probability).sum();
    random::realise_expected(per_tick * f64::from(ticks), rng)
}

/// Draw and apply events for `ticks` against `inventory`.
///
/// # Errors
///
/// Returns [`ChoiceError`] if the table's probabilities cannot be used as
/// weights.
pub fn apply_events(
    table: &[EventMeta],
    ticks: u32,
    inventory: &BTreeMap<String, u32>,
    species: &BTreeMap<String, SpeciesMeta>,
    capacity: u32,
    rng: &mut impl Rng,
) -> Result<EventOutcome, ChoiceError> {
    let mut updated = inventory.clone();
    let slots = event_slots(table, ticks, rng)?;
    let weights: Vec<f64> = table.iter().map(|event| event.probability).collect();

    let mut events = Vec::new();
    for _ in 0..slots {
        let meta = random::choose_weighted(&weights, table, rng)?;
        let changes = apply_effect(meta, &mut updated, species, capacity, rng)?;
        debug!(
            event_id = %meta.id,
            kind = meta.kind.as_str(),
            changes = changes.len(),
            "world event fired"
        );
        events.push(WorldEvent {
            id: meta.id.clone(),
            name: meta.name.clone(),
            description: meta.description.clone(),
            kind: meta.kind,
            changes,
        });
    }

    Ok(EventOutcome {
        inventory: updated,
        events,
    })
}

/// Apply one event's effect, returning the deltas it made.
///
/// # Errors
///
/// Returns [`ChoiceError`] only if a candidate draw fails, which cannot
/// happen for non-empty candidate lists.
pub fn apply_effect(
    meta: &EventMeta,
    inventory: &mut BTreeMap<String, u32>,
    species: &BTreeMap<String, SpeciesMeta>,
    capacity: u32,
    rng: &mut impl Rng,
) -> Result<Vec<SpeciesDelta>, ChoiceError> {
    match meta.kind {
        EventKind::Reduce => reduce(meta, inventory, rng),
        EventKind::Add => add(meta, inventory, species, capacity, rng),
        EventKind::Change => change(meta, inventory, species, rng),
        EventKind::Normal | EventKind::Unknown => Ok(Vec::new()),
    }
}

fn held_species(inventory: &BTreeMap<String, u32>) -> impl Iterator<Item = &String> {
    inventory
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(id, _)| id)
}

fn known_related<'a>(
    meta: &'a EventMeta,
    species: &BTreeMap<String, SpeciesMeta>,
) -> Vec<&'a String> {
    meta.relation
        .iter()
        .filter(|id| species.contains_key(id.as_str()))
        .collect()
}

fn reduce(
    meta: &EventMeta,
    inventory: &mut BTreeMap<String, u32>,
    rng: &mut impl Rng,
) -> Result<Vec<SpeciesDelta>, ChoiceError> {
    let candidates: Vec<String> = if meta.relation.is_empty() {
        held_species(inventory).cloned().collect()
    } else {
        held_species(inventory)
            .filter(|id| meta.relation.contains(*id))
            .cloned()
            .collect()
    };
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let victim = random::choose_uniform(&candidates, rng)?;
    if inventory::remove_individuals(inventory, victim, 1).is_err() {
        return Ok(Vec::new());
    }
    Ok(vec![SpeciesDelta {
        species_id: victim.clone(),
        change: -1,
    }])
}

fn add(
    meta: &EventMeta,
    inventory: &mut BTreeMap<String, u32>,
    species: &BTreeMap<String, SpeciesMeta>,
    capacity: u32,
    rng: &mut impl Rng,
) -> Result<Vec<SpeciesDelta>, ChoiceError> {
    let candidates = known_related(meta, species);
    if candidates.is_empty() || inventory::room_left(inventory, capacity) == 0 {
        return Ok(Vec::new());
    }
    let newcomer = *random::choose_uniform(&candidates, rng)?;
    if inventory::add_individuals(inventory, newcomer, 1).is_err() {
        return Ok(Vec::new());
    }
    Ok(vec![SpeciesDelta {
        species_id: newcomer.clone(),
        change: 1,
    }])
}

fn change(
    meta: &EventMeta,
    inventory: &mut BTreeMap<String, u32>,
    species: &BTreeMap<String, SpeciesMeta>,
    rng: &mut impl Rng,
) -> Result<Vec<SpeciesDelta>, ChoiceError> {
    let targets = known_related(meta, species);
    let sources: Vec<String> = held_species(inventory)
        .filter(|id| !meta.relation.contains(*id))
        .cloned()
        .collect();
    if targets.is_empty() || sources.is_empty() {
        return Ok(Vec::new());
    }
    let source = random::choose_uniform(&sources, rng)?;
    let target = *random::choose_uniform(&targets, rng)?;
    if inventory::remove_individuals(inventory, source, 1).is_err() {
        return Ok(Vec::new());
    }
    if inventory::add_individuals(inventory, target, 1).is_err() {
        // Put the source back so the population is unchanged.
        let _restored = inventory::add_individuals(inventory, source, 1);
        return Ok(Vec::new());
    }
    Ok(vec![
        SpeciesDelta {
            species_id: source.clone(),
            change: -1,
        },
        SpeciesDelta {
            species_id: target.clone(),
            change: 1,
        },
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use jellybox_types::Group;

    use super::*;

    fn event(id: &str, kind: EventKind, probability: f64, relation: &[&str]) -> EventMeta {
        EventMeta {
            id: id.to_owned(),
            name: format!("{id} event"),
            description: format!("{id} happened"),
            kind,
            probability,
            relation: relation.iter().map(|r| (*r).to_owned()).collect(),
        }
    }

    fn catalogue(ids: &[&str]) -> BTreeMap<String, SpeciesMeta> {
        ids.iter()
            .map(|id| {
                (
                    (*id).to_owned(),
                    SpeciesMeta {
                        id: (*id).to_owned(),
                        name: (*id).to_owned(),
                        group: Group::Normal,
                        description: String::new(),
                        reproductive_rate: 0.0,
                        draw_size: 1.0,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn empty_table_fires_nothing() {
        let mut rng = SmallRng::seed_from_u64(1);
        let inv = BTreeMap::from([("moon".to_owned(), 3)]);
        let outcome = apply_events(&[], 24, &inv, &catalogue(&["moon"]), 256, &mut rng).unwrap();
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.inventory, inv);
    }

    #[test]
    fn whole_expectation_fires_exact_count() {
        let mut rng = SmallRng::seed_from_u64(2);
        let table = [event("calm", EventKind::Normal, 0.5, &[])];
        let outcome =
            apply_events(&table, 4, &BTreeMap::new(), &BTreeMap::new(), 256, &mut rng).unwrap();
        assert_eq!(outcome.events.len(), 2);
        assert!(outcome.events.iter().all(|e| e.changes.is_empty()));
    }

    #[test]
    fn zero_probability_event_is_never_drawn() {
        let mut rng = SmallRng::seed_from_u64(3);
        let table = [
            event("never", EventKind::Normal, 0.0, &[]),
            event("always", EventKind::Normal, 1.0, &[]),
        ];
        let outcome =
            apply_events(&table, 10, &BTreeMap::new(), &BTreeMap::new(), 256, &mut rng).unwrap();
        assert_eq!(outcome.events.len(), 10);
        assert!(outcome.events.iter().all(|e| e.id == "always"));
    }

    #[test]
    fn negative_probability_is_rejected() {
        let mut rng = SmallRng::seed_from_u64(4);
        let table = [
            event("bad", EventKind::Normal, -2.0, &[]),
            event("good", EventKind::Normal, 3.0, &[]),
        ];
        let result = apply_events(&table, 1, &BTreeMap::new(), &BTreeMap::new(), 256, &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn reduce_targets_related_species() {
        let mut rng = SmallRng::seed_from_u64(5);
        let meta = event("storm", EventKind::Reduce, 1.0, &["moon"]);
        let mut inv = BTreeMap::from([("moon".to_owned(), 1), ("comb".to_owned(), 4)]);
        let changes = apply_effect(&meta, &mut inv, &catalogue(&[]), 256, &mut rng).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change, -1);
        assert!(!inv.contains_key("moon"));
        assert_eq!(inv.get("comb"), Some(&4));
    }

    #[test]
    fn reduce_on_empty_box_is_noop() {
        let mut rng = SmallRng::seed_from_u64(6);
        let meta = event("storm", EventKind::Reduce, 1.0, &[]);
        let mut inv = BTreeMap::new();
        let changes = apply_effect(&meta, &mut inv, &catalogue(&[]), 256, &mut rng).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn add_respects_capacity() {
        let mut rng = SmallRng::seed_from_u64(7);
        let meta = event("drift", EventKind::Add, 1.0, &["moon"]);
        let species = catalogue(&["moon"]);
        let mut inv = BTreeMap::from([("comb".to_owned(), 2)]);
        assert!(apply_effect(&meta, &mut inv, &species, 2, &mut rng)
            .unwrap()
            .is_empty());
        let changes = apply_effect(&meta, &mut inv, &species, 3, &mut rng).unwrap();
        assert_eq!(changes[0].species_id, "moon");
        assert_eq!(inv.get("moon"), Some(&1));
    }

    #[test]
    fn add_ignores_unknown_related_ids() {
        let mut rng = SmallRng::seed_from_u64(8);
        let meta = event("drift", EventKind::Add, 1.0, &["ghost"]);
        let mut inv = BTreeMap::new();
        let changes = apply_effect(&meta, &mut inv, &catalogue(&["moon"]), 256, &mut rng).unwrap();
        assert!(changes.is_empty());
        assert!(inv.is_empty());
    }

    #[test]
    fn change_preserves_population() {
        let mut rng = SmallRng::seed_from_u64(9);
        let meta = event("bloom", EventKind::Change, 1.0, &["crystal"]);
        let species = catalogue(&["crystal", "moon"]);
        let mut inv = BTreeMap::from([("moon".to_owned(), 1)]);
        let changes = apply_effect(&meta, &mut inv, &species, 256, &mut rng).unwrap();
        assert_eq!(changes.len(), 2);
        assert!(!inv.contains_key("moon"));
        assert_eq!(inv.get("crystal"), Some(&1));
        assert_eq!(inventory::population(&inv), 1);
    }

    #[test]
    fn unknown_kind_records_event_without_changes() {
        let mut rng = SmallRng::seed_from_u64(10);
        let table = [event("odd", EventKind::Unknown, 1.0, &["moon"])];
        let inv = BTreeMap::from([("moon".to_owned(), 2)]);
        let outcome = apply_events(&table, 1, &inv, &catalogue(&["moon"]), 256, &mut rng).unwrap();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.inventory, inv);
    }
}
