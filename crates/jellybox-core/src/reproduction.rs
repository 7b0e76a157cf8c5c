//! Per-species stochastic population growth.
//!
//! Each species grows by an expected amount proportional to its count, its
//! monthly reproductive rate and the number of ticks being settled. Above
//! a density threshold the growth is divided by the total population, so
//! crowded boxes grow slowly. The whole part of the expectation always
//! happens; the fractional part happens with matching probability.

use std::collections::BTreeMap;

use rand::Rng;

use jellybox_types::{ReproductionEvent, SpeciesMeta};

use crate::config::ReproductionConfig;
use crate::inventory;
use crate::random::{self, ChoiceError};

/// Updated inventory and the growth that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReproductionOutcome {
    /// Inventory after growth.
    pub inventory: BTreeMap<String, u32>,
    /// One event per species that gained at least one individual, in
    /// species id order.
    pub events: Vec<ReproductionEvent>,
}

/// Expected new individuals for one species over `ticks`.
///
/// `rate` is the expected fraction of the population added per month.
pub fn expected_growth(
    rate: f64,
    count: u32,
    ticks: u32,
    total_population: u32,
    config: &ReproductionConfig,
) -> f64 {
    let expected =
        rate * f64::from(count) * f64::from(ticks) / f64::from(config.month_hours.max(1));
    if total_population > config.density_threshold {
        expected / f64::from(total_population)
    } else {
        expected
    }
}

/// Grow every species in `inventory` over `ticks`.
///
/// `total_population` is the population before growth and is used for the
/// density rule. Species without metadata or with a non-positive rate are
/// skipped. Growth never takes the box above `capacity`.
///
/// # Errors
///
/// Returns [`ChoiceError`] if a species' expected growth is not a usable
/// number (for example a non-finite rate).
pub fn apply_reproduction(
    inventory: &BTreeMap<String, u32>,
    species: &BTreeMap<String, SpeciesMeta>,
    ticks: u32,
    total_population: u32,
    capacity: u32,
    config: &ReproductionConfig,
    rng: &mut impl Rng,
) -> Result<ReproductionOutcome, ChoiceError> {
    let mut updated = inventory.clone();
    let mut events = Vec::new();
    if ticks == 0 {
        return Ok(ReproductionOutcome {
            inventory: updated,
            events,
        });
    }

    for (species_id, count) in inventory {
        let Some(meta) = species.get(species_id) else {
            continue;
        };
        if meta.reproductive_rate <= 0.0 || *count == 0 {
            continue;
        }

        let expected = expected_growth(
            meta.reproductive_rate,
            *count,
            ticks,
            total_population,
            config,
        );
        let born = random::realise_expected(expected, rng)?;
        let room = inventory::room_left(&updated, capacity);
        let added = born.min(room);
        if added == 0 {
            continue;
        }

        let entry = updated.entry(species_id.clone()).or_insert(0);
        *entry = entry.saturating_add(added);
        events.push(ReproductionEvent {
            species_id: species_id.clone(),
            name: meta.name.clone(),
            count: added,
            description: format!("{added} new {} joined the box", meta.name),
        });
    }

    Ok(ReproductionOutcome {
        inventory: updated,
        events,
    })
}
