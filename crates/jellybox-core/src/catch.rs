//! Catching new jellyfish.
//!
//! A catch draws a rarity group by weight, then a species uniformly within
//! the group, then adds a population-scaled quantity of it. Sparse boxes
//! catch more per attempt than crowded ones.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use jellybox_types::{CaughtSpecies, Group, JellyfishBox, SpeciesMeta};

use crate::clock::SECONDS_PER_TICK;
use crate::config::{CatchConfig, RarityWeights};
use crate::error::CatchError;
use crate::inventory;
use crate::random;

/// Refuse the catch if the previous one was less than the cooldown ago.
///
/// The privileged account is never on cooldown.
///
/// # Errors
///
/// Returns [`CatchError::CooldownActive`] with the seconds left to wait.
pub fn check_cooldown(
    record: &JellyfishBox,
    now: DateTime<Utc>,
    privileged: bool,
    config: &CatchConfig,
) -> Result<(), CatchError> {
    if privileged {
        return Ok(());
    }
    let cooldown = i64::from(config.cooldown_hours).saturating_mul(SECONDS_PER_TICK);
    let elapsed = now
        .signed_duration_since(record.last_catch_time)
        .num_seconds();
    if elapsed >= cooldown {
        return Ok(());
    }
    Err(CatchError::CooldownActive {
        remaining_seconds: cooldown.saturating_sub(elapsed),
    })
}

/// How many individuals one catch yields for a box of `population`.
pub fn catch_quantity(population: u32, rng: &mut impl Rng) -> u32 {
    match population {
        0 => rng.random_range(4..=6),
        1..10 => rng.random_range(3..=4),
        10..20 => rng.random_range(2..=3),
        20..50 => rng.random_range(1..=2),
        _ => 1,
    }
}

/// Group weights for a draw over `species`.
///
/// Groups without any species get weight zero so the draw never lands on
/// an empty group.
pub fn group_weights(weights: &RarityWeights, species: &[SpeciesMeta]) -> [f64; 5] {
    Group::ALL.map(|group| {
        if species.iter().any(|s| s.group == group) {
            weights.weight(group)
        } else {
            0.0
        }
    })
}

/// Catch into an already settled box.
///
/// The cooldown is checked separately by [`check_cooldown`] before
/// settlement. Sets `last_catch_time` to `now`.
///
/// # Errors
///
/// Returns [`CatchError::BoxFull`] if the box is at capacity, or
/// [`CatchError::EmptyCatalogue`] if no group with a positive weight has
/// any species.
pub fn catch(
    settled: &JellyfishBox,
    species: &[SpeciesMeta],
    now: DateTime<Utc>,
    capacity: u32,
    config: &CatchConfig,
    rng: &mut impl Rng,
) -> Result<(JellyfishBox, CaughtSpecies), CatchError> {
    let population = settled.population();
    if population >= capacity {
        return Err(CatchError::BoxFull {
            population,
            capacity,
        });
    }

    let weights = group_weights(&config.weights_at(now), species);
    if weights.iter().all(|w| *w <= 0.0) {
        return Err(CatchError::EmptyCatalogue);
    }
    let group = *random::choose_weighted(&weights, &Group::ALL, rng)?;
    let members: Vec<&SpeciesMeta> = species.iter().filter(|s| s.group == group).collect();
    let chosen = *random::choose_uniform(&members, rng)?;

    let quantity = catch_quantity(population, rng).min(capacity.saturating_sub(population));
    let mut updated = settled.clone();
    // Quantity is bounded by the remaining capacity, so this cannot overflow.
    let entry = updated.inventory.entry(chosen.id.clone()).or_insert(0);
    *entry = entry.saturating_add(quantity);
    inventory::prune_empty(&mut updated.inventory);
    updated.last_catch_time = now;

    debug!(
        user_id = %settled.user_id,
        species_id = %chosen.id,
        group = %group,
        quantity,
        "jellyfish caught"
    );

    Ok((
        updated,
        CaughtSpecies {
            species_id: chosen.id.clone(),
            name: chosen.name.clone(),
            group,
            count: quantity,
        },
    ))
}
