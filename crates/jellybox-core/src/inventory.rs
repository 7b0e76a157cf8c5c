//! Inventory operations on a box's species counts.
//!
//! Inventories map species id to a count. A species with count zero is
//! never stored: every removal that reaches zero deletes the entry.

use std::collections::BTreeMap;

pub use jellybox_types::structs::{inventory_count as count_of, inventory_population as population};

use crate::error::InventoryError;

/// How many more individuals fit under `capacity`.
pub fn room_left(inventory: &BTreeMap<String, u32>, capacity: u32) -> u32 {
    capacity.saturating_sub(population(inventory))
}

/// Add `amount` individuals of `species_id`.
///
/// Adding zero is a no-op and creates no entry.
///
/// # Errors
///
/// Returns [`InventoryError::Overflow`] if the species count would
/// overflow `u32`.
pub fn add_individuals(
    inventory: &mut BTreeMap<String, u32>,
    species_id: &str,
    amount: u32,
) -> Result<(), InventoryError> {
    if amount == 0 {
        return Ok(());
    }
    let current = count_of(inventory, species_id);
    let updated = current
        .checked_add(amount)
        .ok_or_else(|| InventoryError::Overflow {
            species_id: species_id.to_owned(),
            attempted: amount,
        })?;
    inventory.insert(species_id.to_owned(), updated);
    Ok(())
}

/// Remove `amount` individuals of `species_id`.
///
/// Removes the key entirely if the count reaches zero.
///
/// # Errors
///
/// Returns [`InventoryError::Insufficient`] if fewer than `amount` are held.
pub fn remove_individuals(
    inventory: &mut BTreeMap<String, u32>,
    species_id: &str,
    amount: u32,
) -> Result<(), InventoryError> {
    let held = count_of(inventory, species_id);
    let remaining = held
        .checked_sub(amount)
        .ok_or_else(|| InventoryError::Insufficient {
            species_id: species_id.to_owned(),
            requested: amount,
            held,
        })?;
    if remaining == 0 {
        inventory.remove(species_id);
    } else {
        inventory.insert(species_id.to_owned(), remaining);
    }
    Ok(())
}

/// Drop entries whose count is zero.
pub fn prune_empty(inventory: &mut BTreeMap<String, u32>) {
    inventory.retain(|_, count| *count > 0);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> BTreeMap<String, u32> {
        BTreeMap::from([("moon".to_owned(), 3), ("comb".to_owned(), 5)])
    }

    #[test]
    fn population_sums_counts() {
        assert_eq!(population(&sample()), 8);
        assert_eq!(population(&BTreeMap::new()), 0);
    }

    #[test]
    fn population_saturates() {
        let inv = BTreeMap::from([("a".to_owned(), u32::MAX), ("b".to_owned(), 1)]);
        assert_eq!(population(&inv), u32::MAX);
    }

    #[test]
    fn room_left_never_underflows() {
        assert_eq!(room_left(&sample(), 10), 2);
        assert_eq!(room_left(&sample(), 4), 0);
    }

    #[test]
    fn add_creates_and_increments() {
        let mut inv = sample();
        add_individuals(&mut inv, "moon", 2).unwrap();
        add_individuals(&mut inv, "crystal", 1).unwrap();
        assert_eq!(count_of(&inv, "moon"), 5);
        assert_eq!(count_of(&inv, "crystal"), 1);
    }

    #[test]
    fn add_zero_creates_nothing() {
        let mut inv = sample();
        add_individuals(&mut inv, "crystal", 0).unwrap();
        assert!(!inv.contains_key("crystal"));
    }

    #[test]
    fn add_overflow_is_an_error() {
        let mut inv = BTreeMap::from([("moon".to_owned(), u32::MAX)]);
        let result = add_individuals(&mut inv, "moon", 1);
        assert!(matches!(result, Err(InventoryError::Overflow { .. })));
        assert_eq!(count_of(&inv, "moon"), u32::MAX);
    }

    #[test]
    fn remove_to_zero_deletes_entry() {
        let mut inv = sample();
        remove_individuals(&mut inv, "moon", 3).unwrap();
        assert!(!inv.contains_key("moon"));
    }

    #[test]
    fn remove_more_than_held_fails_unchanged() {
        let mut inv = sample();
        let result = remove_individuals(&mut inv, "moon", 4);
        assert_eq!(
            result,
            Err(InventoryError::Insufficient {
                species_id: "moon".to_owned(),
                requested: 4,
                held: 3,
            })
        );
        assert_eq!(count_of(&inv, "moon"), 3);
    }

    #[test]
    fn prune_drops_zero_counts() {
        let mut inv = sample();
        inv.insert("ghost".to_owned(), 0);
        prune_empty(&mut inv);
        assert_eq!(inv.len(), 2);
    }
}
