//! Releasing jellyfish from a box.
//!
//! A release command names species (by id or display name) or whole rarity
//! groups, each with a quantity. Every request is validated against the
//! box before anything changes; a single problem vetoes the whole command
//! and all problems are reported together.

use std::collections::BTreeMap;

use jellybox_types::{Group, JellyfishBox, ReleasedEntry, SpeciesMeta};

use crate::error::{ReleaseError, ReleaseRejected};
use crate::inventory;

/// How many individuals a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quantity {
    /// A positive count.
    Count(u32),
    /// Every individual held.
    All,
    /// A token that looked like a quantity but is not usable.
    Invalid(String),
}

impl Quantity {
    /// Interpret a raw token, returning `None` if it is not a quantity at
    /// all (and so names the next species).
    pub fn from_token(token: &str, all_synonyms: &[String]) -> Option<Self> {
        if all_synonyms
            .iter()
            .any(|synonym| synonym.eq_ignore_ascii_case(token))
        {
            return Some(Self::All);
        }
        let numeric = token.parse::<f64>().is_ok_and(f64::is_finite);
        if !numeric {
            return None;
        }
        match token.parse::<u32>() {
            Ok(count) if count > 0 => Some(Self::Count(count)),
            _ => Some(Self::Invalid(token.to_owned())),
        }
    }
}

/// One `name quantity` pair of a release command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Species id, species display name or group tag.
    pub name: String,
    /// Requested quantity.
    pub quantity: Quantity,
}

impl ReleaseRequest {
    /// Request `quantity` of `name`.
    pub fn new(name: impl Into<String>, quantity: Quantity) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// Pair raw command tokens into requests.
///
/// A token following a name is taken as that name's quantity if it is a
/// number or an "all" synonym; otherwise the quantity defaults to one and
/// the token starts the next request.
pub fn parse_release_tokens<S: AsRef<str>>(
    tokens: &[S],
    all_synonyms: &[String],
) -> Vec<ReleaseRequest> {
    let mut requests = Vec::new();
    let mut iter = tokens
        .iter()
        .map(AsRef::as_ref)
        .filter(|t| !t.trim().is_empty())
        .peekable();
    while let Some(name) = iter.next() {
        let quantity = iter
            .peek()
            .and_then(|next| Quantity::from_token(next.trim(), all_synonyms));
        if quantity.is_some() {
            iter.next();
        }
        requests.push(ReleaseRequest::new(
            name.trim(),
            quantity.unwrap_or(Quantity::Count(1)),
        ));
    }
    requests
}

/// The group a held species belongs to. Species without metadata count
/// as [`Group::Normal`].
pub fn group_of(species_id: &str, species: &BTreeMap<String, SpeciesMeta>) -> Group {
    species
        .get(species_id)
        .map_or(Group::Normal, |meta| meta.group)
}

fn display_name(species_id: &str, species: &BTreeMap<String, SpeciesMeta>) -> String {
    species
        .get(species_id)
        .map_or_else(|| species_id.to_owned(), |meta| meta.name.clone())
}

fn resolve_species(
    name: &str,
    record: &JellyfishBox,
    species: &BTreeMap<String, SpeciesMeta>,
) -> Option<String> {
    if species.contains_key(name) || record.inventory.contains_key(name) {
        return Some(name.to_owned());
    }
    species
        .values()
        .find(|meta| meta.name == name)
        .map(|meta| meta.id.clone())
}

/// Planned removals, in the order species were first requested.
#[derive(Debug, Default)]
struct Plan {
    order: Vec<String>,
    amounts: BTreeMap<String, u32>,
}

impl Plan {
    fn set(&mut self, species_id: &str, amount: u32) -> u32 {
        if !self.amounts.contains_key(species_id) {
            self.order.push(species_id.to_owned());
        }
        self.amounts.insert(species_id.to_owned(), amount);
        amount
    }

    fn add(&mut self, species_id: &str, amount: u32) -> u32 {
        let total = self
            .amounts
            .get(species_id)
            .copied()
            .unwrap_or(0)
            .saturating_add(amount);
        self.set(species_id, total)
    }
}

/// Validate and apply `requests` to `record`.
///
/// On success returns the updated box, with emptied species pruned, and
/// what was released in request order.
///
/// # Errors
///
/// Returns [`ReleaseRejected`] listing every problem if any request is
/// invalid. The box is not modified in that case.
pub fn release(
    record: &JellyfishBox,
    requests: &[ReleaseRequest],
    species: &BTreeMap<String, SpeciesMeta>,
) -> Result<(JellyfishBox, Vec<ReleasedEntry>), ReleaseRejected> {
    if requests.is_empty() {
        return Err(ReleaseRejected {
            errors: vec![ReleaseError::NothingRequested],
        });
    }

    let mut plan = Plan::default();
    let mut errors = Vec::new();
    for request in requests {
        if let Some(group) = Group::from_tag(&request.name) {
            plan_group(record, request, group, species, &mut plan, &mut errors);
        } else {
            plan_species(record, request, species, &mut plan, &mut errors);
        }
    }
    if !errors.is_empty() {
        return Err(ReleaseRejected { errors });
    }

    let mut updated = record.clone();
    let mut released = Vec::with_capacity(plan.order.len());
    for species_id in &plan.order {
        let amount = plan.amounts.get(species_id).copied().unwrap_or(0);
        if amount == 0 {
            continue;
        }
        if inventory::remove_individuals(&mut updated.inventory, species_id, amount).is_err() {
            return Err(ReleaseRejected {
                errors: vec![ReleaseError::InsufficientQuantity {
                    name: display_name(species_id, species),
                    requested: amount,
                    held: record.count_of(species_id),
                }],
            });
        }
        released.push(ReleasedEntry {
            species_id: species_id.clone(),
            name: display_name(species_id, species),
            quantity: amount,
        });
    }
    inventory::prune_empty(&mut updated.inventory);
    Ok((updated, released))
}

fn plan_group(
    record: &JellyfishBox,
    request: &ReleaseRequest,
    group: Group,
    species: &BTreeMap<String, SpeciesMeta>,
    plan: &mut Plan,
    errors: &mut Vec<ReleaseError>,
) {
    if request.quantity != Quantity::All {
        errors.push(ReleaseError::InvalidGroupQuantity { group });
        return;
    }
    let members: Vec<(&String, u32)> = record
        .inventory
        .iter()
        .filter(|(id, count)| **count > 0 && group_of(id, species) == group)
        .map(|(id, count)| (id, *count))
        .collect();
    if members.is_empty() {
        errors.push(ReleaseError::GroupNotInBox { group });
        return;
    }
    for (species_id, held) in members {
        plan.set(species_id, held);
    }
}

fn plan_species(
    record: &JellyfishBox,
    request: &ReleaseRequest,
    species: &BTreeMap<String, SpeciesMeta>,
    plan: &mut Plan,
    errors: &mut Vec<ReleaseError>,
) {
    let Some(species_id) = resolve_species(&request.name, record, species) else {
        errors.push(ReleaseError::UnknownSpecies {
            name: request.name.clone(),
        });
        return;
    };
    let name = display_name(&species_id, species);
    let held = record.count_of(&species_id);
    if held == 0 {
        errors.push(ReleaseError::NotInBox { name });
        return;
    }
    let planned = match &request.quantity {
        Quantity::All => plan.set(&species_id, held),
        Quantity::Count(count) => plan.add(&species_id, *count),
        Quantity::Invalid(raw) => {
            errors.push(ReleaseError::InvalidQuantity {
                name,
                raw: raw.clone(),
            });
            return;
        }
    };
    if planned > held {
        errors.push(ReleaseError::InsufficientQuantity {
            name,
            requested: planned,
            held,
        });
    }
}
