//! Core records: the per-user box and the static species/event metadata.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EventKind, Group};
use crate::ids::{BoxId, BoxKey};

/// Style tag assigned to freshly created boxes.
pub const DEFAULT_STYLE: &str = "normal";

// ---------------------------------------------------------------------------
// JellyfishBox
// ---------------------------------------------------------------------------

/// A user's persistent jellyfish collection.
///
/// `inventory` never holds a zero count: every mutation in the simulation
/// prunes emptied entries. `last_refresh_time` always sits on the top of
/// an hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct JellyfishBox {
    /// Storage identifier.
    pub id: BoxId,
    /// Owning chat user.
    pub user_id: String,
    /// Chat platform of the owner.
    pub platform: String,
    /// When the owner last caught jellyfish.
    pub last_catch_time: DateTime<Utc>,
    /// When the box was last settled, truncated to the hour.
    pub last_refresh_time: DateTime<Utc>,
    /// Species id to number of individuals held.
    pub inventory: BTreeMap<String, u32>,
    /// Decoration ids placed in the box.
    pub decorations: BTreeSet<String>,
    /// Salinity in parts per thousand. Not yet used by the simulation.
    pub salinity: f64,
    /// Water temperature in degrees Celsius. Not yet used by the simulation.
    pub temperature: f64,
    /// Presentation style tag.
    pub style: String,
}

impl JellyfishBox {
    /// Create an empty box for `key` with the given timestamps.
    pub fn new(
        key: &BoxKey,
        last_catch_time: DateTime<Utc>,
        last_refresh_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BoxId::new(),
            user_id: key.user_id.clone(),
            platform: key.platform.clone(),
            last_catch_time,
            last_refresh_time,
            inventory: BTreeMap::new(),
            decorations: BTreeSet::new(),
            salinity: 0.0,
            temperature: 0.0,
            style: DEFAULT_STYLE.to_owned(),
        }
    }

    /// The identity key of this box.
    pub fn key(&self) -> BoxKey {
        BoxKey::new(self.user_id.clone(), self.platform.clone())
    }

    /// Total number of individuals held, saturating at `u32::MAX`.
    pub fn population(&self) -> u32 {
        inventory_population(&self.inventory)
    }

    /// Number of individuals of `species_id` held.
    pub fn count_of(&self, species_id: &str) -> u32 {
        inventory_count(&self.inventory, species_id)
    }
}

/// Total individuals in a species-count map, saturating at `u32::MAX`.
pub fn inventory_population(inventory: &BTreeMap<String, u32>) -> u32 {
    inventory
        .values()
        .fold(0_u32, |total, count| total.saturating_add(*count))
}

/// Individuals of `species_id` in a species-count map.
pub fn inventory_count(inventory: &BTreeMap<String, u32>, species_id: &str) -> u32 {
    inventory.get(species_id).copied().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Static description of a jellyfish species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpeciesMeta {
    /// Stable species identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Rarity tier.
    pub group: Group,
    /// Flavour text.
    #[serde(default)]
    pub description: String,
    /// Expected growth fraction per 30-day month. Zero disables breeding.
    #[serde(default)]
    pub reproductive_rate: f64,
    /// Sprite scale used by renderers.
    #[serde(default = "default_draw_size")]
    pub draw_size: f64,
}

const fn default_draw_size() -> f64 {
    1.0
}

/// Static description of a world event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventMeta {
    /// Stable event identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Narrative shown when the event fires.
    pub description: String,
    /// Effect taxonomy.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Expected occurrences per tick.
    pub probability: f64,
    /// Species or decoration ids the effect applies to.
    #[serde(default)]
    pub relation: Vec<String>,
}
