//! Presentation-facing results of box operations.
//!
//! Every report carries the settled (and, where relevant, updated) box plus
//! the events the settlement produced, so a renderer never has to reload
//! state to draw a reply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Group;
use crate::events::BoxEvent;
use crate::structs::JellyfishBox;

/// Result of opening (querying) a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BoxReport {
    /// The settled box.
    pub record: JellyfishBox,
    /// Events produced by the settlement, reproduction first.
    pub events: Vec<BoxEvent>,
}

/// The species and quantity a catch added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CaughtSpecies {
    /// The species caught.
    pub species_id: String,
    /// Display name of the species.
    pub name: String,
    /// Rarity tier of the species.
    pub group: Group,
    /// Individuals added.
    pub count: u32,
}

/// Result of a successful catch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CatchReport {
    /// The box after settlement and catch.
    pub record: JellyfishBox,
    /// Events produced by the settlement that preceded the catch.
    pub events: Vec<BoxEvent>,
    /// What the catch added.
    pub added: CaughtSpecies,
}

/// One species removed by a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReleasedEntry {
    /// The species released.
    pub species_id: String,
    /// Display name, or the id when the species has no metadata.
    pub name: String,
    /// Individuals removed.
    pub quantity: u32,
}

/// Result of a successful release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReleaseReport {
    /// The box after settlement and release.
    pub record: JellyfishBox,
    /// Events produced by the settlement that preceded the release.
    pub events: Vec<BoxEvent>,
    /// Species removed, in species id order.
    pub released: Vec<ReleasedEntry>,
}

/// One row of a box statistics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatisticsEntry {
    /// The species counted.
    pub species_id: String,
    /// Display name, or the id when the species has no metadata.
    pub name: String,
    /// Rarity tier.
    pub group: Group,
    /// Individuals held.
    pub count: u32,
}

/// Per-group and per-species counts of one box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BoxStatistics {
    /// Total individuals held.
    pub population: u32,
    /// Maximum individuals the box can hold.
    pub capacity: u32,
    /// Individuals held per rarity group (groups with none are omitted).
    pub groups: BTreeMap<Group, u32>,
    /// Species rows ordered by group priority, then species id.
    pub entries: Vec<StatisticsEntry>,
}

/// Result of the statistics operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatisticsReport {
    /// The computed table.
    pub statistics: BoxStatistics,
    /// Events produced by the settlement that preceded the query.
    pub events: Vec<BoxEvent>,
}

/// One species in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CatalogueEntry {
    /// Species id.
    pub species_id: String,
    /// Display name.
    pub name: String,
    /// Rarity tier.
    pub group: Group,
    /// Flavour text.
    pub description: String,
    /// Individuals held by the requesting box (0 without a box).
    pub owned: u32,
}
