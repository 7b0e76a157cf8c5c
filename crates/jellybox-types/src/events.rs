//! Events produced by a settlement.
//!
//! A settlement yields reproduction events first, then world events. Both
//! are collected into [`BoxEvent`] so the presentation layer can render a
//! single ordered feed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::EventKind;

/// New individuals born to one species during a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReproductionEvent {
    /// The species that grew.
    pub species_id: String,
    /// Display name of the species.
    pub name: String,
    /// Number of individuals added.
    pub count: u32,
    /// Human-readable summary.
    pub description: String,
}

/// A signed change to one species' count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpeciesDelta {
    /// The affected species.
    pub species_id: String,
    /// Individuals added (positive) or removed (negative).
    pub change: i32,
}

/// A world event that fired during a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldEvent {
    /// Event metadata id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Narrative text.
    pub description: String,
    /// Effect taxonomy of the event.
    pub kind: EventKind,
    /// Inventory changes the effect applied. Empty for narrative events.
    pub changes: Vec<SpeciesDelta>,
}

/// Any event a settlement can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BoxEvent {
    /// Population growth of one species.
    Reproduction(ReproductionEvent),
    /// A world event drawn from the event table.
    World(WorldEvent),
}
