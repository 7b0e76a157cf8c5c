//! Shared type definitions for the jellyfish box simulation.
//!
//! This crate is the single source of truth for the records exchanged
//! between the simulation core, the storage layer and the chat-bot
//! presentation layer. Types flow to `TypeScript` via `ts-rs` so the bot's
//! renderer can consume reports without hand-written interfaces.
//!
//! # Modules
//!
//! - [`ids`] -- Box storage ids and the `(user, platform)` identity key
//! - [`enums`] -- Rarity groups, event kinds, persisted field selectors
//! - [`structs`] -- The box record and species/event metadata
//! - [`events`] -- Reproduction and world events produced by settlements
//! - [`reports`] -- Operation results handed to the presentation layer

pub mod enums;
pub mod events;
pub mod ids;
pub mod reports;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{BoxField, EventKind, Group};
pub use events::{BoxEvent, ReproductionEvent, SpeciesDelta, WorldEvent};
pub use ids::{BoxId, BoxKey};
pub use reports::{
    BoxReport, BoxStatistics, CatalogueEntry, CatchReport, CaughtSpecies, ReleaseReport,
    ReleasedEntry, StatisticsEntry, StatisticsReport,
};
pub use structs::{
    DEFAULT_STYLE, EventMeta, JellyfishBox, SpeciesMeta, inventory_count, inventory_population,
};

#[cfg(test)]
mod tests {
    //! Binding generation for the presentation layer.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to `bindings/` relative to the crate root
        // when the export is triggered.
        use ts_rs::TS;

        let _ = crate::ids::BoxId::export_all();
        let _ = crate::ids::BoxKey::export_all();
        let _ = crate::enums::Group::export_all();
        let _ = crate::enums::EventKind::export_all();
        let _ = crate::structs::JellyfishBox::export_all();
        let _ = crate::structs::SpeciesMeta::export_all();
        let _ = crate::structs::EventMeta::export_all();
        let _ = crate::events::BoxEvent::export_all();
        let _ = crate::reports::BoxReport::export_all();
        let _ = crate::reports::CatchReport::export_all();
        let _ = crate::reports::ReleaseReport::export_all();
        let _ = crate::reports::StatisticsReport::export_all();
        let _ = crate::reports::CatalogueEntry::export_all();
    }
}
