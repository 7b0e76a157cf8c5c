//! Catalogue file import.
//!
//! A catalogue file is JSON of the form
//! `{ "jellyfishes": [SpeciesMeta...], "events": [EventMeta...] }`.
//! Importing replaces the stored catalogue and removes species that are no
//! longer listed from every box.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use jellybox_types::{EventMeta, SpeciesMeta};

use crate::error::DbError;
use crate::meta_store::ReplaceSummary;
use crate::postgres::PostgresPool;

/// Parsed catalogue file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueFile {
    /// Species definitions.
    #[serde(default)]
    pub jellyfishes: Vec<SpeciesMeta>,
    /// World event definitions.
    #[serde(default)]
    pub events: Vec<EventMeta>,
}

impl CatalogueFile {
    /// Parse and validate catalogue JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] for malformed JSON or
    /// [`DbError::InvalidCatalogue`] if validation fails.
    pub fn parse(json: &str) -> Result<Self, DbError> {
        let file: Self = serde_json::from_str(json)?;
        file.validate()?;
        Ok(file)
    }

    /// Read, parse and validate the catalogue at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the file cannot be read, otherwise as
    /// [`CatalogueFile::parse`].
    pub async fn load(path: &Path) -> Result<Self, DbError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::parse(&json)
    }

    /// Check ids are present and unique and numbers are usable.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidCatalogue`] naming the first problem.
    pub fn validate(&self) -> Result<(), DbError> {
        let mut seen = BTreeSet::new();
        for meta in &self.jellyfishes {
            if meta.id.trim().is_empty() {
                return Err(DbError::InvalidCatalogue("species with empty id".to_owned()));
            }
            if !seen.insert(meta.id.as_str()) {
                return Err(DbError::InvalidCatalogue(format!(
                    "duplicate species id {}",
                    meta.id
                )));
            }
            if !meta.reproductive_rate.is_finite() || meta.reproductive_rate < 0.0 {
                return Err(DbError::InvalidCatalogue(format!(
                    "species {} has unusable reproductive_rate {}",
                    meta.id, meta.reproductive_rate
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for meta in &self.events {
            if meta.id.trim().is_empty() {
                return Err(DbError::InvalidCatalogue("event with empty id".to_owned()));
            }
            if !seen.insert(meta.id.as_str()) {
                return Err(DbError::InvalidCatalogue(format!(
                    "duplicate event id {}",
                    meta.id
                )));
            }
            if !meta.probability.is_finite() || meta.probability < 0.0 {
                return Err(DbError::InvalidCatalogue(format!(
                    "event {} has unusable probability {}",
                    meta.id, meta.probability
                )));
            }
        }
        Ok(())
    }
}

/// Import the catalogue at `path` into the database.
///
/// # Errors
///
/// Returns [`DbError`] if the file is unreadable or invalid, or if the
/// database transaction fails. The stored catalogue is untouched on error.
pub async fn import_catalogue(pool: &PostgresPool, path: &Path) -> Result<ReplaceSummary, DbError> {
    let file = CatalogueFile::load(path).await?;
    tracing::info!(
        path = %path.display(),
        species = file.jellyfishes.len(),
        events = file.events.len(),
        "importing catalogue"
    );
    pool.meta()
        .replace_catalogue(&file.jellyfishes, &file.events)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jellybox_types::{EventKind, Group};

    use super::*;

    const SAMPLE: &str = r#"{
        "jellyfishes": [
            {"id": "moon", "name": "Moon Jelly", "group": "normal",
             "description": "Common and calm", "reproductive_rate": 1.5, "draw_size": 1.0},
            {"id": "crown", "name": "Crown Jelly", "group": "perfect"}
        ],
        "events": [
            {"id": "storm", "name": "Storm", "description": "Waves crash",
             "type": "reduce", "probability": 0.01, "relation": ["moon"]},
            {"id": "calm", "name": "Calm", "description": "Still water",
             "type": "normal", "probability": 0.02}
        ]
    }"#;

    #[test]
    fn parses_sample_catalogue() {
        let file = CatalogueFile::parse(SAMPLE).unwrap();
        assert_eq!(file.jellyfishes.len(), 2);
        assert_eq!(file.jellyfishes[1].group, Group::Perfect);
        assert!((file.jellyfishes[1].draw_size - 1.0).abs() < f64::EPSILON);
        assert_eq!(file.events[0].kind, EventKind::Reduce);
        assert!(file.events[1].relation.is_empty());
    }

    #[test]
    fn rejects_duplicate_species() {
        let json = r#"{"jellyfishes": [
            {"id": "moon", "name": "A", "group": "normal"},
            {"id": "moon", "name": "B", "group": "good"}
        ]}"#;
        assert!(matches!(
            CatalogueFile::parse(json),
            Err(DbError::InvalidCatalogue(_))
        ));
    }

    #[test]
    fn rejects_negative_probability() {
        let json = r#"{"events": [
            {"id": "x", "name": "X", "description": "", "type": "add", "probability": -0.5}
        ]}"#;
        assert!(matches!(
            CatalogueFile::parse(json),
            Err(DbError::InvalidCatalogue(_))
        ));
    }

    #[test]
    fn rejects_unknown_group() {
        let json = r#"{"jellyfishes": [{"id": "m", "name": "M", "group": "legendary"}]}"#;
        assert!(matches!(
            CatalogueFile::parse(json),
            Err(DbError::Serialization(_))
        ));
    }

    #[test]
    fn bundled_catalogue_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("data")
            .join("jellyfish.json");
        if path.exists() {
            let json = std::fs::read_to_string(&path).unwrap();
            assert!(CatalogueFile::parse(&json).is_ok());
        }
    }
}
