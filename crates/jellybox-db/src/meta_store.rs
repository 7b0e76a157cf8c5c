//! Persistence for the species and event catalogue.
//!
//! The catalogue is replaced wholesale on import. Replacement, and the
//! pruning of species that disappeared from it, happen in one transaction.

use std::collections::BTreeSet;

use sqlx::PgPool;

use jellybox_types::{EventKind, EventMeta, Group, SpeciesMeta};

use crate::box_store;
use crate::error::DbError;

/// Row counts written by [`MetaStore::replace_catalogue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceSummary {
    /// Species rows written.
    pub species: usize,
    /// Event rows written.
    pub events: usize,
    /// Boxes that lost species no longer in the catalogue.
    pub pruned_boxes: u64,
}

/// Operations on the `jellyfish_species` and `jellyfish_events` tables.
pub struct MetaStore<'a> {
    pool: &'a PgPool,
}

impl<'a> MetaStore<'a> {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Species metadata, restricted to `ids` when given, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::InvalidCatalogue`] if a stored group is unknown.
    pub async fn list_species(
        &self,
        ids: Option<&BTreeSet<String>>,
    ) -> Result<Vec<SpeciesMeta>, DbError> {
        let rows = match ids {
            Some(ids) => {
                let ids: Vec<String> = ids.iter().cloned().collect();
                sqlx::query_as::<_, SpeciesRow>(
                    r"SELECT id, name, species_group, description, reproductive_rate, draw_size
                      FROM jellyfish_species
                      WHERE id = ANY($1)
                      ORDER BY id",
                )
                .bind(ids)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SpeciesRow>(
                    r"SELECT id, name, species_group, description, reproductive_rate, draw_size
                      FROM jellyfish_species
                      ORDER BY id",
                )
                .fetch_all(self.pool)
                .await?
            }
        };
        rows.into_iter().map(SpeciesRow::into_meta).collect()
    }

    /// The event table, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Serialization`] if a relation column does not decode.
    pub async fn list_events(&self) -> Result<Vec<EventMeta>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT id, name, description, event_type, probability, relation
              FROM jellyfish_events
              ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(EventRow::into_meta).collect()
    }

    /// Replace both catalogue tables and prune box inventories of species
    /// that no longer exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any statement fails; nothing is changed in
    /// that case.
    pub async fn replace_catalogue(
        &self,
        species: &[SpeciesMeta],
        events: &[EventMeta],
    ) -> Result<ReplaceSummary, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM jellyfish_species")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM jellyfish_events")
            .execute(&mut *tx)
            .await?;

        let len = species.len();
        let mut ids = Vec::with_capacity(len);
        let mut names = Vec::with_capacity(len);
        let mut groups = Vec::with_capacity(len);
        let mut descriptions = Vec::with_capacity(len);
        let mut rates = Vec::with_capacity(len);
        let mut sizes = Vec::with_capacity(len);
        for meta in species {
            ids.push(meta.id.clone());
            names.push(meta.name.clone());
            groups.push(meta.group.as_str().to_owned());
            descriptions.push(meta.description.clone());
            rates.push(meta.reproductive_rate);
            sizes.push(meta.draw_size);
        }
        sqlx::query(
            r"INSERT INTO jellyfish_species
              (id, name, species_group, description, reproductive_rate, draw_size)
              SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[], $4::TEXT[], $5::FLOAT8[], $6::FLOAT8[])",
        )
        .bind(&ids)
        .bind(&names)
        .bind(&groups)
        .bind(&descriptions)
        .bind(&rates)
        .bind(&sizes)
        .execute(&mut *tx)
        .await?;

        let len = events.len();
        let mut event_ids = Vec::with_capacity(len);
        let mut event_names = Vec::with_capacity(len);
        let mut event_descriptions = Vec::with_capacity(len);
        let mut kinds = Vec::with_capacity(len);
        let mut probabilities = Vec::with_capacity(len);
        let mut relations = Vec::with_capacity(len);
        for meta in events {
            event_ids.push(meta.id.clone());
            event_names.push(meta.name.clone());
            event_descriptions.push(meta.description.clone());
            kinds.push(meta.kind.as_str().to_owned());
            probabilities.push(meta.probability);
            relations.push(serde_json::to_value(&meta.relation)?);
        }
        sqlx::query(
            r"INSERT INTO jellyfish_events
              (id, name, description, event_type, probability, relation)
              SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[], $4::TEXT[], $5::FLOAT8[], $6::JSONB[])",
        )
        .bind(&event_ids)
        .bind(&event_names)
        .bind(&event_descriptions)
        .bind(&kinds)
        .bind(&probabilities)
        .bind(&relations)
        .execute(&mut *tx)
        .await?;

        let pruned_boxes = box_store::prune_unknown_species(&mut tx, &ids).await?;
        tx.commit().await?;

        tracing::info!(
            species = species.len(),
            events = events.len(),
            pruned_boxes,
            "catalogue replaced"
        );
        Ok(ReplaceSummary {
            species: species.len(),
            events: events.len(),
            pruned_boxes,
        })
    }
}

/// A row from the `jellyfish_species` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpeciesRow {
    /// Species id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Rarity group tag.
    pub species_group: String,
    /// Flavour text.
    pub description: String,
    /// Monthly growth fraction.
    pub reproductive_rate: f64,
    /// Sprite scale.
    pub draw_size: f64,
}

impl SpeciesRow {
    /// Convert into catalogue metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidCatalogue`] if the group tag is unknown.
    pub fn into_meta(self) -> Result<SpeciesMeta, DbError> {
        let group = Group::from_tag(&self.species_group).ok_or_else(|| {
            DbError::InvalidCatalogue(format!(
                "species {} has unknown group {}",
                self.id, self.species_group
            ))
        })?;
        Ok(SpeciesMeta {
            id: self.id,
            name: self.name,
            group,
            description: self.description,
            reproductive_rate: self.reproductive_rate,
            draw_size: self.draw_size,
        })
    }
}

/// A row from the `jellyfish_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Event id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Narrative text.
    pub description: String,
    /// Effect type tag. Unknown tags load as narrative-only events.
    pub event_type: String,
    /// Expected occurrences per tick.
    pub probability: f64,
    /// Related ids, as a JSON array.
    pub relation: serde_json::Value,
}

impl EventRow {
    /// Convert into catalogue metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if `relation` is not an array of
    /// strings.
    pub fn into_meta(self) -> Result<EventMeta, DbError> {
        Ok(EventMeta {
            id: self.id,
            name: self.name,
            description: self.description,
            kind: EventKind::from_tag(&self.event_type),
            probability: self.probability,
            relation: serde_json::from_value(self.relation)?,
        })
    }
}
