//! Persistence for the `jellyfish_boxes` table.
//!
//! Inventories and decorations are stored as `JSONB`. Updates write only
//! the columns a command changed.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use jellybox_types::{BoxField, BoxId, BoxKey, JellyfishBox};

use crate::error::DbError;

/// Operations on the `jellyfish_boxes` table.
pub struct BoxStore<'a> {
    pool: &'a PgPool,
}

impl<'a> BoxStore<'a> {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the box for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Serialization`] if a JSON column does not decode.
    pub async fn get(&self, key: &BoxKey) -> Result<Option<JellyfishBox>, DbError> {
        let row = sqlx::query_as::<_, BoxRow>(
            r"SELECT id, user_id, platform, last_catch_time, last_refresh_time,
                     inventory, decorations, salinity, temperature, style
              FROM jellyfish_boxes
              WHERE user_id = $1 AND platform = $2",
        )
        .bind(&key.user_id)
        .bind(&key.platform)
        .fetch_optional(self.pool)
        .await?;

        row.map(BoxRow::into_record).transpose()
    }

    /// Insert `fresh` unless a box with its key exists, then return the
    /// stored box.
    ///
    /// Concurrent first commands from the same user race on the unique
    /// `(user_id, platform)` constraint; the loser reads the winner's row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if either statement fails.
    pub async fn get_or_create(&self, fresh: &JellyfishBox) -> Result<JellyfishBox, DbError> {
        sqlx::query(
            r"INSERT INTO jellyfish_boxes
              (id, user_id, platform, last_catch_time, last_refresh_time,
               inventory, decorations, salinity, temperature, style)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
              ON CONFLICT (user_id, platform) DO NOTHING",
        )
        .bind(fresh.id.into_inner())
        .bind(&fresh.user_id)
        .bind(&fresh.platform)
        .bind(fresh.last_catch_time)
        .bind(fresh.last_refresh_time)
        .bind(serde_json::to_value(&fresh.inventory)?)
        .bind(serde_json::to_value(&fresh.decorations)?)
        .bind(fresh.salinity)
        .bind(fresh.temperature)
        .bind(&fresh.style)
        .execute(self.pool)
        .await?;

        self.get(&fresh.key())
            .await?
            .ok_or_else(|| DbError::Postgres(sqlx::Error::RowNotFound))
    }

    /// Write the listed `fields` of `record`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails or no row matches
    /// the record's key.
    pub async fn update_fields(
        &self,
        record: &JellyfishBox,
        fields: &BTreeSet<BoxField>,
    ) -> Result<(), DbError> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("UPDATE jellyfish_boxes SET updated_at = now()");
        for field in fields {
            match field {
                BoxField::Inventory => {
                    builder
                        .push(", inventory = ")
                        .push_bind(serde_json::to_value(&record.inventory)?);
                }
                BoxField::Decorations => {
                    builder
                        .push(", decorations = ")
                        .push_bind(serde_json::to_value(&record.decorations)?);
                }
                BoxField::LastCatchTime => {
                    builder
                        .push(", last_catch_time = ")
                        .push_bind(record.last_catch_time);
                }
                BoxField::LastRefreshTime => {
                    builder
                        .push(", last_refresh_time = ")
                        .push_bind(record.last_refresh_time);
                }
                BoxField::Environment => {
                    builder
                        .push(", salinity = ")
                        .push_bind(record.salinity)
                        .push(", temperature = ")
                        .push_bind(record.temperature);
                }
                BoxField::Style => {
                    builder.push(", style = ").push_bind(record.style.clone());
                }
            }
        }
        builder
            .push(" WHERE user_id = ")
            .push_bind(record.user_id.clone())
            .push(" AND platform = ")
            .push_bind(record.platform.clone());

        let result = builder.build().execute(self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::Postgres(sqlx::Error::RowNotFound));
        }

        tracing::debug!(
            user_id = %record.user_id,
            platform = %record.platform,
            fields = fields.len(),
            "box updated"
        );
        Ok(())
    }

    /// Drop inventory entries whose species id is not in `known`, across
    /// every box. Returns the number of boxes changed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn prune_unknown_species(&self, known: &[String]) -> Result<u64, DbError> {
        let mut conn = self.pool.acquire().await?;
        prune_unknown_species(&mut conn, known).await
    }
}

/// Connection-level prune, shared with the catalogue transaction.
pub(crate) async fn prune_unknown_species(
    conn: &mut PgConnection,
    known: &[String],
) -> Result<u64, DbError> {
    let result = sqlx::query(
        r"UPDATE jellyfish_boxes AS b
          SET inventory = COALESCE(
                (SELECT jsonb_object_agg(entry.key, entry.value)
                   FROM jsonb_each(b.inventory) AS entry
                  WHERE entry.key = ANY($1)),
                '{}'::jsonb),
              updated_at = now()
          WHERE EXISTS (
                SELECT 1
                  FROM jsonb_object_keys(b.inventory) AS held(key)
                 WHERE NOT (held.key = ANY($1)))",
    )
    .bind(known)
    .execute(&mut *conn)
    .await?;

    let pruned = result.rows_affected();
    if pruned > 0 {
        tracing::info!(boxes = pruned, "pruned species missing from catalogue");
    }
    Ok(pruned)
}

/// A row from the `jellyfish_boxes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoxRow {
    /// Storage id.
    pub id: Uuid,
    /// Chat user id.
    pub user_id: String,
    /// Chat platform.
    pub platform: String,
    /// Last successful catch.
    pub last_catch_time: DateTime<Utc>,
    /// Last settlement boundary.
    pub last_refresh_time: DateTime<Utc>,
    /// Species id to count, as a JSON object.
    pub inventory: serde_json::Value,
    /// Decoration ids, as a JSON array.
    pub decorations: serde_json::Value,
    /// Salinity.
    pub salinity: f64,
    /// Temperature.
    pub temperature: f64,
    /// Presentation style.
    pub style: String,
}

impl BoxRow {
    /// Decode the JSON columns into a box record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if a JSON column has the wrong
    /// shape (for example a negative count).
    pub fn into_record(self) -> Result<JellyfishBox, DbError> {
        Ok(JellyfishBox {
            id: BoxId::from(self.id),
            user_id: self.user_id,
            platform: self.platform,
            last_catch_time: self.last_catch_time,
            last_refresh_time: self.last_refresh_time,
            inventory: serde_json::from_value(self.inventory)?,
            decorations: serde_json::from_value(self.decorations)?,
            salinity: self.salinity,
            temperature: self.temperature,
            style: self.style,
        })
    }
}
