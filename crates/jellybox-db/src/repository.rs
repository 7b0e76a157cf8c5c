//! [`BoxRepository`] backed by `PostgreSQL`.

use std::collections::BTreeSet;

use jellybox_core::{BoxRepository, RepositoryError};
use jellybox_types::{BoxField, EventMeta, JellyfishBox, SpeciesMeta};

use crate::error::DbError;
use crate::postgres::PostgresPool;

/// Box repository over a [`PostgresPool`].
#[derive(Debug, Clone)]
pub struct PgBoxRepository {
    pool: PostgresPool,
}

impl PgBoxRepository {
    /// Wrap a connected pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub const fn pool(&self) -> &PostgresPool {
        &self.pool
    }
}

fn logged(operation: &'static str) -> impl FnOnce(DbError) -> RepositoryError {
    move |err| {
        tracing::warn!(operation, error = %err, "repository operation failed");
        RepositoryError::from(err)
    }
}

impl BoxRepository for PgBoxRepository {
    async fn get_or_create_box(&self, fresh: &JellyfishBox) -> Result<JellyfishBox, RepositoryError> {
        self.pool
            .boxes()
            .get_or_create(fresh)
            .await
            .map_err(logged("get_or_create_box"))
    }

    async fn get_species_meta(
        &self,
        ids: Option<&BTreeSet<String>>,
    ) -> Result<Vec<SpeciesMeta>, RepositoryError> {
        self.pool
            .meta()
            .list_species(ids)
            .await
            .map_err(logged("get_species_meta"))
    }

    async fn get_event_meta(&self) -> Result<Vec<EventMeta>, RepositoryError> {
        self.pool
            .meta()
            .list_events()
            .await
            .map_err(logged("get_event_meta"))
    }

    async fn save_box(
        &self,
        record: &JellyfishBox,
        fields: &BTreeSet<BoxField>,
    ) -> Result<(), RepositoryError> {
        self.pool
            .boxes()
            .update_fields(record, fields)
            .await
            .map_err(logged("save_box"))
    }
}
