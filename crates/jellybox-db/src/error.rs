//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors with context about which operation failed. At the
//! repository boundary they collapse into the core's [`RepositoryError`].

use jellybox_core::RepositoryError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored JSON column or catalogue file could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The catalogue file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalogue parsed but breaks an invariant.
    #[error("Invalid catalogue: {0}")]
    InvalidCatalogue(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for RepositoryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Serialization(_) | DbError::InvalidCatalogue(_) => Self::Corrupt {
                message: err.to_string(),
            },
            DbError::Postgres(_)
            | DbError::Migration(_)
            | DbError::Io(_)
            | DbError::Config(_) => Self::Unavailable {
                message: err.to_string(),
            },
        }
    }
}
