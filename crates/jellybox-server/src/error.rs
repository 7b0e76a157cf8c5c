//! Error types for the server binary.

/// Top-level startup and run error.
#[derive(Debug, thiserror::Error)]
pub enum ServerAppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: jellybox_core::config::ConfigError,
    },

    /// Database connection, migration or catalogue import failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: jellybox_db::DbError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("api error: {source}")]
    Api {
        /// The underlying server error.
        #[from]
        source: jellybox_api::ServerError,
    },

    /// The log filter in the config does not parse.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the filter problem.
        message: String,
    },
}
