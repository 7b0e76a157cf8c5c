//! `PostgreSQL` storage for the jellyfish box.
//!
//! ```text
//! BoxService (jellybox-core)
//!     |
//!     +-- BoxRepository --> PgBoxRepository
//!                              |-- BoxStore   (jellyfish_boxes)
//!                              +-- MetaStore  (jellyfish_species, jellyfish_events)
//!
//! Start-up --> import_catalogue --> MetaStore::replace_catalogue
//!                                   + prune stale species from every box
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool and migrations
//! - [`box_store`] -- Box rows with per-field updates
//! - [`meta_store`] -- Species and event catalogue tables
//! - [`catalogue_import`] -- Catalogue JSON parsing and import
//! - [`repository`] -- The core's repository trait over `PostgreSQL`
//! - [`error`] -- Shared error types

pub mod box_store;
pub mod catalogue_import;
pub mod error;
pub mod meta_store;
pub mod postgres;
pub mod repository;

pub use box_store::{BoxRow, BoxStore};
pub use catalogue_import::{CatalogueFile, import_catalogue};
pub use error::DbError;
pub use meta_store::{EventRow, MetaStore, ReplaceSummary, SpeciesRow};
pub use postgres::{PostgresConfig, PostgresPool};
pub use repository::PgBoxRepository;
