//! Simulation core of the jellyfish box.
//!
//! A box is settled to the present before every action: the accrual clock
//! decides how many hourly ticks are due, reproduction grows each species,
//! and world events fire from a weighted table. Catches and releases then
//! act on the settled box, and the service persists the result in one
//! write.
//!
//! # Modules
//!
//! - [`random`] -- Weighted and uniform choice, Bernoulli trials.
//! - [`clock`] -- Tick accrual with long-absence throttling.
//! - [`inventory`] -- Checked species count arithmetic.
//! - [`reproduction`] -- Per-species population growth.
//! - [`event_engine`] -- World event selection and effects.
//! - [`settlement`] -- Accrual, reproduction and events combined.
//! - [`catch`] -- Cooldown, rarity draw and population-scaled quantity.
//! - [`release`] -- Release command parsing and atomic validation.
//! - [`catalogue`] -- Statistics and catalogue views.
//! - [`repository`] -- [`BoxRepository`] trait and [`MemoryRepository`].
//! - [`locks`] -- Per-box async mutexes.
//! - [`service`] -- [`BoxService`], the settle-then-act orchestrator.
//! - [`config`] -- Loading `jellybox-config.yaml`.
//! - [`error`] -- Error taxonomy.
//!
//! [`BoxRepository`]: repository::BoxRepository
//! [`MemoryRepository`]: repository::MemoryRepository
//! [`BoxService`]: service::BoxService

pub mod catalogue;
pub mod catch;
pub mod clock;
pub mod config;
pub mod error;
pub mod event_engine;
pub mod inventory;
pub mod locks;
pub mod random;
pub mod release;
pub mod repository;
pub mod reproduction;
pub mod service;
pub mod settlement;

pub use config::JellyboxConfig;
pub use error::{BoxError, CatchError, ReleaseError, ReleaseRejected, RepositoryError};
pub use release::{Quantity, ReleaseRequest};
pub use repository::{BoxRepository, MemoryRepository};
pub use service::BoxService;
