//! HTTP API for the jellyfish box.
//!
//! Chat-bot front ends translate user commands into these endpoints and
//! render the JSON reports they get back. The API owns no state of its
//! own: every request goes through a shared
//! [`BoxService`](jellybox_core::BoxService), which settles the box and
//! persists the result through whichever repository it was built with.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
