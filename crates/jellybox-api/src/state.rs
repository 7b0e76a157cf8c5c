//! Shared application state for the API server.

use jellybox_core::{BoxRepository, BoxService};

/// State shared by every handler.
///
/// Handlers receive it behind an [`Arc`](std::sync::Arc); the service
/// serialises commands per box internally.
pub struct AppState<R> {
    /// The box service all commands go through.
    pub service: BoxService<R>,
}

impl<R: BoxRepository> AppState<R> {
    /// Wrap a configured service.
    pub const fn new(service: BoxService<R>) -> Self {
        Self { service }
    }
}
