//! Axum router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use jellybox_core::BoxRepository;

use crate::handlers;
use crate::state::AppState;

/// Build the complete router.
///
/// Routes are listed in [`handlers`]. CORS allows any origin so browser
/// based bot dashboards can call the API directly.
pub fn build_router<R: BoxRepository + 'static>(state: Arc<AppState<R>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/catalogue", get(handlers::catalogue::<R>))
        .route("/api/boxes/{platform}/{user_id}", get(handlers::open_box::<R>))
        .route("/api/boxes/{platform}/{user_id}/catch", post(handlers::catch::<R>))
        .route(
            "/api/boxes/{platform}/{user_id}/release",
            post(handlers::release::<R>),
        )
        .route(
            "/api/boxes/{platform}/{user_id}/statistics",
            get(handlers::statistics::<R>),
        )
        .route(
            "/api/boxes/{platform}/{user_id}/style",
            put(handlers::set_style::<R>),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
