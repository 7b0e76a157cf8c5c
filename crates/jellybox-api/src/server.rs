//! HTTP server lifecycle.
//!
//! [`start_server`] binds, serves, and returns once `Ctrl-C` has been
//! received and in-flight requests have finished.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use jellybox_core::BoxRepository;
use jellybox_core::config::InfrastructureConfig;

use crate::router::build_router;
use crate::state::AppState;

/// Listen address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Take the listen address from the infrastructure section.
    pub fn from_infrastructure(config: &InfrastructureConfig) -> Self {
        Self {
            host: config.api_host.clone(),
            port: config.api_port,
        }
    }

    /// Parse the socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if host and port do not form an address.
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))
    }
}

/// Serve the API until shutdown.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or serving fails.
pub async fn start_server<R: BoxRepository + 'static>(
    config: &ServerConfig,
    state: Arc<AppState<R>>,
) -> Result<(), ServerError> {
    let addr = config.addr()?;
    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "jellybox api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("jellybox api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

/// Errors from starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server failed while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
