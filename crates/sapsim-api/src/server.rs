//! Listener setup and the serve loop.
//!
//! The simulator serves until `Ctrl-C`. Connections carry their peer
//! address so the recorder can attribute each transaction to a client.

use std::net::SocketAddr;
use std::sync::Arc;

use sapsim_core::config::ServerSettings;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Where the simulator listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface address or host name, e.g. `0.0.0.0` or `localhost`.
    pub host: String,
    /// TCP port; `0` asks the OS for a free one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ServerSettings::default())
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
        }
    }
}

/// Bind the listener described by `config`. Host names are resolved.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address cannot be resolved or bound.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| ServerError::Bind(format!("{}:{}: {e}", config.host, config.port)))
}

/// Serve the simulator until `Ctrl-C`, then drain in-flight requests.
///
/// # Errors
///
/// Returns [`ServerError`] if binding fails or the serve loop dies.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(e.to_string()))?;
    info!(%addr, "Simulator listening");

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| ServerError::Serve(e.to_string()))?;

    info!("Simulator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until killed.
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Listener and serve-loop failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The address could not be resolved or bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// The serve loop failed.
    #[error("serve error: {0}")]
    Serve(String),
}
