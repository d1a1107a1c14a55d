//! SAP backend simulator binary.
//!
//! Loads configuration, prepares the mock data provider, registers the
//! configured systems and serves the simulator API until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `SAPSIM_CONFIG` (default `sapsim.yaml`)
//! 3. Open the data provider and seed sample records
//! 4. Register configured systems
//! 5. Create the request monitor
//! 6. Serve HTTP and `WebSocket` traffic

mod error;
mod startup;

use std::sync::Arc;

use sapsim_api::{AppState, ServerConfig, start_server};
use sapsim_core::{RequestMonitor, SimulatorConfig, SystemRegistry};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Application entry point for the simulator.
///
/// # Errors
///
/// Returns an error if configuration, the data provider or the server
/// fails.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("sapsim starting");

    // 2. Load configuration.
    let config_path = startup::config_path();
    let config = SimulatorConfig::load_or_default(&config_path)?;
    info!(
        path = %config_path.display(),
        host = config.server.host,
        port = config.server.port,
        systems = config.systems.len(),
        max_requests = config.monitor.max_requests,
        "Configuration loaded"
    );

    // 3. Data provider.
    let data = Arc::new(startup::open_data_provider(&config.data).await?);

    // 4. Systems.
    let registry = Arc::new(SystemRegistry::new());
    let registered = startup::register_systems(&registry, &config.systems);
    info!(registered, "System registry ready");

    // 5. Request monitor.
    let monitor = Arc::new(RequestMonitor::new(
        config.monitor.max_requests,
        config.monitor.broadcast_capacity,
    ));

    // 6. Serve.
    let state = Arc::new(
        AppState::new(registry, monitor, data).with_max_body_bytes(config.monitor.max_body_bytes),
    );
    let server_config = ServerConfig::from(&config.server);
    start_server(&server_config, state).await?;

    info!("sapsim stopped");
    Ok(())
}
