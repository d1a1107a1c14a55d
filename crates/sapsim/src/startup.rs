//! Startup wiring: data provider, sample data and the system catalog.

use std::path::PathBuf;

use sapsim_core::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, DataSettings};
use sapsim_core::seed::seed_sample_data;
use sapsim_core::{DataBackend, SystemDefinition, SystemRegistry};
use sapsim_store::{DataProvider, StoreError};
use tracing::{error, info, warn};

/// Path of the configuration file: `SAPSIM_CONFIG` or `sapsim.yaml`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Open the configured data provider and seed it when enabled.
///
/// A seeding failure is logged and startup continues with whatever was
/// written.
///
/// # Errors
///
/// Returns [`StoreError`] if the file backend cannot create its directory.
pub async fn open_data_provider(settings: &DataSettings) -> Result<DataProvider, StoreError> {
    let data = match settings.backend {
        DataBackend::Memory => DataProvider::in_memory(),
        DataBackend::File => DataProvider::file(settings.directory.clone()).await?,
    };
    info!(provider = data.name(), "Data provider ready");

    if settings.seed {
        if let Err(e) = seed_sample_data(&data, settings).await {
            warn!(error = %e, "Sample data seeding failed");
        }
    }
    Ok(data)
}

/// Register every definition. Invalid or conflicting definitions are
/// logged and skipped; the rest are served.
///
/// Returns the number of systems registered.
pub fn register_systems(registry: &SystemRegistry, definitions: &[SystemDefinition]) -> usize {
    let mut registered: usize = 0;
    for definition in definitions {
        let result = definition
            .build()
            .and_then(|system| registry.register_system(system));
        match result {
            Ok(()) => registered = registered.saturating_add(1),
            Err(e) => error!(system_id = %definition.id, error = %e, "System rejected"),
        }
    }
    registered
}
