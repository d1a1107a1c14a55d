//! Shared application state for the simulator API.
//!
//! [`AppState`] is built once at startup and handed to every handler
//! through Axum's state. The registry, monitor and data provider are the
//! same instances the rest of the process sees; there are no globals.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sapsim_core::{RequestCounters, RequestMonitor, SystemRegistry};
use sapsim_store::DataProvider;

/// Default number of body bytes kept in a log entry.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Largest request body the simulator accepts.
pub const MAX_REQUEST_BYTES: usize = 2 * 1024 * 1024;

/// Shared state behind every route.
#[derive(Debug)]
pub struct AppState {
    /// Catalog of simulated systems.
    pub registry: Arc<SystemRegistry>,
    /// Bounded request log with observer fan-out.
    pub monitor: Arc<RequestMonitor>,
    /// Running status counters fed by the monitor.
    pub counters: Arc<RequestCounters>,
    /// Mock business data.
    pub data: Arc<DataProvider>,
    /// Body bytes captured per log entry.
    pub max_body_bytes: usize,
    /// Process start, for the stats endpoint.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Assemble the state and attach the status counters to `monitor`.
    pub fn new(
        registry: Arc<SystemRegistry>,
        monitor: Arc<RequestMonitor>,
        data: Arc<DataProvider>,
    ) -> Self {
        let counters = RequestCounters::attach(&monitor);
        Self {
            registry,
            monitor,
            counters,
            data,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            started_at: Utc::now(),
        }
    }

    /// State with an empty registry, a default monitor and in-memory data.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(SystemRegistry::new()),
            Arc::new(RequestMonitor::default()),
            Arc::new(DataProvider::in_memory()),
        )
    }

    /// Override how many body bytes are captured per log entry.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
