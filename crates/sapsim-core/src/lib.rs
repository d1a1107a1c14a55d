//! Core of the SAP backend simulator.
//!
//! Turns declarative system definitions into live, routable endpoints and
//! records every transaction for live inspection.
//!
//! # Components
//!
//! | Component | Entry point | Concurrency |
//! |-----------|-------------|-------------|
//! | System registry | [`SystemRegistry`] | lock-free snapshot reads, serialized writes |
//! | Endpoint resolution | [`resolve::execute`] | per request |
//! | Request monitor | [`RequestMonitor`] | mutex append, broadcast fan-out |
//!
//! # Modules
//!
//! - [`registry`] -- the system catalog and request resolution
//! - [`system`] -- systems and modules
//! - [`endpoint`] -- endpoints, the handler capability and shape checks
//! - [`path`] -- path templates with `{param}` segments
//! - [`resolve`] -- running a resolved endpoint to a status and body
//! - [`simulation`] -- header-triggered failure injection
//! - [`handlers`] -- the configurable handler catalog
//! - [`health`] -- per-system health probes
//! - [`monitor`] -- the bounded request log and observers
//! - [`definition`] -- declarative system definitions
//! - [`config`] -- YAML configuration
//! - [`seed`] -- deterministic sample business data
//! - [`error`] -- error types

pub mod config;
pub mod definition;
pub mod endpoint;
pub mod error;
pub mod handlers;
pub mod health;
pub mod monitor;
pub mod path;
pub mod registry;
pub mod resolve;
pub mod seed;
pub mod simulation;
pub mod system;

// Re-export primary types for convenience.
pub use config::{ConfigError, DataBackend, SimulatorConfig};
pub use definition::{EndpointDefinition, ModuleDefinition, SystemDefinition};
pub use endpoint::{Endpoint, EndpointHandler, EndpointRequest};
pub use error::{HandlerError, RegistryError, ResolveError};
pub use handlers::HandlerBinding;
pub use health::HealthProbe;
pub use monitor::{CounterSnapshot, RequestCounters, RequestMonitor};
pub use path::PathTemplate;
pub use registry::SystemRegistry;
pub use resolve::{EndpointOutcome, ResolvedEndpoint};
pub use simulation::{SIMULATE_ERROR_HEADER, SimulatedFault};
pub use system::{Module, System};
