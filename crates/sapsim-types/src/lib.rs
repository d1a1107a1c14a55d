//! Shared type definitions for the SAP backend simulator.
//!
//! This crate holds the serializable vocabulary used across the
//! workspace. Types flow downstream to `TypeScript` via `ts-rs` for the
//! request monitor dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers
//! - [`enums`] -- HTTP methods, simulated error kinds, payload shapes
//! - [`catalog`] -- JSON views of systems, modules and endpoints
//! - [`request_log`] -- Recorded transactions and the live feed envelope

pub mod catalog;
pub mod enums;
pub mod ids;
pub mod request_log;

// Re-export all public types at crate root for convenience.
pub use catalog::{EndpointSummary, ModuleInfo, ShapeDescriptor, SystemInfo};
pub use enums::{HttpMethod, ShapeKind, SimulatedErrorKind, UnsupportedMethod};
pub use ids::{ObserverId, RequestId};
pub use request_log::{ClientInfo, FeedMessage, RECEIVE_REQUEST_EVENT, RequestLogEntry};
