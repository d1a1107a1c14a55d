//! HTTP surface of the SAP backend simulator.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Dynamic endpoints** (`/api/{systemId}/{moduleId}{path}`) resolved
//!   against the live [`SystemRegistry`](sapsim_core::SystemRegistry)
//! - **Management endpoints** for listing, registering and probing systems
//! - **Monitor endpoints** for reading and clearing the request log
//! - **`WebSocket` endpoint** (`/ws/requests`) streaming every recorded
//!   transaction via [`tokio::sync::broadcast`]
//!
//! # Architecture
//!
//! Dynamic endpoints are served by the router fallback, so systems
//! registered at runtime are routable immediately. The recorder middleware
//! wraps every route, buffers both bodies, and logs one entry per
//! completed transaction. Broadcast to observers happens on their own
//! tasks, off the response path.

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod recorder;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
