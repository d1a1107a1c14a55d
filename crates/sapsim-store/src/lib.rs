//! Mock business data for the SAP backend simulator.
//!
//! Endpoint handlers read and write synthetic records (business partners,
//! materials, sales orders, ...) through [`DataProvider`]. Records are
//! grouped into named collections and addressed by key.
//!
//! # Backends
//!
//! | Backend | Type | Durability |
//! |---------|------|------------|
//! | `memory` | [`MemoryStore`] | process lifetime |
//! | `file` | [`FileStore`] | one JSON document per collection |
//!
//! # Modules
//!
//! - [`provider`] -- the [`DataProvider`] contract (enum dispatch)
//! - [`memory`] -- in-memory backend
//! - [`file`] -- file-backed backend
//! - [`record`] -- record and filter types
//! - [`error`] -- [`StoreError`]

pub mod error;
pub mod file;
pub mod memory;
pub mod provider;
pub mod record;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use provider::DataProvider;
pub use record::{Record, RecordFilter};
