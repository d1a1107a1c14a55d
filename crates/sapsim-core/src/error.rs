//! Error types for the simulator core.
//!
//! - [`RegistryError`] -- rejected registrations (reported synchronously)
//! - [`ResolveError`] -- a request that targets nothing registered
//! - [`HandlerError`] -- an endpoint handler refusing or failing a request

use sapsim_store::StoreError;
use sapsim_types::HttpMethod;

/// Errors reported to the caller of a registration.
///
/// A failed registration never changes the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two endpoints in one module could answer the same request.
    #[error(
        "configuration conflict in {system_id}/{module_id}: {method} {conflicting} is ambiguous with {existing}"
    )]
    ConfigurationConflict {
        /// Owning system.
        system_id: String,
        /// Module holding both endpoints.
        module_id: String,
        /// Shared HTTP method.
        method: HttpMethod,
        /// Template already in the module.
        existing: String,
        /// Template that was rejected.
        conflicting: String,
    },

    /// Two modules of one system share an identifier.
    #[error("duplicate module {module_id} in system {system_id}")]
    DuplicateModule {
        /// Owning system.
        system_id: String,
        /// Repeated module identifier.
        module_id: String,
    },

    /// A path template could not be parsed.
    #[error("invalid path template {template:?}: {reason}")]
    InvalidPathTemplate {
        /// The offending template.
        template: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An identifier cannot be used as a URL segment or is reserved.
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),

    /// The system to update is not registered.
    #[error("system not found: {0}")]
    SystemNotFound(String),
}

/// A request whose target is not registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Unknown system.
    #[error("system not found: {0}")]
    SystemNotFound(String),

    /// Unknown module within a known system.
    #[error("module not found: {system_id}/{module_id}")]
    ModuleNotFound {
        /// The system that was found.
        system_id: String,
        /// The module that was not.
        module_id: String,
    },

    /// No endpoint of the module matches the method and path.
    #[error("endpoint not found: {method} {system_id}/{module_id}{path}")]
    EndpointNotFound {
        /// Resolved system.
        system_id: String,
        /// Resolved module.
        module_id: String,
        /// Request method.
        method: HttpMethod,
        /// Path relative to the module.
        path: String,
    },
}

/// Failure raised by an endpoint handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The payload does not fit what the endpoint accepts.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The addressed business record does not exist.
    #[error("record {key} not found in {collection}")]
    RecordNotFound {
        /// Collection searched.
        collection: String,
        /// Key requested.
        key: String,
    },

    /// The data provider could not complete the operation.
    #[error("data provider failure: {0}")]
    Provider(#[from] StoreError),
}
