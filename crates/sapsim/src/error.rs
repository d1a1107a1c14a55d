//! Error types for the simulator binary.
//!
//! [`AppError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the simulator binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: sapsim_core::ConfigError,
    },

    /// The data provider could not be opened.
    #[error("data provider error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: sapsim_store::StoreError,
    },

    /// The HTTP server failed to start or crashed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: sapsim_api::ServerError,
    },
}
