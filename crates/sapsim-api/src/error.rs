//! Error types for the simulator API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sapsim_core::{RegistryError, ResolveError};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request could not be understood.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A registration clashes with the rules of the registry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The HTTP method is not one the simulator routes.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The request body exceeds the accepted size.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::ConfigurationConflict { .. } | RegistryError::DuplicateModule { .. } => {
                Self::Conflict(e.to_string())
            }
            RegistryError::InvalidPathTemplate { .. } | RegistryError::InvalidIdentifier(_) => {
                Self::BadRequest(e.to_string())
            }
            RegistryError::SystemNotFound(_) => Self::NotFound(e.to_string()),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        Self::NotFound(e.to_string())
    }
}

impl ApiError {
    /// The HTTP status this error renders with.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Serialization(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::MethodNotAllowed(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::Serialization(e) => format!("JSON error: {e}"),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
