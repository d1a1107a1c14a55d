//! Endpoints and the handler capability they carry.
//!
//! An [`Endpoint`] binds a method and [`PathTemplate`] to an
//! [`EndpointHandler`]. Handlers are trait objects so per-endpoint logic can
//! vary freely; they return boxed futures because they consult the async
//! [`DataProvider`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use sapsim_store::DataProvider;
use sapsim_types::{EndpointSummary, HttpMethod, ShapeDescriptor, ShapeKind};
use serde_json::Value;

use crate::error::{HandlerError, RegistryError};
use crate::path::PathTemplate;

/// Decoded request handed to an endpoint handler.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Path relative to the module, e.g. `/SalesOrders/0000500001`.
    pub path: String,
    /// Parameters captured by the path template.
    pub path_params: BTreeMap<String, String>,
    /// Decoded query string.
    pub query: BTreeMap<String, String>,
    /// Decoded JSON body, `None` when the body was empty.
    pub body: Option<Value>,
}

impl EndpointRequest {
    /// A request with no parameters, query or body.
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_owned(),
            path_params: BTreeMap::new(),
            query: BTreeMap::new(),
            body: None,
        }
    }

    /// Look up a captured path parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

/// Per-endpoint request logic.
///
/// Implementations must not keep state that outlives a call beyond what
/// they store through the provider; they may be invoked concurrently.
pub trait EndpointHandler: Send + Sync + fmt::Debug {
    /// Produce the response payload for `request`.
    fn handle<'a>(
        &'a self,
        request: &'a EndpointRequest,
        data: &'a DataProvider,
    ) -> BoxFuture<'a, Result<Value, HandlerError>>;

    /// Whether a successful call creates a resource (`201` instead of `200`).
    fn creates(&self) -> bool {
        false
    }
}

/// A single routable operation.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Path template relative to the module.
    pub template: PathTemplate,
    /// HTTP method.
    pub method: HttpMethod,
    /// Declared request payload shape.
    pub request_shape: ShapeDescriptor,
    /// Declared response payload shape.
    pub response_shape: ShapeDescriptor,
    /// Bound handler.
    pub handler: Arc<dyn EndpointHandler>,
}

impl Endpoint {
    /// Build an endpoint from a raw path template.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidPathTemplate`] if `path` does not parse.
    pub fn new(
        method: HttpMethod,
        path: &str,
        request_shape: ShapeDescriptor,
        response_shape: ShapeDescriptor,
        handler: Arc<dyn EndpointHandler>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            template: PathTemplate::parse(path)?,
            method,
            request_shape,
            response_shape,
            handler,
        })
    }

    /// Whether this endpoint and `other` could answer the same request
    /// with equal specificity.
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self.method == other.method && self.template.is_ambiguous_with(&other.template)
    }

    /// JSON summary for the management API.
    pub fn summary(&self) -> EndpointSummary {
        EndpointSummary {
            path: self.template.as_str().to_owned(),
            method: self.method,
            request_type: self.request_shape.type_name.clone(),
            response_type: self.response_shape.type_name.clone(),
        }
    }
}

/// Basic shape check of a request body against its descriptor.
///
/// # Errors
///
/// Returns [`HandlerError::BadRequest`] naming the first mismatch.
pub fn check_shape(shape: &ShapeDescriptor, body: Option<&Value>) -> Result<(), HandlerError> {
    match shape.kind {
        ShapeKind::Any => Ok(()),
        ShapeKind::Array => match body {
            Some(Value::Array(_)) => Ok(()),
            _ => Err(HandlerError::BadRequest(format!(
                "expected a JSON array of {}",
                shape.type_name
            ))),
        },
        ShapeKind::Object => {
            let Some(Value::Object(fields)) = body else {
                return Err(HandlerError::BadRequest(format!(
                    "expected a JSON object of type {}",
                    shape.type_name
                )));
            };
            match shape.required_fields.iter().find(|f| !fields.contains_key(*f)) {
                Some(missing) => Err(HandlerError::BadRequest(format!(
                    "{} is missing required field {missing}",
                    shape.type_name
                ))),
                None => Ok(()),
            }
        }
    }
}
