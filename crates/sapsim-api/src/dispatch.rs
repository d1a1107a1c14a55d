//! Dynamic routing for `/api/{systemId}/{moduleId}{endpointPath}`.
//!
//! The catalog changes at runtime, so these routes are not registered with
//! Axum. [`dispatch`] is installed as the router fallback: it splits the
//! path itself, asks the [`SystemRegistry`](sapsim_core::SystemRegistry) to
//! resolve the target and runs the endpoint through
//! [`sapsim_core::resolve::execute`].

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::body::to_bytes;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sapsim_core::resolve::{execute, simulate};
use sapsim_core::{EndpointOutcome, EndpointRequest, ResolvedEndpoint, SIMULATE_ERROR_HEADER};
use sapsim_types::HttpMethod;
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppState, MAX_REQUEST_BYTES};

/// Prefix under which dynamic endpoints live.
pub const API_PREFIX: &str = "/api/";

/// The system and module a request resolved to.
///
/// Attached to the response extensions so the request recorder can log
/// the target without re-resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Resolved system.
    pub system_id: String,
    /// Resolved module.
    pub module_id: String,
}

/// A dynamic request path split into its addressing parts, with every
/// segment percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicPath {
    /// System identifier.
    pub system_id: String,
    /// Module identifier.
    pub module_id: String,
    /// Path relative to the module, always starting with `/`.
    pub endpoint_path: String,
}

impl DynamicPath {
    /// Split `/api/{system}/{module}{rest}`. An empty rest becomes `/`.
    ///
    /// Returns `Ok(None)` when the path is not a dynamic endpoint path.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BadRequest`] if a segment does not decode to
    /// UTF-8 or decodes to a `/`.
    pub fn parse(path: &str) -> Result<Option<Self>, ApiError> {
        let Some(rest) = path.strip_prefix(API_PREFIX) else {
            return Ok(None);
        };
        let Some((system_id, after_system)) = rest.split_once('/') else {
            return Ok(None);
        };
        let (module_id, endpoint_path) = match after_system.find('/') {
            Some(at) => after_system.split_at(at),
            None => (after_system, "/"),
        };
        if system_id.is_empty() || module_id.is_empty() {
            return Ok(None);
        }
        let endpoint_path = endpoint_path
            .split('/')
            .map(decode_segment)
            .collect::<Result<Vec<_>, _>>()?
            .join("/");
        Ok(Some(Self {
            system_id: decode_segment(system_id)?,
            module_id: decode_segment(module_id)?,
            endpoint_path,
        }))
    }
}

/// Percent-decode one path segment.
fn decode_segment(raw: &str) -> Result<String, ApiError> {
    let decoded = urlencoding::decode(raw)
        .map_err(|_| ApiError::BadRequest(format!("path segment {raw} is not valid UTF-8")))?;
    if decoded.contains('/') {
        return Err(ApiError::BadRequest(format!(
            "path segment {raw} encodes a '/'"
        )));
    }
    Ok(decoded.into_owned())
}

/// Set on a request whose body exceeded the buffering limit but was still
/// forwarded because it asked for a simulated error.
#[derive(Debug, Clone, Copy)]
pub struct OversizedBody;

/// Router fallback: resolve and run a dynamic endpoint.
pub async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Response {
    match run(&state, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn run(state: &AppState, request: Request) -> Result<Response, ApiError> {
    let uri = request.uri().clone();
    let target = DynamicPath::parse(uri.path())?
        .ok_or_else(|| ApiError::NotFound(format!("no route for {}", uri.path())))?;

    let method: HttpMethod = request
        .method()
        .as_str()
        .parse()
        .map_err(|_| ApiError::MethodNotAllowed(request.method().to_string()))?;

    let resolved = state.registry.resolve(
        &target.system_id,
        &target.module_id,
        method,
        &target.endpoint_path,
    )?;

    let simulation = request
        .headers()
        .get(SIMULATE_ERROR_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Some(outcome) = simulate(&resolved, simulation, &target.endpoint_path) {
        return Ok(respond(resolved, outcome));
    }

    if request.extensions().get::<OversizedBody>().is_some() {
        return Err(ApiError::PayloadTooLarge(String::from(
            "length limit exceeded",
        )));
    }

    let query = Query::<BTreeMap<String, String>>::try_from_uri(&uri)
        .map(|Query(q)| q)
        .map_err(|e| ApiError::BadRequest(format!("invalid query string: {e}")))?;

    let bytes = to_bytes(request.into_body(), MAX_REQUEST_BYTES)
        .await
        .map_err(|e| ApiError::PayloadTooLarge(e.to_string()))?;
    let body = if bytes.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(
            serde_json::from_slice::<Value>(&bytes)
                .map_err(|e| ApiError::BadRequest(format!("request body is not JSON: {e}")))?,
        )
    };

    let mut endpoint_request = EndpointRequest::new(method, &target.endpoint_path);
    endpoint_request.query = query;
    endpoint_request.body = body;

    let outcome = execute(&resolved, endpoint_request, None, &state.data).await;
    Ok(respond(resolved, outcome))
}

fn respond(resolved: ResolvedEndpoint, outcome: EndpointOutcome) -> Response {
    debug!(
        system_id = %resolved.system_id,
        module_id = %resolved.module_id,
        template = %resolved.endpoint.template,
        status = outcome.status,
        handler_invoked = outcome.handler_invoked,
        "Dynamic endpoint served"
    );

    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(outcome.body)).into_response();
    response.extensions_mut().insert(ResolvedTarget {
        system_id: resolved.system_id,
        module_id: resolved.module_id,
    });
    response
}
