//! Request recording middleware.
//!
//! Wraps every simulated API call: buffers the request and response
//! bodies, times the exchange and hands one [`RequestLogEntry`] to the
//! [`RequestMonitor`](sapsim_core::RequestMonitor) once the response is
//! final. Monitor traffic and the `WebSocket` feed are not recorded.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes, to_bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use sapsim_core::SIMULATE_ERROR_HEADER;
use sapsim_types::{ClientInfo, RequestId, RequestLogEntry};
use tracing::warn;

use crate::dispatch::{OversizedBody, ResolvedTarget};
use crate::error::ApiError;
use crate::state::{AppState, MAX_REQUEST_BYTES};

/// Path prefixes that bypass recording.
const UNRECORDED_PREFIXES: &[&str] = &["/ws", "/api/monitor"];

/// Headers whose values never reach the log.
const REDACTED_HEADERS: &[&str] = &["authorization", "proxy-authorization", "cookie", "set-cookie"];

const REDACTED: &str = "[redacted]";
const TRUNCATED: &str = "...[truncated]";

/// Whether requests to `path` are recorded.
pub fn is_recorded(path: &str) -> bool {
    !UNRECORDED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Middleware that logs each completed transaction to the monitor.
pub async fn record_transaction(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_recorded(request.uri().path()) {
        return next.run(request).await;
    }

    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_owned();
    let query = request.uri().query().map(str::to_owned);
    let headers = snapshot_headers(request.headers());
    let client = ClientInfo {
        user_agent: request
            .headers()
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        remote_address: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string()),
    };

    let (mut parts, body) = request.into_parts();
    let (response, request_bytes) = match to_bytes(body, MAX_REQUEST_BYTES).await {
        Ok(bytes) => {
            let request = Request::from_parts(parts, Body::from(bytes.clone()));
            (next.run(request).await, Some(bytes))
        }
        // A simulated fault still wins over the size limit.
        Err(_) if parts.headers.contains_key(SIMULATE_ERROR_HEADER) => {
            parts.extensions.insert(OversizedBody);
            (next.run(Request::from_parts(parts, Body::empty())).await, None)
        }
        Err(e) => (ApiError::PayloadTooLarge(e.to_string()).into_response(), None),
    };

    let (mut parts, body) = response.into_parts();
    let response_bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path, error = %e, "Failed to buffer response body");
            let failed = ApiError::Internal(String::from("response body unavailable")).into_response();
            let (failed_parts, _) = failed.into_parts();
            parts = failed_parts;
            Bytes::new()
        }
    };
    let target = parts.extensions.get::<ResolvedTarget>().cloned();

    let entry = RequestLogEntry {
        id: RequestId::new(),
        timestamp: Utc::now(),
        method,
        path,
        query,
        system_id: target.as_ref().map(|t| t.system_id.clone()),
        module_id: target.map(|t| t.module_id),
        status_code: parts.status.as_u16(),
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        headers,
        request_body: request_bytes.and_then(|bytes| capture_body(&bytes, state.max_body_bytes)),
        response_body: capture_body(&response_bytes, state.max_body_bytes),
        client,
    };
    state.monitor.log_request(entry);

    Response::from_parts(parts, Body::from(response_bytes))
}

/// Flatten headers into a sorted map, joining repeated values with `, `
/// and redacting credentials.
pub fn snapshot_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut snapshot: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        let value = if REDACTED_HEADERS.contains(&name) {
            String::from(REDACTED)
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        snapshot
            .entry(name.to_owned())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    snapshot
}

/// Body text for the log, cut at `limit` bytes. Empty bodies are `None`.
pub fn capture_body(bytes: &[u8], limit: usize) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    match bytes.get(..limit) {
        Some(head) if head.len() < bytes.len() => {
            let mut text = String::from_utf8_lossy(head).into_owned();
            text.push_str(TRUNCATED);
            Some(text)
        }
        _ => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn monitor_and_feed_paths_are_not_recorded() {
        assert!(is_recorded("/api/S4H/SD/SalesOrders"));
        assert!(is_recorded("/api/systems"));
        assert!(!is_recorded("/api/monitor/requests"));
        assert!(!is_recorded("/ws/requests"));
    }

    #[test]
    fn headers_are_joined_and_redacted() {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("application/json"));
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.insert("authorization", HeaderValue::from_static("Basic c2VjcmV0"));

        let snapshot = snapshot_headers(&headers);
        assert_eq!(snapshot.get("accept").unwrap(), "application/json, text/plain");
        assert_eq!(snapshot.get("authorization").unwrap(), REDACTED);
    }

    #[test]
    fn bodies_are_truncated_at_limit() {
        assert_eq!(capture_body(b"", 10), None);
        assert_eq!(capture_body(b"{\"a\":1}", 64).unwrap(), "{\"a\":1}");
        let cut = capture_body(b"0123456789", 4).unwrap();
        assert_eq!(cut, format!("0123{TRUNCATED}"));
    }
}
