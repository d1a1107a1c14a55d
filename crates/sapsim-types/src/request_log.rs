//! Recorded HTTP transactions and the live feed envelope.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::RequestId;

/// Name of the event carrying a [`RequestLogEntry`] on the live feed.
pub const RECEIVE_REQUEST_EVENT: &str = "ReceiveRequest";

/// Client metadata captured from the inbound connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClientInfo {
    /// Value of the `User-Agent` header, if sent.
    pub user_agent: Option<String>,
    /// Remote socket address, if known to the transport.
    pub remote_address: Option<String>,
}

/// One completed HTTP transaction.
///
/// Created exactly once per inbound request after the response is
/// finalized. Entries are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RequestLogEntry {
    /// Process-unique identifier.
    pub id: RequestId,
    /// When the request arrived.
    pub timestamp: DateTime<Utc>,
    /// HTTP method as received.
    pub method: String,
    /// Request path (without query string).
    pub path: String,
    /// Raw query string, if any.
    pub query: Option<String>,
    /// System the request resolved to.
    pub system_id: Option<String>,
    /// Module the request resolved to.
    pub module_id: Option<String>,
    /// Final HTTP status code.
    pub status_code: u16,
    /// Wall-clock time spent producing the response, in milliseconds.
    pub elapsed_ms: u64,
    /// Request headers at arrival.
    pub headers: BTreeMap<String, String>,
    /// Request body, truncated to the capture limit.
    pub request_body: Option<String>,
    /// Response body, truncated to the capture limit.
    pub response_body: Option<String>,
    /// Caller metadata.
    pub client: ClientInfo,
}

/// Envelope pushed to every live observer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FeedMessage {
    /// Event name, always [`RECEIVE_REQUEST_EVENT`] for request entries.
    pub event: String,
    /// The recorded transaction.
    pub data: RequestLogEntry,
}

impl FeedMessage {
    /// Wrap an entry in a `ReceiveRequest` event.
    pub fn receive_request(entry: RequestLogEntry) -> Self {
        Self {
            event: RECEIVE_REQUEST_EVENT.to_owned(),
            data: entry,
        }
    }
}
