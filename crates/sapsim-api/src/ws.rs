//! `WebSocket` feed of completed transactions.
//!
//! Clients connect to `GET /ws/requests` and receive every newly logged
//! transaction as a JSON text frame
//! `{"event": "ReceiveRequest", "data": <entry>}`. Each connection is an
//! independent observer with its own broadcast receiver.
//!
//! If a client falls behind, lagged entries are skipped and the client
//! resumes from the most recent one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use sapsim_types::{FeedMessage, ObserverId, RequestLogEntry};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming transactions.
///
/// # Route
///
/// `GET /ws/requests`
pub async fn ws_requests(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Encode one entry as a feed frame.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if the entry cannot be serialized.
pub fn feed_frame(entry: &RequestLogEntry) -> Result<String, serde_json::Error> {
    serde_json::to_string(&FeedMessage::receive_request(entry.clone()))
}

/// Handle the `WebSocket` lifecycle: subscribe to the monitor and forward
/// each entry as a text frame.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let observer = ObserverId::new();
    let mut rx = state.monitor.subscribe();
    debug!(%observer, observers = state.monitor.observer_count(), "Observer connected");

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(entry) => {
                        let json = match feed_frame(&entry) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!(%observer, "Failed to serialize request entry: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!(%observer, "Observer disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(%observer, skipped = n, "Observer lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!(%observer, "Monitor channel closed, shutting down feed");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%observer, "Observer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%observer, "Observer disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%observer, "WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Client text and binary frames carry no meaning here.
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use sapsim_types::{ClientInfo, RequestId};

    use super::*;

    #[test]
    fn frame_wraps_entry_in_event_envelope() {
        let entry = RequestLogEntry {
            id: RequestId::new(),
            timestamp: Utc::now(),
            method: String::from("GET"),
            path: String::from("/api/S4H/SD/SalesOrders"),
            query: None,
            system_id: Some(String::from("S4H")),
            module_id: Some(String::from("SD")),
            status_code: 200,
            elapsed_ms: 3,
            headers: BTreeMap::new(),
            request_body: None,
            response_body: None,
            client: ClientInfo::default(),
        };
        let frame: serde_json::Value = serde_json::from_str(&feed_frame(&entry).unwrap()).unwrap();
        assert_eq!(frame["event"], "ReceiveRequest");
        assert_eq!(frame["data"]["path"], "/api/S4H/SD/SalesOrders");
    }
}
