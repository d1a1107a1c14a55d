//! Header-triggered failure injection.
//!
//! A request carrying [`SIMULATE_ERROR_HEADER`] with a recognised value
//! never reaches its handler. Instead a canned error in the SAP Gateway
//! message format is returned with the status mapped from the kind.

use chrono::Utc;
use sapsim_types::SimulatedErrorKind;
use serde_json::{Value, json};

/// Request header selecting a simulated failure.
pub const SIMULATE_ERROR_HEADER: &str = "x-simulate-error";

/// A synthesized failure response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedFault {
    /// Which failure was injected.
    pub kind: SimulatedErrorKind,
    /// HTTP status to return.
    pub status: u16,
    /// Structured error payload.
    pub body: Value,
}

struct MessageSpec {
    message_class: &'static str,
    message_number: &'static str,
    severity: &'static str,
    text: &'static str,
}

const fn message_spec(kind: SimulatedErrorKind) -> MessageSpec {
    match kind {
        SimulatedErrorKind::Timeout => MessageSpec {
            message_class: "/IWFND/CM_BEC",
            message_number: "026",
            severity: "E",
            text: "Timeout occurred while waiting for the backend system response",
        },
        SimulatedErrorKind::Authorization => MessageSpec {
            message_class: "/IWFND/CM_CONSUMER",
            message_number: "101",
            severity: "E",
            text: "No authorization to access the requested service",
        },
        SimulatedErrorKind::Business => MessageSpec {
            message_class: "V1",
            message_number: "384",
            severity: "E",
            text: "Business rule validation failed for the submitted document",
        },
        SimulatedErrorKind::System => MessageSpec {
            message_class: "/IWBEP/CM_MGW_RT",
            message_number: "004",
            severity: "A",
            text: "An exception was raised in the backend system",
        },
    }
}

impl SimulatedFault {
    /// Build the fault for `kind`, naming the target in the message
    /// variables.
    pub fn new(kind: SimulatedErrorKind, system_id: &str, module_id: &str, path: &str) -> Self {
        let spec = message_spec(kind);
        let body = json!({
            "error": {
                "code": format!("{}/{}", spec.message_class, spec.message_number),
                "message": {
                    "lang": "en",
                    "value": spec.text,
                },
                "type": spec.severity,
                "simulated": kind.header_value(),
                "innererror": {
                    "message_class": spec.message_class,
                    "message_number": spec.message_number,
                    "variables": [system_id, module_id, path],
                    "timestamp": Utc::now().format("%Y%m%d%H%M%S").to_string(),
                },
            }
        });
        Self {
            kind,
            status: kind.status_code(),
            body,
        }
    }
}

/// Interpret the simulation header. Unknown values are ignored with a
/// warning and the request proceeds normally.
pub fn parse_header(value: Option<&str>) -> Option<SimulatedErrorKind> {
    let raw = value?;
    let kind = SimulatedErrorKind::from_header_value(raw);
    if kind.is_none() {
        tracing::warn!(value = raw, "Ignoring unknown simulation header value");
    }
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_status_follows_kind() {
        for kind in SimulatedErrorKind::ALL {
            let fault = SimulatedFault::new(kind, "S4H", "SD", "/Orders");
            assert_eq!(fault.status, kind.status_code());
            assert_eq!(fault.body["error"]["simulated"], kind.header_value());
        }
    }

    #[test]
    fn fault_body_carries_message_metadata() {
        let fault = SimulatedFault::new(SimulatedErrorKind::Business, "S4H", "SD", "/Orders");
        let error = &fault.body["error"];
        assert_eq!(error["code"], "V1/384");
        assert_eq!(error["type"], "E");
        assert_eq!(error["innererror"]["message_class"], "V1");
        assert_eq!(error["innererror"]["message_number"], "384");
        assert_eq!(error["innererror"]["variables"][0], "S4H");
        assert!(error["message"]["value"].is_string());
    }

    #[test]
    fn header_parsing() {
        assert_eq!(parse_header(None), None);
        assert_eq!(parse_header(Some("Timeout")), Some(SimulatedErrorKind::Timeout));
        assert_eq!(parse_header(Some("bogus")), None);
    }
}
