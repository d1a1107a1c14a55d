//! Enumeration types for the simulator.
//!
//! HTTP methods accepted by dynamic endpoints, the failure modes that can
//! be injected through the simulation header, and the coarse payload
//! shapes used for request checks.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// HTTP methods
// ---------------------------------------------------------------------------

/// HTTP method a dynamic endpoint responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Canonical upper-case name of the method.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a method name is not one of the supported verbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMethod(pub String);

impl core::fmt::Display for UnsupportedMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unsupported HTTP method: {}", self.0)
    }
}

impl std::error::Error for UnsupportedMethod {}

impl core::str::FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(UnsupportedMethod(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulated errors
// ---------------------------------------------------------------------------

/// Failure mode injected through the `X-Simulate-Error` request header.
///
/// Each kind maps to a fixed HTTP status and a message class in the
/// style of the SAP Gateway runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SimulatedErrorKind {
    /// The backend did not answer in time (`408`).
    Timeout,
    /// The caller is not authorized (`401`).
    Authorization,
    /// A business rule rejected the request (`400`).
    Business,
    /// The backend failed internally (`500`).
    System,
}

impl SimulatedErrorKind {
    /// Every simulated failure mode, in header-value order.
    pub const ALL: [Self; 4] = [Self::Timeout, Self::Authorization, Self::Business, Self::System];

    /// Parse a header value. Matching ignores ASCII case and surrounding
    /// whitespace; unknown values yield `None`.
    pub fn from_header_value(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.header_value().eq_ignore_ascii_case(value))
    }

    /// The canonical header value for this kind.
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::Timeout => "Timeout",
            Self::Authorization => "Authorization",
            Self::Business => "Business",
            Self::System => "System",
        }
    }

    /// HTTP status code returned for this kind.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Timeout => 408,
            Self::Authorization => 401,
            Self::Business => 400,
            Self::System => 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload shapes
// ---------------------------------------------------------------------------

/// Coarse JSON shape accepted or produced by an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ShapeKind {
    /// Anything, including an empty body.
    #[default]
    Any,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("Delete".parse::<HttpMethod>(), Ok(HttpMethod::Delete));
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn method_serializes_upper_case() {
        let json = serde_json::to_string(&HttpMethod::Post).ok();
        assert_eq!(json.as_deref(), Some("\"POST\""));
    }

    #[test]
    fn simulated_error_statuses() {
        let statuses: Vec<u16> = SimulatedErrorKind::ALL
            .iter()
            .map(|kind| kind.status_code())
            .collect();
        assert_eq!(statuses, vec![408, 401, 400, 500]);
    }

    #[test]
    fn simulated_error_header_parsing() {
        assert_eq!(
            SimulatedErrorKind::from_header_value(" timeout "),
            Some(SimulatedErrorKind::Timeout)
        );
        assert_eq!(
            SimulatedErrorKind::from_header_value("BUSINESS"),
            Some(SimulatedErrorKind::Business)
        );
        assert_eq!(SimulatedErrorKind::from_header_value("Network"), None);
    }
}
