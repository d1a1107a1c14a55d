//! Read-only projections of the system catalog served by the management API.
//!
//! The live registry holds handlers and health probes that cannot be
//! serialized; these structs are the JSON view of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{HttpMethod, ShapeKind};

/// Declared shape of an endpoint's request or response payload.
///
/// Only a basic shape check is performed against it: the top-level JSON
/// kind and the presence of required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShapeDescriptor {
    /// Domain type name (e.g. `SalesOrder`).
    #[serde(default = "default_type_name")]
    pub type_name: String,
    /// Expected top-level JSON kind.
    #[serde(default)]
    pub kind: ShapeKind,
    /// Fields that must be present when `kind` is [`ShapeKind::Object`].
    #[serde(default)]
    pub required_fields: Vec<String>,
}

fn default_type_name() -> String {
    String::from("Any")
}

impl Default for ShapeDescriptor {
    fn default() -> Self {
        Self {
            type_name: default_type_name(),
            kind: ShapeKind::Any,
            required_fields: Vec::new(),
        }
    }
}

impl ShapeDescriptor {
    /// An object shape with the given type name and required fields.
    pub fn object(type_name: &str, required_fields: &[&str]) -> Self {
        Self {
            type_name: type_name.to_owned(),
            kind: ShapeKind::Object,
            required_fields: required_fields.iter().map(|f| (*f).to_owned()).collect(),
        }
    }
}

/// Summary of one routable endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EndpointSummary {
    /// Path template relative to the module, e.g. `/SalesOrders/{id}`.
    pub path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request type name.
    pub request_type: String,
    /// Response type name.
    pub response_type: String,
}

/// JSON view of a module and its endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ModuleInfo {
    /// Module identifier, unique within its system.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Identifier of the owning system.
    pub system_id: String,
    /// Endpoints in declaration order.
    pub endpoints: Vec<EndpointSummary>,
}

/// JSON view of a registered system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemInfo {
    /// System identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Type classifier (e.g. `S4HANA`, `ECC`).
    #[serde(rename = "type")]
    pub system_type: String,
    /// Free-form connection parameters.
    pub connection_parameters: BTreeMap<String, String>,
}
