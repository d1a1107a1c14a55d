//! Declarative system definitions.
//!
//! The same structures are read from the YAML configuration at startup and
//! accepted as JSON by `POST /api/systems`. [`SystemDefinition::build`]
//! turns a definition into a live [`System`] with bound handlers, failing
//! on the first invalid identifier, template or endpoint conflict.

use std::collections::BTreeMap;

use sapsim_types::{HttpMethod, ShapeDescriptor};
use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;
use crate::error::RegistryError;
use crate::handlers::HandlerBinding;
use crate::health::HealthProbe;
use crate::system::{Module, System};

/// Declaration of one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    /// Path template relative to the module.
    pub path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request payload shape.
    #[serde(default)]
    pub request: ShapeDescriptor,
    /// Response payload shape.
    #[serde(default)]
    pub response: ShapeDescriptor,
    /// Handler binding.
    pub handler: HandlerBinding,
}

/// Declaration of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    /// Module identifier.
    pub id: String,
    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// Endpoints in routing declaration order.
    #[serde(default)]
    pub endpoints: Vec<EndpointDefinition>,
}

/// Declaration of one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDefinition {
    /// System identifier.
    pub id: String,
    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// Type classifier.
    #[serde(rename = "type", default = "default_system_type")]
    pub system_type: String,
    /// Free-form connection parameters.
    #[serde(default)]
    pub connection_parameters: BTreeMap<String, String>,
    /// Health probe.
    #[serde(default)]
    pub health: HealthProbe,
    /// Modules.
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
}

fn default_system_type() -> String {
    String::from("S4HANA")
}

impl SystemDefinition {
    /// Build the live system.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] met while building.
    pub fn build(&self) -> Result<System, RegistryError> {
        let name = self.name.as_deref().unwrap_or(&self.id);
        let mut system = System::new(&self.id, name, &self.system_type)?
            .with_parameters(self.connection_parameters.clone())
            .with_health(self.health.clone());

        for module_def in &self.modules {
            let module_name = module_def.name.as_deref().unwrap_or(&module_def.id);
            let mut module = Module::new(&module_def.id, module_name, &self.id)?;
            for endpoint_def in &module_def.endpoints {
                module.add_endpoint(Endpoint::new(
                    endpoint_def.method,
                    &endpoint_def.path,
                    endpoint_def.request.clone(),
                    endpoint_def.response.clone(),
                    endpoint_def.handler.bind(),
                )?)?;
            }
            system = system.with_module(module)?;
        }
        Ok(system)
    }
}
