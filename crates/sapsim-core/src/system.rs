//! Systems and their modules: the catalog tree held by the registry.
//!
//! The tree is strict: an [`Endpoint`] lives in exactly one [`Module`], a
//! module in exactly one [`System`]. Identifiers are case-sensitive.

use std::collections::{BTreeMap, HashSet};

use sapsim_types::{ModuleInfo, SystemInfo};

use crate::endpoint::Endpoint;
use crate::error::RegistryError;
use crate::health::HealthProbe;

/// System ids taken by the management routes under `/api/`.
pub const RESERVED_SYSTEM_IDS: &[&str] = &["systems", "health", "monitor"];

/// A functional grouping of endpoints within a system.
#[derive(Debug, Clone)]
pub struct Module {
    id: String,
    name: String,
    system_id: String,
    endpoints: Vec<Endpoint>,
}

impl Module {
    /// Create an empty module owned by `system_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidIdentifier`] for an unusable id.
    pub fn new(id: &str, name: &str, system_id: &str) -> Result<Self, RegistryError> {
        check_identifier(id)?;
        check_identifier(system_id)?;
        Ok(Self {
            id: id.to_owned(),
            name: name.to_owned(),
            system_id: system_id.to_owned(),
            endpoints: Vec::new(),
        })
    }

    /// Append an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ConfigurationConflict`] when the endpoint is
    /// ambiguous with one already present; the module is left unchanged.
    pub fn add_endpoint(&mut self, endpoint: Endpoint) -> Result<(), RegistryError> {
        if let Some(existing) = self.endpoints.iter().find(|e| e.conflicts_with(&endpoint)) {
            return Err(RegistryError::ConfigurationConflict {
                system_id: self.system_id.clone(),
                module_id: self.id.clone(),
                method: endpoint.method,
                existing: existing.template.as_str().to_owned(),
                conflicting: endpoint.template.as_str().to_owned(),
            });
        }
        self.endpoints.push(endpoint);
        Ok(())
    }

    /// Builder form of [`Module::add_endpoint`].
    ///
    /// # Errors
    ///
    /// See [`Module::add_endpoint`].
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Result<Self, RegistryError> {
        self.add_endpoint(endpoint)?;
        Ok(self)
    }

    /// Module identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the owning system.
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    /// Endpoints in declaration order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Re-check every endpoint pair for ambiguity.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError::ConfigurationConflict`] found.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for (i, later) in self.endpoints.iter().enumerate() {
            let mut earlier = self.endpoints.iter().take(i);
            if let Some(existing) = earlier.find(|e| e.conflicts_with(later)) {
                return Err(RegistryError::ConfigurationConflict {
                    system_id: self.system_id.clone(),
                    module_id: self.id.clone(),
                    method: later.method,
                    existing: existing.template.as_str().to_owned(),
                    conflicting: later.template.as_str().to_owned(),
                });
            }
        }
        Ok(())
    }

    /// JSON view including endpoint summaries.
    pub fn info(&self) -> ModuleInfo {
        ModuleInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            system_id: self.system_id.clone(),
            endpoints: self.endpoints.iter().map(Endpoint::summary).collect(),
        }
    }
}

/// A mocked backend instance.
#[derive(Debug, Clone)]
pub struct System {
    id: String,
    name: String,
    system_type: String,
    connection_parameters: BTreeMap<String, String>,
    modules: Vec<Module>,
    health: HealthProbe,
}

impl System {
    /// Create a system with no modules and an always-healthy probe.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidIdentifier`] for an unusable or
    /// reserved id.
    pub fn new(id: &str, name: &str, system_type: &str) -> Result<Self, RegistryError> {
        check_identifier(id)?;
        if RESERVED_SYSTEM_IDS.contains(&id) {
            return Err(RegistryError::InvalidIdentifier(id.to_owned()));
        }
        Ok(Self {
            id: id.to_owned(),
            name: name.to_owned(),
            system_type: system_type.to_owned(),
            connection_parameters: BTreeMap::new(),
            modules: Vec::new(),
            health: HealthProbe::default(),
        })
    }

    /// Replace the connection parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.connection_parameters = parameters;
        self
    }

    /// Replace the health probe.
    #[must_use]
    pub fn with_health(mut self, health: HealthProbe) -> Self {
        self.health = health;
        self
    }

    /// Attach a module.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateModule`] if the id is taken, or
    /// [`RegistryError::InvalidIdentifier`] if the module names another
    /// system as its owner.
    pub fn with_module(mut self, module: Module) -> Result<Self, RegistryError> {
        if module.system_id != self.id {
            return Err(RegistryError::InvalidIdentifier(format!(
                "module {} belongs to {}, not {}",
                module.id, module.system_id, self.id
            )));
        }
        if self.module(&module.id).is_some() {
            return Err(RegistryError::DuplicateModule {
                system_id: self.id.clone(),
                module_id: module.id,
            });
        }
        self.modules.push(module);
        Ok(self)
    }

    /// System identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type classifier.
    pub fn system_type(&self) -> &str {
        &self.system_type
    }

    /// Connection parameters.
    pub const fn connection_parameters(&self) -> &BTreeMap<String, String> {
        &self.connection_parameters
    }

    /// Modules in declaration order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Find a module by exact identifier.
    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// The configured health probe.
    pub const fn health(&self) -> &HealthProbe {
        &self.health
    }

    /// Check the whole tree: unique module ids, correct ownership and
    /// unambiguous endpoints in every module.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] found.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.system_id != self.id {
                return Err(RegistryError::InvalidIdentifier(format!(
                    "module {} belongs to {}, not {}",
                    module.id, module.system_id, self.id
                )));
            }
            if !seen.insert(module.id.as_str()) {
                return Err(RegistryError::DuplicateModule {
                    system_id: self.id.clone(),
                    module_id: module.id.clone(),
                });
            }
            module.validate()?;
        }
        Ok(())
    }

    /// JSON view without modules.
    pub fn info(&self) -> SystemInfo {
        SystemInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            system_type: self.system_type.clone(),
            connection_parameters: self.connection_parameters.clone(),
        }
    }
}

/// Identifiers become URL segments, so they must be non-empty and free of
/// `/` and whitespace.
fn check_identifier(id: &str) -> Result<(), RegistryError> {
    if id.is_empty() || id.chars().any(|c| c == '/' || c.is_whitespace()) {
        return Err(RegistryError::InvalidIdentifier(id.to_owned()));
    }
    Ok(())
}
