//! The system registry.
//!
//! Holds the catalog behind an [`ArcSwap`] so request handling reads a
//! consistent snapshot without ever taking a lock. Registrations are
//! serialized by a writer mutex, build the next catalog off to the side
//! and publish it with a single pointer swap: a reader sees either the
//! whole old system or the whole new one.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use futures::future::join_all;
use sapsim_store::DataProvider;
use sapsim_types::HttpMethod;
use tracing::info;

use crate::error::{RegistryError, ResolveError};
use crate::resolve::ResolvedEndpoint;
use crate::system::{Module, System};

type Catalog = BTreeMap<String, Arc<System>>;

/// Shared catalog of systems, modules and endpoints.
#[derive(Debug, Default)]
pub struct SystemRegistry {
    catalog: ArcSwap<Catalog>,
    write_lock: Mutex<()>,
}

impl SystemRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a system.
    ///
    /// The whole record is validated first; on error nothing changes.
    /// Registering the same id again replaces the previous record.
    ///
    /// # Errors
    ///
    /// Returns the [`RegistryError`] found by [`System::validate`].
    pub fn register_system(&self, system: System) -> Result<(), RegistryError> {
        system.validate()?;
        let id = system.id().to_owned();
        let modules = system.modules().len();
        let replaced = self.publish(|catalog| catalog.insert(id.clone(), Arc::new(system)).is_some());
        info!(system_id = %id, modules, replaced, "System registered");
        Ok(())
    }

    /// Replace a system's connection parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SystemNotFound`] if `id` is not registered.
    pub fn update_parameters(
        &self,
        id: &str,
        parameters: BTreeMap<String, String>,
    ) -> Result<Arc<System>, RegistryError> {
        self.publish(|catalog| {
            let current = catalog
                .get(id)
                .ok_or_else(|| RegistryError::SystemNotFound(id.to_owned()))?;
            let updated = Arc::new(current.as_ref().clone().with_parameters(parameters));
            catalog.insert(id.to_owned(), Arc::clone(&updated));
            Ok(updated)
        })
    }

    /// Look up one system.
    pub fn get_system(&self, id: &str) -> Option<Arc<System>> {
        self.catalog.load().get(id).cloned()
    }

    /// Snapshot of every system, ordered by id.
    pub fn get_all_systems(&self) -> Vec<Arc<System>> {
        self.catalog.load().values().cloned().collect()
    }

    /// Modules of a system; `None` when the system is unknown.
    pub fn get_modules_for_system(&self, id: &str) -> Option<Vec<Module>> {
        self.get_system(id).map(|system| system.modules().to_vec())
    }

    /// Run every system's health probe concurrently.
    pub async fn get_system_health_status(&self, data: &DataProvider) -> BTreeMap<String, bool> {
        let systems = self.get_all_systems();
        let checks = systems.iter().map(|system| async move {
            (system.id().to_owned(), system.health().check(data).await)
        });
        join_all(checks).await.into_iter().collect()
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.catalog.load().len()
    }

    /// Whether no system is registered.
    pub fn is_empty(&self) -> bool {
        self.catalog.load().is_empty()
    }

    /// Resolve a request against the current snapshot.
    ///
    /// `path` is relative to the module. Among matching endpoints the one
    /// with the fewest path parameters wins; registration guarantees there
    /// is never a tie.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] naming the first missing level.
    pub fn resolve(
        &self,
        system_id: &str,
        module_id: &str,
        method: HttpMethod,
        path: &str,
    ) -> Result<ResolvedEndpoint, ResolveError> {
        let system = self
            .get_system(system_id)
            .ok_or_else(|| ResolveError::SystemNotFound(system_id.to_owned()))?;
        let module = system
            .module(module_id)
            .ok_or_else(|| ResolveError::ModuleNotFound {
                system_id: system_id.to_owned(),
                module_id: module_id.to_owned(),
            })?;

        module
            .endpoints()
            .iter()
            .filter(|endpoint| endpoint.method == method)
            .filter_map(|endpoint| endpoint.template.matches(path).map(|params| (endpoint, params)))
            .min_by_key(|(endpoint, _)| endpoint.template.param_count())
            .map(|(endpoint, path_params)| ResolvedEndpoint {
                system_id: system_id.to_owned(),
                module_id: module_id.to_owned(),
                endpoint: endpoint.clone(),
                path_params,
            })
            .ok_or_else(|| ResolveError::EndpointNotFound {
                system_id: system_id.to_owned(),
                module_id: module_id.to_owned(),
                method,
                path: path.to_owned(),
            })
    }

    /// Apply `change` to a private copy of the catalog and publish it.
    fn publish<T>(&self, change: impl FnOnce(&mut Catalog) -> T) -> T {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Catalog::clone(&self.catalog.load());
        let out = change(&mut next);
        self.catalog.store(Arc::new(next));
        out
    }
}
