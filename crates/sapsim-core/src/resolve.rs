//! Executing a resolved endpoint.
//!
//! [`execute`] is the resolution boundary: simulated faults, shape
//! mismatches, handler failures and provider failures all come out as an
//! [`EndpointOutcome`] with a status and a JSON body. Nothing escapes as an
//! error to the transport.

use std::collections::BTreeMap;

use sapsim_store::DataProvider;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::endpoint::{Endpoint, EndpointRequest, check_shape};
use crate::error::HandlerError;
use crate::simulation::{SimulatedFault, parse_header};

/// An endpoint selected for a request, with its captured parameters.
#[derive(Debug, Clone)]
pub struct ResolvedEndpoint {
    /// Owning system.
    pub system_id: String,
    /// Owning module.
    pub module_id: String,
    /// The selected endpoint.
    pub endpoint: Endpoint,
    /// Parameters captured from the path.
    pub path_params: BTreeMap<String, String>,
}

/// The finished response of a dynamic endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointOutcome {
    /// HTTP status code.
    pub status: u16,
    /// JSON response body.
    pub body: Value,
    /// Whether the handler ran.
    pub handler_invoked: bool,
}

impl EndpointOutcome {
    fn failure(status: u16, message: &str) -> Self {
        Self {
            status,
            body: error_body(status, message),
            handler_invoked: false,
        }
    }
}

/// Generic error payload used outside the simulated-fault path.
pub fn error_body(status: u16, message: &str) -> Value {
    json!({ "error": message, "status": status })
}

/// The simulated fault named by the simulation header, if any.
///
/// This is checked as soon as an endpoint is resolved; a `Some` outcome
/// replaces everything that would follow, including body decoding.
pub fn simulate(
    resolved: &ResolvedEndpoint,
    simulation: Option<&str>,
    path: &str,
) -> Option<EndpointOutcome> {
    let kind = parse_header(simulation)?;
    let fault = SimulatedFault::new(kind, &resolved.system_id, &resolved.module_id, path);
    debug!(
        system_id = %resolved.system_id,
        module_id = %resolved.module_id,
        kind = kind.header_value(),
        status = fault.status,
        "Simulated error injected"
    );
    Some(EndpointOutcome {
        status: fault.status,
        body: fault.body,
        handler_invoked: false,
    })
}

/// Run the resolution protocol for one request.
///
/// `simulation` is the raw value of the simulation header, if any. A
/// recognised value short-circuits the handler entirely.
pub async fn execute(
    resolved: &ResolvedEndpoint,
    mut request: EndpointRequest,
    simulation: Option<&str>,
    data: &DataProvider,
) -> EndpointOutcome {
    if let Some(outcome) = simulate(resolved, simulation, &request.path) {
        return outcome;
    }

    let endpoint = &resolved.endpoint;
    if let Err(e) = check_shape(&endpoint.request_shape, request.body.as_ref()) {
        return EndpointOutcome::failure(400, &e.to_string());
    }

    request.path_params.clone_from(&resolved.path_params);
    let result = endpoint.handler.handle(&request, data).await;
    match result {
        Ok(body) => EndpointOutcome {
            status: if endpoint.handler.creates() { 201 } else { 200 },
            body,
            handler_invoked: true,
        },
        Err(e) => {
            let status = match &e {
                HandlerError::BadRequest(_) => 400,
                HandlerError::RecordNotFound { .. } => 404,
                HandlerError::Provider(_) => {
                    warn!(
                        system_id = %resolved.system_id,
                        module_id = %resolved.module_id,
                        error = %e,
                        "Data provider failure"
                    );
                    500
                }
            };
            EndpointOutcome {
                handler_invoked: true,
                ..EndpointOutcome::failure(status, &e.to_string())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::BoxFuture;
    use sapsim_types::{HttpMethod, ShapeDescriptor, SimulatedErrorKind};

    use super::*;
    use crate::endpoint::EndpointHandler;

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
        creates: bool,
        fail: bool,
    }

    impl EndpointHandler for Counting {
        fn handle<'a>(
            &'a self,
            request: &'a EndpointRequest,
            _data: &'a DataProvider,
        ) -> BoxFuture<'a, Result<Value, HandlerError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if self.fail {
                    Err(HandlerError::BadRequest(String::from("rejected")))
                } else {
                    Ok(json!({ "params": request.path_params }))
                }
            })
        }

        fn creates(&self) -> bool {
            self.creates
        }
    }

    fn resolved(handler: Arc<Counting>, shape: ShapeDescriptor) -> ResolvedEndpoint {
        let endpoint =
            Endpoint::new(HttpMethod::Post, "/Orders/{id}", shape, ShapeDescriptor::default(), handler)
                .unwrap();
        let mut path_params = BTreeMap::new();
        path_params.insert(String::from("id"), String::from("7"));
        ResolvedEndpoint {
            system_id: String::from("S4H"),
            module_id: String::from("SD"),
            endpoint,
            path_params,
        }
    }

    #[tokio::test]
    async fn simulated_errors_never_invoke_handler() {
        let data = DataProvider::in_memory();
        let handler = Arc::new(Counting::default());
        let target = resolved(Arc::clone(&handler), ShapeDescriptor::default());

        for (value, status) in [("Timeout", 408), ("Authorization", 401), ("Business", 400), ("System", 500)] {
            let outcome = execute(
                &target,
                EndpointRequest::new(HttpMethod::Post, "/Orders/7"),
                Some(value),
                &data,
            )
            .await;
            assert_eq!(outcome.status, status);
            assert!(!outcome.handler_invoked);
            assert!(outcome.body["error"]["code"].is_string());
        }
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(SimulatedErrorKind::ALL.len(), 4);
    }

    #[test]
    fn simulate_answers_only_for_known_values() {
        let target = resolved(Arc::new(Counting::default()), ShapeDescriptor::default());

        let fault = simulate(&target, Some("timeout"), "/Orders/7").unwrap();
        assert_eq!(fault.status, 408);
        assert!(!fault.handler_invoked);
        assert!(simulate(&target, Some("Gremlins"), "/Orders/7").is_none());
        assert!(simulate(&target, None, "/Orders/7").is_none());
    }

    #[tokio::test]
    async fn no_header_invokes_handler_once() {
        let data = DataProvider::in_memory();
        let handler = Arc::new(Counting::default());
        let target = resolved(Arc::clone(&handler), ShapeDescriptor::default());

        let outcome = execute(&target, EndpointRequest::new(HttpMethod::Post, "/Orders/7"), None, &data).await;
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.body["params"]["id"], "7");
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn creating_handler_returns_201() {
        let data = DataProvider::in_memory();
        let handler = Arc::new(Counting {
            creates: true,
            ..Counting::default()
        });
        let target = resolved(Arc::clone(&handler), ShapeDescriptor::default());

        let outcome = execute(&target, EndpointRequest::new(HttpMethod::Post, "/Orders/7"), None, &data).await;
        assert_eq!(outcome.status, 201);
    }

    #[tokio::test]
    async fn unknown_header_value_is_ignored() {
        let data = DataProvider::in_memory();
        let handler = Arc::new(Counting::default());
        let target = resolved(Arc::clone(&handler), ShapeDescriptor::default());

        let outcome = execute(&target, EndpointRequest::new(HttpMethod::Post, "/Orders/7"), Some("Gremlins"), &data).await;
        assert_eq!(outcome.status, 200);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shape_mismatch_is_400_without_invocation() {
        let data = DataProvider::in_memory();
        let handler = Arc::new(Counting::default());
        let target = resolved(
            Arc::clone(&handler),
            ShapeDescriptor::object("SalesOrder", &["SoldToParty"]),
        );

        let mut request = EndpointRequest::new(HttpMethod::Post, "/Orders/7");
        request.body = Some(json!({"Other": true}));
        let outcome = execute(&target, request, None, &data).await;
        assert_eq!(outcome.status, 400);
        assert!(!outcome.handler_invoked);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_failure_is_400() {
        let data = DataProvider::in_memory();
        let handler = Arc::new(Counting {
            fail: true,
            ..Counting::default()
        });
        let target = resolved(Arc::clone(&handler), ShapeDescriptor::default());

        let outcome = execute(&target, EndpointRequest::new(HttpMethod::Post, "/Orders/7"), None, &data).await;
        assert_eq!(outcome.status, 400);
        assert_eq!(outcome.body["status"], 400);
        assert!(outcome.handler_invoked);
    }
}
