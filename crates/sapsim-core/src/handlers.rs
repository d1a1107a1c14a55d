//! Built-in endpoint handlers and the configuration binding that selects them.
//!
//! Collection handlers speak a small subset of the OData V2 JSON format
//! used by SAP Gateway services: single records come back as `{"d": record}`
//! and lists as `{"d": {"results": [...]}}`.
//!
//! | Binding | Handler | Success |
//! |---------|---------|---------|
//! | `list` | [`ListRecords`] | `200` |
//! | `read` | [`ReadRecord`] | `200` |
//! | `create` | [`CreateRecord`] | `201` |
//! | `update` | [`UpdateRecord`] | `200` |
//! | `delete` | [`DeleteRecord`] | `200` |
//! | `static` | [`StaticResponse`] | `200` |
//! | `echo` | [`EchoRequest`] | `200` |

use std::sync::Arc;

use futures::future::BoxFuture;
use sapsim_store::{DataProvider, RecordFilter};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::endpoint::{EndpointHandler, EndpointRequest};
use crate::error::HandlerError;

/// Query parameter limiting the size of a list (OData `$top`).
pub const TOP_PARAM: &str = "$top";

/// Handler selection as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerBinding {
    /// List a collection, filtered by query parameters.
    List {
        /// Collection name.
        collection: String,
    },
    /// Read one record by path parameter.
    Read {
        /// Collection name.
        collection: String,
        /// Path parameter holding the key.
        #[serde(default = "default_key_param")]
        key_param: String,
    },
    /// Store the request body as a new record.
    Create {
        /// Collection name.
        collection: String,
        /// Body field holding the key; generated when absent.
        key_field: String,
    },
    /// Merge the request body into an existing record.
    Update {
        /// Collection name.
        collection: String,
        /// Path parameter holding the key.
        #[serde(default = "default_key_param")]
        key_param: String,
    },
    /// Remove a record.
    Delete {
        /// Collection name.
        collection: String,
        /// Path parameter holding the key.
        #[serde(default = "default_key_param")]
        key_param: String,
    },
    /// Always return the same body.
    Static {
        /// Response payload.
        body: Value,
    },
    /// Reflect the decoded request.
    Echo,
}

fn default_key_param() -> String {
    String::from("id")
}

impl HandlerBinding {
    /// Instantiate the handler this binding names.
    pub fn bind(&self) -> Arc<dyn EndpointHandler> {
        match self {
            Self::List { collection } => Arc::new(ListRecords {
                collection: collection.clone(),
            }),
            Self::Read {
                collection,
                key_param,
            } => Arc::new(ReadRecord {
                collection: collection.clone(),
                key_param: key_param.clone(),
            }),
            Self::Create {
                collection,
                key_field,
            } => Arc::new(CreateRecord {
                collection: collection.clone(),
                key_field: key_field.clone(),
            }),
            Self::Update {
                collection,
                key_param,
            } => Arc::new(UpdateRecord {
                collection: collection.clone(),
                key_param: key_param.clone(),
            }),
            Self::Delete {
                collection,
                key_param,
            } => Arc::new(DeleteRecord {
                collection: collection.clone(),
                key_param: key_param.clone(),
            }),
            Self::Static { body } => Arc::new(StaticResponse::new(body.clone())),
            Self::Echo => Arc::new(EchoRequest),
        }
    }
}

fn key_from_path<'a>(request: &'a EndpointRequest, key_param: &str) -> Result<&'a str, HandlerError> {
    request
        .path_param(key_param)
        .ok_or_else(|| HandlerError::BadRequest(format!("missing path parameter {key_param}")))
}

fn body_object(request: &EndpointRequest) -> Result<serde_json::Map<String, Value>, HandlerError> {
    match &request.body {
        Some(Value::Object(fields)) => Ok(fields.clone()),
        Some(_) => Err(HandlerError::BadRequest(String::from(
            "request body must be a JSON object",
        ))),
        None => Err(HandlerError::BadRequest(String::from("request body is required"))),
    }
}

// ---------------------------------------------------------------------------
// Collection handlers
// ---------------------------------------------------------------------------

/// Lists a collection. Query parameters other than `$top` become equality
/// filters on top-level fields.
#[derive(Debug)]
pub struct ListRecords {
    collection: String,
}

impl EndpointHandler for ListRecords {
    fn handle<'a>(
        &'a self,
        request: &'a EndpointRequest,
        data: &'a DataProvider,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            let mut filter = RecordFilter::all();
            for (field, value) in &request.query {
                if field == TOP_PARAM {
                    let top = value.parse::<usize>().map_err(|e| {
                        HandlerError::BadRequest(format!("invalid {TOP_PARAM}: {e}"))
                    })?;
                    filter = filter.limit(top);
                } else {
                    filter = filter.with(field, value);
                }
            }
            let records = data.list(&self.collection, &filter).await?;
            Ok(json!({ "d": { "results": records } }))
        })
    }
}

/// Reads one record keyed by a path parameter.
#[derive(Debug)]
pub struct ReadRecord {
    collection: String,
    key_param: String,
}

impl EndpointHandler for ReadRecord {
    fn handle<'a>(
        &'a self,
        request: &'a EndpointRequest,
        data: &'a DataProvider,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            let key = key_from_path(request, &self.key_param)?;
            match data.read(&self.collection, key).await? {
                Some(record) => Ok(json!({ "d": record })),
                None => Err(HandlerError::RecordNotFound {
                    collection: self.collection.clone(),
                    key: key.to_owned(),
                }),
            }
        })
    }
}

/// Stores the body as a new record, generating a key when the body has none.
#[derive(Debug)]
pub struct CreateRecord {
    collection: String,
    key_field: String,
}

impl EndpointHandler for CreateRecord {
    fn handle<'a>(
        &'a self,
        request: &'a EndpointRequest,
        data: &'a DataProvider,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            let mut fields = body_object(request)?;
            let key = match fields.get(&self.key_field) {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Null) | None => {
                    let generated = Uuid::now_v7().simple().to_string().to_uppercase();
                    fields.insert(self.key_field.clone(), Value::String(generated.clone()));
                    generated
                }
                Some(_) => {
                    return Err(HandlerError::BadRequest(format!(
                        "{} must be a string or number",
                        self.key_field
                    )));
                }
            };
            let record = Value::Object(fields);
            data.write(&self.collection, &key, record.clone()).await?;
            Ok(json!({ "d": record }))
        })
    }

    fn creates(&self) -> bool {
        true
    }
}

/// Merges the body's top-level fields into an existing record.
#[derive(Debug)]
pub struct UpdateRecord {
    collection: String,
    key_param: String,
}

impl EndpointHandler for UpdateRecord {
    fn handle<'a>(
        &'a self,
        request: &'a EndpointRequest,
        data: &'a DataProvider,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            let key = key_from_path(request, &self.key_param)?;
            let changes = body_object(request)?;
            let Some(existing) = data.read(&self.collection, key).await? else {
                return Err(HandlerError::RecordNotFound {
                    collection: self.collection.clone(),
                    key: key.to_owned(),
                });
            };
            let Value::Object(mut fields) = existing else {
                return Err(HandlerError::BadRequest(format!(
                    "record {key} in {} is not an object and cannot be merged",
                    self.collection
                )));
            };
            fields.extend(changes);
            let record = Value::Object(fields);
            data.write(&self.collection, key, record.clone()).await?;
            Ok(json!({ "d": record }))
        })
    }
}

/// Removes a record.
#[derive(Debug)]
pub struct DeleteRecord {
    collection: String,
    key_param: String,
}

impl EndpointHandler for DeleteRecord {
    fn handle<'a>(
        &'a self,
        request: &'a EndpointRequest,
        data: &'a DataProvider,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            let key = key_from_path(request, &self.key_param)?;
            if data.delete(&self.collection, key).await? {
                Ok(json!({ "d": { "deleted": key } }))
            } else {
                Err(HandlerError::RecordNotFound {
                    collection: self.collection.clone(),
                    key: key.to_owned(),
                })
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Data-free handlers
// ---------------------------------------------------------------------------

/// Returns a fixed payload.
#[derive(Debug)]
pub struct StaticResponse {
    body: Value,
}

impl StaticResponse {
    /// Wrap a payload.
    pub const fn new(body: Value) -> Self {
        Self { body }
    }
}

impl EndpointHandler for StaticResponse {
    fn handle<'a>(
        &'a self,
        _request: &'a EndpointRequest,
        _data: &'a DataProvider,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move { Ok(self.body.clone()) })
    }
}

/// Reflects the decoded request back to the caller.
#[derive(Debug)]
pub struct EchoRequest;

impl EndpointHandler for EchoRequest {
    fn handle<'a>(
        &'a self,
        request: &'a EndpointRequest,
        _data: &'a DataProvider,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            Ok(json!({
                "method": request.method,
                "path": request.path,
                "path_params": request.path_params,
                "query": request.query,
                "body": request.body,
            }))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sapsim_types::HttpMethod;

    use super::*;

    fn request(method: HttpMethod, key: Option<&str>, body: Option<Value>) -> EndpointRequest {
        let mut request = EndpointRequest::new(method, "/Materials");
        if let Some(key) = key {
            request.path_params.insert(String::from("id"), key.to_owned());
        }
        request.body = body;
        request
    }

    fn binding(yaml: &str) -> Arc<dyn EndpointHandler> {
        serde_yml::from_str::<HandlerBinding>(yaml).unwrap().bind()
    }

    #[tokio::test]
    async fn update_refuses_to_merge_into_non_object() {
        let data = DataProvider::in_memory();
        data.write("Materials", "MAT-9", json!("legacy")).await.unwrap();
        let update = binding("kind: update\ncollection: Materials\n");

        let result = update
            .handle(
                &request(HttpMethod::Put, Some("MAT-9"), Some(json!({"Unit": "KG"}))),
                &data,
            )
            .await;
        assert!(matches!(result, Err(HandlerError::BadRequest(_))));
        assert_eq!(data.read("Materials", "MAT-9").await.unwrap(), Some(json!("legacy")));
    }

    #[tokio::test]
    async fn create_then_read_then_update_then_delete() {
        let data = DataProvider::in_memory();
        let create = binding("kind: create\ncollection: Materials\nkey_field: Material\n");
        let read = binding("kind: read\ncollection: Materials\n");
        let update = binding("kind: update\ncollection: Materials\n");
        let delete = binding("kind: delete\ncollection: Materials\n");
        assert!(create.creates());
        assert!(!read.creates());

        let created = create
            .handle(
                &request(HttpMethod::Post, None, Some(json!({"Material": "MAT-1", "Unit": "EA"}))),
                &data,
            )
            .await
            .unwrap();
        assert_eq!(created["d"]["Material"], "MAT-1");

        let fetched = read
            .handle(&request(HttpMethod::Get, Some("MAT-1"), None), &data)
            .await
            .unwrap();
        assert_eq!(fetched["d"]["Unit"], "EA");

        let updated = update
            .handle(
                &request(HttpMethod::Put, Some("MAT-1"), Some(json!({"Unit": "KG"}))),
                &data,
            )
            .await
            .unwrap();
        assert_eq!(updated["d"]["Unit"], "KG");
        assert_eq!(updated["d"]["Material"], "MAT-1");

        let deleted = delete
            .handle(&request(HttpMethod::Delete, Some("MAT-1"), None), &data)
            .await
            .unwrap();
        assert_eq!(deleted["d"]["deleted"], "MAT-1");

        let gone = read
            .handle(&request(HttpMethod::Get, Some("MAT-1"), None), &data)
            .await;
        assert!(matches!(gone, Err(HandlerError::RecordNotFound { .. })));
    }

    #[tokio::test]
    async fn create_generates_missing_key() {
        let data = DataProvider::in_memory();
        let create = binding("kind: create\ncollection: Notes\nkey_field: Id\n");
        let created = create
            .handle(&request(HttpMethod::Post, None, Some(json!({"Text": "hi"}))), &data)
            .await
            .unwrap();
        let id = created["d"]["Id"].as_str().unwrap().to_owned();
        assert!(!id.is_empty());
        assert!(data.read("Notes", &id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_rejects_non_object_body() {
        let data = DataProvider::in_memory();
        let create = binding("kind: create\ncollection: Notes\nkey_field: Id\n");
        let result = create
            .handle(&request(HttpMethod::Post, None, Some(json!([1]))), &data)
            .await;
        assert!(matches!(result, Err(HandlerError::BadRequest(_))));
    }

    #[tokio::test]
    async fn list_filters_and_limits() {
        let data = DataProvider::in_memory();
        for (key, status) in [("1", "A"), ("2", "B"), ("3", "A"), ("4", "A")] {
            data.write("Orders", key, json!({"Status": status})).await.unwrap();
        }
        let list = binding("kind: list\ncollection: Orders\n");

        let mut req = request(HttpMethod::Get, None, None);
        req.query.insert(String::from("Status"), String::from("A"));
        req.query.insert(String::from(TOP_PARAM), String::from("2"));
        let out = list.handle(&req, &data).await.unwrap();
        assert_eq!(out["d"]["results"].as_array().map(Vec::len), Some(2));

        req.query.insert(String::from(TOP_PARAM), String::from("x"));
        let bad = list.handle(&req, &data).await;
        assert!(matches!(bad, Err(HandlerError::BadRequest(_))));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let data = DataProvider::in_memory();
        let list = binding("kind: list\ncollection: \"../etc\"\n");
        let result = list
            .handle(&request(HttpMethod::Get, None, None), &data)
            .await;
        assert!(matches!(result, Err(HandlerError::Provider(_))));
    }

    #[tokio::test]
    async fn echo_reflects_request() {
        let data = DataProvider::in_memory();
        let echo = binding("kind: echo\n");
        let out = echo
            .handle(&request(HttpMethod::Post, Some("7"), Some(json!({"a": 1}))), &data)
            .await
            .unwrap();
        assert_eq!(out["method"], "POST");
        assert_eq!(out["path_params"]["id"], "7");
        assert_eq!(out["body"]["a"], 1);
    }
}
