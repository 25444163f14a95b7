//! Adapter emulating a REST backend on top of a `Storage` medium.
//!
//! # Design
//! Each resource key maps to one storage entry holding the JSON-encoded
//! `Collection`, stored under `{namespace}-{base_url}{key}`. Mutating verbs
//! rewrite the whole collection. Read-modify-write cycles are serialized
//! per adapter so concurrent calls on one adapter cannot lose writes or hand
//! out the same id twice. Adapters sharing a medium do not coordinate.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::{found, AdapterConfig, ClientAdapter};
use crate::error::ApiError;
use crate::http::{Body, HttpMethod};
use crate::options::RequestOptions;
use crate::path::parse_path;
use crate::query::{insert, patch, remove, replace, select};
use crate::storage::{MemoryStorage, Storage};
use crate::types::Collection;

pub const DEFAULT_NAMESPACE: &str = "rest-endpoint";

/// REST verbs answered from a storage medium.
#[derive(Debug)]
pub struct StorageAdapter<S = MemoryStorage> {
    storage: S,
    namespace: String,
    config: AdapterConfig,
    write_lock: Mutex<()>,
}

impl StorageAdapter<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl<S: Storage> StorageAdapter<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            namespace: DEFAULT_NAMESPACE.to_string(),
            config: AdapterConfig::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The storage entry backing `resource_key`.
    pub fn storage_key(&self, resource_key: &str) -> String {
        format!("{}-{}{}", self.namespace, self.config.base_url(), resource_key)
    }

    /// Remove every collection under this adapter's namespace.
    pub fn clear(&self) -> Result<usize, ApiError> {
        self.storage.clear_prefix(&format!("{}-", self.namespace))
    }

    /// The stored collection, empty when none exists yet.
    pub fn load(&self, key: &str) -> Result<Collection, ApiError> {
        match self.storage.get_item(key)? {
            Some(text) => {
                serde_json::from_str(&text).map_err(|e| ApiError::DeserializationError(format!("{key}: {e}")))
            }
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, key: &str, collection: &Collection) -> Result<(), ApiError> {
        let text = serde_json::to_string(collection).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        self.storage.set_item(key, &text)
    }

    async fn post(&self, key: &str, body: Value) -> Result<Value, ApiError> {
        let records = match &body {
            Value::Array(items) => items.clone(),
            single => vec![single.clone()],
        };
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load(key)?;
        insert(&mut collection, records)?;
        self.save(key, &collection)?;
        Ok(body)
    }

    async fn put_or_patch(
        &self,
        key: &str,
        path: &str,
        criteria: &Map<String, Value>,
        body: Value,
        merge: bool,
    ) -> Result<Value, ApiError> {
        let fields = into_fields(body)?;
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load(key)?;
        let changed = if merge {
            patch(&mut collection, criteria, &fields)
        } else {
            replace(&mut collection, criteria, &fields)
        };
        if changed.is_empty() && !criteria.is_empty() {
            return Err(ApiError::NotFound(path.to_string()));
        }
        self.save(key, &collection)?;
        Ok(Value::Array(changed))
    }

    async fn delete(&self, key: &str, path: &str, criteria: &Map<String, Value>) -> Result<Value, ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load(key)?;
        if criteria.is_empty() {
            self.storage.remove_item(key)?;
            return Ok(Value::Array(collection));
        }
        let removed = remove(&mut collection, criteria);
        if removed.is_empty() {
            return Err(ApiError::NotFound(path.to_string()));
        }
        self.save(key, &collection)?;
        Ok(Value::Array(removed))
    }
}

#[async_trait]
impl<S: Storage> ClientAdapter for StorageAdapter<S> {
    fn name(&self) -> &'static str {
        "storage"
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut AdapterConfig {
        &mut self.config
    }

    async fn request(
        &self,
        method: &HttpMethod,
        path: &str,
        body: Option<Body>,
        _options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let parsed = parse_path(path);
        let key = self.storage_key(&parsed.key);
        let criteria = parsed.criteria();
        tracing::debug!(adapter = "storage", %method, %key, "handling request");

        match method {
            HttpMethod::Get => Ok(found(select(&self.load(&key)?, &criteria))),
            HttpMethod::Post => self.post(&key, body_value(body)?).await,
            HttpMethod::Put => self.put_or_patch(&key, path, &criteria, body_value(body)?, false).await,
            HttpMethod::Patch => self.put_or_patch(&key, path, &criteria, body_value(body)?, true).await,
            HttpMethod::Delete => self.delete(&key, path, &criteria).await,
            other => {
                tracing::info!(adapter = "storage", method = %other, "unsupported verb");
                Err(ApiError::Unsupported {
                    adapter: "storage",
                    method: other.to_string(),
                })
            }
        }
    }
}

/// Decode a request body into JSON. A missing body is `null`.
fn body_value(body: Option<Body>) -> Result<Value, ApiError> {
    match body {
        None => Ok(Value::Null),
        Some(Body::Json(value)) => Ok(value),
        Some(Body::Text(text)) => {
            serde_json::from_str(&text).map_err(|e| ApiError::DeserializationError(e.to_string()))
        }
        Some(Body::Bytes(bytes)) => {
            serde_json::from_slice(&bytes).map_err(|e| ApiError::DeserializationError(e.to_string()))
        }
    }
}

fn into_fields(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(fields) => Ok(fields),
        Value::Null => Ok(Map::new()),
        _ => Err(ApiError::SerializationError(
            "update body must be a JSON object".to_string(),
        )),
    }
}
