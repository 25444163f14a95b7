//! The CRUD façade over a `ClientAdapter`.
//!
//! # Design
//! `RestClient` holds an adapter, the endpoint name it was registered under,
//! and a `PathBuilder`. It carries no per-request state: every call lowers to
//! exactly one `request(method, path, body, options)` on the adapter.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::adapter::ClientAdapter;
use crate::error::ApiError;
use crate::http::{Body, HttpMethod};
use crate::options::RequestOptions;
use crate::path::PathBuilder;
use crate::types::Criteria;

/// Uniform CRUD client for one endpoint.
pub struct RestClient {
    adapter: Box<dyn ClientAdapter>,
    endpoint: Option<String>,
    paths: PathBuilder,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("adapter", &self.adapter.name())
            .field("base_url", &self.adapter.config().base_url())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl RestClient {
    pub fn new(adapter: impl ClientAdapter + 'static) -> Self {
        Self::from_boxed(Box::new(adapter))
    }

    pub fn from_boxed(adapter: Box<dyn ClientAdapter>) -> Self {
        Self {
            adapter,
            endpoint: None,
            paths: PathBuilder::new(),
        }
    }

    pub fn with_endpoint(mut self, name: &str) -> Self {
        self.endpoint = Some(name.to_string());
        self
    }

    /// Serialize array criteria as repeated keys instead of `key[]`.
    pub fn with_traditional_uri_templates(mut self, traditional: bool) -> Self {
        self.paths = PathBuilder::traditional(traditional);
        self
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn adapter(&self) -> &dyn ClientAdapter {
        self.adapter.as_ref()
    }

    pub fn path_builder(&self) -> PathBuilder {
        self.paths
    }

    /// Send one request. `method` may use any casing.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let method = HttpMethod::parse(method);
        self.adapter.request(&method, path, body, options).await
    }

    /// `request`, decoding the response into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<T, ApiError> {
        let value = self.request(method, path, body, options).await?;
        serde_json::from_value(value).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    /// GET `resource`, filtered by an id or field criteria.
    pub async fn find(
        &self,
        resource: &str,
        criteria: Option<Criteria>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let path = self.paths.build(resource, criteria.as_ref(), None);
        self.request("get", &path, None, options).await
    }

    /// GET `resource/id`, with optional criteria.
    pub async fn find_one(
        &self,
        resource: &str,
        id: impl Into<Criteria>,
        criteria: Option<Criteria>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let path = self.paths.build(resource, Some(&id.into()), criteria.as_ref());
        self.request("get", &path, None, options).await
    }

    /// POST `body` to `resource`.
    pub async fn post(
        &self,
        resource: &str,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        self.request("post", resource, body, options).await
    }

    /// Alias of `post`.
    pub async fn create(
        &self,
        resource: &str,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        self.post(resource, body, options).await
    }

    /// PUT `body` to the records selected by `criteria`.
    pub async fn update(
        &self,
        resource: &str,
        criteria: Option<Criteria>,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let path = self.paths.build(resource, criteria.as_ref(), None);
        self.request("put", &path, body, options).await
    }

    /// PUT `body` to `resource/id`.
    pub async fn update_one(
        &self,
        resource: &str,
        id: impl Into<Criteria>,
        criteria: Option<Criteria>,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let path = self.paths.build(resource, Some(&id.into()), criteria.as_ref());
        self.request("put", &path, body, options).await
    }

    /// PATCH the records selected by `criteria`.
    pub async fn patch(
        &self,
        resource: &str,
        criteria: Option<Criteria>,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let path = self.paths.build(resource, criteria.as_ref(), None);
        self.request("patch", &path, body, options).await
    }

    /// PATCH `resource/id`.
    pub async fn patch_one(
        &self,
        resource: &str,
        id: impl Into<Criteria>,
        criteria: Option<Criteria>,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let path = self.paths.build(resource, Some(&id.into()), criteria.as_ref());
        self.request("patch", &path, body, options).await
    }

    /// DELETE the records selected by `criteria`.
    pub async fn destroy(
        &self,
        resource: &str,
        criteria: Option<Criteria>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let path = self.paths.build(resource, criteria.as_ref(), None);
        self.request("delete", &path, None, options).await
    }

    /// DELETE `resource/id`.
    pub async fn destroy_one(
        &self,
        resource: &str,
        id: impl Into<Criteria>,
        criteria: Option<Criteria>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let path = self.paths.build(resource, Some(&id.into()), criteria.as_ref());
        self.request("delete", &path, None, options).await
    }
}
