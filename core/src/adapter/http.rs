//! Generic HTTP adapter over a pluggable `Transport`.
//!
//! The adapter owns request construction (option merging, body encoding,
//! URL joining) and response interpretation. The transport only moves bytes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{AdapterConfig, ClientAdapter};
use crate::error::ApiError;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};
use crate::options::RequestOptions;
use crate::path::join_url;

/// Executes a fully built `HttpRequest`.
///
/// Implementations return every response that arrived, whatever its status.
/// Only failures below HTTP are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request).await
    }
}

/// Speaks HTTP through `T`.
#[derive(Debug, Clone)]
pub struct HttpAdapter<T> {
    transport: T,
    config: AdapterConfig,
}

impl<T: Transport> HttpAdapter<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            config: AdapterConfig::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request a call would send, without sending it.
    pub fn build_request(
        &self,
        method: &HttpMethod,
        path: &str,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, ApiError> {
        let effective = self.config.build_options(method, options, body)?;
        Ok(HttpRequest {
            url: join_url(self.config.base_url(), path),
            headers: effective.header_pairs(),
            method: effective.method,
            body: effective.body,
            timeout: effective.timeout,
        })
    }
}

#[async_trait]
impl<T: Transport> ClientAdapter for HttpAdapter<T> {
    fn name(&self) -> &'static str {
        self.transport.name()
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut AdapterConfig {
        &mut self.config
    }

    fn validate(&self) -> Result<(), ApiError> {
        validate_base_url(self.config.base_url())
    }

    async fn request(
        &self,
        method: &HttpMethod,
        path: &str,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(method, path, body, options)?;
        tracing::debug!(adapter = self.name(), method = %request.method, url = %request.url, "dispatching request");
        let response = self.transport.execute(request).await.inspect_err(|e| {
            tracing::warn!(adapter = self.name(), error = %e, "transport failed");
        })?;
        response.into_json()
    }
}

/// An empty base URL is allowed (paths must then be absolute). Anything
/// else must be an absolute URL.
pub(crate) fn validate_base_url(base_url: &str) -> Result<(), ApiError> {
    if base_url.is_empty() {
        return Ok(());
    }
    url::Url::parse(base_url)
        .map(|_| ())
        .map_err(|e| ApiError::Configuration(format!("invalid base url {base_url:?}: {e}")))
}
