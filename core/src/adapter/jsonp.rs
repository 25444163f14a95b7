//! JSONP adapter.
//!
//! Every call is a GET carrying a callback parameter. The server wraps its
//! JSON in `callback(...)`, which is stripped before parsing. Method and body
//! of the call are ignored, as are custom headers: a script include cannot
//! send any.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::fetch::FetchTransport;
use super::http::{validate_base_url, Transport};
use super::{AdapterConfig, ClientAdapter};
use crate::error::ApiError;
use crate::http::{parse_lenient, Body, HttpMethod, HttpRequest};
use crate::options::RequestOptions;
use crate::path::join_url;

pub const DEFAULT_CALLBACK_PARAMETER: &str = "jsoncallback";

/// GET-only adapter using the JSONP callback convention.
#[derive(Debug, Clone)]
pub struct JsonpAdapter<T = FetchTransport> {
    transport: T,
    config: AdapterConfig,
    callback_parameter: String,
}

impl JsonpAdapter<FetchTransport> {
    pub fn new() -> Result<Self, ApiError> {
        Ok(Self::with_transport(FetchTransport::new()?))
    }
}

impl<T: Transport> JsonpAdapter<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            config: AdapterConfig::new(),
            callback_parameter: DEFAULT_CALLBACK_PARAMETER.to_string(),
        }
    }

    /// Adapter-level callback parameter name. Per-call options override it.
    pub fn with_callback_parameter(mut self, name: &str) -> Self {
        self.callback_parameter = name.to_string();
        self
    }

    pub fn callback_parameter(&self) -> &str {
        &self.callback_parameter
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The GET request for `path` and the callback name it announces.
    pub fn build_request(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<(HttpRequest, String), ApiError> {
        let effective = self.config.build_options(&HttpMethod::Get, options, None)?;
        let parameter = effective
            .callback_parameter
            .as_deref()
            .unwrap_or(&self.callback_parameter);
        let callback = format!("jsonp_{}", Uuid::new_v4().simple());

        let mut url = join_url(self.config.base_url(), path);
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&format!("{parameter}={callback}"));

        let request = HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
            timeout: effective.timeout,
        };
        Ok((request, callback))
    }
}

#[async_trait]
impl<T: Transport> ClientAdapter for JsonpAdapter<T> {
    fn name(&self) -> &'static str {
        "jsonp"
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
        _method: &HttpMethod,
        path: &str,
        _body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let (request, callback) = self.build_request(path, options)?;
        tracing::debug!(adapter = "jsonp", url = %request.url, "dispatching request");
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(ApiError::HttpError {
                status: response.status,
                body: response.body,
            });
        }
        Ok(parse_lenient(unwrap_callback(&response.body, &callback)))
    }
}

/// Strip `callback(` ... `);` around a JSONP payload. Unwrapped bodies are
/// returned as they are.
fn unwrap_callback<'a>(body: &'a str, callback: &str) -> &'a str {
    let trimmed = body.trim().trim_start_matches("/**/").trim_start();
    let Some(rest) = trimmed.strip_prefix(callback) else {
        return body;
    };
    let Some(rest) = rest.trim_start().strip_prefix('(') else {
        return body;
    };
    let rest = rest.trim_end().trim_end_matches(';').trim_end();
    rest.strip_suffix(')').unwrap_or(rest)
}
