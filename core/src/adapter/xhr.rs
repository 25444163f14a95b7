//! `ureq`-backed transport: the blocking, XHR-style HTTP adapter.
//!
//! Each request runs on tokio's blocking pool so callers still await it.

use std::time::Duration;

use async_trait::async_trait;
use ureq::typestate::WithBody;

use super::http::{HttpAdapter, Transport};
use crate::error::ApiError;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};

/// HTTP adapter driven by a blocking `ureq` agent.
pub type HttpXhrAdapter = HttpAdapter<XhrTransport>;

impl HttpAdapter<XhrTransport> {
    pub fn new() -> Self {
        Self::with_transport(XhrTransport::new())
    }
}

impl Default for HttpAdapter<XhrTransport> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends requests with a `ureq::Agent` that reports 4xx/5xx as data.
#[derive(Clone)]
pub struct XhrTransport {
    agent: ureq::Agent,
}

impl Default for XhrTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl XhrTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Transport for XhrTransport {
    fn name(&self) -> &'static str {
        "xhr"
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || send_blocking(&agent, request))
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?
    }
}

fn send_blocking(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    let body = request.body.map(Body::into_bytes).transpose()?;
    let url = request.url.as_str();
    let headers = &request.headers;
    let timeout = request.timeout;

    let result = match &request.method {
        HttpMethod::Get => prepare(agent.get(url), headers, timeout).call(),
        HttpMethod::Head => prepare(agent.head(url), headers, timeout).call(),
        HttpMethod::Delete => prepare(agent.delete(url), headers, timeout).call(),
        HttpMethod::Options => prepare(agent.options(url), headers, timeout).call(),
        HttpMethod::Post => send(prepare(agent.post(url), headers, timeout), body),
        HttpMethod::Put => send(prepare(agent.put(url), headers, timeout), body),
        HttpMethod::Patch => send(prepare(agent.patch(url), headers, timeout), body),
        HttpMethod::Other(token) => {
            return Err(ApiError::Transport(format!("xhr transport cannot send {token}")));
        }
    };

    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    // ureq caps string reads at 10 MB by default.
    let body = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_string()
        .map_err(|e| ApiError::Transport(format!("reading response body: {e}")))?;

    Ok(HttpResponse { status, headers, body })
}

/// Copy headers onto `builder` and bound the whole call by `timeout`.
fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
    timeout: Option<Duration>,
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match timeout {
        Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
        None => builder,
    }
}

fn send(
    builder: ureq::RequestBuilder<WithBody>,
    body: Option<Vec<u8>>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(&bytes[..]),
        None => builder.send_empty(),
    }
}
