//! HTTP transport types shared by the network adapters.
//!
//! # Design
//! Requests and responses are plain data. Adapters build an `HttpRequest`,
//! hand it to a `Transport` which performs the I/O, and interpret the
//! returned `HttpResponse`. Keeping the round-trip behind this boundary means
//! the interpretation rules (success band, lenient empty bodies) live in one
//! place and are testable without a network.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::error::ApiError;

/// HTTP method for a request, always held in canonical upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Any other token, upper-cased.
    Other(String),
}

impl HttpMethod {
    /// Normalize a method token of any casing.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(token) => token,
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(token: &str) -> Self {
        HttpMethod::parse(token)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request payload.
///
/// Only `Json` bodies holding an object or array are ever re-encoded by the
/// options builder. `Text` and `Bytes` are treated as already in wire form.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl Body {
    /// Whether the body is object-shaped and therefore subject to encoding.
    pub fn is_structured(&self) -> bool {
        matches!(self, Body::Json(Value::Object(_)) | Body::Json(Value::Array(_)))
    }

    /// The bytes that go on the wire.
    pub fn into_bytes(self) -> Result<Vec<u8>, ApiError> {
        match self {
            Body::Json(value) => {
                serde_json::to_vec(&value).map_err(|e| ApiError::SerializationError(e.to_string()))
            }
            Body::Text(text) => Ok(text.into_bytes()),
            Body::Bytes(bytes) => Ok(bytes),
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
    pub timeout: Option<Duration>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Statuses in `[200, 400)` count as success.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    /// Interpret the response: parsed JSON on success, `Value::Null` when a
    /// successful body is empty or not JSON, the raw response otherwise.
    pub fn into_json(self) -> Result<Value, ApiError> {
        if !self.is_success() {
            return Err(ApiError::HttpError {
                status: self.status,
                body: self.body,
            });
        }
        Ok(parse_lenient(&self.body))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Parse a success body, falling back to `Value::Null`.
pub(crate) fn parse_lenient(body: &str) -> Value {
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            if !body.trim().is_empty() {
                tracing::debug!(error = %e, "response body is not JSON, resolving to null");
            }
            Value::Null
        }
    }
}
