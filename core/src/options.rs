//! Request option merging and body encoding.
//!
//! # Design
//! `RequestOptions` has a fixed schema: headers plus a couple of transport
//! extensions. Merging is right-biased: headers merge name by name (names
//! compare case-insensitively, so `content-type` overrides `Content-Type`)
//! and scalar extensions are replaced when the later source sets them. The
//! call's method and body never enter the header map; they are separate
//! fields of `EffectiveOptions`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::{Body, HttpMethod};
use crate::path::build_query_string;

/// Per-endpoint or per-call request configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// JSONP callback parameter name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Accept` and `Content-Type` set to `application/json`.
    pub fn json() -> Self {
        Self::new()
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_callback_parameter(mut self, name: &str) -> Self {
        self.callback_parameter = Some(name.to_string());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set a header, replacing any existing spelling of the same name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Merge `other` over `self`.
    pub fn merge(&mut self, other: &RequestOptions) {
        for (name, value) in &other.headers {
            self.set_header(name, value);
        }
        if other.callback_parameter.is_some() {
            self.callback_parameter.clone_from(&other.callback_parameter);
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
    }
}

fn header_lookup<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// The fully merged configuration of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveOptions {
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Body>,
    pub callback_parameter: Option<String>,
    pub timeout: Option<Duration>,
}

impl EffectiveOptions {
    pub fn content_type(&self) -> Option<&str> {
        header_lookup(&self.headers, "Content-Type")
    }

    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Produces `EffectiveOptions` from a baseline, configured defaults, and a
/// per-call override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptionsBuilder {
    baseline: RequestOptions,
}

impl Default for RequestOptionsBuilder {
    fn default() -> Self {
        Self {
            baseline: RequestOptions::json(),
        }
    }
}

impl RequestOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the JSON baseline, e.g. with `RequestOptions::default()` to
    /// send no headers unless configured.
    pub fn with_baseline(baseline: RequestOptions) -> Self {
        Self { baseline }
    }

    pub fn baseline(&self) -> &RequestOptions {
        &self.baseline
    }

    /// Merge baseline, `defaults`, and `per_call`, then apply the call's
    /// method and body.
    ///
    /// Headers left with an empty value are dropped. A structured body is
    /// encoded as JSON when the effective content type is JSON and as a
    /// form query string for any other content type. Without a content type
    /// the body passes through as given.
    pub fn build(
        &self,
        method: &HttpMethod,
        defaults: &RequestOptions,
        per_call: Option<&RequestOptions>,
        body: Option<Body>,
    ) -> Result<EffectiveOptions, ApiError> {
        let mut merged = self.baseline.clone();
        merged.merge(defaults);
        if let Some(per_call) = per_call {
            merged.merge(per_call);
        }
        merged.headers.retain(|_, value| !value.is_empty());

        let body = match body {
            Some(body) => Some(encode_body(body, merged.content_type())?),
            None => None,
        };

        Ok(EffectiveOptions {
            method: method.clone(),
            headers: merged.headers,
            body,
            callback_parameter: merged.callback_parameter,
            timeout: merged.timeout_ms.map(Duration::from_millis),
        })
    }
}

/// Whether a content type denotes JSON (`application/json` or `application/*+json`).
pub fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.strip_prefix("application/") {
        Some(subtype) => subtype == "json" || subtype.ends_with("+json"),
        None => false,
    }
}

/// Encode a structured body according to `content_type`.
pub fn encode_body(body: Body, content_type: Option<&str>) -> Result<Body, ApiError> {
    let Some(content_type) = content_type else {
        return Ok(body);
    };
    let Body::Json(value) = body else {
        return Ok(body);
    };
    if !(value.is_object() || value.is_array()) {
        return Ok(Body::Json(value));
    }

    if is_json_content_type(content_type) {
        let text = serde_json::to_string(&value).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        return Ok(Body::Text(text));
    }

    let fields = match value {
        Value::Object(fields) => fields,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect::<Map<String, Value>>(),
        _ => Map::new(),
    };
    Ok(Body::Text(build_query_string(&fields, false)))
}
