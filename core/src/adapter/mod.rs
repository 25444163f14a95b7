//! Transport adapters behind the uniform `ClientAdapter` capability.
//!
//! # Design
//! Every adapter owns an `AdapterConfig` (base URL, configured defaults,
//! header baseline) reachable through the trait, so registering an endpoint
//! can configure any adapter without probing its shape at runtime. The
//! network adapters are generic over a `Transport` that performs the actual
//! round-trip; the storage and file adapters answer from a record
//! `Collection` using the `query` routines.

pub mod fetch;
pub mod file;
pub mod http;
pub mod jsonp;
pub mod storage;
pub mod xhr;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{Body, HttpMethod};
use crate::options::{EffectiveOptions, RequestOptions, RequestOptionsBuilder};
use crate::types::Collection;

/// Base URL and default options shared by all adapters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterConfig {
    base_url: String,
    defaults: RequestOptions,
    options: RequestOptionsBuilder,
}

impl AdapterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(&mut self, base_url: &str) -> &mut Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Replace the configured defaults.
    pub fn with_defaults(&mut self, defaults: RequestOptions) -> &mut Self {
        self.defaults = defaults;
        self
    }

    /// Merge `defaults` over the configured defaults.
    pub fn merge_defaults(&mut self, defaults: &RequestOptions) -> &mut Self {
        self.defaults.merge(defaults);
        self
    }

    /// Replace the header baseline applied beneath the defaults.
    pub fn with_baseline(&mut self, baseline: RequestOptions) -> &mut Self {
        self.options = RequestOptionsBuilder::with_baseline(baseline);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    /// Effective options for one call.
    pub fn build_options(
        &self,
        method: &HttpMethod,
        per_call: Option<&RequestOptions>,
        body: Option<Body>,
    ) -> Result<EffectiveOptions, ApiError> {
        self.options.build(method, &self.defaults, per_call, body)
    }
}

/// A transport that turns `(method, path, body, options)` into response data.
#[async_trait]
pub trait ClientAdapter: Send + Sync {
    /// Short name used in logs and `Unsupported` errors.
    fn name(&self) -> &'static str;

    fn config(&self) -> &AdapterConfig;

    fn config_mut(&mut self) -> &mut AdapterConfig;

    /// Check the configuration once it is complete.
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }

    /// Dispatch one request. Resolves to the parsed response data.
    async fn request(
        &self,
        method: &HttpMethod,
        path: &str,
        body: Option<Body>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError>;
}

/// A single match is returned unwrapped, anything else as a list.
pub(crate) fn found(mut matches: Collection) -> Value {
    if matches.len() == 1 {
        matches.remove(0)
    } else {
        Value::Array(matches)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn config_builder_chains() {
        let mut config = AdapterConfig::new();
        config
            .with_base_url("http://api.test")
            .with_defaults(RequestOptions::new().with_header("X-A", "1"))
            .merge_defaults(&RequestOptions::new().with_header("X-B", "2"));
        assert_eq!(config.base_url(), "http://api.test");
        assert_eq!(config.defaults().header("x-a"), Some("1"));
        assert_eq!(config.defaults().header("x-b"), Some("2"));
    }

    #[test]
    fn baseline_can_be_replaced() {
        let mut config = AdapterConfig::new();
        config.with_baseline(RequestOptions::new());
        let effective = config.build_options(&HttpMethod::Get, None, None).unwrap();
        assert!(effective.headers.is_empty());
    }

    #[test]
    fn found_unwraps_single_match() {
        assert_eq!(found(vec![json!({"id": 1})]), json!({"id": 1}));
        assert_eq!(found(vec![]), json!([]));
        assert_eq!(found(vec![json!(1), json!(2)]), json!([1, 2]));
    }
}
