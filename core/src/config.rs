//! The endpoint registry.
//!
//! # Design
//! `Config` is an owned value: create it, register endpoints, then hand it
//! (or the `Arc<RestClient>`s it returns) to the code that needs clients.
//! Endpoints are registered either one at a time, with a `Configure` step
//! applied to the adapter's `AdapterConfig`, or in bulk from deserialized
//! `ConfigSettings`.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::adapter::fetch::HttpFetchAdapter;
use crate::adapter::file::FileAdapter;
use crate::adapter::jsonp::JsonpAdapter;
use crate::adapter::storage::StorageAdapter;
use crate::adapter::xhr::HttpXhrAdapter;
use crate::adapter::{AdapterConfig, ClientAdapter};
use crate::error::ApiError;
use crate::options::RequestOptions;
use crate::rest::RestClient;
use crate::storage::FileStorage;

/// How a newly registered adapter is configured.
pub enum Configure {
    /// Use the registry's default base URL, if any.
    Default,
    BaseUrl(String),
    With(Box<dyn FnOnce(&mut AdapterConfig) + Send>),
}

impl Configure {
    pub fn with(configure: impl FnOnce(&mut AdapterConfig) + Send + 'static) -> Self {
        Configure::With(Box::new(configure))
    }

    fn apply(self, config: &mut AdapterConfig, default_base_url: Option<&str>) {
        match self {
            Configure::Default => {
                if let Some(base_url) = default_base_url {
                    config.with_base_url(base_url);
                }
            }
            Configure::BaseUrl(base_url) => {
                config.with_base_url(&base_url);
            }
            Configure::With(configure) => configure(config),
        }
    }
}

impl fmt::Debug for Configure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Configure::Default => f.write_str("Default"),
            Configure::BaseUrl(url) => f.debug_tuple("BaseUrl").field(url).finish(),
            Configure::With(_) => f.write_str("With(..)"),
        }
    }
}

impl From<&str> for Configure {
    fn from(base_url: &str) -> Self {
        Configure::BaseUrl(base_url.to_string())
    }
}

impl From<String> for Configure {
    fn from(base_url: String) -> Self {
        Configure::BaseUrl(base_url)
    }
}

impl From<Option<&str>> for Configure {
    fn from(base_url: Option<&str>) -> Self {
        base_url.map_or(Configure::Default, Configure::from)
    }
}

/// Named `RestClient`s plus the default selection.
#[derive(Debug, Default)]
pub struct Config {
    endpoints: HashMap<String, Arc<RestClient>>,
    default_endpoint: Option<String>,
    default_base_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// The endpoint called `name`, or the default endpoint when `name` is `None`.
    pub fn get_endpoint(&self, name: Option<&str>) -> Option<Arc<RestClient>> {
        let name = name.or(self.default_endpoint.as_deref())?;
        self.endpoints.get(name).cloned()
    }

    pub fn endpoint_exists(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    /// Register an endpoint backed by the fetch adapter.
    pub fn register_endpoint(
        &mut self,
        name: &str,
        configure: impl Into<Configure>,
        defaults: Option<RequestOptions>,
    ) -> Result<&mut Self, ApiError> {
        self.register_endpoint_with(name, HttpFetchAdapter::new()?, configure, defaults)
    }

    /// Register an endpoint backed by `adapter`. A previous endpoint with the
    /// same name is replaced.
    pub fn register_endpoint_with(
        &mut self,
        name: &str,
        adapter: impl ClientAdapter + 'static,
        configure: impl Into<Configure>,
        defaults: Option<RequestOptions>,
    ) -> Result<&mut Self, ApiError> {
        self.register_boxed(name, Box::new(adapter), configure.into(), defaults, false)
    }

    fn register_boxed(
        &mut self,
        name: &str,
        adapter: Box<dyn ClientAdapter>,
        configure: Configure,
        defaults: Option<RequestOptions>,
        traditional: bool,
    ) -> Result<&mut Self, ApiError> {
        let client = build_client(
            name,
            adapter,
            configure,
            defaults,
            traditional,
            self.default_base_url.as_deref(),
        )?;
        self.endpoints.insert(name.to_string(), Arc::new(client));
        Ok(self)
    }

    /// Make `name` the endpoint returned by `get_endpoint(None)`.
    ///
    /// The name need not be registered yet.
    pub fn set_default_endpoint(&mut self, name: &str) -> &mut Self {
        self.default_endpoint = Some(name.to_string());
        self
    }

    pub fn default_endpoint(&self) -> Option<&str> {
        self.default_endpoint.as_deref()
    }

    /// Base URL for endpoints registered with `Configure::Default`.
    pub fn set_default_base_url(&mut self, base_url: &str) -> &mut Self {
        self.default_base_url = Some(base_url.to_string());
        self
    }

    /// Register every endpoint described by `settings`.
    ///
    /// All or nothing: every endpoint is built and validated before any is
    /// registered, so on error the registry is left as it was.
    pub fn configure(&mut self, settings: ConfigSettings) -> Result<&mut Self, ApiError> {
        let default_base_url = settings.default_base_url.as_deref().or(self.default_base_url.as_deref());

        let mut staged = Vec::with_capacity(settings.endpoints.len());
        let mut default_endpoint = None;
        for endpoint in settings.endpoints {
            let client = build_client(
                &endpoint.name,
                endpoint.adapter.build()?,
                Configure::from(endpoint.endpoint.as_deref()),
                endpoint.defaults,
                endpoint.traditional,
                default_base_url,
            )?;
            if endpoint.default {
                default_endpoint = Some(endpoint.name.clone());
            }
            staged.push((endpoint.name, client));
        }

        if let Some(name) = settings.default_endpoint {
            let known = self.endpoint_exists(&name) || staged.iter().any(|(staged, _)| *staged == name);
            if !known {
                return Err(ApiError::Configuration(format!(
                    "default endpoint {name:?} is not registered"
                )));
            }
            default_endpoint = Some(name);
        }

        if let Some(base_url) = settings.default_base_url {
            self.default_base_url = Some(base_url);
        }
        for (name, client) in staged {
            self.endpoints.insert(name, Arc::new(client));
        }
        if let Some(name) = default_endpoint {
            self.default_endpoint = Some(name);
        }
        Ok(self)
    }
}

/// Configure and validate `adapter`, then wrap it as the endpoint `name`.
fn build_client(
    name: &str,
    mut adapter: Box<dyn ClientAdapter>,
    configure: Configure,
    defaults: Option<RequestOptions>,
    traditional: bool,
    default_base_url: Option<&str>,
) -> Result<RestClient, ApiError> {
    configure.apply(adapter.config_mut(), default_base_url);
    if let Some(defaults) = &defaults {
        adapter.config_mut().merge_defaults(defaults);
    }
    adapter.validate()?;

    tracing::debug!(
        endpoint = name,
        adapter = adapter.name(),
        base_url = adapter.config().base_url(),
        "registering endpoint"
    );
    Ok(RestClient::from_boxed(adapter)
        .with_endpoint(name)
        .with_traditional_uri_templates(traditional))
}

/// Bulk registry configuration, typically read from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSettings {
    #[serde(default)]
    pub default_base_url: Option<String>,
    #[serde(default)]
    pub default_endpoint: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<EndpointSettings>,
}

impl ConfigSettings {
    pub fn from_json(text: &str) -> Result<Self, ApiError> {
        serde_json::from_str(text).map_err(|e| ApiError::Configuration(format!("invalid settings: {e}")))
    }
}

/// One endpoint in `ConfigSettings`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSettings {
    pub name: String,
    /// Base URL. Falls back to `defaultBaseUrl`.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub defaults: Option<RequestOptions>,
    #[serde(default)]
    pub adapter: AdapterSettings,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub traditional: bool,
}

/// Which adapter backs an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AdapterSettings {
    #[default]
    Fetch,
    Xhr,
    Jsonp {
        #[serde(default, rename = "callbackParameter")]
        callback_parameter: Option<String>,
    },
    File {
        root: PathBuf,
    },
    /// In memory unless `path` names a file to persist to.
    Storage {
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default)]
        namespace: Option<String>,
    },
}

impl AdapterSettings {
    pub fn build(&self) -> Result<Box<dyn ClientAdapter>, ApiError> {
        let adapter: Box<dyn ClientAdapter> = match self {
            AdapterSettings::Fetch => Box::new(HttpFetchAdapter::new()?),
            AdapterSettings::Xhr => Box::new(HttpXhrAdapter::new()),
            AdapterSettings::Jsonp { callback_parameter } => {
                let adapter = match callback_parameter {
                    Some(name) => JsonpAdapter::new()?.with_callback_parameter(name),
                    None => JsonpAdapter::new()?,
                };
                Box::new(adapter)
            }
            AdapterSettings::File { root } => Box::new(FileAdapter::new(root.clone())),
            AdapterSettings::Storage { path, namespace } => {
                let namespace = namespace.as_deref();
                match path {
                    Some(path) => storage_adapter(StorageAdapter::new(FileStorage::open(path.clone())?), namespace),
                    None => storage_adapter(StorageAdapter::in_memory(), namespace),
                }
            }
        };
        Ok(adapter)
    }
}

fn storage_adapter<S>(adapter: StorageAdapter<S>, namespace: Option<&str>) -> Box<dyn ClientAdapter>
where
    S: crate::storage::Storage + 'static,
{
    match namespace {
        Some(namespace) => Box::new(adapter.with_namespace(namespace)),
        None => Box::new(adapter),
    }
}
