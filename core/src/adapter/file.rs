//! Read-only adapter serving static JSON files.
//!
//! `GET posts/3?user=john` loads `<base_url>/posts.json`, a JSON array of
//! records, and answers with the records matching `{id: 3, user: john}`.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use super::{found, AdapterConfig, ClientAdapter};
use crate::error::ApiError;
use crate::http::{Body, HttpMethod};
use crate::options::RequestOptions;
use crate::path::{join_url, parse_path};
use crate::query::select;
use crate::types::Collection;

/// Loads a text resource by path.
#[async_trait]
pub trait TextLoader: Send + Sync {
    async fn load_text(&self, path: &str) -> Result<String, ApiError>;
}

/// Loads files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TextLoader for FsLoader {
    async fn load_text(&self, path: &str) -> Result<String, ApiError> {
        let file = self.root.join(path.trim_start_matches('/'));
        tokio::fs::read_to_string(&file).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ApiError::NotFound(path.to_string()),
            _ => ApiError::Transport(format!("{}: {e}", file.display())),
        })
    }
}

/// Answers GET requests from `<key>.json` files.
#[derive(Debug, Clone)]
pub struct FileAdapter<L = FsLoader> {
    loader: L,
    config: AdapterConfig,
}

impl FileAdapter<FsLoader> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_loader(FsLoader::new(root))
    }
}

impl<L: TextLoader> FileAdapter<L> {
    pub fn with_loader(loader: L) -> Self {
        Self {
            loader,
            config: AdapterConfig::new(),
        }
    }

    /// The file a resource key is served from.
    pub fn file_for(&self, key: &str) -> String {
        format!("{}.json", join_url(self.config.base_url(), key))
    }
}

#[async_trait]
impl<L: TextLoader> ClientAdapter for FileAdapter<L> {
    fn name(&self) -> &'static str {
        "file"
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
        _body: Option<Body>,
        _options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        if *method != HttpMethod::Get {
            tracing::info!(adapter = "file", %method, "file adapter is read-only");
            return Err(ApiError::Unsupported {
                adapter: "file",
                method: method.to_string(),
            });
        }

        let parsed = parse_path(path);
        let file = self.file_for(&parsed.key);
        tracing::debug!(adapter = "file", %file, "loading collection");
        let text = self.loader.load_text(&file).await?;
        let collection: Collection =
            serde_json::from_str(&text).map_err(|e| ApiError::DeserializationError(format!("{file}: {e}")))?;

        Ok(found(select(&collection, &parsed.criteria())))
    }
}
