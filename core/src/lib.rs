//! Named REST endpoints over interchangeable transports.
//!
//! # Overview
//! A `Config` registry maps endpoint names to `RestClient`s. Each client
//! lowers CRUD calls (`find`, `post`, `update`, `patch`, `destroy`, ...) into
//! one `(method, path, body, options)` request on its `ClientAdapter`:
//!
//! - `HttpFetchAdapter` (reqwest) and `HttpXhrAdapter` (ureq) speak HTTP.
//! - `JsonpAdapter` issues callback-wrapped GETs.
//! - `FileAdapter` serves static `<resource>.json` files, read-only.
//! - `StorageAdapter` emulates a REST backend over a key/value `Storage`.
//!
//! # Design
//! - Request construction is pure: `PathBuilder` builds paths and
//!   `RequestOptionsBuilder` merges headers and encodes bodies.
//! - Network adapters delegate I/O to a `Transport`, so response handling
//!   (success band `[200, 400)`, empty bodies as `null`) is shared.
//! - The storage and file adapters answer from a `Collection` with the
//!   matching and mutation routines in `query`.

pub mod adapter;
pub mod config;
pub mod error;
pub mod http;
pub mod options;
pub mod path;
pub mod query;
pub mod rest;
pub mod storage;
pub mod types;

pub use adapter::fetch::{FetchTransport, HttpFetchAdapter};
pub use adapter::file::{FileAdapter, FsLoader, TextLoader};
pub use adapter::http::{HttpAdapter, Transport};
pub use adapter::jsonp::JsonpAdapter;
pub use adapter::storage::StorageAdapter;
pub use adapter::xhr::{HttpXhrAdapter, XhrTransport};
pub use adapter::{AdapterConfig, ClientAdapter};
pub use config::{AdapterSettings, Config, ConfigSettings, Configure, EndpointSettings};
pub use error::ApiError;
pub use http::{Body, HttpMethod, HttpRequest, HttpResponse};
pub use options::{EffectiveOptions, RequestOptions, RequestOptionsBuilder};
pub use path::{build_path, PathBuilder};
pub use rest::RestClient;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use types::{Collection, Criteria, Record};
