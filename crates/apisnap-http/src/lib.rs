//! apisnap HTTP - live service adapter
//!
//! Implements [`apisnap_core::SchemaFetcher`] against a running service:
//!
//! - `GET <node_url>/<prefix>/api` for a role's OpenAPI document
//! - `GET <node_url>/<prefix>/api/schema?method="<method>"` for one method
//!
//! Any non-2xx status or transport failure is a fatal
//! [`apisnap_core::FetchError`]. Requests use `rustls`; client identities
//! are loaded from PEM files per role.

#![warn(unreachable_pub)]

mod config;
mod error;
mod fetcher;
mod session;

pub use config::{IdentityFiles, ServiceConfig, DEFAULT_NODE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::SessionError;
pub use fetcher::HttpSchemaFetcher;
pub use session::AttachedService;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
