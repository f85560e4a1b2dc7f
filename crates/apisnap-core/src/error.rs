//! Error types for reconciliation
//!
//! Fatal errors abort a run and are collected under [`SyncError`]:
//! - Fetch failures (non-success status, transport, malformed responses)
//! - Filesystem failures in the schema store
//! - Configuration errors
//!
//! Validation failures are not errors at this level; see
//! [`crate::validate::ValidationGate`].

use crate::config::ConfigError;
use crate::fetch::FetchError;
use apisnap_store::StoreError;

/// Fatal reconciliation error
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Live service could not be queried
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Schema root could not be read or written
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for reconciliation
pub type SyncResult<T> = Result<T, SyncError>;
