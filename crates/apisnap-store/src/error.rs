//! Error types for the schema store
//!
//! - Layout errors (identifiers that cannot be mapped to a path)
//! - Store errors (filesystem and encoding failures)

use std::path::PathBuf;

/// Errors mapping service identifiers onto the on-disk layout
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// Method identifier is empty after normalization
    #[error("method identifier is empty")]
    EmptyMethod,

    /// Method identifier has a segment that cannot become a path component
    #[error("method '{method}' has invalid segment '{segment}'")]
    InvalidSegment {
        /// Raw method identifier
        method: String,
        /// Rejected segment
        segment: String,
    },

    /// Verb is not an HTTP method token
    #[error("invalid verb token: '{0}'")]
    InvalidVerb(String),
}

/// Errors during store operations
///
/// All of these are fatal for a reconciliation run.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error reading, writing or removing a path
    #[error("io error at {}: {source}", path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Schema element could not be rendered
    #[error("failed to encode schema for {}: {source}", path.display())]
    Encode {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Path does not lie inside the schema root
    #[error("path {} is outside schema root {}", path.display(), root.display())]
    OutsideRoot {
        /// Offending path
        path: PathBuf,
        /// Schema root
        root: PathBuf,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create encoding error for path
    pub fn encode(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Encode {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
