//! Schema fetching from a live service
//!
//! [`SchemaFetcher`] is the seam to the running service. The engine never
//! retries: every error returned here aborts the run.

use crate::model::{EndpointRole, MethodSchema, OpenApiDocument};
use apisnap_store::{LayoutError, MethodId};
use async_trait::async_trait;

/// Errors reaching or decoding a role's API surface
///
/// All variants are fatal for a reconciliation run.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Request completed with a non-success status
    #[error("{role}: GET {path} returned status {status}")]
    Status {
        // Role being fetched
        role: String,
        // Request path and query
        path: String,
        /// HTTP status code
        status: u16,
    },

    /// Request could not be completed
    #[error("{role}: GET {path} failed: {message}")]
    Transport {
        // Role being fetched
        role: String,
        // Request path and query
        path: String,
        // Failure detail
        message: String,
    },

    /// Response body is not the expected shape
    #[error("{role}: malformed response from {path}: {message}")]
    Malformed {
        // Role being fetched
        role: String,
        // Request path and query
        path: String,
        // Failure detail
        message: String,
    },

    /// Method or verb cannot be mapped onto the schema layout
    #[error("{role}: {source}")]
    Layout {
        // Role being fetched
        role: String,
        /// Underlying error
        #[source]
        source: LayoutError,
    },
}

impl FetchError {
    /// Create status error
    pub fn status(role: &EndpointRole, path: impl Into<String>, status: u16) -> Self {
        Self::Status {
            role: role.name.clone(),
            path: path.into(),
            status,
        }
    }

    /// Create transport error
    pub fn transport(
        // Role being fetched
        role: &EndpointRole,
        // Request path and query
        path: impl Into<String>,
        // Failure detail
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            role: role.name.clone(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create malformed-response error
    pub fn malformed(
        // Role being fetched
        role: &EndpointRole,
        // Request path and query
        path: impl Into<String>,
        // Failure detail
        message: impl Into<String>,
    ) -> Self {
        Self::Malformed {
            role: role.name.clone(),
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Source of live schema documents
///
/// Implementations serve every role; the role selects the path prefix and the
/// client identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    /// Fetch the role's full OpenAPI document (`/<prefix>/api`)
    async fn document(&self, role: &EndpointRole) -> Result<OpenApiDocument, FetchError>;

    /// Fetch per-verb schemas of one normalized method
    async fn schema_for(
        &self,
        // Role being fetched
        role: &EndpointRole,
        // Raw method identifier
        method: &MethodId,
    ) -> Result<MethodSchema, FetchError>;
}

/// Ordered raw method identifiers reported by a role
///
/// # Errors
/// Propagates the fetcher's [`FetchError`].
pub async fn list_methods<F>(fetcher: &F, role: &EndpointRole) -> Result<Vec<String>, FetchError>
where
    F: SchemaFetcher + ?Sized,
{
    Ok(fetcher.document(role).await?.list_methods())
}
