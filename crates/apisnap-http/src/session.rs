//! Scoped session with the service under test

use crate::config::ServiceConfig;
use crate::error::SessionError;
use crate::fetcher::HttpSchemaFetcher;
use apisnap_core::EndpointRole;

/// Live connection to the service, held for the duration of a run
///
/// Detaches when dropped, including when a run aborts with an error.
#[derive(Debug)]
pub struct AttachedService {
    fetcher: HttpSchemaFetcher,
}

impl AttachedService {
    /// Attach to the service at `config.node_url` for `roles`
    ///
    /// # Errors
    /// See [`HttpSchemaFetcher::new`].
    pub fn attach(config: &ServiceConfig, roles: &[EndpointRole]) -> Result<Self, SessionError> {
        let fetcher = HttpSchemaFetcher::new(config, roles)?;
        tracing::info!("Attached to {}", fetcher.base_url());
        Ok(Self { fetcher })
    }

    /// Fetcher bound to this session
    #[inline]
    #[must_use]
    pub fn fetcher(&self) -> &HttpSchemaFetcher {
        &self.fetcher
    }
}

impl Drop for AttachedService {
    fn drop(&mut self) {
        tracing::info!("Detached from {}", self.fetcher.base_url());
    }
}
