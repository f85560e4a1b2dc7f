//! Service connection settings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default node address of a local development network
pub const DEFAULT_NODE_URL: &str = "https://127.0.0.1:8000";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// PEM files of a client identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityFiles {
    /// Certificate chain
    pub cert: PathBuf,
    /// Private key
    pub key: PathBuf,
}

/// How to reach the service under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL; role prefixes are appended to it
    pub node_url: String,
    /// Extra root certificate for the service's TLS endpoint
    pub ca_cert: Option<PathBuf>,
    /// Client identities by name, referenced from role definitions
    pub identities: BTreeMap<String, IdentityFiles>,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Skip server certificate verification (local clusters only)
    pub accept_invalid_certs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            ca_cert: None,
            identities: BTreeMap::new(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: false,
        }
    }
}

impl ServiceConfig {
    /// Settings for `node_url` with everything else defaulted
    #[must_use]
    pub fn new(node_url: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            ..Self::default()
        }
    }

    /// Trust an extra root certificate
    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Register a client identity
    #[must_use]
    pub fn with_identity(
        mut self,
        name: impl Into<String>,
        cert: impl Into<PathBuf>,
        key: impl Into<PathBuf>,
    ) -> Self {
        self.identities.insert(
            name.into(),
            IdentityFiles {
                cert: cert.into(),
                key: key.into(),
            },
        );
        self
    }

    /// Request timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
