//! Session setup errors

use std::path::PathBuf;

/// Errors opening a session with the service
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Node URL does not parse
    #[error("invalid node URL '{url}': {message}")]
    InvalidUrl {
        /// Configured URL
        url: String,
        /// Failure detail
        message: String,
    },

    /// PEM file could not be read
    #[error("failed to read {}: {source}", path.display())]
    ReadPem {
        /// PEM file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// PEM material was rejected by the TLS stack
    #[error("invalid TLS material in {}: {source}", path.display())]
    Tls {
        /// PEM file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl SessionError {
    /// Create PEM read error
    pub fn read_pem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadPem {
            path: path.into(),
            source,
        }
    }

    /// Create TLS material error
    pub fn tls(path: impl Into<PathBuf>, source: reqwest::Error) -> Self {
        Self::Tls {
            path: path.into(),
            source,
        }
    }
}
