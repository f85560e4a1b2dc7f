//! [`SchemaFetcher`] over HTTP

use crate::config::ServiceConfig;
use crate::error::SessionError;
use apisnap_core::model::schema_request_path;
use apisnap_core::{EndpointRole, FetchError, MethodSchema, OpenApiDocument, SchemaFetcher};
use apisnap_store::MethodId;
use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, RequestBuilder, Url};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Fetches documents and method schemas from a running service
///
/// Holds one client per identity named by the roles it was built for.
/// Roles without an identity, or naming one that is not configured, use an
/// anonymous client.
#[derive(Debug)]
pub struct HttpSchemaFetcher {
    base: String,
    anonymous: Client,
    clients: HashMap<String, Client>,
}

impl HttpSchemaFetcher {
    /// Build clients for `roles`
    ///
    /// # Errors
    /// Invalid node URL, unreadable or rejected PEM files, or a client that
    /// fails to build.
    pub fn new(config: &ServiceConfig, roles: &[EndpointRole]) -> Result<Self, SessionError> {
        let url = Url::parse(&config.node_url).map_err(|e| SessionError::InvalidUrl {
            url: config.node_url.clone(),
            message: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(SessionError::InvalidUrl {
                url: config.node_url.clone(),
                message: "not a base URL".to_string(),
            });
        }

        let ca = match &config.ca_cert {
            Some(path) => Some(load_certificate(path)?),
            None => None,
        };

        let anonymous = build_client(config, ca.clone(), None)?;
        let mut clients = HashMap::new();
        for role in roles {
            let Some(name) = &role.identity else {
                continue;
            };
            if clients.contains_key(name) {
                continue;
            }
            let Some(files) = config.identities.get(name) else {
                tracing::warn!(
                    "Identity {} of role {} is not configured, using anonymous client",
                    name,
                    role.name
                );
                continue;
            };
            let identity = load_identity(&files.cert, &files.key)?;
            clients.insert(name.clone(), build_client(config, ca.clone(), Some(identity))?);
            tracing::debug!("Loaded identity {} for role {}", name, role.name);
        }

        Ok(Self {
            base: config.node_url.trim_end_matches('/').to_string(),
            anonymous,
            clients,
        })
    }

    /// Base URL requests are made against
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn client(&self, role: &EndpointRole) -> &Client {
        role.identity
            .as_ref()
            .and_then(|name| self.clients.get(name))
            .unwrap_or(&self.anonymous)
    }

    /// Send a GET and return the body of a 2xx response
    async fn body(
        role: &EndpointRole,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, FetchError> {
        tracing::debug!("GET {}", path);
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::transport(role, path, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(role, path, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(role, path, e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl SchemaFetcher for HttpSchemaFetcher {
    async fn document(&self, role: &EndpointRole) -> Result<OpenApiDocument, FetchError> {
        let path = format!("/{}/api", role.prefix);
        let request = self.client(role).get(format!("{}{path}", self.base));

        let body = Self::body(role, &path, request).await?;
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| FetchError::malformed(role, &path, e.to_string()))?;
        OpenApiDocument::from_value(role, value)
    }

    async fn schema_for(
        &self,
        role: &EndpointRole,
        method: &MethodId,
    ) -> Result<MethodSchema, FetchError> {
        let path = schema_request_path(role, method);
        let request = self
            .client(role)
            .get(format!("{}/{}/api/schema", self.base, role.prefix))
            .query(&[("method", format!("\"{method}\""))]);

        let body = Self::body(role, &path, request).await?;
        MethodSchema::from_body(role, method, &body)
    }
}

fn build_client(
    config: &ServiceConfig,
    ca: Option<Certificate>,
    identity: Option<Identity>,
) -> Result<Client, SessionError> {
    let mut builder = Client::builder()
        .use_rustls_tls()
        .timeout(config.timeout())
        .danger_accept_invalid_certs(config.accept_invalid_certs);
    if let Some(ca) = ca {
        builder = builder.add_root_certificate(ca);
    }
    if let Some(identity) = identity {
        builder = builder.identity(identity);
    }
    Ok(builder.build()?)
}

fn read_pem(path: &Path) -> Result<Vec<u8>, SessionError> {
    fs::read(path).map_err(|e| SessionError::read_pem(path, e))
}

fn load_certificate(path: &Path) -> Result<Certificate, SessionError> {
    Certificate::from_pem(&read_pem(path)?).map_err(|e| SessionError::tls(path, e))
}

/// Key and chain concatenated into the single PEM bundle rustls expects
fn load_identity(cert: &Path, key: &Path) -> Result<Identity, SessionError> {
    let mut pem = read_pem(key)?;
    pem.push(b'\n');
    pem.extend(read_pem(cert)?);
    Identity::from_pem(&pem).map_err(|e| SessionError::tls(cert, e))
}
