//! Configuration file and command line merging

use crate::cli::Cli;
use apisnap_core::{load_toml, ConfigError, EndpointRole, SyncConfig};
use apisnap_http::ServiceConfig;
use serde::Deserialize;

/// Contents of the `--config` TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FileConfig {
    roles: Option<Vec<EndpointRole>>,
    #[serde(flatten)]
    service: ServiceConfig,
}

/// Everything a run needs, after flags override the file
#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) sync: SyncConfig,
    pub(crate) service: ServiceConfig,
}

impl Settings {
    /// Resolve settings from the command line and optional config file
    pub(crate) fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                load_toml::<FileConfig>(path)?
            }
            None => FileConfig::default(),
        };

        let mut sync = SyncConfig::new(&cli.schema_dir).with_list_all(cli.list_all);
        if let Some(roles) = file.roles {
            sync = sync.with_roles(roles)?;
        }

        let mut service = file.service;
        if let Some(url) = &cli.node_url {
            service.node_url.clone_from(url);
        }
        if let Some(ca) = &cli.ca_cert {
            service.ca_cert = Some(ca.clone());
        }

        Ok(Self { sync, service })
    }
}
