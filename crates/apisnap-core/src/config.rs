//! Reconciliation configuration

use crate::model::EndpointRole;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Invalid or unreadable configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No roles configured
    #[error("at least one endpoint role is required")]
    NoRoles,

    /// Two roles share a name
    #[error("duplicate role name: '{0}'")]
    DuplicateRole(String),

    /// Two roles share a prefix (their aggregate documents would collide)
    #[error("duplicate role prefix: '{0}'")]
    DuplicatePrefix(String),

    /// Prefix is not a single non-empty path segment
    #[error("invalid role prefix: '{0}'")]
    InvalidPrefix(String),

    /// Config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected shape
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
}

/// What to reconcile and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Schema root directory
    pub schema_dir: PathBuf,
    /// Log every discovered method identifier at the end of the run
    pub list_all: bool,
    roles: Vec<EndpointRole>,
}

impl SyncConfig {
    /// Configuration with the standard roles
    #[must_use]
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            list_all: false,
            roles: EndpointRole::defaults(),
        }
    }

    /// With custom roles, processed in the given order
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the list is empty, has duplicate names or
    /// prefixes, or a prefix is not a single path segment.
    pub fn with_roles(mut self, roles: Vec<EndpointRole>) -> Result<Self, ConfigError> {
        validate_roles(&roles)?;
        self.roles = roles;
        Ok(self)
    }

    /// With discovered-method listing
    #[inline]
    #[must_use]
    pub fn with_list_all(mut self, list_all: bool) -> Self {
        self.list_all = list_all;
        self
    }

    /// Roles in processing order
    #[inline]
    #[must_use]
    pub fn roles(&self) -> &[EndpointRole] {
        &self.roles
    }
}

fn validate_roles(roles: &[EndpointRole]) -> Result<(), ConfigError> {
    if roles.is_empty() {
        return Err(ConfigError::NoRoles);
    }

    let mut names = HashSet::new();
    let mut prefixes = HashSet::new();
    for role in roles {
        let prefix = role.prefix.as_str();
        if prefix.is_empty() || prefix == "." || prefix == ".." || prefix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidPrefix(role.prefix.clone()));
        }
        if !names.insert(role.name.as_str()) {
            return Err(ConfigError::DuplicateRole(role.name.clone()));
        }
        if !prefixes.insert(prefix) {
            return Err(ConfigError::DuplicatePrefix(role.prefix.clone()));
        }
    }
    Ok(())
}

/// Load a TOML config file into `T`
///
/// # Errors
/// - [`ConfigError::Read`] if the file cannot be read
/// - [`ConfigError::Parse`] if it does not deserialize into `T`
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn defaults_use_standard_roles() {
        let config = SyncConfig::new("schema");
        assert_eq!(config.roles().len(), 3);
        assert!(!config.list_all);
    }

    #[test]
    fn custom_roles_are_validated() {
        let base = SyncConfig::new("schema");
        assert!(matches!(
            base.clone().with_roles(vec![]),
            Err(ConfigError::NoRoles)
        ));
        assert!(matches!(
            base.clone()
                .with_roles(vec![EndpointRole::new("a", "x"), EndpointRole::new("a", "y")]),
            Err(ConfigError::DuplicateRole(_))
        ));
        assert!(matches!(
            base.clone()
                .with_roles(vec![EndpointRole::new("a", "x"), EndpointRole::new("b", "x")]),
            Err(ConfigError::DuplicatePrefix(_))
        ));
        assert!(matches!(
            base.clone().with_roles(vec![EndpointRole::new("a", "x/y")]),
            Err(ConfigError::InvalidPrefix(_))
        ));

        let config = base.with_roles(vec![EndpointRole::node()]).unwrap();
        assert_eq!(config.roles(), &[EndpointRole::node()]);
    }

    #[derive(Debug, Deserialize)]
    struct RolesOnly {
        roles: Vec<EndpointRole>,
    }

    #[test]
    fn load_toml_reads_roles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apisnap.toml");
        std::fs::write(
            &path,
            "[[roles]]\nname = \"user\"\nprefix = \"app\"\nidentity = \"user0\"\n\n[[roles]]\nname = \"node\"\nprefix = \"node\"\n",
        )
        .unwrap();

        let parsed: RolesOnly = load_toml(&path).unwrap();
        assert_eq!(parsed.roles, vec![EndpointRole::user(), EndpointRole::node()]);
    }

    #[test]
    fn load_toml_reports_path() {
        let missing = Path::new("/nonexistent/apisnap.toml");
        let err = load_toml::<RolesOnly>(missing).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/apisnap.toml"));
    }
}
