//! YAML service configuration for the bootstrap binary.

use crate::bootstrap::defaults::{DefaultsError, SeedDefaults};
use crate::bootstrap::initializer::InitializerConfig;
use crate::bootstrap::version::{VersionKeys, LEGACY_VERSION_KEY};
use crate::config_utils::{config_base_dir, resolve_relative};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_NAMESPACE: &str = "authboot";
pub const DEFAULT_STORE_PATH: &str = "state/store.json";
pub const MEMORY_STORE: &str = "memory";

/// Version the binary tags stores with unless configured otherwise.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl StoreLocation {
    pub fn parse(raw: &str) -> Self {
        if raw == MEMORY_STORE {
            StoreLocation::Memory
        } else {
            StoreLocation::File(PathBuf::from(raw))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub namespace: String,
    pub legacy_version_key: String,
    pub expected_version: String,
    pub store: String,
    pub defaults: SeedDefaults,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            legacy_version_key: LEGACY_VERSION_KEY.to_string(),
            expected_version: CURRENT_VERSION.to_string(),
            store: DEFAULT_STORE_PATH.to_string(),
            defaults: SeedDefaults::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Defaults(#[from] DefaultsError),
}

impl ServiceConfig {
    /// Loads and validates a config file. A relative store path is resolved
    /// against the directory holding the config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ServiceConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        if let StoreLocation::File(store) = config.store_location() {
            let base = config_base_dir(path);
            config.store = resolve_relative(&base, &store).display().to_string();
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("namespace", &self.namespace),
            ("legacy_version_key", &self.legacy_version_key),
            ("expected_version", &self.expected_version),
            ("store", &self.store),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }
        if self.version_keys().namespaced == self.legacy_version_key {
            return Err(ConfigError::Invalid(
                "legacy and namespaced version keys must differ".into(),
            ));
        }
        self.defaults.validate()?;
        Ok(())
    }

    pub fn store_location(&self) -> StoreLocation {
        StoreLocation::parse(&self.store)
    }

    pub fn version_keys(&self) -> VersionKeys {
        VersionKeys {
            legacy: self.legacy_version_key.clone(),
            ..VersionKeys::for_namespace(&self.namespace)
        }
    }

    pub fn initializer_config(&self, allow_foreign: bool) -> InitializerConfig {
        InitializerConfig {
            keys: self.version_keys(),
            expected_version: self.expected_version.clone(),
            allow_foreign,
        }
    }
}
