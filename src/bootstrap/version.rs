use crate::store::KeyValueStore;
use crate::util::error::StoreError;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LEGACY_VERSION_KEY: &str = "version";

/// Where the version marker lives. Stores written by older releases only
/// carry the un-namespaced legacy key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionKeys {
    pub legacy: String,
    pub namespaced: String,
}

impl VersionKeys {
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            legacy: LEGACY_VERSION_KEY.to_string(),
            namespaced: format!("{namespace}:version"),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to write version marker {key}={version}: {source}")]
pub struct VersionWriteError {
    pub key: String,
    pub version: String,
    #[source]
    pub source: StoreError,
}

/// Sets the namespaced version marker. Writing the same value twice is harmless.
#[derive(Debug, Clone)]
pub struct VersionWriter {
    key: String,
}

impl VersionWriter {
    pub fn new(keys: &VersionKeys) -> Self {
        Self {
            key: keys.namespaced.clone(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn write(
        &self,
        store: &dyn KeyValueStore,
        version: &str,
    ) -> Result<(), VersionWriteError> {
        store
            .set(&self.key, version)
            .await
            .map_err(|source| VersionWriteError {
                key: self.key.clone(),
                version: version.to_string(),
                source,
            })?;
        info!("event=version_marker_written key={} version={}", self.key, version);
        Ok(())
    }
}
