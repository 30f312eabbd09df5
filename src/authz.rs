//! Authorization domain objects created during bootstrap and the repository
//! traits the seeder writes them through.

pub mod keyspace;
pub mod role;
pub mod scope;

use crate::util::error::StoreError;
use thiserror::Error;

pub use keyspace::{KeyspaceRoles, KeyspaceScopes};
pub use role::{Role, RoleRepository};
pub use scope::{Scope, ScopeRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{kind} {name} already exists")]
    Duplicate { kind: &'static str, name: String },
    #[error("invalid {kind} name {name:?}")]
    InvalidName { kind: &'static str, name: String },
    #[error("corrupt {kind} record under {key}: {reason}")]
    Corrupt {
        kind: &'static str,
        key: String,
        reason: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Names become key segments, so they must be non-empty and free of the
/// `:` separator and whitespace.
pub(crate) fn validate_name(kind: &'static str, name: &str) -> Result<(), RepositoryError> {
    let valid = !name.is_empty()
        && !name
            .chars()
            .any(|c| c == ':' || c.is_whitespace() || c.is_control());
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}
