use super::RepositoryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Capability unit that can be granted to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,
    pub description: String,
}

#[async_trait]
pub trait ScopeRepository: Send + Sync {
    async fn create(&self, name: &str, description: &str) -> Result<Scope, RepositoryError>;

    async fn get(&self, name: &str) -> Result<Option<Scope>, RepositoryError>;

    async fn list(&self) -> Result<Vec<Scope>, RepositoryError>;
}
