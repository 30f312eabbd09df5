use super::RepositoryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Named grouping of permissions. `id` is assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    pub name: String,
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Creates a role. Fails with [`RepositoryError::Duplicate`] if the name is taken.
    async fn create(&self, name: &str) -> Result<Role, RepositoryError>;

    /// Grants `scope_name` to `role_name`. Works by name only, so neither side
    /// has to exist yet; re-applying an existing grant is a no-op.
    async fn associate_scope(&self, role_name: &str, scope_name: &str)
        -> Result<(), RepositoryError>;

    async fn get(&self, name: &str) -> Result<Option<Role>, RepositoryError>;

    async fn list(&self) -> Result<Vec<Role>, RepositoryError>;

    async fn scopes_of(&self, role_name: &str) -> Result<Vec<String>, RepositoryError>;
}
