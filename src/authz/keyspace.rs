use super::role::{Role, RoleRepository};
use super::scope::{Scope, ScopeRepository};
use super::{validate_name, RepositoryError};
use crate::store::KeyValueStore;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

const ROLE: &str = "role";
const SCOPE: &str = "scope";
const ROLE_INDEX: &str = "roles";
const ROLE_ID_COUNTER: &str = "role_ids:next";
const SCOPE_INDEX: &str = "scopes";

fn role_key(name: &str) -> String {
    format!("roles:{name}")
}

fn role_scopes_key(name: &str) -> String {
    format!("roles:{name}:scopes")
}

fn scope_key(name: &str) -> String {
    format!("scopes:{name}")
}

fn scope_roles_key(name: &str) -> String {
    format!("scopes:{name}:roles")
}

/// Role records stored as JSON under `roles:<name>`, indexed by the `roles` set.
#[derive(Clone)]
pub struct KeyspaceRoles {
    store: Arc<dyn KeyValueStore>,
}

impl KeyspaceRoles {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoleRepository for KeyspaceRoles {
    async fn create(&self, name: &str) -> Result<Role, RepositoryError> {
        validate_name(ROLE, name)?;
        let key = role_key(name);
        if self.store.get(&key).await?.is_some() {
            return Err(RepositoryError::Duplicate {
                kind: ROLE,
                name: name.to_string(),
            });
        }
        let id = self.store.incr(ROLE_ID_COUNTER).await?;
        let role = Role {
            id,
            name: name.to_string(),
        };
        let payload = encode(&role)?;
        // A concurrent create can still win between the check and here.
        if !self.store.set_if_absent(&key, &payload).await? {
            return Err(RepositoryError::Duplicate {
                kind: ROLE,
                name: name.to_string(),
            });
        }
        self.store.set_add(ROLE_INDEX, name).await?;
        Ok(role)
    }

    async fn associate_scope(
        &self,
        role_name: &str,
        scope_name: &str,
    ) -> Result<(), RepositoryError> {
        validate_name(ROLE, role_name)?;
        validate_name(SCOPE, scope_name)?;
        self.store
            .set_add(&role_scopes_key(role_name), scope_name)
            .await?;
        self.store
            .set_add(&scope_roles_key(scope_name), role_name)
            .await?;
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        load(self.store.as_ref(), ROLE, &role_key(name)).await
    }

    async fn list(&self) -> Result<Vec<Role>, RepositoryError> {
        let mut roles = Vec::new();
        for name in self.store.set_members(ROLE_INDEX).await? {
            if let Some(role) = self.get(&name).await? {
                roles.push(role);
            }
        }
        roles.sort_by_key(|role| role.id);
        Ok(roles)
    }

    async fn scopes_of(&self, role_name: &str) -> Result<Vec<String>, RepositoryError> {
        Ok(self.store.set_members(&role_scopes_key(role_name)).await?)
    }
}

/// Scope records stored as JSON under `scopes:<name>`, indexed by the `scopes` set.
#[derive(Clone)]
pub struct KeyspaceScopes {
    store: Arc<dyn KeyValueStore>,
}

impl KeyspaceScopes {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ScopeRepository for KeyspaceScopes {
    async fn create(&self, name: &str, description: &str) -> Result<Scope, RepositoryError> {
        validate_name(SCOPE, name)?;
        let scope = Scope {
            name: name.to_string(),
            description: description.to_string(),
        };
        let payload = encode(&scope)?;
        if !self.store.set_if_absent(&scope_key(name), &payload).await? {
            return Err(RepositoryError::Duplicate {
                kind: SCOPE,
                name: name.to_string(),
            });
        }
        self.store.set_add(SCOPE_INDEX, name).await?;
        Ok(scope)
    }

    async fn get(&self, name: &str) -> Result<Option<Scope>, RepositoryError> {
        load(self.store.as_ref(), SCOPE, &scope_key(name)).await
    }

    async fn list(&self) -> Result<Vec<Scope>, RepositoryError> {
        let mut scopes = Vec::new();
        for name in self.store.set_members(SCOPE_INDEX).await? {
            if let Some(scope) = self.get(&name).await? {
                scopes.push(scope);
            }
        }
        Ok(scopes)
    }
}

fn encode<T: serde::Serialize>(record: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(record).map_err(|err| RepositoryError::Store(err.into()))
}

async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    kind: &'static str,
    key: &str,
) -> Result<Option<T>, RepositoryError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| RepositoryError::Corrupt {
            kind,
            key: key.to_string(),
            reason: err.to_string(),
        })
}
