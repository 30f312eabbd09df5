use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDefinition {
    pub name: String,
    pub description: String,
}

impl ScopeDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Grant of `scope` to `role`, recorded by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionBinding {
    pub role: String,
    pub scope: String,
}

impl PermissionBinding {
    pub fn new(role: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            scope: scope.into(),
        }
    }
}

/// Objects written into a fresh store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedDefaults {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<ScopeDefinition>,
    #[serde(default)]
    pub permissions: Vec<PermissionBinding>,
}

impl Default for SeedDefaults {
    fn default() -> Self {
        Self {
            roles: vec!["authority".into(), "developer".into()],
            scopes: vec![
                ScopeDefinition::new("openid", "View your identity"),
                ScopeDefinition::new("profile", "View your basic account info"),
                ScopeDefinition::new("client", "Register and configure clients"),
                ScopeDefinition::new("realm", "Configure the security realm"),
            ],
            permissions: vec![
                PermissionBinding::new("authority", "realm"),
                PermissionBinding::new("developer", "client"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefaultsError {
    #[error("duplicate default role {0}")]
    DuplicateRole(String),
    #[error("duplicate default scope {0}")]
    DuplicateScope(String),
    #[error("permission {role}->{scope} references undeclared {missing} {name}")]
    UndeclaredReference {
        role: String,
        scope: String,
        missing: &'static str,
        name: String,
    },
}

impl SeedDefaults {
    /// Rejects duplicates (they would fail the seed halfway) and grants whose
    /// endpoints are not seeded alongside them.
    pub fn validate(&self) -> Result<(), DefaultsError> {
        let mut roles = HashSet::new();
        for role in &self.roles {
            if !roles.insert(role.as_str()) {
                return Err(DefaultsError::DuplicateRole(role.clone()));
            }
        }
        let mut scopes = HashSet::new();
        for scope in &self.scopes {
            if !scopes.insert(scope.name.as_str()) {
                return Err(DefaultsError::DuplicateScope(scope.name.clone()));
            }
        }
        for binding in &self.permissions {
            let missing = if !roles.contains(binding.role.as_str()) {
                Some(("role", binding.role.clone()))
            } else if !scopes.contains(binding.scope.as_str()) {
                Some(("scope", binding.scope.clone()))
            } else {
                None
            };
            if let Some((missing, name)) = missing {
                return Err(DefaultsError::UndeclaredReference {
                    role: binding.role.clone(),
                    scope: binding.scope.clone(),
                    missing,
                    name,
                });
            }
        }
        Ok(())
    }
}
