use crate::authz::{RepositoryError, Role, RoleRepository, Scope, ScopeRepository};
use crate::bootstrap::defaults::SeedDefaults;
use crate::bootstrap::version::{VersionWriteError, VersionWriter};
use crate::store::KeyValueStore;
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedTask {
    InsertRoles,
    InsertScopes,
    AssignPermissions,
}

impl fmt::Display for SeedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeedTask::InsertRoles => "insert_roles",
            SeedTask::InsertScopes => "insert_scopes",
            SeedTask::AssignPermissions => "assign_permissions",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("{task} failed: {source}")]
    Task {
        task: SeedTask,
        #[source]
        source: RepositoryError,
    },
    #[error("{task} worker did not complete: {source}")]
    Worker {
        task: SeedTask,
        #[source]
        source: JoinError,
    },
    #[error(transparent)]
    Version(#[from] VersionWriteError),
}

impl SeedError {
    pub fn task(&self) -> Option<SeedTask> {
        match self {
            SeedError::Task { task, .. } | SeedError::Worker { task, .. } => Some(*task),
            SeedError::Version(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub roles: Vec<Role>,
    pub scopes: Vec<Scope>,
    pub permissions: usize,
}

/// Populates a fresh store with the default roles, scopes and grants.
///
/// The three tasks run concurrently and each fans out one worker per item.
/// Every worker runs to completion; when something fails the first error in
/// task order is reported and the others are only logged. Nothing already
/// written is undone.
pub struct Seeder {
    roles: Arc<dyn RoleRepository>,
    scopes: Arc<dyn ScopeRepository>,
    defaults: SeedDefaults,
}

impl Seeder {
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        scopes: Arc<dyn ScopeRepository>,
        defaults: SeedDefaults,
    ) -> Self {
        Self {
            roles,
            scopes,
            defaults,
        }
    }

    pub fn defaults(&self) -> &SeedDefaults {
        &self.defaults
    }

    /// Seeds, then tags the store with `version`. The marker is only written
    /// once all three tasks succeeded.
    pub async fn run(
        &self,
        store: &dyn KeyValueStore,
        writer: &VersionWriter,
        version: &str,
    ) -> Result<SeedReport, SeedError> {
        let report = self.populate().await?;
        writer.write(store, version).await?;
        Ok(report)
    }

    pub async fn populate(&self) -> Result<SeedReport, SeedError> {
        let (roles, scopes, permissions) = tokio::join!(
            self.insert_roles(),
            self.insert_scopes(),
            self.assign_permissions()
        );
        let failures = [
            roles.as_ref().err(),
            scopes.as_ref().err(),
            permissions.as_ref().err(),
        ];
        for discarded in failures.into_iter().flatten().skip(1) {
            debug!("event=seed_error_discarded error={discarded}");
        }
        match (roles, scopes, permissions) {
            (Ok(roles), Ok(scopes), Ok(permissions)) => Ok(SeedReport {
                roles,
                scopes,
                permissions,
            }),
            (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => {
                debug!("event=seed_failed error={err}");
                Err(err)
            }
        }
    }

    async fn insert_roles(&self) -> Result<Vec<Role>, SeedError> {
        let repo = &self.roles;
        let roles = fan_out(SeedTask::InsertRoles, self.defaults.roles.clone(), |name| {
            let repo = Arc::clone(repo);
            async move { repo.create(&name).await }
        })
        .await?;
        info!("event=seed_roles_created count={}", roles.len());
        Ok(roles)
    }

    async fn insert_scopes(&self) -> Result<Vec<Scope>, SeedError> {
        let repo = &self.scopes;
        let scopes = fan_out(SeedTask::InsertScopes, self.defaults.scopes.clone(), |def| {
            let repo = Arc::clone(repo);
            async move { repo.create(&def.name, &def.description).await }
        })
        .await?;
        info!("event=seed_scopes_created count={}", scopes.len());
        Ok(scopes)
    }

    async fn assign_permissions(&self) -> Result<usize, SeedError> {
        let repo = &self.roles;
        let granted = fan_out(
            SeedTask::AssignPermissions,
            self.defaults.permissions.clone(),
            |binding| {
                let repo = Arc::clone(repo);
                async move { repo.associate_scope(&binding.role, &binding.scope).await }
            },
        )
        .await?;
        info!("event=seed_permissions_assigned count={}", granted.len());
        Ok(granted.len())
    }
}

/// Spawns one worker per item and drains all of them. Results keep the input
/// order; the first failure seen is returned after every worker finished.
async fn fan_out<I, T, F, Fut>(
    task: SeedTask,
    items: Vec<I>,
    mut spawn: F,
) -> Result<Vec<T>, SeedError>
where
    T: Send + 'static,
    F: FnMut(I) -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>> + Send + 'static,
{
    let mut workers = JoinSet::new();
    for (idx, item) in items.into_iter().enumerate() {
        let work = spawn(item);
        workers.spawn(async move { (idx, work.await) });
    }

    let mut slots: Vec<Option<T>> = (0..workers.len()).map(|_| None).collect();
    let mut first_error = None;
    while let Some(joined) = workers.join_next().await {
        let failure = match joined {
            Ok((idx, Ok(value))) => {
                if let Some(slot) = slots.get_mut(idx) {
                    *slot = Some(value);
                }
                continue;
            }
            Ok((_, Err(source))) => SeedError::Task { task, source },
            Err(source) => SeedError::Worker { task, source },
        };
        if first_error.is_none() {
            first_error = Some(failure);
        } else {
            debug!("event=seed_error_discarded task={task} error={failure}");
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(slots.into_iter().flatten().collect()),
    }
}
