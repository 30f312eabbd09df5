use crate::authz::{RoleRepository, ScopeRepository};
use crate::bootstrap::defaults::SeedDefaults;
use crate::bootstrap::gate::{GateDecision, GateError, Gatekeeper};
use crate::bootstrap::probe::{ProbeSnapshot, StoreProbe, TransactionError};
use crate::bootstrap::seeder::{SeedError, SeedReport, Seeder};
use crate::bootstrap::version::{VersionKeys, VersionWriteError, VersionWriter};
use crate::store::KeyValueStore;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitState {
    Start,
    Probing,
    Blocked,
    Deciding,
    Migrating,
    Continuing,
    Seeding,
    Ready,
    Fatal,
}

impl InitState {
    pub fn is_terminal(self) -> bool {
        matches!(self, InitState::Ready | InitState::Fatal)
    }
}

impl fmt::Display for InitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitState::Start => "start",
            InitState::Probing => "probing",
            InitState::Blocked => "blocked",
            InitState::Deciding => "deciding",
            InitState::Migrating => "migrating",
            InitState::Continuing => "continuing",
            InitState::Seeding => "seeding",
            InitState::Ready => "ready",
            InitState::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    ForeignDatabase(#[from] GateError),
    #[error(transparent)]
    VersionWrite(#[from] VersionWriteError),
    #[error("unable to set defaults: {0}")]
    Seed(SeedError),
}

impl From<SeedError> for InitError {
    fn from(err: SeedError) -> Self {
        match err {
            SeedError::Version(err) => InitError::VersionWrite(err),
            other => InitError::Seed(other),
        }
    }
}

impl InitError {
    /// Short name of the stage that failed, for operator diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            InitError::Transaction(_) => "probe",
            InitError::ForeignDatabase(_) => "database check",
            InitError::VersionWrite(_) => "version marker write",
            InitError::Seed(_) => "seed defaults",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializerConfig {
    pub keys: VersionKeys,
    pub expected_version: String,
    #[serde(default)]
    pub allow_foreign: bool,
}

impl InitializerConfig {
    pub fn new(namespace: &str, expected_version: impl Into<String>) -> Self {
        Self {
            keys: VersionKeys::for_namespace(namespace),
            expected_version: expected_version.into(),
            allow_foreign: false,
        }
    }

    pub fn allow_foreign(mut self, allow: bool) -> Self {
        self.allow_foreign = allow;
        self
    }
}

/// Outcome of a successful [`Initializer::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub probe: ProbeSnapshot,
    pub decision: GateDecision,
    pub seeded: Option<SeedReport>,
    pub trace: Vec<InitState>,
}

/// Read-only view produced by [`Initializer::inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub probe: ProbeSnapshot,
    pub decision: Option<GateDecision>,
    pub blocked: Option<String>,
}

/// Drives probe → gate → {version write, seed} and reports one terminal outcome.
pub struct Initializer {
    store: Arc<dyn KeyValueStore>,
    roles: Arc<dyn RoleRepository>,
    scopes: Arc<dyn ScopeRepository>,
    defaults: SeedDefaults,
    config: InitializerConfig,
    state: InitState,
    trace: Vec<InitState>,
}

impl Initializer {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        roles: Arc<dyn RoleRepository>,
        scopes: Arc<dyn ScopeRepository>,
        config: InitializerConfig,
    ) -> Self {
        Self {
            store,
            roles,
            scopes,
            defaults: SeedDefaults::default(),
            config,
            state: InitState::Start,
            trace: Vec::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: SeedDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn config(&self) -> &InitializerConfig {
        &self.config
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn trace(&self) -> &[InitState] {
        &self.trace
    }

    /// Probes and evaluates the gate without writing anything.
    pub async fn inspect(&self) -> Result<Inspection, InitError> {
        let probe = StoreProbe::new(self.config.keys.clone())
            .run(self.store.as_ref())
            .await?;
        let (decision, blocked) = match self.gatekeeper().evaluate(&probe) {
            Ok(decision) => (Some(decision), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Ok(Inspection {
            probe,
            decision,
            blocked,
        })
    }

    pub async fn run(&mut self) -> Result<InitReport, InitError> {
        self.trace.clear();
        self.enter(InitState::Start);
        match self.drive().await {
            Ok((probe, decision, seeded)) => {
                self.enter(InitState::Ready);
                info!(
                    "event=bootstrap_ready version={} seeded={}",
                    self.config.expected_version,
                    seeded.is_some()
                );
                Ok(InitReport {
                    probe,
                    decision,
                    seeded,
                    trace: self.trace.clone(),
                })
            }
            Err(err) => {
                error!(
                    "event=bootstrap_failed stage={} after={} error={}",
                    err.stage(),
                    self.state,
                    err
                );
                self.enter(InitState::Fatal);
                Err(err)
            }
        }
    }

    async fn drive(
        &mut self,
    ) -> Result<(ProbeSnapshot, GateDecision, Option<SeedReport>), InitError> {
        let store = Arc::clone(&self.store);

        self.enter(InitState::Probing);
        let probe = StoreProbe::new(self.config.keys.clone())
            .run(store.as_ref())
            .await?;

        let decision = match self.gatekeeper().evaluate(&probe) {
            Ok(decision) => decision,
            Err(err) => {
                self.enter(InitState::Blocked);
                warn!("event=bootstrap_blocked dbsize={}", probe.dbsize);
                return Err(err.into());
            }
        };
        self.enter(InitState::Deciding);

        let writer = VersionWriter::new(&self.config.keys);
        let seeded = match &decision {
            GateDecision::Continue { version } => {
                self.enter(InitState::Continuing);
                info!("event=bootstrap_continue version={version}");
                None
            }
            GateDecision::Migrate { from, to } => {
                self.enter(InitState::Migrating);
                info!(
                    "event=bootstrap_migrate from={} to={}",
                    from.as_deref().unwrap_or("none"),
                    to
                );
                writer.write(store.as_ref(), to).await?;
                None
            }
            GateDecision::Seed { to } => {
                self.enter(InitState::Seeding);
                info!("event=bootstrap_seed version={to}");
                let seeder = Seeder::new(
                    Arc::clone(&self.roles),
                    Arc::clone(&self.scopes),
                    self.defaults.clone(),
                );
                Some(seeder.run(store.as_ref(), &writer, to).await?)
            }
        };
        Ok((probe, decision, seeded))
    }

    fn gatekeeper(&self) -> Gatekeeper {
        Gatekeeper::new(
            self.config.expected_version.clone(),
            self.config.allow_foreign,
        )
    }

    fn enter(&mut self, state: InitState) {
        self.state = state;
        self.trace.push(state);
    }
}
