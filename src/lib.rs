//! Version-gated bootstrap for the key-value store behind an identity and
//! authorization service.
//!
//! On start the [`Initializer`] probes the store, decides whether it belongs
//! to this service, and then either refuses to touch it, rewrites the version
//! marker, or seeds the default roles, scopes and grants exactly once.

pub mod authz;
pub mod bootstrap;
pub mod config;
pub mod config_utils;
pub mod store;
pub mod util;

pub use authz::{
    KeyspaceRoles, KeyspaceScopes, RepositoryError, Role, RoleRepository, Scope, ScopeRepository,
};
pub use bootstrap::{
    GateDecision, GateError, Gatekeeper, InitError, InitReport, InitState, Initializer,
    InitializerConfig, Inspection, PermissionBinding, ProbeSnapshot, ScopeDefinition,
    SeedDefaults, SeedError, SeedReport, SeedTask, Seeder, StoreProbe, TransactionError,
    VersionKeys, VersionWriteError, VersionWriter,
};
pub use config::{ConfigError, ServiceConfig, StoreLocation};
pub use store::{FileStore, KeyValueStore, Keyspace, MemoryStore};
pub use util::{SerializationError, StoreError};
