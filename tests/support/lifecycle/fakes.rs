#![allow(dead_code)]

use async_trait::async_trait;
use authboot::store::{Keyspace, KeyValueStore, MemoryStore, Read, Reply};
use authboot::{
    Initializer, InitializerConfig, KeyspaceRoles, KeyspaceScopes, RepositoryError, Role,
    RoleRepository, Scope, ScopeRepository, StoreError,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

/// Memory store that counts mutations and can be told to fail.
pub struct FlakyStore {
    inner: MemoryStore,
    fail_transaction: AtomicBool,
    fail_set: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::with_entries(&[])
    }

    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let mut keyspace = Keyspace::new();
        for (key, value) in entries {
            keyspace.set(key, value);
        }
        Self::from_keyspace(keyspace)
    }

    /// `count` unrelated keys, as left behind by some other application.
    pub fn with_foreign_keys(count: usize) -> Self {
        let mut keyspace = Keyspace::new();
        for idx in 0..count {
            keyspace.set(&format!("sessions:{idx}"), "opaque");
        }
        Self::from_keyspace(keyspace)
    }

    fn from_keyspace(keyspace: Keyspace) -> Self {
        Self {
            inner: MemoryStore::with_keyspace(keyspace),
            fail_transaction: AtomicBool::new(false),
            fail_set: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn fail_transactions(&self) {
        self.fail_transaction.store(true, Ordering::SeqCst);
    }

    pub fn fail_sets(&self) {
        self.fail_set.store(true, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Keyspace {
        self.inner.snapshot()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn transaction(&self, reads: &[Read]) -> Result<Vec<Reply>, StoreError> {
        if self.fail_transaction.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.inner.transaction(reads).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read-only replica".into()));
        }
        self.record_write();
        self.inner.set(key, value).await
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.record_write();
        self.inner.set_if_absent(key, value).await
    }

    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        self.record_write();
        self.inner.incr(key).await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.record_write();
        self.inner.set_add(key, member).await
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.inner.set_members(key).await
    }

    async fn dbsize(&self) -> Result<u64, StoreError> {
        self.inner.dbsize().await
    }
}

fn injected(kind: &'static str, name: &str) -> RepositoryError {
    RepositoryError::Store(StoreError::Other(format!("injected {kind} failure for {name}")))
}

/// Keyspace-backed role repository that counts calls.
pub struct RecordingRoles {
    inner: KeyspaceRoles,
    creates: AtomicUsize,
    associations: AtomicUsize,
    fail_create: Mutex<Option<String>>,
    panic_create: Mutex<Option<String>>,
    barrier: Mutex<Option<Arc<Barrier>>>,
}

impl RecordingRoles {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: KeyspaceRoles::new(store),
            creates: AtomicUsize::new(0),
            associations: AtomicUsize::new(0),
            fail_create: Mutex::new(None),
            panic_create: Mutex::new(None),
            barrier: Mutex::new(None),
        }
    }

    pub fn fail_create_of(&self, name: &str) {
        *self.fail_create.lock().unwrap() = Some(name.to_string());
    }

    /// The worker creating `name` panics instead of returning.
    pub fn panic_on_create_of(&self, name: &str) {
        *self.panic_create.lock().unwrap() = Some(name.to_string());
    }

    pub fn rendezvous(&self, barrier: Arc<Barrier>) {
        *self.barrier.lock().unwrap() = Some(barrier);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn associations(&self) -> usize {
        self.associations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleRepository for RecordingRoles {
    async fn create(&self, name: &str) -> Result<Role, RepositoryError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let barrier = self.barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        let fail = self.fail_create.lock().unwrap().as_deref() == Some(name);
        if fail {
            return Err(injected("role", name));
        }
        let explode = self.panic_create.lock().unwrap().as_deref() == Some(name);
        if explode {
            panic!("injected role panic for {name}");
        }
        self.inner.create(name).await
    }

    async fn associate_scope(
        &self,
        role_name: &str,
        scope_name: &str,
    ) -> Result<(), RepositoryError> {
        self.associations.fetch_add(1, Ordering::SeqCst);
        self.inner.associate_scope(role_name, scope_name).await
    }

    async fn get(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        self.inner.get(name).await
    }

    async fn list(&self) -> Result<Vec<Role>, RepositoryError> {
        self.inner.list().await
    }

    async fn scopes_of(&self, role_name: &str) -> Result<Vec<String>, RepositoryError> {
        self.inner.scopes_of(role_name).await
    }
}

/// Keyspace-backed scope repository that counts calls.
pub struct RecordingScopes {
    inner: KeyspaceScopes,
    creates: AtomicUsize,
    fail_create: Mutex<Option<String>>,
    barrier: Mutex<Option<Arc<Barrier>>>,
}

impl RecordingScopes {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: KeyspaceScopes::new(store),
            creates: AtomicUsize::new(0),
            fail_create: Mutex::new(None),
            barrier: Mutex::new(None),
        }
    }

    pub fn fail_create_of(&self, name: &str) {
        *self.fail_create.lock().unwrap() = Some(name.to_string());
    }

    pub fn rendezvous(&self, barrier: Arc<Barrier>) {
        *self.barrier.lock().unwrap() = Some(barrier);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScopeRepository for RecordingScopes {
    async fn create(&self, name: &str, description: &str) -> Result<Scope, RepositoryError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let barrier = self.barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        let fail = self.fail_create.lock().unwrap().as_deref() == Some(name);
        if fail {
            return Err(injected("scope", name));
        }
        self.inner.create(name, description).await
    }

    async fn get(&self, name: &str) -> Result<Option<Scope>, RepositoryError> {
        self.inner.get(name).await
    }

    async fn list(&self) -> Result<Vec<Scope>, RepositoryError> {
        self.inner.list().await
    }
}

/// Store plus recording collaborators sharing it.
pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub roles: Arc<RecordingRoles>,
    pub scopes: Arc<RecordingScopes>,
}

impl Harness {
    pub fn new(store: FlakyStore) -> Self {
        let store = Arc::new(store);
        let shared: Arc<dyn KeyValueStore> = store.clone();
        Self {
            roles: Arc::new(RecordingRoles::new(shared.clone())),
            scopes: Arc::new(RecordingScopes::new(shared)),
            store,
        }
    }

    pub fn initializer(&self, config: InitializerConfig) -> Initializer {
        Initializer::new(
            self.store.clone(),
            self.roles.clone(),
            self.scopes.clone(),
            config,
        )
    }

    pub fn collaborator_writes(&self) -> usize {
        self.roles.creates() + self.roles.associations() + self.scopes.creates()
    }
}

pub fn config(expected_version: &str) -> InitializerConfig {
    InitializerConfig::new("authboot", expected_version)
}
