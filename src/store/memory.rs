use super::keyspace::{Keyspace, Read, Reply};
use super::KeyValueStore;
use crate::util::error::StoreError;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Process-local store. Every operation holds the keyspace lock for its full
/// duration, which makes [`KeyValueStore::transaction`] atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    keyspace: Mutex<Keyspace>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyspace(keyspace: Keyspace) -> Self {
        Self {
            keyspace: Mutex::new(keyspace),
        }
    }

    pub fn snapshot(&self) -> Keyspace {
        self.keyspace.lock().clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn transaction(&self, reads: &[Read]) -> Result<Vec<Reply>, StoreError> {
        self.keyspace.lock().execute(reads)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.keyspace.lock().get(key)?.map(str::to_string))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.keyspace.lock().set(key, value);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        Ok(self.keyspace.lock().set_if_absent(key, value))
    }

    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        self.keyspace.lock().incr(key)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.keyspace.lock().set_add(key, member)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.keyspace.lock().set_members(key)
    }

    async fn dbsize(&self) -> Result<u64, StoreError> {
        Ok(self.keyspace.lock().len())
    }
}
