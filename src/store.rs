//! Key-value store protocol consumed by the bootstrap, plus the in-process and
//! file-backed backends that implement it.

pub mod file;
pub mod keyspace;
pub mod memory;

use crate::util::error::StoreError;
use async_trait::async_trait;

pub use file::FileStore;
pub use keyspace::{Keyspace, Read, Reply, Value};
pub use memory::MemoryStore;

/// Operations the bootstrap and the keyspace-backed collaborators need from a
/// store. Implementations must evaluate [`KeyValueStore::transaction`]
/// atomically: no write may interleave with the reads of one batch.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn transaction(&self, reads: &[Read]) -> Result<Vec<Reply>, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Sets `key` only when no value of any type exists under it.
    /// Returns `true` when the write happened.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Increments the integer under `key` (missing counts as zero) and returns the new value.
    async fn incr(&self, key: &str) -> Result<u64, StoreError>;

    /// Adds `member` to the set under `key`. Returns `false` if it was already present.
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    async fn dbsize(&self) -> Result<u64, StoreError>;
}
