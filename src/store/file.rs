use super::keyspace::{Keyspace, Read, Reply};
use super::KeyValueStore;
use crate::util::error::StoreError;
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Keyspace persisted as a JSON snapshot. Each mutation is applied to a copy,
/// written to `<path>.tmp`, synced and renamed over `path`; the in-memory view
/// only advances once the rename succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    keyspace: Mutex<Keyspace>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let keyspace = load_or_default(&path)?;
        debug!(
            "event=file_store_open path={} keys={}",
            path.display(),
            keyspace.len()
        );
        Ok(Self {
            path,
            keyspace: Mutex::new(keyspace),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Keyspace) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.keyspace.lock();
        let mut next = guard.clone();
        let outcome = apply(&mut next)?;
        if next != *guard {
            persist(&self.path, &next)?;
            *guard = next;
        }
        Ok(outcome)
    }
}

fn load_or_default(path: &Path) -> Result<Keyspace, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Keyspace::default()),
        Err(err) => Err(StoreError::Io(err)),
    }
}

fn persist(path: &Path, keyspace: &Keyspace) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    let mut tmp_file = fs::File::create(&tmp_path)?;
    let payload = serde_json::to_vec_pretty(keyspace)?;
    tmp_file.write_all(&payload)?;
    tmp_file.sync_all()?;
    fs::rename(tmp_path, path)?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn transaction(&self, reads: &[Read]) -> Result<Vec<Reply>, StoreError> {
        self.keyspace.lock().execute(reads)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.keyspace.lock().get(key)?.map(str::to_string))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.mutate(|keyspace| {
            keyspace.set(key, value);
            Ok(())
        })
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.mutate(|keyspace| Ok(keyspace.set_if_absent(key, value)))
    }

    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        self.mutate(|keyspace| keyspace.incr(key))
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.mutate(|keyspace| keyspace.set_add(key, member))
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.keyspace.lock().set_members(key)
    }

    async fn dbsize(&self) -> Result<u64, StoreError> {
        Ok(self.keyspace.lock().len())
    }
}
