use crate::util::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One read inside an atomic [`crate::store::KeyValueStore::transaction`] batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Read {
    Get(String),
    DbSize,
}

/// Reply to a [`Read`], positionally matched to the request batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Value(Option<String>),
    Count(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Set(BTreeSet<String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Set(_) => "set",
        }
    }
}

/// Plain in-memory keyspace shared by the store backends. Callers provide
/// the locking; every method here is a single synchronous step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyspace {
    #[serde(default)]
    entries: BTreeMap<String, Value>,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Result<Option<&str>, StoreError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(wrong_type(key, "string", other)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    pub fn set_if_absent(&mut self, key: &str, value: &str) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.set(key, value);
        true
    }

    pub fn incr(&mut self, key: &str) -> Result<u64, StoreError> {
        let current = match self.get(key)? {
            None => 0,
            Some(raw) => raw.parse::<u64>().map_err(|_| StoreError::NotAnInteger {
                key: key.to_string(),
            })?,
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::CounterOverflow {
                key: key.to_string(),
            })?;
        self.set(key, &next.to_string());
        Ok(next)
    }

    pub fn set_add(&mut self, key: &str, member: &str) -> Result<bool, StoreError> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()));
        match entry {
            Value::Set(members) => Ok(members.insert(member.to_string())),
            other => Err(wrong_type(key, "set", other)),
        }
    }

    pub fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.entries.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(other) => Err(wrong_type(key, "set", other)),
        }
    }

    /// Evaluates a read batch against one consistent view of the keyspace.
    pub fn execute(&self, reads: &[Read]) -> Result<Vec<Reply>, StoreError> {
        reads
            .iter()
            .map(|read| match read {
                Read::Get(key) => Ok(Reply::Value(self.get(key)?.map(str::to_string))),
                Read::DbSize => Ok(Reply::Count(self.len())),
            })
            .collect()
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &Value) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}
