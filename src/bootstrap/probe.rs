use crate::bootstrap::version::VersionKeys;
use crate::store::{KeyValueStore, Read, Reply};
use crate::util::error::StoreError;
use log::debug;
use serde::Serialize;
use thiserror::Error;

/// Store state observed by one atomic probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeSnapshot {
    pub legacy_version: Option<String>,
    pub current_version: Option<String>,
    pub dbsize: u64,
}

impl ProbeSnapshot {
    /// Legacy marker, with an empty value counted as unset.
    pub fn legacy(&self) -> Option<&str> {
        marker(&self.legacy_version)
    }

    /// Namespaced marker, with an empty value counted as unset.
    pub fn current(&self) -> Option<&str> {
        marker(&self.current_version)
    }

    /// The namespaced marker wins over the legacy one.
    pub fn effective_version(&self) -> Option<&str> {
        self.current().or(self.legacy())
    }
}

fn marker(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|version| !version.is_empty())
}

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("probe transaction failed: {0}")]
    Store(#[from] StoreError),
    #[error("probe transaction returned {got} replies, expected {expected}")]
    ReplyCount { got: usize, expected: usize },
    #[error("probe reply {index} has unexpected shape {reply:?}")]
    UnexpectedReply { index: usize, reply: Reply },
}

/// Reads both version markers and the key count in a single transaction.
#[derive(Debug, Clone)]
pub struct StoreProbe {
    keys: VersionKeys,
}

impl StoreProbe {
    pub fn new(keys: VersionKeys) -> Self {
        Self { keys }
    }

    pub async fn run(&self, store: &dyn KeyValueStore) -> Result<ProbeSnapshot, TransactionError> {
        let reads = [
            Read::Get(self.keys.legacy.clone()),
            Read::Get(self.keys.namespaced.clone()),
            Read::DbSize,
        ];
        let replies: [Reply; 3] = store
            .transaction(&reads)
            .await?
            .try_into()
            .map_err(|replies: Vec<Reply>| TransactionError::ReplyCount {
                got: replies.len(),
                expected: reads.len(),
            })?;
        let [legacy, current, count] = replies;
        let legacy_version = expect_value(0, legacy)?;
        let current_version = expect_value(1, current)?;
        let dbsize = match count {
            Reply::Count(count) => count,
            reply => return Err(TransactionError::UnexpectedReply { index: 2, reply }),
        };

        let snapshot = ProbeSnapshot {
            legacy_version,
            current_version,
            dbsize,
        };
        debug!(
            "event=store_probe legacy={:?} current={:?} dbsize={}",
            snapshot.legacy_version, snapshot.current_version, snapshot.dbsize
        );
        Ok(snapshot)
    }
}

fn expect_value(index: usize, reply: Reply) -> Result<Option<String>, TransactionError> {
    match reply {
        Reply::Value(value) => Ok(value),
        reply => Err(TransactionError::UnexpectedReply { index, reply }),
    }
}
