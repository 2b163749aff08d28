//! Store trait: pluggable record storage backend
//!
//! Abstracts load/save-by-id persistence so the detection and aggregation
//! engines never see the backend:
//! - `InMemoryStore`: in-memory store for tests and one-shot runs
//! - `SledStore`: durable sled-backed store (see `sled_store`)

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::types::{DailyReport, Operation, Phase, Problem, User};

/// A persistable record with an optional store-assigned id.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the sled tree (and log label) for this record type
    const TREE: &'static str;

    fn id(&self) -> Option<u64>;

    fn set_id(&mut self, id: u64);
}

macro_rules! impl_record {
    ($ty:ty, $tree:literal) => {
        impl Record for $ty {
            const TREE: &'static str = $tree;

            fn id(&self) -> Option<u64> {
                self.id
            }

            fn set_id(&mut self, id: u64) {
                self.id = Some(id);
            }
        }
    };
}

impl_record!(Operation, "operations");
impl_record!(Phase, "phases");
impl_record!(DailyReport, "daily_reports");
impl_record!(User, "users");
impl_record!(Problem, "problems");

/// Trait for pluggable record stores
///
/// Implementations must be thread-safe (Send + Sync) so independent report
/// submissions can be processed in parallel.
pub trait Store<T: Record>: Send + Sync {
    /// Load a record by id
    fn get(&self, id: u64) -> Result<Option<T>, PersistenceError>;

    /// Insert or replace a record, assigning an id when it has none
    fn save(&self, record: T) -> Result<T, PersistenceError>;

    /// All records matching `predicate`, in ascending id order
    fn query(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>, PersistenceError>;

    /// Remove a record. Returns whether it existed.
    fn delete(&self, id: u64) -> Result<bool, PersistenceError>;

    /// Every record, in ascending id order
    fn all(&self) -> Result<Vec<T>, PersistenceError> {
        self.query(&|_| true)
    }

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sled::Error> for PersistenceError {
    fn from(err: sled::Error) -> Self {
        PersistenceError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

/// In-memory record store
///
/// Thread-safe via `RwLock`. Not durable: data is lost on restart.
/// Ids only move forward, so a deleted record's id is never handed out again.
pub struct InMemoryStore<T> {
    records: RwLock<BTreeMap<u64, T>>,
    /// Highest id seen. Only written while holding the `records` write lock.
    last_id: AtomicU64,
}

impl<T: Record> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            last_id: AtomicU64::new(0),
        }
    }

    /// Store pre-populated with `records` (ids assigned where missing)
    pub fn with_records(records: impl IntoIterator<Item = T>) -> Result<Self, PersistenceError> {
        let store = Self::new();
        for record in records {
            store.save(record)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> Result<usize, PersistenceError> {
        let records = self
            .records
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool, PersistenceError> {
        Ok(self.len()? == 0)
    }
}

impl<T: Record> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Store<T> for InMemoryStore<T> {
    fn get(&self, id: u64) -> Result<Option<T>, PersistenceError> {
        let records = self
            .records
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        Ok(records.get(&id).cloned())
    }

    fn save(&self, mut record: T) -> Result<T, PersistenceError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        let id = match record.id() {
            Some(id) => {
                self.last_id.fetch_max(id, Ordering::SeqCst);
                id
            }
            None => {
                let next = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                record.set_id(next);
                next
            }
        };
        records.insert(id, record.clone());

        Ok(record)
    }

    fn query(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>, PersistenceError> {
        let records = self
            .records
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        Ok(records.values().filter(|r| predicate(r)).cloned().collect())
    }

    fn delete(&self, id: u64) -> Result<bool, PersistenceError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        Ok(records.remove(&id).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
