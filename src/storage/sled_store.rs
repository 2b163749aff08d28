//! Sled-backed record store
//!
//! Each record type lives in its own named sled tree within one database.
//! Keys are record ids as big-endian u64 (so iteration is in id order),
//! values are JSON. Id allocation goes through a shared "id_counters" tree so
//! concurrent saves never hand out the same id.

use std::marker::PhantomData;
use std::path::Path;

use sled::{Db, Tree};

use super::persistence::{PersistenceError, Record, Store};

const COUNTERS_TREE: &str = "id_counters";

/// Durable store for one record type
pub struct SledStore<T> {
    tree: Tree,
    counters: Tree,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> SledStore<T> {
    /// Open (or create) the tree for `T` inside an already-open database.
    pub fn open_in(db: &Db) -> Result<Self, PersistenceError> {
        let tree = db.open_tree(T::TREE)?;
        let counters = db.open_tree(COUNTERS_TREE)?;
        Ok(Self {
            tree,
            counters,
            _record: PhantomData,
        })
    }

    /// Open a database at `path` holding only this record type.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let db = sled::open(path)?;
        Self::open_in(&db)
    }

    /// Number of stored records
    pub fn count(&self) -> usize {
        self.tree.len()
    }

    fn next_id(&self) -> Result<u64, PersistenceError> {
        // Ids saved explicitly (imports) may run ahead of the counter.
        let floor = match self.tree.last()? {
            Some((key, _)) => decode_id(&key)?,
            None => 0,
        };

        let updated = self.counters.update_and_fetch(T::TREE.as_bytes(), |old| {
            let current = old.and_then(|bytes| decode_id(bytes).ok()).unwrap_or(0);
            Some(current.max(floor).saturating_add(1).to_be_bytes().to_vec())
        })?;

        match updated {
            Some(bytes) => decode_id(&bytes),
            None => Err(PersistenceError::Storage(format!(
                "id counter for '{}' vanished during update",
                T::TREE
            ))),
        }
    }
}

impl<T: Record> Store<T> for SledStore<T> {
    fn get(&self, id: u64) -> Result<Option<T>, PersistenceError> {
        match self.tree.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, mut record: T) -> Result<T, PersistenceError> {
        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = self.next_id()?;
                record.set_id(id);
                id
            }
        };

        let value = serde_json::to_vec(&record)?;
        self.tree.insert(id.to_be_bytes(), value)?;

        tracing::trace!(tree = T::TREE, id, "Record saved");
        Ok(record)
    }

    fn query(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>, PersistenceError> {
        let mut matches = Vec::new();

        for item in self.tree.iter() {
            let (key, value) = item?;
            match serde_json::from_slice::<T>(&value) {
                Ok(record) => {
                    if predicate(&record) {
                        matches.push(record);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        tree = T::TREE,
                        id = decode_id(&key).unwrap_or_default(),
                        error = %e,
                        "Skipping undecodable record"
                    );
                }
            }
        }

        Ok(matches)
    }

    fn delete(&self, id: u64) -> Result<bool, PersistenceError> {
        Ok(self.tree.remove(id.to_be_bytes())?.is_some())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}

fn decode_id(bytes: &[u8]) -> Result<u64, PersistenceError> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| PersistenceError::Storage(format!("malformed record key ({} bytes)", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Operation, Problem, ProblemType, Severity};
    use chrono::NaiveDate;

    #[test]
    fn test_sled_store_save_and_get() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store: SledStore<Operation> = SledStore::open(temp_dir.path()).unwrap();

        let mut op = Operation::new(3, "Run 13 3/8 casing");
        op.planned_cost = Some(5000.0);
        let saved = store.save(op).unwrap();
        assert_eq!(saved.id, Some(1));

        let loaded = store.get(1).unwrap().unwrap();
        assert_eq!(loaded.description, "Run 13 3/8 casing");
        assert_eq!(loaded.planned_cost, Some(5000.0));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_sled_store_ids_skip_past_explicit_ids() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store: SledStore<Operation> = SledStore::open(temp_dir.path()).unwrap();

        let mut imported = Operation::new(1, "imported");
        imported.id = Some(10);
        store.save(imported).unwrap();

        let fresh = store.save(Operation::new(1, "fresh")).unwrap();
        assert_eq!(fresh.id, Some(11));
    }

    #[test]
    fn test_sled_store_query_and_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db = sled::open(temp_dir.path()).unwrap();
        let store: SledStore<Problem> = SledStore::open_in(&db).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        store
            .save(Problem::new(ProblemType::Cost, "a", Severity::Low, today))
            .unwrap();
        store
            .save(Problem::new(ProblemType::Schedule, "b", Severity::Critical, today))
            .unwrap();

        let critical = store.query(&|p: &Problem| p.severity == Severity::Critical).unwrap();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].description, "b");

        assert!(store.delete(1).unwrap());
        assert!(store.get(1).unwrap().is_none());
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn test_decode_id_rejects_short_keys() {
        assert!(decode_id(&[1, 2, 3]).is_err());
        assert_eq!(decode_id(&7u64.to_be_bytes()).unwrap(), 7);
    }
}
