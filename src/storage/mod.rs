//! Record storage collaborators
//!
//! The engines consume records through the `Store` trait only. Two backends
//! ship with the crate: an in-memory store and a sled database with one tree
//! per record type.

pub mod bundle;
pub mod persistence;
pub mod queries;
pub mod sled_store;

pub use bundle::{ImportSummary, RecordBundle};
pub use persistence::{InMemoryStore, PersistenceError, Record, Store};
pub use queries::{OperationQueries, ProblemQueries};
pub use sled_store::SledStore;

use std::path::Path;
use std::sync::Arc;

use crate::types::{DailyReport, Operation, Phase, Problem, User};

/// Handles to every record store the services need.
#[derive(Clone)]
pub struct Repositories {
    pub problems: Arc<dyn Store<Problem>>,
    pub operations: Arc<dyn Store<Operation>>,
    pub phases: Arc<dyn Store<Phase>>,
    pub daily_reports: Arc<dyn Store<DailyReport>>,
    pub users: Arc<dyn Store<User>>,
    db: Option<sled::Db>,
}

impl Repositories {
    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            problems: Arc::new(InMemoryStore::<Problem>::new()),
            operations: Arc::new(InMemoryStore::<Operation>::new()),
            phases: Arc::new(InMemoryStore::<Phase>::new()),
            daily_reports: Arc::new(InMemoryStore::<DailyReport>::new()),
            users: Arc::new(InMemoryStore::<User>::new()),
            db: None,
        }
    }

    /// Open (or create) the sled database at `path` with all record trees
    pub fn open_sled<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;

        let repos = Self {
            problems: Arc::new(SledStore::<Problem>::open_in(&db)?),
            operations: Arc::new(SledStore::<Operation>::open_in(&db)?),
            phases: Arc::new(SledStore::<Phase>::open_in(&db)?),
            daily_reports: Arc::new(SledStore::<DailyReport>::open_in(&db)?),
            users: Arc::new(SledStore::<User>::open_in(&db)?),
            db: Some(db),
        };

        tracing::info!(path = %path_ref.display(), "Record database opened");
        Ok(repos)
    }

    /// Flush pending writes to disk (no-op for in-memory stores)
    pub fn flush(&self) -> Result<(), PersistenceError> {
        if let Some(db) = &self.db {
            db.flush()?;
        }
        Ok(())
    }

    /// Backend name for logging
    pub fn backend_name(&self) -> &'static str {
        self.problems.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_repositories_are_empty() {
        let repos = Repositories::in_memory();
        assert_eq!(repos.backend_name(), "InMemory");
        assert!(repos.problems.all().unwrap().is_empty());
        assert!(repos.flush().is_ok());
    }

    #[test]
    fn test_sled_repositories_share_one_database() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repos = Repositories::open_sled(temp_dir.path()).unwrap();
        assert_eq!(repos.backend_name(), "Sled");

        let phase = repos.phases.save(Phase::new(1, 1)).unwrap();
        let op = repos.operations.save(Operation::new(1, "spud")).unwrap();
        assert_eq!(phase.id, Some(1));
        assert_eq!(op.id, Some(1));
        repos.flush().unwrap();
    }
}
