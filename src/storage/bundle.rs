//! JSON record bundle for bulk import
//!
//! ```json
//! { "users": [...], "phases": [...], "daily_reports": [...],
//!   "operations": [...], "problems": [...] }
//! ```
//!
//! Every section is optional. Records keep their ids when given, so a bundle
//! can reference its own phases and reports by id.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{PersistenceError, Repositories, Store};
use crate::types::{DailyReport, Operation, Phase, Problem, User};

/// Records to load into a set of repositories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordBundle {
    pub users: Vec<User>,
    pub phases: Vec<Phase>,
    pub daily_reports: Vec<DailyReport>,
    pub operations: Vec<Operation>,
    pub problems: Vec<Problem>,
}

/// Per-section counts of what an import wrote.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub users: usize,
    pub phases: usize,
    pub daily_reports: usize,
    pub operations: usize,
    pub problems: usize,
    /// Operations rejected for invalid cost values
    pub rejected_operations: usize,
}

impl RecordBundle {
    pub fn from_json_str(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, PersistenceError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PersistenceError::Storage(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&contents)
    }

    /// Save every record. Operations with negative or non-finite costs are
    /// skipped with a warning.
    pub fn import_into(self, repos: &Repositories) -> Result<ImportSummary, PersistenceError> {
        let mut summary = ImportSummary {
            users: save_all(repos.users.as_ref(), self.users)?,
            phases: save_all(repos.phases.as_ref(), self.phases)?,
            daily_reports: save_all(repos.daily_reports.as_ref(), self.daily_reports)?,
            ..ImportSummary::default()
        };

        for op in self.operations {
            if let Err(e) = op.validate_costs() {
                warn!(operation = ?op.id, field = e.field, error = %e, "Rejecting operation");
                summary.rejected_operations += 1;
                continue;
            }
            repos.operations.save(op)?;
            summary.operations += 1;
        }

        summary.problems = save_all(repos.problems.as_ref(), self.problems)?;

        info!(
            users = summary.users,
            phases = summary.phases,
            daily_reports = summary.daily_reports,
            operations = summary.operations,
            problems = summary.problems,
            rejected = summary.rejected_operations,
            "Bundle imported"
        );
        Ok(summary)
    }
}

fn save_all<T: super::Record>(store: &dyn Store<T>, records: Vec<T>) -> Result<usize, PersistenceError> {
    let count = records.len();
    for record in records {
        store.save(record)?;
    }
    Ok(count)
}
