//! Aggregation Engine
//!
//! Read-only cost and schedule roll-up over the whole phase/operation corpus.
//! Nothing is cached; every call re-scans the stores.

mod snapshot;

pub use snapshot::{build_snapshot, DashboardSnapshot, OperationTypeCost, Overruns, PhaseCost, Totals};

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::storage::{PersistenceError, Store};
use crate::types::{Operation, Phase};

/// Computes dashboard snapshots from the phase and operation stores.
pub struct DashboardEngine {
    phases: Arc<dyn Store<Phase>>,
    operations: Arc<dyn Store<Operation>>,
    top_n: usize,
}

impl DashboardEngine {
    pub fn new(phases: Arc<dyn Store<Phase>>, operations: Arc<dyn Store<Operation>>, top_n: usize) -> Self {
        Self {
            phases,
            operations,
            top_n,
        }
    }

    /// Snapshot as of today's UTC date.
    pub fn compute_dashboard(&self) -> Result<DashboardSnapshot, PersistenceError> {
        self.compute_dashboard_at(Utc::now().date_naive())
    }

    /// Snapshot with `today` standing in for the end date of open phases.
    pub fn compute_dashboard_at(&self, today: NaiveDate) -> Result<DashboardSnapshot, PersistenceError> {
        let phases = self.phases.all()?;
        let operations = self.operations.all()?;

        let snapshot = build_snapshot(&phases, &operations, today, self.top_n);
        debug!(
            phases = phases.len(),
            operations = operations.len(),
            total_actual = snapshot.totals.total_actual_cost,
            backend = self.phases.backend_name(),
            "Dashboard computed"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    #[test]
    fn test_engine_reads_current_store_contents() {
        let phases = Arc::new(InMemoryStore::<Phase>::new());
        let operations = Arc::new(InMemoryStore::<Operation>::new());
        let engine = DashboardEngine::new(phases.clone(), operations.clone(), 10);
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert_eq!(engine.compute_dashboard_at(today).unwrap().totals.total_phases, 0);

        let phase = phases.save(Phase::new(1, 1)).unwrap();
        let mut op = Operation::new(phase.id.unwrap(), "Drill");
        op.planned_cost = Some(10.0);
        op.actual_cost = Some(12.0);
        operations.save(op).unwrap();

        let snap = engine.compute_dashboard_at(today).unwrap();
        assert_eq!(snap.totals.total_phases, 1);
        assert_eq!(snap.totals.total_actual_cost, 12.0);
        assert_eq!(snap.as_of, Some(today));
    }
}
