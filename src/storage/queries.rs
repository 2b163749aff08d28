//! Typed finders layered over the generic `Store::query`

use super::persistence::{PersistenceError, Store};
use crate::types::{
    AnomalyKey, DailyReportId, Operation, OperationId, PhaseId, Problem, ProblemStatus,
    ProblemType, Severity, UserId,
};

/// Problem lookups used by the detector and the management service.
///
/// "Open" here means any status except `Closed`.
pub trait ProblemQueries {
    fn find_open_by_operation_and_type(
        &self,
        operation_id: OperationId,
        problem_type: ProblemType,
    ) -> Result<Vec<Problem>, PersistenceError>;

    fn find_open_by_description(&self, fragment: &str) -> Result<Vec<Problem>, PersistenceError>;

    fn find_open_by_key(&self, key: &AnomalyKey) -> Result<Vec<Problem>, PersistenceError>;

    fn find_by_operation(&self, operation_id: OperationId) -> Result<Vec<Problem>, PersistenceError>;

    fn find_by_type(&self, problem_type: ProblemType) -> Result<Vec<Problem>, PersistenceError>;

    fn find_by_severity(&self, severity: Severity) -> Result<Vec<Problem>, PersistenceError>;

    fn find_by_status(&self, status: ProblemStatus) -> Result<Vec<Problem>, PersistenceError>;

    fn find_by_reporter(&self, user_id: UserId) -> Result<Vec<Problem>, PersistenceError>;

    fn find_by_resolver(&self, user_id: UserId) -> Result<Vec<Problem>, PersistenceError>;
}

impl<S: Store<Problem> + ?Sized> ProblemQueries for S {
    fn find_open_by_operation_and_type(
        &self,
        operation_id: OperationId,
        problem_type: ProblemType,
    ) -> Result<Vec<Problem>, PersistenceError> {
        self.query(&|p: &Problem| {
            !p.is_closed() && p.operation_id == Some(operation_id) && p.problem_type == problem_type
        })
    }

    fn find_open_by_description(&self, fragment: &str) -> Result<Vec<Problem>, PersistenceError> {
        self.query(&|p: &Problem| !p.is_closed() && p.description.contains(fragment))
    }

    fn find_open_by_key(&self, key: &AnomalyKey) -> Result<Vec<Problem>, PersistenceError> {
        self.query(&|p: &Problem| !p.is_closed() && p.anomaly_key.as_ref() == Some(key))
    }

    fn find_by_operation(&self, operation_id: OperationId) -> Result<Vec<Problem>, PersistenceError> {
        self.query(&|p: &Problem| p.operation_id == Some(operation_id))
    }

    fn find_by_type(&self, problem_type: ProblemType) -> Result<Vec<Problem>, PersistenceError> {
        self.query(&|p: &Problem| p.problem_type == problem_type)
    }

    fn find_by_severity(&self, severity: Severity) -> Result<Vec<Problem>, PersistenceError> {
        self.query(&|p: &Problem| p.severity == severity)
    }

    fn find_by_status(&self, status: ProblemStatus) -> Result<Vec<Problem>, PersistenceError> {
        self.query(&|p: &Problem| p.status == status)
    }

    fn find_by_reporter(&self, user_id: UserId) -> Result<Vec<Problem>, PersistenceError> {
        self.query(&|p: &Problem| p.reported_by == Some(user_id))
    }

    fn find_by_resolver(&self, user_id: UserId) -> Result<Vec<Problem>, PersistenceError> {
        self.query(&|p: &Problem| p.resolved_by == Some(user_id))
    }
}

/// Operation lookups by parent record.
///
/// `find_by_daily_report` feeds detection when no explicit operation list
/// comes with a report.
pub trait OperationQueries {
    fn find_by_phase(&self, phase_id: PhaseId) -> Result<Vec<Operation>, PersistenceError>;

    fn find_by_daily_report(
        &self,
        report_id: DailyReportId,
    ) -> Result<Vec<Operation>, PersistenceError>;
}

impl<S: Store<Operation> + ?Sized> OperationQueries for S {
    fn find_by_phase(&self, phase_id: PhaseId) -> Result<Vec<Operation>, PersistenceError> {
        self.query(&|o: &Operation| o.phase_id == phase_id)
    }

    fn find_by_daily_report(
        &self,
        report_id: DailyReportId,
    ) -> Result<Vec<Operation>, PersistenceError> {
        self.query(&|o: &Operation| o.daily_report_id == Some(report_id))
    }
}
