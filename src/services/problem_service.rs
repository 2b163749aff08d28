//! Problem register management

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::ServiceError;
use crate::storage::{ProblemQueries, Repositories, Store};
use crate::types::{
    Operation, OperationId, Problem, ProblemId, ProblemPatch, ProblemStatus, ProblemType, Severity,
    User, UserId,
};

/// Finders and lifecycle transitions over the problem store.
///
/// Operation and user links in a patch are only applied when the referenced
/// record exists. Unknown references are dropped with a warning and the rest
/// of the patch still applies.
#[derive(Clone)]
pub struct ProblemService {
    problems: Arc<dyn Store<Problem>>,
    operations: Arc<dyn Store<Operation>>,
    users: Arc<dyn Store<User>>,
}

impl ProblemService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            problems: repos.problems.clone(),
            operations: repos.operations.clone(),
            users: repos.users.clone(),
        }
    }

    // ========================================================================
    // Finders
    // ========================================================================

    pub fn find_all(&self) -> Result<Vec<Problem>, ServiceError> {
        Ok(self.problems.all()?)
    }

    pub fn find_by_id(&self, id: ProblemId) -> Result<Option<Problem>, ServiceError> {
        Ok(self.problems.get(id)?)
    }

    pub fn find_by_operation(&self, operation_id: OperationId) -> Result<Vec<Problem>, ServiceError> {
        Ok(self.problems.find_by_operation(operation_id)?)
    }

    /// Problems of the type named by `label` (e.g. "COST", "depth").
    pub fn find_by_type_label(&self, label: &str) -> Result<Vec<Problem>, ServiceError> {
        let problem_type: ProblemType = label.parse()?;
        Ok(self.problems.find_by_type(problem_type)?)
    }

    pub fn find_by_severity_label(&self, label: &str) -> Result<Vec<Problem>, ServiceError> {
        let severity: Severity = label.parse()?;
        Ok(self.problems.find_by_severity(severity)?)
    }

    pub fn find_by_status_label(&self, label: &str) -> Result<Vec<Problem>, ServiceError> {
        let status: ProblemStatus = label.parse()?;
        Ok(self.problems.find_by_status(status)?)
    }

    pub fn find_by_reporter(&self, user_id: UserId) -> Result<Vec<Problem>, ServiceError> {
        Ok(self.problems.find_by_reporter(user_id)?)
    }

    pub fn find_by_resolver(&self, user_id: UserId) -> Result<Vec<Problem>, ServiceError> {
        Ok(self.problems.find_by_resolver(user_id)?)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert a problem as a new record. Any id on the input is ignored.
    pub fn create(&self, mut problem: Problem) -> Result<Problem, ServiceError> {
        problem.id = None;
        if problem.description.trim().is_empty() {
            return Err(ServiceError::Invalid("description must not be empty".to_string()));
        }
        let saved = self.problems.save(problem)?;
        info!(problem_id = ?saved.id, problem_type = %saved.problem_type, "Problem created");
        Ok(saved)
    }

    /// Create from a partial record: type and description are required,
    /// detection date defaults to today and status to OPEN.
    pub fn create_from_patch(&self, patch: ProblemPatch) -> Result<Problem, ServiceError> {
        self.create_from_patch_on(patch, Utc::now().date_naive())
    }

    pub fn create_from_patch_on(&self, patch: ProblemPatch, today: NaiveDate) -> Result<Problem, ServiceError> {
        let problem_type = patch
            .problem_type
            .ok_or_else(|| ServiceError::Invalid("type is required".to_string()))?;
        let description = patch.description.clone().unwrap_or_default();
        let detection_date = patch.detection_date.unwrap_or(today);

        let patch = self.checked_links(patch)?;
        let mut problem = Problem::new(problem_type, description, patch.severity.unwrap_or_default(), detection_date);
        problem.apply_patch(patch, today);
        self.create(problem)
    }

    /// Apply `patch` to an existing problem. `None` when the id is unknown.
    pub fn update(&self, id: ProblemId, patch: ProblemPatch) -> Result<Option<Problem>, ServiceError> {
        self.update_on(id, patch, Utc::now().date_naive())
    }

    pub fn update_on(
        &self,
        id: ProblemId,
        patch: ProblemPatch,
        today: NaiveDate,
    ) -> Result<Option<Problem>, ServiceError> {
        let Some(mut problem) = self.problems.get(id)? else {
            return Ok(None);
        };
        let patch = self.checked_links(patch)?;
        problem.apply_patch(patch, today);
        Ok(Some(self.problems.save(problem)?))
    }

    /// Remove a problem. Returns whether it existed.
    pub fn delete(&self, id: ProblemId) -> Result<bool, ServiceError> {
        let removed = self.problems.delete(id)?;
        if removed {
            info!(problem_id = id, "Problem deleted");
        }
        Ok(removed)
    }

    /// Mark a problem RESOLVED, stamping today's date if none is recorded.
    pub fn resolve(&self, id: ProblemId, resolved_by: Option<UserId>) -> Result<Option<Problem>, ServiceError> {
        self.resolve_on(id, resolved_by, Utc::now().date_naive())
    }

    pub fn resolve_on(
        &self,
        id: ProblemId,
        resolved_by: Option<UserId>,
        today: NaiveDate,
    ) -> Result<Option<Problem>, ServiceError> {
        let resolved_by = match resolved_by {
            Some(user_id) if !self.user_exists(user_id)? => None,
            other => other,
        };
        self.transition(id, |p| p.resolve(resolved_by, today))
    }

    /// Mark a problem CLOSED. Closed problems are never matched by detection.
    pub fn close(&self, id: ProblemId) -> Result<Option<Problem>, ServiceError> {
        self.transition(id, Problem::close)
    }

    /// Clear patch links that point at operations or users not in the store.
    fn checked_links(&self, mut patch: ProblemPatch) -> Result<ProblemPatch, ServiceError> {
        if let Some(operation_id) = patch.operation_id {
            if self.operations.get(operation_id)?.is_none() {
                warn!(operation_id, "Unknown operation, link not applied");
                patch.operation_id = None;
            }
        }
        if let Some(user_id) = patch.reported_by {
            if !self.user_exists(user_id)? {
                patch.reported_by = None;
            }
        }
        if let Some(user_id) = patch.resolved_by {
            if !self.user_exists(user_id)? {
                patch.resolved_by = None;
            }
        }
        Ok(patch)
    }

    fn user_exists(&self, user_id: UserId) -> Result<bool, ServiceError> {
        let exists = self.users.get(user_id)?.is_some();
        if !exists {
            warn!(user_id, "Unknown user, link not applied");
        }
        Ok(exists)
    }

    fn transition(&self, id: ProblemId, apply: impl FnOnce(&mut Problem)) -> Result<Option<Problem>, ServiceError> {
        let Some(mut problem) = self.problems.get(id)? else {
            return Ok(None);
        };
        let from = problem.status;
        apply(&mut problem);
        let saved = self.problems.save(problem)?;
        info!(problem_id = id, from = %from, to = %saved.status, "Problem status changed");
        Ok(Some(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Service over fresh stores holding users 1 and 2 and operation 1.
    fn service() -> ProblemService {
        let repos = Repositories::in_memory();
        for (id, name) in [(1, "system"), (2, "supervisor")] {
            repos
                .users
                .save(User {
                    id: Some(id),
                    name: name.to_string(),
                    role: "engineer".to_string(),
                })
                .unwrap();
        }
        repos.operations.save(Operation::new(1, "Drill 26in section")).unwrap();
        ProblemService::new(&repos)
    }

    fn cost_problem(op: u64) -> Problem {
        let mut p = Problem::new(ProblemType::Cost, "overrun", Severity::Critical, date(2024, 1, 1));
        p.operation_id = Some(op);
        p.reported_by = Some(1);
        p
    }

    #[test]
    fn test_create_assigns_fresh_id() {
        let svc = service();
        let mut p = cost_problem(3);
        p.id = Some(500);
        let saved = svc.create(p).unwrap();
        assert_eq!(saved.id, Some(1));
        assert_eq!(svc.find_by_id(1).unwrap(), Some(saved));
    }

    #[test]
    fn test_create_rejects_blank_description() {
        let svc = service();
        let mut p = cost_problem(3);
        p.description = "  ".to_string();
        assert!(matches!(svc.create(p), Err(ServiceError::Invalid(_))));
    }

    #[test]
    fn test_create_from_patch_defaults() {
        let svc = service();
        let patch = ProblemPatch {
            problem_type: Some(ProblemType::Technical),
            description: Some("Stuck pipe".to_string()),
            ..Default::default()
        };
        let p = svc.create_from_patch_on(patch, date(2024, 5, 1)).unwrap();
        assert_eq!(p.detection_date, date(2024, 5, 1));
        assert_eq!(p.status, ProblemStatus::Open);
        assert_eq!(p.severity, Severity::Low);

        let missing_type = ProblemPatch {
            description: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(svc.create_from_patch(missing_type), Err(ServiceError::Invalid(_))));
    }

    #[test]
    fn test_label_finders() {
        let svc = service();
        svc.create(cost_problem(3)).unwrap();

        assert_eq!(svc.find_by_type_label("cost").unwrap().len(), 1);
        assert_eq!(svc.find_by_severity_label("CRITICAL").unwrap().len(), 1);
        assert_eq!(svc.find_by_status_label("open").unwrap().len(), 1);
        assert!(svc.find_by_status_label("closed").unwrap().is_empty());

        let err = svc.find_by_type_label("safety").unwrap_err();
        assert!(matches!(err, ServiceError::Label(_)));
    }

    #[test]
    fn test_update_unknown_id_is_none() {
        let svc = service();
        assert!(svc.update(42, ProblemPatch::default()).unwrap().is_none());
    }

    #[test]
    fn test_update_to_resolved_stamps_date() {
        let svc = service();
        let p = svc.create(cost_problem(3)).unwrap();
        let patch = ProblemPatch {
            status: Some(ProblemStatus::Resolved),
            implemented_solution: Some("Renegotiated rig rate".to_string()),
            ..Default::default()
        };
        let updated = svc.update_on(p.id.unwrap(), patch, date(2024, 2, 1)).unwrap().unwrap();
        assert_eq!(updated.resolution_date, Some(date(2024, 2, 1)));
        assert_eq!(updated.implemented_solution.as_deref(), Some("Renegotiated rig rate"));
    }

    #[test]
    fn test_update_links_only_existing_records() {
        let svc = service();
        let id = svc.create(cost_problem(3)).unwrap().id.unwrap();

        let patch = ProblemPatch {
            operation_id: Some(1),
            resolved_by: Some(2),
            ..Default::default()
        };
        let linked = svc.update_on(id, patch, date(2024, 2, 1)).unwrap().unwrap();
        assert_eq!(linked.operation_id, Some(1));
        assert_eq!(linked.resolved_by, Some(2));

        let patch = ProblemPatch {
            operation_id: Some(77),
            reported_by: Some(88),
            resolved_by: Some(99),
            description: Some("still applied".to_string()),
            ..Default::default()
        };
        let kept = svc.update_on(id, patch, date(2024, 2, 2)).unwrap().unwrap();
        assert_eq!(kept.operation_id, Some(1));
        assert_eq!(kept.reported_by, Some(1));
        assert_eq!(kept.resolved_by, Some(2));
        assert_eq!(kept.description, "still applied");
    }

    #[test]
    fn test_create_from_patch_drops_unknown_links() {
        let svc = service();
        let patch = ProblemPatch {
            problem_type: Some(ProblemType::Technical),
            description: Some("Lost circulation".to_string()),
            operation_id: Some(404),
            reported_by: Some(1),
            ..Default::default()
        };
        let p = svc.create_from_patch_on(patch, date(2024, 5, 1)).unwrap();
        assert_eq!(p.operation_id, None);
        assert_eq!(p.reported_by, Some(1));
    }

    #[test]
    fn test_resolve_by_unknown_user_leaves_resolver_unset() {
        let svc = service();
        let id = svc.create(cost_problem(3)).unwrap().id.unwrap();
        let resolved = svc.resolve_on(id, Some(42), date(2024, 3, 1)).unwrap().unwrap();
        assert_eq!(resolved.status, ProblemStatus::Resolved);
        assert_eq!(resolved.resolved_by, None);
    }

    #[test]
    fn test_resolve_and_close() {
        let svc = service();
        let id = svc.create(cost_problem(3)).unwrap().id.unwrap();

        let resolved = svc.resolve_on(id, Some(2), date(2024, 3, 1)).unwrap().unwrap();
        assert_eq!(resolved.status, ProblemStatus::Resolved);
        assert_eq!(resolved.resolved_by, Some(2));
        assert_eq!(svc.find_by_resolver(2).unwrap().len(), 1);

        let closed = svc.close(id).unwrap().unwrap();
        assert_eq!(closed.status, ProblemStatus::Closed);
        assert!(svc.close(999).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let svc = service();
        let id = svc.create(cost_problem(3)).unwrap().id.unwrap();
        assert!(svc.delete(id).unwrap());
        assert!(!svc.delete(id).unwrap());
        assert!(svc.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_reporter_and_operation_finders() {
        let svc = service();
        svc.create(cost_problem(3)).unwrap();
        svc.create(cost_problem(4)).unwrap();
        assert_eq!(svc.find_by_reporter(1).unwrap().len(), 2);
        assert_eq!(svc.find_by_operation(4).unwrap().len(), 1);
    }
}
