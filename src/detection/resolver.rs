//! Match findings against stored problems
//!
//! Lookup order for an existing, non-closed problem:
//! 1. the structured anomaly key
//! 2. cost findings: same operation with type COST
//! 3. phase findings: legacy description substring, unkeyed records only
//!
//! A match is updated in place (description, impact, severity). Anything else
//! becomes a fresh OPEN problem. Nothing here writes to the store.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use super::findings::Finding;
use crate::storage::{PersistenceError, ProblemQueries, Store};
use crate::types::{Problem, ProblemType, RuleFamily, UserId};

/// Outcome of matching a single finding.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No live record matched; a new OPEN problem to insert
    Created(Problem),
    /// An existing record refreshed with the finding's figures
    Updated(Problem),
}

impl Resolution {
    pub fn problem(&self) -> &Problem {
        match self {
            Resolution::Created(p) | Resolution::Updated(p) => p,
        }
    }

    pub fn into_problem(self) -> Problem {
        match self {
            Resolution::Created(p) | Resolution::Updated(p) => p,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }
}

/// Finds the live problem a finding refers to, or drafts a new one.
pub struct ProblemResolver {
    problems: Arc<dyn Store<Problem>>,
    legacy_description_match: bool,
}

impl ProblemResolver {
    pub fn new(problems: Arc<dyn Store<Problem>>, legacy_description_match: bool) -> Self {
        Self {
            problems,
            legacy_description_match,
        }
    }

    /// Resolve a finding to an insert or an in-place update.
    ///
    /// Updates keep status, detection date and reporter. The anomaly key is
    /// stamped on the record so later passes match it structurally.
    pub fn resolve(
        &self,
        finding: &Finding,
        today: NaiveDate,
        reporter: Option<UserId>,
    ) -> Result<Resolution, PersistenceError> {
        if let Some(mut existing) = self.find_existing(finding)? {
            refresh(&mut existing, finding);
            return Ok(Resolution::Updated(existing));
        }

        let mut problem = Problem::new(
            finding.family().problem_type(),
            finding.description.clone(),
            finding.severity,
            today,
        );
        problem.cost_impact = finding.cost_impact;
        problem.delay_impact = finding.delay_impact;
        problem.operation_id = finding.operation_id;
        problem.reported_by = reporter;
        problem.proposed_solution = Some(finding.proposed_solution.to_string());
        problem.anomaly_key = Some(finding.key);

        Ok(Resolution::Created(problem))
    }

    fn find_existing(&self, finding: &Finding) -> Result<Option<Problem>, PersistenceError> {
        let keyed = self.problems.find_open_by_key(&finding.key)?;
        if !keyed.is_empty() {
            return Ok(first_of(keyed, finding));
        }

        match finding.family() {
            RuleFamily::Cost => {
                let Some(operation_id) = finding.operation_id else {
                    return Ok(None);
                };
                let by_operation = self
                    .problems
                    .find_open_by_operation_and_type(operation_id, ProblemType::Cost)?;
                Ok(first_of(by_operation, finding))
            }
            RuleFamily::Depth | RuleFamily::Schedule => {
                if !self.legacy_description_match {
                    return Ok(None);
                }
                let Some(prefix) = finding.legacy_prefix.as_deref() else {
                    return Ok(None);
                };
                // Keyed records already failed the structural match, so a
                // description hit on them belongs to another phase
                let legacy: Vec<Problem> = self
                    .problems
                    .find_open_by_description(prefix)?
                    .into_iter()
                    .filter(|p| p.anomaly_key.is_none())
                    .collect();
                Ok(first_of(legacy, finding))
            }
        }
    }
}

/// Oldest candidate wins. Store queries return ascending ids.
fn first_of(candidates: Vec<Problem>, finding: &Finding) -> Option<Problem> {
    if candidates.len() > 1 {
        debug!(
            key = %finding.key,
            matches = candidates.len(),
            "Several live problems match one finding, updating the oldest"
        );
    }
    candidates.into_iter().next()
}

fn refresh(problem: &mut Problem, finding: &Finding) {
    problem.description = finding.description.clone();
    problem.severity = finding.severity;
    if finding.cost_impact.is_some() {
        problem.cost_impact = finding.cost_impact;
    }
    if finding.delay_impact.is_some() {
        problem.delay_impact = finding.delay_impact;
    }
    problem.anomaly_key = Some(finding.key);
}
