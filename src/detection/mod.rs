//! Anomaly Detection Engine
//!
//! Evaluates one daily report submission against plan and keeps the problem
//! register in step with what it finds:
//!
//! ```text
//! ReportSubmission ──▶ findings (cost / depth / schedule)
//!                          │
//!                          ▼
//!                   ProblemResolver ──▶ Created | Updated ──▶ Store<Problem>
//! ```
//!
//! Each finding is persisted independently. A failed save is logged and
//! reported in `DetectionOutcome::failures` while the remaining findings
//! carry on.

pub mod classifier;
pub mod findings;
pub mod resolver;

pub use classifier::{classify, classify_delay, overrun_percentage};
pub use findings::Finding;
pub use resolver::{ProblemResolver, Resolution};

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::storage::{PersistenceError, Store};
use crate::types::{AnomalyKey, DailyReport, Operation, Phase, Problem, UserId};

// ============================================================================
// Inputs and Outputs
// ============================================================================

/// A daily report with the records it touched, captured at submission time.
#[derive(Debug, Clone)]
pub struct ReportSubmission {
    pub report: DailyReport,
    /// Phase the well is in, if the report names one that exists
    pub current_phase: Option<Phase>,
    pub operations: Vec<Operation>,
}

impl ReportSubmission {
    pub fn new(report: DailyReport, current_phase: Option<Phase>, operations: Vec<Operation>) -> Self {
        Self {
            report,
            current_phase,
            operations,
        }
    }
}

/// A finding whose problem record could not be matched or saved.
#[derive(Debug, Clone, Serialize)]
pub struct FindingFailure {
    pub key: AnomalyKey,
    pub description: String,
    pub error: String,
}

/// Result of one detection pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionOutcome {
    /// Every problem created or updated, as persisted, in finding order
    pub problems: Vec<Problem>,
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<FindingFailure>,
}

impl DetectionOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Knobs for a detector instance.
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    /// Currency label rendered in cost descriptions
    pub currency: String,
    pub legacy_description_match: bool,
    pub cost_checks: bool,
    pub depth_checks: bool,
    pub schedule_checks: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

impl DetectorSettings {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            currency: config.reporting.currency.clone(),
            legacy_description_match: config.detection.legacy_description_match,
            cost_checks: config.detection.cost_checks,
            depth_checks: config.detection.depth_checks,
            schedule_checks: config.detection.schedule_checks,
        }
    }
}

// ============================================================================
// Detector
// ============================================================================

/// Runs the rule checks and writes the resulting problems.
pub struct AnomalyDetector {
    problems: Arc<dyn Store<Problem>>,
    resolver: ProblemResolver,
    settings: DetectorSettings,
    reporter: Option<UserId>,
}

impl AnomalyDetector {
    pub fn new(problems: Arc<dyn Store<Problem>>, settings: DetectorSettings) -> Self {
        let resolver = ProblemResolver::new(problems.clone(), settings.legacy_description_match);
        Self {
            problems,
            resolver,
            settings,
            reporter: None,
        }
    }

    /// User credited as reporter on newly created problems
    pub fn with_reporter(mut self, reporter: Option<UserId>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run detection with today's UTC date as the detection date.
    pub fn detect(&self, submission: &ReportSubmission) -> DetectionOutcome {
        self.detect_on(submission, Utc::now().date_naive())
    }

    /// Run detection with an explicit detection date.
    pub fn detect_on(&self, submission: &ReportSubmission, today: NaiveDate) -> DetectionOutcome {
        let mut outcome = DetectionOutcome::default();

        for finding in self.findings(submission) {
            let key = finding.key;
            match self.persist(&finding, today) {
                Ok((problem, created)) => {
                    debug!(
                        key = %key,
                        problem_id = ?problem.id,
                        severity = %problem.severity,
                        created,
                        "Problem recorded"
                    );
                    if created {
                        outcome.created += 1;
                    } else {
                        outcome.updated += 1;
                    }
                    outcome.problems.push(problem);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to record problem, continuing");
                    outcome.failures.push(FindingFailure {
                        key,
                        description: finding.description,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            report_id = ?submission.report.id,
            report_date = %submission.report.report_date,
            operations = submission.operations.len(),
            phase = ?submission.current_phase.as_ref().and_then(|p| p.id),
            created = outcome.created,
            updated = outcome.updated,
            failed = outcome.failures.len(),
            "Detection pass complete"
        );

        outcome
    }

    /// Evaluate the enabled checks without touching the store.
    ///
    /// Order: cost findings per operation, then depth, then start and end
    /// delay for the current phase.
    pub fn findings(&self, submission: &ReportSubmission) -> Vec<Finding> {
        let mut out = Vec::new();

        if self.settings.cost_checks {
            out.extend(
                submission
                    .operations
                    .iter()
                    .filter_map(|op| findings::cost_overrun(op, &self.settings.currency)),
            );
        }

        match &submission.current_phase {
            Some(phase) => {
                if self.settings.depth_checks {
                    out.extend(findings::depth_overrun(phase));
                }
                if self.settings.schedule_checks {
                    out.extend(findings::schedule_delays(phase, submission.report.report_date));
                }
            }
            None => debug!(report_id = ?submission.report.id, "No current phase, skipping phase checks"),
        }

        out
    }

    fn persist(&self, finding: &Finding, today: NaiveDate) -> Result<(Problem, bool), PersistenceError> {
        let resolution = self.resolver.resolve(finding, today, self.reporter)?;
        let created = resolution.is_created();
        let saved = self.problems.save(resolution.into_problem())?;
        Ok((saved, created))
    }
}
