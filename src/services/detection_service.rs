//! Detection entry point for saved daily reports

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use super::DetectionError;
use crate::config::MonitorConfig;
use crate::detection::{AnomalyDetector, DetectionOutcome, DetectorSettings, ReportSubmission};
use crate::storage::{OperationQueries, Repositories};
use crate::types::{DailyReport, DailyReportId, OperationId, Phase, UserId};

/// Loads a report and the operations it touched, then runs the detector.
pub struct DetectionService {
    repos: Repositories,
    settings: DetectorSettings,
    system_reporter_id: Option<UserId>,
}

impl DetectionService {
    pub fn new(repos: Repositories, config: &MonitorConfig) -> Self {
        Self {
            repos,
            settings: DetectorSettings::from_config(config),
            system_reporter_id: config.detection.system_reporter_id,
        }
    }

    /// Detect problems for a saved daily report.
    ///
    /// `operation_ids` lists the operations updated with the report. `None`
    /// means every operation attached to the report. Unknown operation ids
    /// are logged and skipped.
    pub fn detect_problems_from_daily_report(
        &self,
        report_id: DailyReportId,
        operation_ids: Option<&[OperationId]>,
    ) -> Result<DetectionOutcome, DetectionError> {
        self.detect_problems_on(report_id, operation_ids, Utc::now().date_naive())
    }

    /// As `detect_problems_from_daily_report`, with an explicit detection date.
    pub fn detect_problems_on(
        &self,
        report_id: DailyReportId,
        operation_ids: Option<&[OperationId]>,
        today: NaiveDate,
    ) -> Result<DetectionOutcome, DetectionError> {
        let report = self
            .repos
            .daily_reports
            .get(report_id)?
            .ok_or(DetectionError::ReportNotFound(report_id))?;

        let submission = self.load_submission(report, operation_ids)?;
        let reporter = self.system_reporter()?;

        let detector = AnomalyDetector::new(self.repos.problems.clone(), self.settings.clone())
            .with_reporter(reporter);
        Ok(detector.detect_on(&submission, today))
    }

    fn load_submission(
        &self,
        report: DailyReport,
        operation_ids: Option<&[OperationId]>,
    ) -> Result<ReportSubmission, DetectionError> {
        let current_phase = self.load_phase(&report)?;

        let operations = match operation_ids {
            Some(ids) => {
                let mut ops = Vec::with_capacity(ids.len());
                for &id in ids {
                    match self.repos.operations.get(id)? {
                        Some(op) => ops.push(op),
                        None => warn!(operation_id = id, "Operation not found, skipping"),
                    }
                }
                ops
            }
            None => match report.id {
                Some(report_id) => self.repos.operations.find_by_daily_report(report_id)?,
                None => Vec::new(),
            },
        };

        debug!(
            report_id = ?report.id,
            operations = operations.len(),
            has_phase = current_phase.is_some(),
            "Submission loaded"
        );
        Ok(ReportSubmission::new(report, current_phase, operations))
    }

    fn load_phase(&self, report: &DailyReport) -> Result<Option<Phase>, DetectionError> {
        let Some(phase_id) = report.current_phase_id else {
            return Ok(None);
        };
        let phase = self.repos.phases.get(phase_id)?;
        if phase.is_none() {
            warn!(report_id = ?report.id, phase_id, "Current phase not found, phase checks skipped");
        }
        Ok(phase)
    }

    /// Configured system reporter, if that user exists.
    fn system_reporter(&self) -> Result<Option<UserId>, DetectionError> {
        let Some(user_id) = self.system_reporter_id else {
            return Ok(None);
        };
        match self.repos.users.get(user_id)? {
            Some(_) => Ok(Some(user_id)),
            None => {
                warn!(user_id, "System reporter not found, problems will be unattributed");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for DetectionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionService")
            .field("backend", &self.repos.backend_name())
            .field("settings", &self.settings)
            .field("system_reporter_id", &self.system_reporter_id)
            .finish()
    }
}
