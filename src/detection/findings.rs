//! Rule checks: turn a record snapshot into deviation findings
//!
//! Each check is a pure function over one record. Missing data is never an
//! error: a check whose inputs are absent simply produces nothing.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::classifier::{classify, classify_delay, overrun_percentage};
use crate::types::{
    AnomalyKey, AnomalySubfamily, Operation, OperationId, Phase, RuleFamily, Severity,
};

const COST_SOLUTION: &str = "Analyse the causes of the overrun and adjust future estimates.";
const DEPTH_SOLUTION: &str = "Review drilling parameters and geological forecasts.";
const SCHEDULE_SOLUTION: &str = "Analyse the causes of the delay and adjust the schedule.";

/// A quantified deviation from plan, not yet matched against stored problems.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Finding {
    /// Structured identity of the anomaly
    pub key: AnomalyKey,
    /// Originating operation (cost findings only)
    pub operation_id: Option<OperationId>,
    /// Rendered problem description
    pub description: String,
    /// Legacy match text for phase findings (e.g. "Phase 2 - end delay")
    pub legacy_prefix: Option<String>,
    /// Overrun percentage, or days late for schedule findings
    pub magnitude: f64,
    pub severity: Severity,
    pub cost_impact: Option<f64>,
    pub delay_impact: Option<i64>,
    pub proposed_solution: &'static str,
}

impl Finding {
    pub fn family(&self) -> RuleFamily {
        self.key.family
    }
}

/// Cost overrun on one operation: both costs recorded and actual > planned.
pub fn cost_overrun(operation: &Operation, currency: &str) -> Option<Finding> {
    let Some((planned, actual)) = operation.costs() else {
        debug!(
            operation = ?operation.id,
            planned = ?operation.planned_cost,
            actual = ?operation.actual_cost,
            "Skipping cost check: missing cost data"
        );
        return None;
    };

    if !planned.is_finite() || !actual.is_finite() {
        debug!(operation = ?operation.id, planned, actual, "Skipping cost check: non-finite cost");
        return None;
    }
    if actual <= planned {
        return None;
    }

    let Some(operation_id) = operation.id else {
        debug!(description = %operation.description, "Skipping cost check: operation not persisted");
        return None;
    };

    let overrun = actual - planned;
    let pct = overrun_percentage(planned, actual);

    Some(Finding {
        key: AnomalyKey {
            entity_id: operation_id,
            family: RuleFamily::Cost,
            subfamily: AnomalySubfamily::Overrun,
        },
        operation_id: Some(operation_id),
        description: format!(
            "Cost overrun detected for operation '{}'. Planned cost: {planned:.2} {currency}, \
             actual cost: {actual:.2} {currency}, overrun: {overrun:.2} {currency}",
            operation.description
        ),
        legacy_prefix: None,
        magnitude: pct,
        severity: classify(RuleFamily::Cost, pct),
        cost_impact: Some(overrun),
        delay_impact: None,
        proposed_solution: COST_SOLUTION,
    })
}

/// Depth overrun on a phase: both depths recorded and actual > planned.
pub fn depth_overrun(phase: &Phase) -> Option<Finding> {
    let (Some(planned), Some(actual)) = (phase.planned_depth, phase.actual_depth) else {
        debug!(phase = ?phase.id, "Skipping depth check: missing depth data");
        return None;
    };

    if !planned.is_finite() || !actual.is_finite() {
        debug!(phase = ?phase.id, planned, actual, "Skipping depth check: non-finite depth");
        return None;
    }
    if actual <= planned {
        return None;
    }

    let phase_id = persisted_phase_id(phase)?;
    let overrun = actual - planned;
    let pct = overrun_percentage(planned, actual);
    let prefix = depth_prefix(phase.phase_number);

    Some(Finding {
        key: AnomalyKey {
            entity_id: phase_id,
            family: RuleFamily::Depth,
            subfamily: AnomalySubfamily::Overrun,
        },
        operation_id: None,
        description: format!(
            "{prefix} detected. Planned depth: {planned:.2} m, actual depth: {actual:.2} m, \
             overrun: {overrun:.2} m"
        ),
        legacy_prefix: Some(prefix),
        magnitude: pct,
        severity: classify(RuleFamily::Depth, pct),
        cost_impact: None,
        delay_impact: None,
        proposed_solution: DEPTH_SOLUTION,
    })
}

/// Start and end delays on a phase, evaluated independently.
///
/// - start: actual start after planned start
/// - end, still open: no actual end and the report date is past planned end
/// - end, completed: actual end after planned end
pub fn schedule_delays(phase: &Phase, report_date: NaiveDate) -> Vec<Finding> {
    let mut findings = Vec::new();
    let Some(phase_id) = persisted_phase_id(phase) else {
        return findings;
    };

    if let (Some(planned), Some(actual)) = (phase.planned_start_date, phase.actual_start_date) {
        if actual > planned {
            findings.push(delay_finding(phase, phase_id, AnomalySubfamily::StartDelay, planned, actual));
        }
    }

    if let Some(planned_end) = phase.planned_end_date {
        let reference = match phase.actual_end_date {
            Some(actual_end) => actual_end,
            None => report_date,
        };
        if reference > planned_end {
            findings.push(delay_finding(phase, phase_id, AnomalySubfamily::EndDelay, planned_end, reference));
        }
    }

    findings
}

fn delay_finding(
    phase: &Phase,
    phase_id: u64,
    subfamily: AnomalySubfamily,
    planned: NaiveDate,
    actual: NaiveDate,
) -> Finding {
    let days = (actual - planned).num_days();
    let prefix = delay_prefix(phase.phase_number, subfamily);

    Finding {
        key: AnomalyKey {
            entity_id: phase_id,
            family: RuleFamily::Schedule,
            subfamily,
        },
        operation_id: None,
        description: format!(
            "{prefix} detected. Planned date: {planned}, actual date: {actual}, delay: {days} days"
        ),
        legacy_prefix: Some(prefix),
        magnitude: days as f64,
        severity: classify_delay(days),
        cost_impact: None,
        delay_impact: Some(days),
        proposed_solution: SCHEDULE_SOLUTION,
    }
}

/// Legacy disambiguation text for a phase depth overrun
pub fn depth_prefix(phase_number: u32) -> String {
    format!("Phase {phase_number} - depth overrun")
}

/// Legacy disambiguation text for a phase start/end delay
pub fn delay_prefix(phase_number: u32, subfamily: AnomalySubfamily) -> String {
    let which = match subfamily {
        AnomalySubfamily::StartDelay => "start",
        _ => "end",
    };
    format!("Phase {phase_number} - {which} delay")
}

fn persisted_phase_id(phase: &Phase) -> Option<u64> {
    if phase.id.is_none() {
        debug!(phase_number = phase.phase_number, "Skipping phase check: phase not persisted");
    }
    phase.id
}
