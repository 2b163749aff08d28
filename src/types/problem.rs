//! Problem: the anomaly record, and its classification enums

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{labels, LabelError, OperationId, ProblemId, UserId};

// ============================================================================
// Problem Type
// ============================================================================

/// Category of a problem record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemType {
    /// Cost overrun on an operation
    Cost,
    /// Technical deviation (depth overrun)
    Technical,
    /// Schedule slippage on a phase
    Schedule,
}

impl ProblemType {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            ProblemType::Cost => "Cost",
            ProblemType::Technical => "Technical",
            ProblemType::Schedule => "Schedule",
        }
    }
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ProblemType {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match labels::normalise(s).as_str() {
            "cost" => Ok(ProblemType::Cost),
            "technical" | "depth" => Ok(ProblemType::Technical),
            "schedule" | "delay" => Ok(ProblemType::Schedule),
            _ => Err(LabelError::new("problem type", s)),
        }
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Severity tier of a problem. Ordered `Low < Moderate < Critical`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Low,
    Moderate,
    Critical,
}

impl Severity {
    pub fn display_name(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Severity {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match labels::normalise(s).as_str() {
            "low" => Ok(Severity::Low),
            "moderate" | "medium" => Ok(Severity::Moderate),
            "critical" => Ok(Severity::Critical),
            _ => Err(LabelError::new("severity", s)),
        }
    }
}

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of a problem.
///
/// `Closed` problems are invisible to deduplication: a recurrence of the same
/// deviation opens a fresh record instead of reviving a closed one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemStatus {
    #[default]
    Open,
    Resolved,
    Closed,
}

impl ProblemStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProblemStatus::Open => "Open",
            ProblemStatus::Resolved => "Resolved",
            ProblemStatus::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ProblemStatus {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match labels::normalise(s).as_str() {
            "open" => Ok(ProblemStatus::Open),
            "resolved" => Ok(ProblemStatus::Resolved),
            "closed" => Ok(ProblemStatus::Closed),
            _ => Err(LabelError::new("status", s)),
        }
    }
}

// ============================================================================
// Structured Anomaly Key
// ============================================================================

/// Detection rule family that produced a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleFamily {
    Cost,
    Depth,
    Schedule,
}

impl RuleFamily {
    /// Problem type recorded for findings of this family
    pub fn problem_type(&self) -> ProblemType {
        match self {
            RuleFamily::Cost => ProblemType::Cost,
            RuleFamily::Depth => ProblemType::Technical,
            RuleFamily::Schedule => ProblemType::Schedule,
        }
    }

    /// Get short code for logging
    pub fn short_code(&self) -> &'static str {
        match self {
            RuleFamily::Cost => "COST",
            RuleFamily::Depth => "DEPTH",
            RuleFamily::Schedule => "SCHED",
        }
    }
}

impl std::fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_code())
    }
}

/// Which deviation within a family a finding describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySubfamily {
    Overrun,
    StartDelay,
    EndDelay,
}

/// Identity of a logical anomaly instance, independent of rendered text.
///
/// `entity_id` is the operation id for cost findings and the phase id for
/// depth and schedule findings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AnomalyKey {
    pub entity_id: u64,
    pub family: RuleFamily,
    pub subfamily: AnomalySubfamily,
}

impl std::fmt::Display for AnomalyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{:?}", self.family, self.entity_id, self.subfamily)
    }
}

// ============================================================================
// Problem
// ============================================================================

/// A detected or manually logged deviation from plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Problem {
    #[serde(default)]
    pub id: Option<ProblemId>,
    #[serde(rename = "type")]
    pub problem_type: ProblemType,
    /// Display text; also the legacy disambiguation key for phase findings
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub status: ProblemStatus,
    pub detection_date: NaiveDate,
    #[serde(default)]
    pub resolution_date: Option<NaiveDate>,
    /// Cost overrun amount
    #[serde(default)]
    pub cost_impact: Option<f64>,
    /// Schedule slippage in days
    #[serde(default)]
    pub delay_impact: Option<i64>,
    #[serde(default)]
    pub operation_id: Option<OperationId>,
    #[serde(default)]
    pub reported_by: Option<UserId>,
    #[serde(default)]
    pub resolved_by: Option<UserId>,
    #[serde(default)]
    pub proposed_solution: Option<String>,
    #[serde(default)]
    pub implemented_solution: Option<String>,
    /// Set on problems raised by the detector
    #[serde(default)]
    pub anomaly_key: Option<AnomalyKey>,
}

impl Problem {
    /// New open problem detected on `detection_date`.
    pub fn new(
        problem_type: ProblemType,
        description: impl Into<String>,
        severity: Severity,
        detection_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            problem_type,
            description: description.into(),
            severity,
            status: ProblemStatus::Open,
            detection_date,
            resolution_date: None,
            cost_impact: None,
            delay_impact: None,
            operation_id: None,
            reported_by: None,
            resolved_by: None,
            proposed_solution: None,
            implemented_solution: None,
            anomaly_key: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == ProblemStatus::Closed
    }

    /// Mark resolved, stamping the resolution date if none is recorded.
    pub fn resolve(&mut self, resolved_by: Option<UserId>, today: NaiveDate) {
        self.status = ProblemStatus::Resolved;
        if resolved_by.is_some() {
            self.resolved_by = resolved_by;
        }
        if self.resolution_date.is_none() {
            self.resolution_date = Some(today);
        }
    }

    pub fn close(&mut self) {
        self.status = ProblemStatus::Closed;
    }

    /// Apply a partial update. Fields absent from the patch are untouched.
    ///
    /// A transition to `Resolved` stamps `resolution_date` with `today` when
    /// neither the record nor the patch carries one.
    pub fn apply_patch(&mut self, patch: ProblemPatch, today: NaiveDate) {
        if let Some(t) = patch.problem_type {
            self.problem_type = t;
        }
        if let Some(d) = patch.description {
            self.description = d;
        }
        if let Some(s) = patch.severity {
            self.severity = s;
        }
        if let Some(d) = patch.detection_date {
            self.detection_date = d;
        }
        if let Some(d) = patch.resolution_date {
            self.resolution_date = Some(d);
        }
        if let Some(c) = patch.cost_impact {
            self.cost_impact = Some(c);
        }
        if let Some(d) = patch.delay_impact {
            self.delay_impact = Some(d);
        }
        if let Some(op) = patch.operation_id {
            self.operation_id = Some(op);
        }
        if let Some(u) = patch.reported_by {
            self.reported_by = Some(u);
        }
        if let Some(u) = patch.resolved_by {
            self.resolved_by = Some(u);
        }
        if let Some(s) = patch.proposed_solution {
            self.proposed_solution = Some(s);
        }
        if let Some(s) = patch.implemented_solution {
            self.implemented_solution = Some(s);
        }
        if let Some(status) = patch.status {
            self.status = status;
            if status == ProblemStatus::Resolved && self.resolution_date.is_none() {
                self.resolution_date = Some(today);
            }
        }
    }
}

/// Partial update for a problem record (management interface).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemPatch {
    #[serde(rename = "type")]
    pub problem_type: Option<ProblemType>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<ProblemStatus>,
    pub detection_date: Option<NaiveDate>,
    pub resolution_date: Option<NaiveDate>,
    pub cost_impact: Option<f64>,
    pub delay_impact: Option<i64>,
    pub operation_id: Option<OperationId>,
    pub reported_by: Option<UserId>,
    pub resolved_by: Option<UserId>,
    pub proposed_solution: Option<String>,
    pub implemented_solution: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_label_decoding_accepts_aliases() {
        assert_eq!("COST".parse::<ProblemType>(), Ok(ProblemType::Cost));
        assert_eq!("depth".parse::<ProblemType>(), Ok(ProblemType::Technical));
        assert_eq!(" Delay ".parse::<ProblemType>(), Ok(ProblemType::Schedule));
        assert_eq!("medium".parse::<Severity>(), Ok(Severity::Moderate));
        assert_eq!("closed".parse::<ProblemStatus>(), Ok(ProblemStatus::Closed));
    }

    #[test]
    fn test_label_decoding_rejects_unknown() {
        let err = "safety".parse::<ProblemType>().unwrap_err();
        assert_eq!(err.kind, "problem type");
        assert_eq!(err.label, "safety");
        assert!("severe".parse::<Severity>().is_err());
        assert!("pending".parse::<ProblemStatus>().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Critical);
    }

    #[test]
    fn test_new_problem_is_open() {
        let p = Problem::new(ProblemType::Cost, "overrun", Severity::Low, date(2024, 1, 1));
        assert_eq!(p.status, ProblemStatus::Open);
        assert!(!p.is_closed());
        assert!(p.id.is_none());
    }

    #[test]
    fn test_patch_to_resolved_stamps_resolution_date() {
        let mut p = Problem::new(ProblemType::Schedule, "late", Severity::Moderate, date(2024, 1, 1));
        let patch = ProblemPatch {
            status: Some(ProblemStatus::Resolved),
            ..Default::default()
        };
        p.apply_patch(patch, date(2024, 2, 3));
        assert_eq!(p.status, ProblemStatus::Resolved);
        assert_eq!(p.resolution_date, Some(date(2024, 2, 3)));
    }

    #[test]
    fn test_patch_keeps_explicit_resolution_date() {
        let mut p = Problem::new(ProblemType::Schedule, "late", Severity::Moderate, date(2024, 1, 1));
        let patch = ProblemPatch {
            status: Some(ProblemStatus::Resolved),
            resolution_date: Some(date(2024, 1, 15)),
            ..Default::default()
        };
        p.apply_patch(patch, date(2024, 2, 3));
        assert_eq!(p.resolution_date, Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_patch_leaves_absent_fields_untouched() {
        let mut p = Problem::new(ProblemType::Cost, "original", Severity::Critical, date(2024, 1, 1));
        p.cost_impact = Some(600.0);
        let patch = ProblemPatch {
            description: Some("edited".to_string()),
            ..Default::default()
        };
        p.apply_patch(patch, date(2024, 2, 3));
        assert_eq!(p.description, "edited");
        assert_eq!(p.severity, Severity::Critical);
        assert_eq!(p.cost_impact, Some(600.0));
        assert_eq!(p.status, ProblemStatus::Open);
    }

    #[test]
    fn test_problem_json_uses_type_field() {
        let p = Problem::new(ProblemType::Technical, "deep", Severity::Low, date(2024, 1, 1));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "TECHNICAL");
        assert_eq!(json["status"], "OPEN");
    }
}
