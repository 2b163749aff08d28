//! Operation: a costed unit of work performed within a phase

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DailyReportId, OperationId, PhaseId};

/// A unit of work within a phase, optionally tied to the daily report that
/// recorded it.
///
/// Costs are currency-agnostic. Either cost may be missing while the
/// operation is still being planned or invoiced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    /// Assigned by the store on first save
    #[serde(default)]
    pub id: Option<OperationId>,
    pub phase_id: PhaseId,
    #[serde(default)]
    pub daily_report_id: Option<DailyReportId>,
    /// Operation-type name (e.g. "Drilling", "Casing run"), used for grouping
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub planned_cost: Option<f64>,
    #[serde(default)]
    pub actual_cost: Option<f64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Operation {
    /// New unsaved operation in `phase_id` with no costs recorded.
    pub fn new(phase_id: PhaseId, description: impl Into<String>) -> Self {
        Self {
            id: None,
            phase_id,
            daily_report_id: None,
            operation_type: None,
            description: description.into(),
            planned_cost: None,
            actual_cost: None,
            created_at: Utc::now(),
        }
    }

    /// Both costs, when both are recorded.
    pub fn costs(&self) -> Option<(f64, f64)> {
        Some((self.planned_cost?, self.actual_cost?))
    }

    /// Planned cost with a missing value counted as zero.
    pub fn planned_or_zero(&self) -> f64 {
        self.planned_cost.unwrap_or(0.0)
    }

    /// Actual cost with a missing value counted as zero.
    pub fn actual_or_zero(&self) -> f64 {
        self.actual_cost.unwrap_or(0.0)
    }

    /// Costs, when present, must be finite and non-negative.
    pub fn validate_costs(&self) -> Result<(), CostError> {
        for (field, value) in [("planned_cost", self.planned_cost), ("actual_cost", self.actual_cost)] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(CostError { field, value });
                }
            }
        }
        Ok(())
    }
}

/// A recorded cost that is negative or not a number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field} must be a non-negative number, got {value}")]
pub struct CostError {
    /// `planned_cost` or `actual_cost`
    pub field: &'static str,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costs_requires_both_values() {
        let mut op = Operation::new(1, "Drill 26in section");
        assert_eq!(op.costs(), None);
        op.planned_cost = Some(1000.0);
        assert_eq!(op.costs(), None);
        op.actual_cost = Some(1200.0);
        assert_eq!(op.costs(), Some((1000.0, 1200.0)));
    }

    #[test]
    fn test_missing_costs_count_as_zero() {
        let op = Operation::new(1, "Rig move");
        assert_eq!(op.planned_or_zero(), 0.0);
        assert_eq!(op.actual_or_zero(), 0.0);
    }

    #[test]
    fn test_validate_costs_rejects_negative() {
        let mut op = Operation::new(1, "Cementing");
        op.planned_cost = Some(-5.0);
        let err = op.validate_costs().unwrap_err();
        assert_eq!(err, CostError { field: "planned_cost", value: -5.0 });
        assert_eq!(err.to_string(), "planned_cost must be a non-negative number, got -5");
        op.planned_cost = Some(f64::NAN);
        assert_eq!(op.validate_costs().unwrap_err().field, "planned_cost");
        op.planned_cost = Some(0.0);
        op.actual_cost = Some(f64::INFINITY);
        assert_eq!(op.validate_costs().unwrap_err().field, "actual_cost");
        op.actual_cost = Some(12.5);
        assert!(op.validate_costs().is_ok());
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let op: Operation = serde_json::from_str(r#"{"phase_id": 4, "planned_cost": 250.0}"#).unwrap();
        assert_eq!(op.id, None);
        assert_eq!(op.phase_id, 4);
        assert_eq!(op.planned_cost, Some(250.0));
        assert!(op.actual_cost.is_none());
    }
}
