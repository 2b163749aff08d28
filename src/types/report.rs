//! DailyReport and User records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DailyReportId, PhaseId, UserId, WellId};

/// Per-day status submission for a well.
///
/// A report submission together with the operations it touched is the
/// trigger unit for anomaly detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyReport {
    #[serde(default)]
    pub id: Option<DailyReportId>,
    #[serde(default)]
    pub report_name: String,
    pub report_date: NaiveDate,
    pub well_id: WellId,
    #[serde(default)]
    pub current_phase_id: Option<PhaseId>,
    /// Bit depth at report time (m)
    #[serde(default)]
    pub current_depth: Option<f64>,
    #[serde(default)]
    pub daily_cost: Option<f64>,
}

impl DailyReport {
    pub fn new(well_id: WellId, report_date: NaiveDate) -> Self {
        Self {
            id: None,
            report_name: String::new(),
            report_date,
            well_id,
            current_phase_id: None,
            current_depth: None,
            daily_cost: None,
        }
    }
}

/// A user account. Only used here to attribute problems.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(default)]
    pub id: Option<UserId>,
    pub name: String,
    #[serde(default)]
    pub role: String,
}
