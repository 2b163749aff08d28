//! Severity classification for plan deviations
//!
//! Pure functions, no state. Thresholds live in `config::defaults`:
//!
//! | Family   | CRITICAL | MODERATE | else |
//! |----------|----------|----------|------|
//! | Cost     | > 50 %   | > 20 %   | LOW  |
//! | Depth    | > 30 %   | > 10 %   | LOW  |
//! | Schedule | > 14 d   | > 7 d    | LOW  |
//!
//! Comparisons are strict: a deviation exactly on a threshold stays in the
//! lower tier.

use crate::config::defaults::{
    COST_CRITICAL_PERCENT, COST_MODERATE_PERCENT, DEPTH_CRITICAL_PERCENT, DEPTH_MODERATE_PERCENT,
    SCHEDULE_CRITICAL_DAYS, SCHEDULE_MODERATE_DAYS,
};
use crate::types::{RuleFamily, Severity};

/// Map a deviation to a severity tier.
///
/// `magnitude` is an overrun percentage for `Cost` and `Depth`, and a count
/// of days late for `Schedule`. NaN classifies as `Low`.
pub fn classify(family: RuleFamily, magnitude: f64) -> Severity {
    let (critical, moderate) = match family {
        RuleFamily::Cost => (COST_CRITICAL_PERCENT, COST_MODERATE_PERCENT),
        RuleFamily::Depth => (DEPTH_CRITICAL_PERCENT, DEPTH_MODERATE_PERCENT),
        RuleFamily::Schedule => (SCHEDULE_CRITICAL_DAYS as f64, SCHEDULE_MODERATE_DAYS as f64),
    };

    if magnitude > critical {
        Severity::Critical
    } else if magnitude > moderate {
        Severity::Moderate
    } else {
        Severity::Low
    }
}

/// Severity of a schedule slippage of `days_late` days.
pub fn classify_delay(days_late: i64) -> Severity {
    if days_late > SCHEDULE_CRITICAL_DAYS {
        Severity::Critical
    } else if days_late > SCHEDULE_MODERATE_DAYS {
        Severity::Moderate
    } else {
        Severity::Low
    }
}

/// `(actual - planned) / planned * 100`, or 0 when `planned` is not positive.
pub fn overrun_percentage(planned: f64, actual: f64) -> f64 {
    if planned <= 0.0 || !planned.is_finite() {
        return 0.0;
    }
    let pct = (actual - planned) / planned * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}
