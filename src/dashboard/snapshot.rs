//! Dashboard snapshot and the pure aggregation that builds it

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::defaults::{MAX_TOP_OPERATION_TYPES, UNKNOWN_LABEL};
use crate::detection::overrun_percentage;
use crate::types::{Operation, Phase, PhaseId};

/// Planned vs actual cost of one phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseCost {
    pub phase_id: Option<PhaseId>,
    pub phase_number: u32,
    /// e.g. `Phase 2 - 16"`
    pub phase_name: String,
    pub planned_cost: f64,
    pub actual_cost: f64,
    pub well_name: String,
}

/// Corpus-wide cost totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Totals {
    pub total_planned_cost: f64,
    pub total_actual_cost: f64,
    pub total_phases: usize,
    /// `total_actual_cost - total_planned_cost`, may be negative
    pub cost_overrun: f64,
    /// 0 when nothing is planned
    pub cost_overrun_percentage: f64,
}

/// Phases running late or over budget.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Overruns {
    pub time_overruns: usize,
    pub total_time_overrun_days: i64,
    pub cost_overruns: usize,
    pub total_cost_overrun: f64,
    pub total_phases: usize,
}

/// Spend grouped by operation type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationTypeCost {
    pub operation_type: String,
    /// planned + actual, the ranking key
    pub total_cost: f64,
    pub planned_cost: f64,
    pub actual_cost: f64,
    pub operation_count: usize,
    pub overrun_percentage: f64,
}

/// Everything the reporting surface shows, computed in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    /// Date used as "now" for phases that are still open
    pub as_of: Option<NaiveDate>,
    pub phase_costs: Vec<PhaseCost>,
    pub totals: Totals,
    pub overruns: Overruns,
    pub top_costly_operation_types: Vec<OperationTypeCost>,
}

/// Aggregate phases and operations into a snapshot.
///
/// Missing costs count as zero. `top_n` is clamped to `1..=10`. Phase order
/// follows the input slice.
pub fn build_snapshot(
    phases: &[Phase],
    operations: &[Operation],
    today: NaiveDate,
    top_n: usize,
) -> DashboardSnapshot {
    let mut by_phase: HashMap<PhaseId, (f64, f64)> = HashMap::new();
    for op in operations {
        let entry = by_phase.entry(op.phase_id).or_default();
        entry.0 += op.planned_or_zero();
        entry.1 += op.actual_or_zero();
    }

    let phase_costs: Vec<PhaseCost> = phases
        .iter()
        .map(|phase| {
            let (planned_cost, actual_cost) = phase
                .id
                .and_then(|id| by_phase.get(&id).copied())
                .unwrap_or_default();
            PhaseCost {
                phase_id: phase.id,
                phase_number: phase.phase_number,
                phase_name: phase.display_name(),
                planned_cost,
                actual_cost,
                well_name: phase
                    .well_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            }
        })
        .collect();

    let totals = totals(&phase_costs);
    let overruns = overruns(phases, &phase_costs, today);
    let top_costly_operation_types = top_operation_types(operations, top_n);

    DashboardSnapshot {
        as_of: Some(today),
        phase_costs,
        totals,
        overruns,
        top_costly_operation_types,
    }
}

fn totals(phase_costs: &[PhaseCost]) -> Totals {
    let total_planned_cost: f64 = phase_costs.iter().map(|p| p.planned_cost).sum();
    let total_actual_cost: f64 = phase_costs.iter().map(|p| p.actual_cost).sum();
    let cost_overrun = total_actual_cost - total_planned_cost;

    Totals {
        total_planned_cost,
        total_actual_cost,
        total_phases: phase_costs.len(),
        cost_overrun,
        cost_overrun_percentage: overrun_percentage(total_planned_cost, total_actual_cost),
    }
}

fn overruns(phases: &[Phase], phase_costs: &[PhaseCost], today: NaiveDate) -> Overruns {
    let mut out = Overruns {
        total_phases: phases.len(),
        ..Overruns::default()
    };

    for phase in phases {
        let Some(planned_end) = phase.planned_end_date else {
            continue;
        };
        let reference = phase.actual_end_date.unwrap_or(today);
        if reference > planned_end {
            out.time_overruns += 1;
            out.total_time_overrun_days += (reference - planned_end).num_days();
        }
    }

    for cost in phase_costs {
        if cost.actual_cost > cost.planned_cost {
            out.cost_overruns += 1;
            out.total_cost_overrun += cost.actual_cost - cost.planned_cost;
        }
    }

    out
}

fn top_operation_types(operations: &[Operation], top_n: usize) -> Vec<OperationTypeCost> {
    // BTreeMap keeps equal-cost groups in name order through the stable sort
    let mut groups: BTreeMap<&str, OperationTypeCost> = BTreeMap::new();

    for op in operations {
        let Some(name) = op.operation_type.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        let group = groups.entry(name).or_insert_with(|| OperationTypeCost {
            operation_type: name.to_string(),
            total_cost: 0.0,
            planned_cost: 0.0,
            actual_cost: 0.0,
            operation_count: 0,
            overrun_percentage: 0.0,
        });
        group.planned_cost += op.planned_or_zero();
        group.actual_cost += op.actual_or_zero();
        group.operation_count += 1;
    }

    let mut ranked: Vec<OperationTypeCost> = groups
        .into_values()
        .map(|mut g| {
            g.total_cost = g.planned_cost + g.actual_cost;
            g.overrun_percentage = overrun_percentage(g.planned_cost, g.actual_cost);
            g
        })
        .collect();

    ranked.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
    ranked.truncate(top_n.clamp(1, MAX_TOP_OPERATION_TYPES));
    ranked
}
