//! Dashboard Integration Tests
//!
//! Aggregation over stored phases and operations via `DashboardEngine`,
//! including an import bundle loaded into a sled database.

use chrono::NaiveDate;

use drillwatch::storage::{RecordBundle, Repositories};
use drillwatch::{DashboardEngine, Diameter, Operation, Phase};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine(repos: &Repositories, top_n: usize) -> DashboardEngine {
    DashboardEngine::new(repos.phases.clone(), repos.operations.clone(), top_n)
}

fn costed(phase_id: u64, kind: &str, planned: f64, actual: f64) -> Operation {
    let mut op = Operation::new(phase_id, kind);
    op.operation_type = Some(kind.to_string());
    op.planned_cost = Some(planned);
    op.actual_cost = Some(actual);
    op
}

#[test]
fn totals_for_two_phases() {
    let repos = Repositories::in_memory();
    let p1 = repos.phases.save(Phase::new(1, 1)).unwrap().id.unwrap();
    let p2 = repos.phases.save(Phase::new(1, 2)).unwrap().id.unwrap();
    repos.operations.save(costed(p1, "Drilling", 60.0, 100.0)).unwrap();
    repos.operations.save(costed(p1, "Casing", 40.0, 50.0)).unwrap();
    repos.operations.save(costed(p2, "Drilling", 200.0, 180.0)).unwrap();

    let snap = engine(&repos, 10).compute_dashboard_at(date(2024, 1, 1)).unwrap();

    assert_eq!(snap.phase_costs.len(), 2);
    assert_eq!(snap.phase_costs[0].planned_cost, 100.0);
    assert_eq!(snap.phase_costs[0].actual_cost, 150.0);
    assert_eq!(snap.phase_costs[1].planned_cost, 200.0);
    assert_eq!(snap.phase_costs[1].actual_cost, 180.0);

    assert_eq!(snap.totals.total_planned_cost, 300.0);
    assert_eq!(snap.totals.total_actual_cost, 330.0);
    assert_eq!(snap.totals.cost_overrun, 30.0);
    assert!((snap.totals.cost_overrun_percentage - 10.0).abs() < 1e-9);
}

#[test]
fn top_types_never_exceed_ten_and_are_descending() {
    let repos = Repositories::in_memory();
    let phase = repos.phases.save(Phase::new(1, 1)).unwrap().id.unwrap();
    for i in 0..25 {
        let kind = format!("Type {i:02}");
        repos
            .operations
            .save(costed(phase, &kind, f64::from(i) * 10.0, f64::from(i) * 12.0))
            .unwrap();
    }

    let snap = engine(&repos, 10).compute_dashboard_at(date(2024, 1, 1)).unwrap();
    let top = &snap.top_costly_operation_types;
    assert_eq!(top.len(), 10);
    assert!(top.windows(2).all(|w| w[0].total_cost > w[1].total_cost));
    assert_eq!(top[0].operation_type, "Type 24");
    assert!((top[0].overrun_percentage - 20.0).abs() < 1e-9);

    let smaller = engine(&repos, 3).compute_dashboard_at(date(2024, 1, 1)).unwrap();
    assert_eq!(smaller.top_costly_operation_types.len(), 3);
}

#[test]
fn open_phase_overrun_measured_to_today() {
    let repos = Repositories::in_memory();
    let mut phase = Phase::new(1, 1);
    phase.planned_end_date = Some(date(2024, 1, 10));
    repos.phases.save(phase).unwrap();

    let e = engine(&repos, 10);
    assert_eq!(e.compute_dashboard_at(date(2024, 1, 10)).unwrap().overruns.time_overruns, 0);

    let late = e.compute_dashboard_at(date(2024, 1, 25)).unwrap();
    assert_eq!(late.overruns.time_overruns, 1);
    assert_eq!(late.overruns.total_time_overrun_days, 15);
}

#[test]
fn snapshot_serializes_to_json() {
    let repos = Repositories::in_memory();
    let mut phase = Phase::new(1, 1);
    phase.diameter = Some(Diameter::Inches26);
    phase.well_name = Some("HMD-42".to_string());
    repos.phases.save(phase).unwrap();

    let snap = engine(&repos, 10).compute_dashboard_at(date(2024, 1, 1)).unwrap();
    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["phase_costs"][0]["phase_name"], "Phase 1 - 26\"");
    assert_eq!(json["phase_costs"][0]["well_name"], "HMD-42");
    assert_eq!(json["totals"]["total_phases"], 1);
}

#[test]
fn imported_bundle_aggregates_from_sled() {
    let dir = tempfile::tempdir().unwrap();
    let repos = Repositories::open_sled(dir.path()).unwrap();

    let bundle = RecordBundle::from_json_str(
        r#"{
            "phases": [
                { "id": 1, "forage_id": 1, "phase_number": 1, "diameter": "26",
                  "planned_end_date": "2024-01-10", "actual_end_date": "2024-01-14" },
                { "id": 2, "forage_id": 1, "phase_number": 2, "diameter": "16" }
            ],
            "operations": [
                { "phase_id": 1, "operation_type": "Drilling", "planned_cost": 100.0, "actual_cost": 150.0 },
                { "phase_id": 2, "operation_type": "Cementing", "planned_cost": 200.0, "actual_cost": 180.0 },
                { "phase_id": 2, "planned_cost": 10.0 }
            ]
        }"#,
    )
    .unwrap();
    bundle.import_into(&repos).unwrap();

    let snap = engine(&repos, 10).compute_dashboard_at(date(2024, 2, 1)).unwrap();
    assert_eq!(snap.totals.total_planned_cost, 310.0);
    assert_eq!(snap.totals.total_actual_cost, 330.0);
    assert_eq!(snap.overruns.time_overruns, 1);
    assert_eq!(snap.overruns.total_time_overrun_days, 4);
    assert_eq!(snap.overruns.cost_overruns, 1);
    // The untyped operation counts toward phase totals but not the ranking
    assert_eq!(snap.top_costly_operation_types.len(), 2);
    assert_eq!(snap.top_costly_operation_types[0].operation_type, "Cementing");
}
