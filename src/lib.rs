//! DrillWatch: drilling operations anomaly detection and cost aggregation
//!
//! Watches a drilling program (wells, boreholes, phases, operations, daily
//! reports) for deviations from plan and rolls costs up for reporting.
//!
//! ## Architecture
//!
//! - **Anomaly Detector**: cost, depth and schedule checks per daily report,
//!   with severity classification and dedup/upsert into the problem register
//! - **Aggregation Engine**: read-only dashboard snapshot of phase costs,
//!   totals, overruns and the costliest operation types
//! - **Storage**: `Store` trait with in-memory and sled backends
//! - **Services**: report-driven detection and problem management

pub mod config;
pub mod dashboard;
pub mod detection;
pub mod services;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, MonitorConfig};

// Re-export commonly used types
pub use types::{
    AnomalyKey, CostError, DailyReport, Diameter, LabelError, Operation, Phase, Problem,
    ProblemPatch, ProblemStatus, ProblemType, RuleFamily, Severity, User,
};

// Re-export engines
pub use dashboard::{build_snapshot, DashboardEngine, DashboardSnapshot};
pub use detection::{AnomalyDetector, DetectionOutcome, DetectorSettings, ReportSubmission};

// Re-export storage
pub use storage::{InMemoryStore, PersistenceError, Repositories, SledStore, Store};

// Re-export services
pub use services::{DetectionError, DetectionService, ProblemService, ServiceError};
