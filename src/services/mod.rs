//! Service layer
//!
//! Entry points the surrounding system calls. They load records through the
//! `Repositories` handles, then hand snapshots to the engines.
//!
//! - `DetectionService`: run anomaly detection for a saved daily report
//! - `ProblemService`: problem register management (find, create, update,
//!   resolve, close, delete)

mod detection_service;
mod problem_service;

pub use detection_service::DetectionService;
pub use problem_service::ProblemService;

use crate::storage::PersistenceError;
use crate::types::{DailyReportId, LabelError};

/// Errors from `DetectionService`.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// The daily report id is not in the store
    #[error("daily report {0} not found")]
    ReportNotFound(DailyReportId),
    /// Loading the report, phase, operations or reporter failed
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors from `ProblemService`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error("invalid problem: {0}")]
    Invalid(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
