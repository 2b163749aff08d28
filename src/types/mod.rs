//! Shared domain records for drilling operations monitoring
//!
//! The record hierarchy mirrors the drilling program:
//! - Well → Forage (borehole) → Phase → Operation
//! - DailyReport: per-day submission referencing a well and its current phase
//! - Problem: detected or manually logged deviation from plan
//!
//! Records are plain data. Persistence belongs to the `storage` collaborators;
//! detection and aggregation operate on already-loaded snapshots.

mod labels;
mod operation;
mod phase;
mod problem;
mod report;

pub use labels::*;
pub use operation::*;
pub use phase::*;
pub use problem::*;
pub use report::*;

/// Identifier of a persisted operation.
pub type OperationId = u64;
/// Identifier of a persisted phase.
pub type PhaseId = u64;
/// Identifier of a persisted forage (borehole).
pub type ForageId = u64;
/// Identifier of a well.
pub type WellId = u64;
/// Identifier of a persisted daily report.
pub type DailyReportId = u64;
/// Identifier of a persisted problem record.
pub type ProblemId = u64;
/// Identifier of a user account.
pub type UserId = u64;
