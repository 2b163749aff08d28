//! System-wide default constants.
//!
//! Severity thresholds are fixed policy, not operator-tunable: acceptance
//! behaviour and historical problem records depend on these exact values.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Severity Thresholds
// ============================================================================

/// Cost overrun above this percentage is CRITICAL.
pub const COST_CRITICAL_PERCENT: f64 = 50.0;

/// Cost overrun above this percentage is MODERATE.
pub const COST_MODERATE_PERCENT: f64 = 20.0;

/// Depth overrun above this percentage is CRITICAL.
pub const DEPTH_CRITICAL_PERCENT: f64 = 30.0;

/// Depth overrun above this percentage is MODERATE.
pub const DEPTH_MODERATE_PERCENT: f64 = 10.0;

/// Schedule slippage above this many days is CRITICAL.
pub const SCHEDULE_CRITICAL_DAYS: i64 = 14;

/// Schedule slippage above this many days is MODERATE.
pub const SCHEDULE_MODERATE_DAYS: i64 = 7;

// ============================================================================
// Dashboard
// ============================================================================

/// Upper bound on operation-type categories in the dashboard ranking.
pub const MAX_TOP_OPERATION_TYPES: usize = 10;

/// Label used when a phase has no diameter or well name.
pub const UNKNOWN_LABEL: &str = "Unknown";

// ============================================================================
// Storage
// ============================================================================

/// Default sled database directory.
pub const DEFAULT_DATA_DIR: &str = "./data/drillwatch.db";

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "DRILLWATCH_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "drillwatch.toml";
