//! Monitor Configuration Module
//!
//! Provides deployment configuration loaded from TOML: currency label used in
//! problem descriptions, the service account credited with detected problems,
//! deduplication behaviour, dashboard sizing and the database location.
//!
//! ## Loading Order
//!
//! 1. `DRILLWATCH_CONFIG` environment variable (path to TOML file)
//! 2. `drillwatch.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(MonitorConfig::load());
//!
//! // Anywhere in the codebase:
//! let currency = &config::get().reporting.currency;
//! ```

mod monitor_config;
pub mod defaults;
pub mod validation;

pub use monitor_config::*;

use std::sync::OnceLock;

/// Global monitor configuration, initialized once at startup.
static MONITOR_CONFIG: OnceLock<MonitorConfig> = OnceLock::new();

/// Initialize the global monitor configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: MonitorConfig) {
    if MONITOR_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global monitor configuration.
///
/// Falls back to built-in defaults when `init()` has not been called, so
/// library users that configure engines explicitly never need the global.
pub fn get() -> &'static MonitorConfig {
    MONITOR_CONFIG.get_or_init(MonitorConfig::default)
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    MONITOR_CONFIG.get().is_some()
}
