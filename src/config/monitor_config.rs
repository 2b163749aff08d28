//! Monitor Configuration - deployment settings as TOML values
//!
//! Each struct implements `Default` with the values the system ships with,
//! so an absent or empty config file changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a monitoring deployment.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$DRILLWATCH_CONFIG` env var
/// 2. `./drillwatch.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Deployment identification
    #[serde(default)]
    pub well: WellInfo,

    /// Rendering of problem descriptions
    #[serde(default)]
    pub reporting: ReportingConfig,

    /// Anomaly detection behaviour
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Dashboard aggregation
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Record database
    #[serde(default)]
    pub storage: StorageConfig,
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$DRILLWATCH_CONFIG` environment variable
    /// 2. `./drillwatch.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), well = %config.well.name, "Loaded monitor config from DRILLWATCH_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from DRILLWATCH_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "DRILLWATCH_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./drillwatch.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(well = %config.well.name, "Loaded monitor config from ./drillwatch.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./drillwatch.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No drillwatch.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged, not fatal.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Monitor config saved");
        Ok(())
    }

    /// Validate settings for internal consistency.
    ///
    /// Rules:
    /// - Dashboard ranking size within 1..=10
    /// - Currency label and data directory non-empty
    /// - System reporter id, when set, non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let top = self.dashboard.top_operation_types;
        if top == 0 || top > defaults::MAX_TOP_OPERATION_TYPES {
            errors.push(format!(
                "dashboard.top_operation_types = {top} must be between 1 and {}",
                defaults::MAX_TOP_OPERATION_TYPES
            ));
        }

        if self.reporting.currency.trim().is_empty() {
            errors.push("reporting.currency must not be empty".to_string());
        }

        if self.storage.data_dir.trim().is_empty() {
            errors.push("storage.data_dir must not be empty".to_string());
        }

        if self.detection.system_reporter_id == Some(0) {
            errors.push("detection.system_reporter_id must be > 0 when set".to_string());
        }

        for w in super::validation::validate_semantics(self) {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Well Info
// ============================================================================

/// Identification metadata, shown in logs only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellInfo {
    /// Deployment / field name
    #[serde(default = "default_well_name")]
    pub name: String,

    /// Field name
    #[serde(default)]
    pub field: String,
}

fn default_well_name() -> String {
    "DEFAULT".to_string()
}

impl Default for WellInfo {
    fn default() -> Self {
        Self {
            name: default_well_name(),
            field: String::new(),
        }
    }
}

// ============================================================================
// Reporting
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Currency label rendered in cost problem descriptions
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "DZD".to_string()
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Service account credited as reporter of detected problems
    #[serde(default = "default_system_reporter")]
    pub system_reporter_id: Option<u64>,

    /// Fall back to description-substring matching for phase findings
    /// when no problem carries the structured anomaly key
    #[serde(default = "default_true")]
    pub legacy_description_match: bool,

    /// Run the per-operation cost overrun check
    #[serde(default = "default_true")]
    pub cost_checks: bool,

    /// Run the current-phase depth overrun check
    #[serde(default = "default_true")]
    pub depth_checks: bool,

    /// Run the current-phase schedule delay checks
    #[serde(default = "default_true")]
    pub schedule_checks: bool,
}

#[allow(clippy::unnecessary_wraps)]
fn default_system_reporter() -> Option<u64> {
    Some(1)
}
fn default_true() -> bool {
    true
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            system_reporter_id: default_system_reporter(),
            legacy_description_match: true,
            cost_checks: true,
            depth_checks: true,
            schedule_checks: true,
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Number of operation-type categories in the cost ranking
    #[serde(default = "default_top_operation_types")]
    pub top_operation_types: usize,
}

fn default_top_operation_types() -> usize {
    defaults::MAX_TOP_OPERATION_TYPES
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_operation_types: default_top_operation_types(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    defaults::DEFAULT_DATA_DIR.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: MonitorConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config.reporting.currency, "DZD");
        assert_eq!(config.detection.system_reporter_id, Some(1));
        assert!(config.detection.legacy_description_match);
        assert_eq!(config.dashboard.top_operation_types, 10);
        assert_eq!(config.storage.data_dir, defaults::DEFAULT_DATA_DIR);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[well]
name = "HMD-42"

[detection]
system_reporter_id = 7
schedule_checks = false
"#;
        let config = MonitorConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.well.name, "HMD-42");
        assert_eq!(config.detection.system_reporter_id, Some(7));
        assert!(!config.detection.schedule_checks);
        // Non-overridden values retain defaults
        assert!(config.detection.cost_checks);
        assert_eq!(config.reporting.currency, "DZD");
    }

    #[test]
    fn test_validation_catches_oversized_ranking() {
        let mut config = MonitorConfig::default();
        config.dashboard.top_operation_types = 25;
        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.contains("top_operation_types")));
        }
    }

    #[test]
    fn test_validation_catches_zero_reporter_and_blank_currency() {
        let mut config = MonitorConfig::default();
        config.detection.system_reporter_id = Some(0);
        config.reporting.currency = "  ".to_string();
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut original = MonitorConfig::default();
        original.reporting.currency = "USD".to_string();
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped: MonitorConfig = toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(roundtripped.reporting.currency, "USD");
        assert_eq!(
            roundtripped.dashboard.top_operation_types,
            original.dashboard.top_operation_types
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drillwatch.toml");
        std::fs::write(&path, "[reporting]\ncurrency = \"EUR\"\n").unwrap();
        let config = MonitorConfig::load_from_file(&path).unwrap();
        assert_eq!(config.reporting.currency, "EUR");
    }

    #[test]
    fn test_load_from_file_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[reporting\ncurrency = ").unwrap();
        let err = MonitorConfig::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
