//! Config validation: unknown-key detection with Levenshtein suggestions
//! and non-fatal semantic checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for MonitorConfig.
///
/// Maintained manually to match the struct hierarchy in monitor_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [well]
        "well",
        "well.name",
        "well.field",
        // [reporting]
        "reporting",
        "reporting.currency",
        // [detection]
        "detection",
        "detection.system_reporter_id",
        "detection.legacy_description_match",
        "detection.cost_checks",
        "detection.depth_checks",
        "detection.schedule_checks",
        // [dashboard]
        "dashboard",
        "dashboard.top_operation_types",
        // [storage]
        "storage",
        "storage.data_dir",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        // Ties break alphabetically so suggestions are stable across runs
        let better = match best {
            None => true,
            Some((best_key, best_dist)) => dist < best_dist || (dist == best_dist && k < best_key),
        };
        if better {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(&key, &known);
            warnings.push(ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Semantic Checks
// ============================================================================

/// Suspicious-but-legal settings on a parsed MonitorConfig.
pub fn validate_semantics(config: &super::MonitorConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let d = &config.detection;

    if !d.cost_checks && !d.depth_checks && !d.schedule_checks {
        warnings.push(ValidationWarning {
            field: "detection".to_string(),
            message: "All detection checks are disabled; no problems will ever be raised".to_string(),
            suggestion: None,
        });
    }

    if d.system_reporter_id.is_none() {
        warnings.push(ValidationWarning {
            field: "detection.system_reporter_id".to_string(),
            message: "No system reporter configured; detected problems will be unattributed".to_string(),
            suggestion: None,
        });
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================
