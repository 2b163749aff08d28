//! Label decoding for user-supplied category strings

/// A category string that does not name any known variant.
///
/// Returned by the `FromStr` impls of the problem enums. Callers decide
/// whether an unknown label is an error or falls back to a default.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} label: '{label}'")]
pub struct LabelError {
    /// Which enum was being decoded ("problem type", "severity", ...)
    pub kind: &'static str,
    /// The rejected input, verbatim
    pub label: String,
}

impl LabelError {
    pub(crate) fn new(kind: &'static str, label: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
        }
    }
}

/// Normalise a label for matching: trimmed, lowercase, `-`/space folded to `_`.
pub(crate) fn normalise(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_folds_case_and_separators() {
        assert_eq!(normalise("  In Progress "), "in_progress");
        assert_eq!(normalise("half-open"), "half_open");
    }

    #[test]
    fn test_label_error_display() {
        let err = LabelError::new("severity", "Apocalyptic");
        assert_eq!(err.to_string(), "unknown severity label: 'Apocalyptic'");
    }
}
