//! Phase: a planned drilling stage within a forage

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{labels, ForageId, LabelError, PhaseId};

// ============================================================================
// Hole Section Diameter
// ============================================================================

/// Nominal hole-section diameter drilled during a phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Diameter {
    #[serde(rename = "26")]
    Inches26,
    #[serde(rename = "16")]
    Inches16,
    #[serde(rename = "12_25")]
    Inches12_25,
    #[serde(rename = "8_5")]
    Inches8_5,
}

impl Diameter {
    /// Label used in reports, e.g. `12 1/4"`
    pub fn label(&self) -> &'static str {
        match self {
            Diameter::Inches26 => "26\"",
            Diameter::Inches16 => "16\"",
            Diameter::Inches12_25 => "12 1/4\"",
            Diameter::Inches8_5 => "8 1/2\"",
        }
    }
}

impl std::fmt::Display for Diameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Diameter {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = labels::normalise(s).replace('"', "");
        match cleaned.as_str() {
            "26" => Ok(Diameter::Inches26),
            "16" => Ok(Diameter::Inches16),
            "12_25" | "12.25" | "12_1/4" => Ok(Diameter::Inches12_25),
            "8_5" | "8.5" | "8_1/2" => Ok(Diameter::Inches8_5),
            _ => Err(LabelError::new("diameter", s)),
        }
    }
}

// ============================================================================
// Phase
// ============================================================================

/// A drilling stage within a forage, with target and actual depth/dates.
///
/// Phase numbers are unique within their forage; the record store enforces
/// that, not this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase {
    #[serde(default)]
    pub id: Option<PhaseId>,
    pub forage_id: ForageId,
    pub phase_number: u32,
    #[serde(default)]
    pub diameter: Option<Diameter>,
    /// Name of the owning well, resolved by the loader through the forage
    #[serde(default)]
    pub well_name: Option<String>,
    /// Target depth (m)
    #[serde(default)]
    pub planned_depth: Option<f64>,
    /// Depth reached so far (m)
    #[serde(default)]
    pub actual_depth: Option<f64>,
    #[serde(default)]
    pub planned_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub planned_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_end_date: Option<NaiveDate>,
}

impl Phase {
    /// New unsaved phase with no depth or date information.
    pub fn new(forage_id: ForageId, phase_number: u32) -> Self {
        Self {
            id: None,
            forage_id,
            phase_number,
            diameter: None,
            well_name: None,
            planned_depth: None,
            actual_depth: None,
            planned_start_date: None,
            planned_end_date: None,
            actual_start_date: None,
            actual_end_date: None,
        }
    }

    /// Display name, e.g. `Phase 2 - 16"`
    pub fn display_name(&self) -> String {
        let diameter = self.diameter.map_or(crate::config::defaults::UNKNOWN_LABEL, |d| d.label());
        format!("Phase {} - {}", self.phase_number, diameter)
    }
}
