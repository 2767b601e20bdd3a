//! Gap Evaluator
//!
//! Compares a parameter average against its optimal [min, max] range.
//!
//! percent_gap is relative to the breached bound, not the midpoint:
//!   - below: (avg - min) / min × 100  (negative)
//!   - above: (avg - max) / max × 100  (positive)
//!   - inside (bounds inclusive): 0
//!
//! Severity tiers on |percent_gap|:
//!   ≤ 5   → Balanced
//!   ≤ 15  → Low
//!   > 15  → Critical
//!
//! Status text is derived from severity and direction, except that pH below
//! its minimum by no more than 0.5 units reads "Low" instead of "Critical Low".

use crate::data::Category;
use crate::knowledge::{ReferenceStandard, ReferenceTable, PH_PARAMETER_ID};
use crate::metrics::aggregator::ParameterStatistics;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Upper bound (inclusive) of the Balanced tier, in percent
pub const BALANCED_MAX_GAP: f64 = 5.0;
/// Upper bound (inclusive) of the Low tier, in percent
pub const LOW_MAX_GAP: f64 = 15.0;
/// pH units below the minimum still labelled "Low"
pub const PH_SOFT_BOUNDARY: f64 = 0.5;

/// Severity tier, a pure function of gap magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Balanced,
    Low,
    Critical,
}

impl Severity {
    pub fn from_gap_magnitude(magnitude: f64) -> Self {
        if magnitude <= BALANCED_MAX_GAP {
            Severity::Balanced
        } else if magnitude <= LOW_MAX_GAP {
            Severity::Low
        } else {
            Severity::Critical
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            Severity::Balanced => "Balanced",
            Severity::Low => "Low",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}

/// Priority rank for reporting: Critical, Low, Balanced, then not determined
pub fn priority_rank(severity: Option<Severity>) -> u8 {
    match severity {
        Some(Severity::Critical) => 0,
        Some(Severity::Low) => 1,
        Some(Severity::Balanced) => 2,
        None => 3,
    }
}

/// Status label shown next to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GapStatus {
    Balanced,
    Low,
    #[serde(rename = "Critical Low")]
    CriticalLow,
    High,
    #[serde(rename = "Critical High")]
    CriticalHigh,
    #[serde(rename = "N.D.")]
    NotDetermined,
}

impl GapStatus {
    pub fn display_text(&self) -> &'static str {
        match self {
            GapStatus::Balanced => "Balanced",
            GapStatus::Low => "Low",
            GapStatus::CriticalLow => "Critical Low",
            GapStatus::High => "High",
            GapStatus::CriticalHigh => "Critical High",
            GapStatus::NotDetermined => "N.D.",
        }
    }
}

impl fmt::Display for GapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}

/// Gap assessment for one parameter
///
/// All numeric fields are `None` when the status is `N.D.`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapRecord {
    pub parameter_id: String,
    pub category: Category,
    pub average: Option<f64>,
    pub optimal_min: Option<f64>,
    pub optimal_max: Option<f64>,
    /// Signed: negative below the minimum, positive above the maximum
    pub percent_gap: Option<f64>,
    pub gap_magnitude: Option<f64>,
    pub severity: Option<Severity>,
    pub status: GapStatus,
}

impl GapRecord {
    fn not_determined(parameter_id: &str, category: Category, average: Option<f64>, standard: Option<&ReferenceStandard>) -> Self {
        Self {
            parameter_id: parameter_id.to_string(),
            category,
            average,
            optimal_min: standard.map(|s| s.optimal_min),
            optimal_max: standard.map(|s| s.optimal_max),
            percent_gap: None,
            gap_magnitude: None,
            severity: None,
            status: GapStatus::NotDetermined,
        }
    }

    pub fn is_determined(&self) -> bool {
        self.status != GapStatus::NotDetermined
    }

    /// Below the optimal minimum
    pub fn is_deficient(&self) -> bool {
        self.percent_gap.is_some_and(|g| g < 0.0)
    }

    /// Above the optimal maximum
    pub fn is_excess(&self) -> bool {
        self.percent_gap.is_some_and(|g| g > 0.0)
    }
}

/// Signed percent gap relative to the breached bound
pub fn percent_gap(average: f64, optimal_min: f64, optimal_max: f64) -> f64 {
    if average < optimal_min {
        (average - optimal_min) / optimal_min * 100.0
    } else if average > optimal_max {
        (average - optimal_max) / optimal_max * 100.0
    } else {
        0.0
    }
}

fn status_for(parameter_id: &str, average: f64, standard: &ReferenceStandard, severity: Severity) -> GapStatus {
    if average < standard.optimal_min {
        match severity {
            Severity::Balanced => GapStatus::Balanced,
            Severity::Low => GapStatus::Low,
            // Softened only from "Critical Low"; severity keeps the tier
            Severity::Critical
                if parameter_id == PH_PARAMETER_ID && standard.optimal_min - average <= PH_SOFT_BOUNDARY =>
            {
                GapStatus::Low
            }
            Severity::Critical => GapStatus::CriticalLow,
        }
    } else if average > standard.optimal_max {
        match severity {
            Severity::Balanced => GapStatus::Balanced,
            Severity::Low => GapStatus::High,
            Severity::Critical => GapStatus::CriticalHigh,
        }
    } else {
        GapStatus::Balanced
    }
}

/// Evaluate one average against its reference standard
///
/// A missing average or missing standard yields an `N.D.` record; this never fails.
pub fn evaluate_gap(
    parameter_id: &str,
    category: Category,
    average: Option<f64>,
    standard: Option<&ReferenceStandard>,
) -> GapRecord {
    let (Some(avg), Some(standard)) = (average, standard) else {
        return GapRecord::not_determined(parameter_id, category, average, standard);
    };
    if !avg.is_finite() {
        return GapRecord::not_determined(parameter_id, category, None, Some(standard));
    }

    let gap = percent_gap(avg, standard.optimal_min, standard.optimal_max);
    let magnitude = gap.abs();
    let severity = Severity::from_gap_magnitude(magnitude);

    GapRecord {
        parameter_id: parameter_id.to_string(),
        category,
        average: Some(avg),
        optimal_min: Some(standard.optimal_min),
        optimal_max: Some(standard.optimal_max),
        percent_gap: Some(gap),
        gap_magnitude: Some(magnitude),
        severity: Some(severity),
        status: status_for(parameter_id, avg, standard, severity),
    }
}

/// Evaluate every statistic against the reference table (same order as input)
pub fn evaluate_statistics(statistics: &[ParameterStatistics], standards: &ReferenceTable) -> Vec<GapRecord> {
    statistics
        .iter()
        .map(|s| {
            let standard = standards.get(&s.parameter_id, s.category);
            if standard.is_none() {
                tracing::debug!("No reference standard for {} ({})", s.parameter_id, s.category);
            }
            evaluate_gap(&s.parameter_id, s.category, s.average, standard)
        })
        .collect()
}

/// Report ordering: severity tier, then descending magnitude
///
/// Deficiency and excess are not segregated within a tier. Parameter id and
/// category break remaining ties.
pub fn compare_priority(a: &GapRecord, b: &GapRecord) -> Ordering {
    priority_rank(a.severity)
        .cmp(&priority_rank(b.severity))
        .then_with(|| {
            let ma = a.gap_magnitude.unwrap_or(0.0);
            let mb = b.gap_magnitude.unwrap_or(0.0);
            mb.total_cmp(&ma)
        })
        .then_with(|| a.parameter_id.cmp(&b.parameter_id))
        .then_with(|| a.category.cmp(&b.category))
}

pub fn sort_by_priority(records: &mut [GapRecord]) {
    records.sort_by(compare_priority);
}
