//! Analysis Report
//!
//! Structured output handed to the presentation collaborator: statistics,
//! priority-sorted gap records, consolidated findings, per-category
//! severity counts and comparison-table rows. Rendering is not done here.

use crate::canonicalizer::{canonicalize, Canonicalized};
use crate::data::Category;
use crate::findings::ConsolidatedFinding;
use crate::knowledge::KnowledgeBase;
use crate::metrics::aggregator::{ParameterStatistics, UnmappedParameter};
use crate::metrics::gap::{GapRecord, GapStatus, Severity};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Count of gap records per severity tier for one category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub category: Option<Category>,
    pub critical: usize,
    pub low: usize,
    pub balanced: usize,
    pub not_determined: usize,
}

impl SeveritySummary {
    pub fn total(&self) -> usize {
        self.critical + self.low + self.balanced + self.not_determined
    }

    fn record(&mut self, severity: Option<Severity>) {
        match severity {
            Some(Severity::Critical) => self.critical += 1,
            Some(Severity::Low) => self.low += 1,
            Some(Severity::Balanced) => self.balanced += 1,
            None => self.not_determined += 1,
        }
    }
}

/// Per-category severity counts, in category order; categories without
/// records are omitted
pub fn severity_summary(gaps: &[GapRecord]) -> Vec<SeveritySummary> {
    Category::ALL
        .iter()
        .filter_map(|&category| {
            let mut summary = SeveritySummary {
                category: Some(category),
                ..Default::default()
            };
            for gap in gaps.iter().filter(|g| g.category == category) {
                summary.record(gap.severity);
            }
            (summary.total() > 0).then_some(summary)
        })
        .collect()
}

/// One row of a parameter comparison table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub parameter_id: String,
    pub category: Category,
    pub average: Option<f64>,
    /// "min-max", or `None` without a reference standard
    pub optimal_range: Option<String>,
    pub percent_gap: Option<f64>,
    pub status: GapStatus,
}

/// Join statistics with their gap records (statistics order)
pub fn comparison_rows(statistics: &[ParameterStatistics], gaps: &[GapRecord]) -> Vec<ComparisonRow> {
    let by_key: FxHashMap<(&str, Category), &GapRecord> = gaps
        .iter()
        .map(|g| ((g.parameter_id.as_str(), g.category), g))
        .collect();

    statistics
        .iter()
        .map(|s| {
            let gap = by_key.get(&(s.parameter_id.as_str(), s.category));
            let optimal_range = gap.and_then(|g| match (g.optimal_min, g.optimal_max) {
                (Some(min), Some(max)) => Some(format!("{}-{}", min, max)),
                _ => None,
            });
            ComparisonRow {
                parameter_id: s.parameter_id.clone(),
                category: s.category,
                average: s.average,
                optimal_range,
                percent_gap: gap.and_then(|g| g.percent_gap),
                status: gap.map_or(GapStatus::NotDetermined, |g| g.status),
            }
        })
        .collect()
}

/// Map a generated table's header row onto canonical parameter ids
///
/// Headers that are not parameters ("Parameter", "Average") come back
/// `Unmapped` with their raw text.
pub fn canonicalize_headers<S: AsRef<str>>(
    headers: &[S],
    category: Option<Category>,
    knowledge: &KnowledgeBase,
) -> Vec<Canonicalized> {
    headers
        .iter()
        .map(|h| canonicalize(h.as_ref(), category, &knowledge.aliases))
        .collect()
}

/// Complete result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub knowledge_version: String,
    pub statistics: Vec<ParameterStatistics>,
    /// Critical, Low, Balanced, then N.D.; descending magnitude within a tier
    pub gaps: Vec<GapRecord>,
    pub findings: Vec<ConsolidatedFinding>,
    pub unmapped_parameters: Vec<UnmappedParameter>,
    pub summary: Vec<SeveritySummary>,
}

impl AnalysisReport {
    pub fn comparison_rows(&self) -> Vec<ComparisonRow> {
        comparison_rows(&self.statistics, &self.gaps)
    }

    pub fn critical_gaps(&self) -> impl Iterator<Item = &GapRecord> {
        self.gaps.iter().filter(|g| g.severity == Some(Severity::Critical))
    }

    pub fn gap_for(&self, parameter_id: &str, category: Category) -> Option<&GapRecord> {
        self.gaps
            .iter()
            .find(|g| g.parameter_id == parameter_id && g.category == category)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context(|| "Failed to serialize analysis report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::ReferenceTable;
    use crate::metrics::gap::evaluate_gap;

    fn stats(id: &str, category: Category, average: Option<f64>) -> ParameterStatistics {
        ParameterStatistics {
            parameter_id: id.to_string(),
            category,
            count: usize::from(average.is_some()),
            missing_count: usize::from(average.is_none()),
            average,
            min: average,
            max: average,
            std_dev: None,
        }
    }

    #[test]
    fn test_severity_summary() {
        let table = ReferenceTable::builtin();
        let gaps = vec![
            evaluate_gap("pH", Category::Soil, Some(3.0), table.get("pH", Category::Soil)),
            evaluate_gap("CEC (cmol/kg)", Category::Soil, Some(10.0), table.get("CEC (cmol/kg)", Category::Soil)),
            evaluate_gap("Sand %", Category::Soil, Some(40.0), None),
        ];
        let summary = severity_summary(&gaps);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].category, Some(Category::Soil));
        assert_eq!((summary[0].critical, summary[0].low, summary[0].balanced, summary[0].not_determined), (1, 0, 1, 1));
    }

    #[test]
    fn test_comparison_rows() {
        let table = ReferenceTable::builtin();
        let statistics = vec![stats("K (%)", Category::Leaf, Some(0.8)), stats("Mo", Category::Leaf, None)];
        let gaps: Vec<GapRecord> = statistics
            .iter()
            .map(|s| evaluate_gap(&s.parameter_id, s.category, s.average, table.get(&s.parameter_id, s.category)))
            .collect();

        let rows = comparison_rows(&statistics, &gaps);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].optimal_range.as_deref(), Some("0.9-1.2"));
        assert_eq!(rows[0].status, GapStatus::Low);
        assert_eq!(rows[1].optimal_range, None);
        assert_eq!(rows[1].status, GapStatus::NotDetermined);
    }

    #[test]
    fn test_canonicalize_headers() {
        let kb = KnowledgeBase::builtin();
        let headers = ["Parameter", "Leaf K", "Leaf N (%)", "Boron (ppm)"];
        let mapped = canonicalize_headers(&headers, Some(Category::Leaf), &kb);
        let ids: Vec<&str> = mapped.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Parameter", "K (%)", "N (%)", "B (mg/kg)"]);
        assert!(!mapped[0].is_mapped());
    }
}
