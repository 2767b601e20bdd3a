//! Nutrient Analyzer - runs one analysis end to end
//!
//! Sample flow:  records → canonicalize → aggregate → evaluate gaps → sort
//! Finding flow: findings → concepts → group/cluster → consolidate
//!
//! Each run owns its inputs and outputs; the `KnowledgeBase` is the only
//! shared (read-only) state, so independent batches can be analyzed in
//! parallel with Rayon.

use crate::data::{records_from_json, Category, SampleRecord};
use crate::findings::{Finding, FindingDeduplicator};
use crate::knowledge::KnowledgeBase;
use crate::metrics::aggregator::aggregate_records;
use crate::metrics::gap::{evaluate_statistics, sort_by_priority, Severity};
use crate::report::{severity_summary, AnalysisReport};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Source label for findings delivered as bare strings
pub const UNLABELLED_SOURCE: &str = "unlabelled";

/// Everything one analysis run consumes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    #[serde(default)]
    pub soil_samples: Vec<SampleRecord>,
    #[serde(default)]
    pub leaf_samples: Vec<SampleRecord>,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl AnalysisInput {
    pub fn samples(&self, category: Category) -> &[SampleRecord] {
        match category {
            Category::Soil => &self.soil_samples,
            Category::Leaf => &self.leaf_samples,
        }
    }
}

/// Parse a JSON batch leniently
///
/// The document must be an object. Malformed sample records and findings
/// are skipped with a warning instead of failing the batch. A finding may be
/// a bare string or an object with `text` and `source_label`.
pub fn parse_batch(json: &str) -> Result<AnalysisInput> {
    let doc: Value = serde_json::from_str(json).with_context(|| "Failed to parse analysis batch JSON")?;
    let Value::Object(map) = &doc else {
        anyhow::bail!("Analysis batch must be a JSON object");
    };

    let samples = |key: &str| -> Vec<SampleRecord> {
        match map.get(key) {
            Some(Value::Array(values)) => records_from_json(values),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                tracing::warn!("'{}' is not an array ({}); ignoring", key, json_kind(other));
                Vec::new()
            }
        }
    };

    let findings = match map.get("findings") {
        Some(Value::Array(values)) => values
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| finding_from_json(idx, v))
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            tracing::warn!("'findings' is not an array ({}); ignoring", json_kind(other));
            Vec::new()
        }
    };

    Ok(AnalysisInput {
        soil_samples: samples("soil_samples"),
        leaf_samples: samples("leaf_samples"),
        findings,
    })
}

/// Read and parse a JSON batch file
pub fn load_batch(path: &Path) -> Result<AnalysisInput> {
    let contents = fs::read_to_string(path).with_context(|| format!("Failed to read analysis batch: {:?}", path))?;
    parse_batch(&contents).with_context(|| format!("Invalid analysis batch: {:?}", path))
}

fn finding_from_json(idx: usize, value: &Value) -> Option<Finding> {
    match value {
        Value::String(text) => Some(Finding::new(text.clone(), UNLABELLED_SOURCE)),
        Value::Object(_) => match serde_json::from_value::<Finding>(value.clone()) {
            Ok(finding) => Some(finding),
            Err(e) => {
                tracing::warn!("Skipping finding #{}: {}", idx + 1, e);
                None
            }
        },
        other => {
            tracing::warn!("Skipping finding #{}: expected string or object, found {}", idx + 1, json_kind(other));
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Main analyzer
pub struct NutrientAnalyzer<'k> {
    knowledge: &'k KnowledgeBase,
}

impl<'k> NutrientAnalyzer<'k> {
    pub fn new(knowledge: &'k KnowledgeBase) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        self.knowledge
    }

    /// Analyze one batch
    pub fn analyze(&self, input: &AnalysisInput) -> AnalysisReport {
        let mut statistics = Vec::new();
        let mut unmapped = Vec::new();

        for category in Category::ALL {
            let records = input.samples(category);
            if records.is_empty() {
                continue;
            }
            let outcome = aggregate_records(records, category, self.knowledge);
            statistics.extend(outcome.statistics);
            unmapped.extend(outcome.unmapped);
        }

        let mut gaps = evaluate_statistics(&statistics, &self.knowledge.standards);
        sort_by_priority(&mut gaps);

        let findings = FindingDeduplicator::new(&self.knowledge.aliases).deduplicate(&input.findings);
        let summary = severity_summary(&gaps);

        tracing::info!(
            "Analysis complete: {} parameters, {} critical, {} consolidated findings",
            statistics.len(),
            gaps.iter().filter(|g| g.severity == Some(Severity::Critical)).count(),
            findings.len()
        );

        AnalysisReport {
            knowledge_version: self.knowledge.version().to_string(),
            statistics,
            gaps,
            findings,
            unmapped_parameters: unmapped,
            summary,
        }
    }

    /// Analyze independent batches in parallel (output order = input order)
    pub fn analyze_batches(&self, inputs: &[AnalysisInput]) -> Vec<AnalysisReport> {
        inputs.par_iter().map(|input| self.analyze(input)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::GapStatus;

    const BATCH: &str = r#"{
        "soil_samples": [
            {"sample_id": "S1", "pH": 4.0, "Exch K": "0.12"},
            {"sample_id": "S2", "pH (H2O)": 4.2, "Exch K": "N.D."},
            "garbage",
            {"sample_id": "S3", "Soil pH": 4.1, "Exch K": 0.0}
        ],
        "leaf_samples": [
            {"sample_id": "L1", "Leaf K": 0.95, "Boron": "9 mg/kg"}
        ],
        "findings": [
            {"text": "Soil pH is low at 4.1", "source_label": "soil_analysis"},
            "pH deficiency observed, value 4.1",
            42,
            {"source_label": "no text"}
        ]
    }"#;

    #[test]
    fn test_parse_batch_skips_malformed() {
        let input = parse_batch(BATCH).unwrap();
        assert_eq!(input.soil_samples.len(), 3);
        assert_eq!(input.leaf_samples.len(), 1);
        assert_eq!(input.findings.len(), 2);
        assert_eq!(input.findings[1].source_label, UNLABELLED_SOURCE);
    }

    #[test]
    fn test_parse_batch_rejects_non_object() {
        assert!(parse_batch("[1, 2]").is_err());
        assert!(parse_batch("not json").is_err());
        assert_eq!(parse_batch("{}").unwrap(), AnalysisInput::default());
    }

    #[test]
    fn test_analyze() {
        let kb = KnowledgeBase::builtin();
        let input = parse_batch(BATCH).unwrap();
        let report = NutrientAnalyzer::new(&kb).analyze(&input);

        let ph = report.gap_for("pH", Category::Soil).unwrap();
        assert_eq!(ph.status, GapStatus::Low);
        assert_eq!(ph.severity, Some(Severity::Low));

        // Boron 9 vs 15-25: -40 % Critical, sorted first
        assert_eq!(report.gaps[0].parameter_id, "B (mg/kg)");
        assert_eq!(report.gaps[0].severity, Some(Severity::Critical));

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].sources.len(), 2);
        assert!(report.unmapped_parameters.is_empty());
        assert_eq!(report.knowledge_version, kb.version());
    }

    #[test]
    fn test_analyze_batches_keeps_order() {
        let kb = KnowledgeBase::builtin();
        let analyzer = NutrientAnalyzer::new(&kb);
        let a = AnalysisInput {
            soil_samples: vec![SampleRecord::new("A").with_value("pH", 5.0)],
            ..Default::default()
        };
        let b = AnalysisInput {
            soil_samples: vec![SampleRecord::new("B").with_value("pH", 3.0)],
            ..Default::default()
        };

        let reports = analyzer.analyze_batches(&[a.clone(), b.clone()]);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], analyzer.analyze(&a));
        assert_eq!(reports[1].gaps[0].status, GapStatus::CriticalLow);
    }
}
