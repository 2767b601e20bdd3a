//! Sample Aggregator
//!
//! Collapses per-sample readings of one canonical parameter into count,
//! average, min, max and sample standard deviation.
//!
//! Missing-value policy:
//!   - Sentinels ("N.D.", "N/A", empty, null) and unparseable text are missing
//!   - Near-zero readings of zero-ambiguous parameters are missing
//!     (per-parameter rule from `MissingValuePolicy`)
//!   - Everything else, including a literal 0.0 elsewhere, is a reading
//!
//! An empty retained set yields `None` statistics ("not determined"), never zero.

use crate::canonicalizer::{canonicalize, Canonicalized};
use crate::data::{Category, RawValue, SampleRecord};
use crate::knowledge::{KnowledgeBase, MissingValuePolicy};
use crate::utils::numeric::{parse_raw_value, ParsedValue};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Aggregate statistics for one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterStatistics {
    pub parameter_id: String,
    pub category: Category,
    /// Valid samples used
    pub count: usize,
    /// Samples excluded as missing
    pub missing_count: usize,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Sample standard deviation (n - 1); `None` below two readings
    pub std_dev: Option<f64>,
}

impl ParameterStatistics {
    /// Samples considered (count + missing_count)
    pub fn total(&self) -> usize {
        self.count + self.missing_count
    }

    pub fn is_determined(&self) -> bool {
        self.average.is_some()
    }
}

/// Summary of a retained numeric set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: Option<f64>,
}

/// Mean, min, max and sample standard deviation; `None` for an empty slice
pub fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let std_dev = if values.len() >= 2 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        Some((ss / (n - 1.0)).sqrt())
    } else {
        None
    };

    Some(Summary { mean, min, max, std_dev })
}

/// Apply the missing-value policy to one raw value
pub fn retained_value(parameter_id: &str, raw: &RawValue, policy: &MissingValuePolicy) -> Option<f64> {
    match parse_raw_value(raw) {
        ParsedValue::Value(v) if policy.retains(parameter_id, v) => Some(v),
        ParsedValue::Value(v) => {
            tracing::debug!("{}: excluding ambiguous reading {} as missing", parameter_id, v);
            None
        }
        ParsedValue::NotDetermined => None,
        ParsedValue::Unparseable => {
            tracing::debug!("{}: unparseable value {:?} treated as missing", parameter_id, raw);
            None
        }
    }
}

/// Aggregate the raw values of one canonical parameter
pub fn aggregate_values(
    parameter_id: &str,
    category: Category,
    values: &[RawValue],
    policy: &MissingValuePolicy,
) -> ParameterStatistics {
    let retained: Vec<f64> = values
        .iter()
        .filter_map(|raw| retained_value(parameter_id, raw, policy))
        .collect();

    let summary = summarize(&retained);

    ParameterStatistics {
        parameter_id: parameter_id.to_string(),
        category,
        count: retained.len(),
        missing_count: values.len() - retained.len(),
        average: summary.map(|s| s.mean),
        min: summary.map(|s| s.min),
        max: summary.map(|s| s.max),
        std_dev: summary.and_then(|s| s.std_dev),
    }
}

/// Raw parameter name that could not be canonicalized
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnmappedParameter {
    pub raw_name: String,
    pub category: Category,
}

/// Statistics for a whole batch of records
#[derive(Debug, Clone, Default)]
pub struct AggregationOutcome {
    pub statistics: Vec<ParameterStatistics>,
    pub unmapped: Vec<UnmappedParameter>,
}

/// Canonicalize and aggregate a batch of sample records of one category
///
/// A record lacking a parameter counts as missing for it, so every
/// statistic satisfies `count + missing_count == records.len()`.
/// When one record has several raw names for the same parameter, the first
/// value (raw name order) that survives the missing-value policy is used.
pub fn aggregate_records(records: &[SampleRecord], category: Category, knowledge: &KnowledgeBase) -> AggregationOutcome {
    // Warn once per distinct raw name
    let mut resolved: FxHashMap<&str, Canonicalized> = FxHashMap::default();
    // canonical id → per-record chosen value
    let mut columns: FxHashMap<String, Vec<RawValue>> = FxHashMap::default();
    let n = records.len();

    for (row, record) in records.iter().enumerate() {
        for (raw_name, raw) in &record.values {
            let canonical = resolved
                .entry(raw_name.as_str())
                .or_insert_with(|| canonicalize(raw_name, Some(category), &knowledge.aliases));
            let id = canonical.id.clone();

            let slots = columns.entry(id.clone()).or_insert_with(|| vec![RawValue::Missing; n]);
            let slot = &mut slots[row];
            let current_ok = retained_value(&id, slot, &knowledge.missing_policy).is_some();
            if !current_ok && (matches!(slot, RawValue::Missing) || retained_value(&id, raw, &knowledge.missing_policy).is_some()) {
                *slot = raw.clone();
            }
        }
    }

    let mut statistics: Vec<ParameterStatistics> = columns
        .iter()
        .map(|(id, values)| aggregate_values(id, category, values, &knowledge.missing_policy))
        .collect();

    // Table order first, unmapped raw names afterwards in lexical order
    statistics.sort_by(|a, b| {
        let pa = knowledge.aliases.position(&a.parameter_id, category).unwrap_or(usize::MAX);
        let pb = knowledge.aliases.position(&b.parameter_id, category).unwrap_or(usize::MAX);
        pa.cmp(&pb).then_with(|| a.parameter_id.cmp(&b.parameter_id))
    });

    let mut unmapped: Vec<UnmappedParameter> = resolved
        .iter()
        .filter(|(_, c)| !c.is_mapped())
        .map(|(raw, _)| UnmappedParameter {
            raw_name: raw.to_string(),
            category,
        })
        .collect();
    unmapped.sort();

    tracing::info!(
        "Aggregated {} {} samples into {} parameters ({} unmapped)",
        n,
        category,
        statistics.len(),
        unmapped.len()
    );

    AggregationOutcome { statistics, unmapped }
}
