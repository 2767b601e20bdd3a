//! Numeric assessment of sample data
//!
//! - `aggregator`: per-parameter statistics with the missing-value policy
//! - `gap`: deviation from reference ranges and severity tiers

pub mod aggregator;
pub mod gap;

pub use aggregator::{
    aggregate_records, aggregate_values, summarize, AggregationOutcome, ParameterStatistics, Summary,
    UnmappedParameter,
};
pub use gap::{
    compare_priority, evaluate_gap, evaluate_statistics, percent_gap, sort_by_priority, GapRecord, GapStatus,
    Severity, BALANCED_MAX_GAP, LOW_MAX_GAP, PH_SOFT_BOUNDARY,
};
