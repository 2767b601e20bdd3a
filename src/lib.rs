//! Nutrient Gap Engine
//!
//! Reconciles soil and leaf laboratory results from heterogeneous producers
//! into a decision-ready dataset.
//!
//! Module layout:
//! - `knowledge/`: alias table, reference standards, missing-value policy
//! - `utils/`: name/text normalization and numeric parsing
//! - `canonicalizer`: raw parameter name → canonical id
//! - `data`: sample records and their ingestion (JSON, CSV via Polars)
//! - `metrics/`: per-parameter statistics and gap/severity evaluation
//! - `findings/`: concept extraction and finding consolidation
//! - `analyzer`: one analysis run end to end
//! - `report`: structured output for presentation layers

pub mod analyzer;
pub mod canonicalizer;
pub mod data;
pub mod findings;
pub mod knowledge;
pub mod metrics;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use analyzer::{load_batch, parse_batch, AnalysisInput, NutrientAnalyzer};
pub use canonicalizer::{canonical_id, canonicalize, resolve_text_parameter, Canonicalized, MatchKind, TextParameter};
pub use data::{load_csv_records, records_from_dataframe, records_from_json, Category, IngestError, RawValue, SampleRecord};
pub use findings::{deduplicate_findings, ConsolidatedFinding, Finding, FindingDeduplicator};
pub use knowledge::{KnowledgeBase, KnowledgeOverrides, KNOWLEDGE_VERSION};
pub use metrics::{
    aggregate_records, aggregate_values, evaluate_gap, sort_by_priority, GapRecord, GapStatus, ParameterStatistics,
    Severity,
};
pub use report::{canonicalize_headers, comparison_rows, AnalysisReport, ComparisonRow, SeveritySummary};
