//! Free-text finding consolidation
//!
//! - `concepts`: concept sets and similarity ratios
//! - `issue_category`: same-issue keyword families
//! - `merge_text`: consolidated statement synthesis
//! - `deduplicator`: parameter grouping and union-find clustering

pub mod concepts;
pub mod deduplicator;
pub mod issue_category;
pub mod merge_text;
pub mod types;

pub use concepts::{dominant_ratio, extract_concepts, overlap_ratio, ConceptSet};
pub use deduplicator::{deduplicate_findings, match_strength, FindingDeduplicator, MatchStrength};
pub use issue_category::{same_issue, IssueCategory, IssueProfile};
pub use merge_text::synthesize;
pub use types::{ConsolidatedFinding, Finding};
