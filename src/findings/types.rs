//! Finding input and consolidated output types

use crate::data::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Free-text observation from one analysis step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub text: String,
    /// Provenance (step name, report section)
    #[serde(default, alias = "source")]
    pub source_label: String,
}

impl Finding {
    pub fn new(text: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_label: source_label.into(),
        }
    }

    /// Text with no letter or digit cannot be analyzed and is dropped
    pub fn is_parseable(&self) -> bool {
        self.text.chars().any(|c| c.is_alphanumeric())
    }
}

/// One statement standing for one or more findings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedFinding {
    pub text: String,
    /// Union of contributing source labels
    pub sources: BTreeSet<String>,
    /// Dominant canonical parameter, if one was recognized
    pub parameter_id: Option<String>,
    pub category: Option<Category>,
    /// Number of input findings merged into this one
    pub member_count: usize,
}

impl ConsolidatedFinding {
    pub fn is_merged(&self) -> bool {
        self.member_count > 1
    }
}
