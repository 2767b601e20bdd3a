//! Same-Issue Heuristic
//!
//! Keyword families that decide whether two moderately similar findings
//! describe the same agronomic issue. A family matches when any subject
//! phrase occurs and, for deficiency families, a deficiency qualifier too.
//!
//! Two findings share an issue when they have at least one family in common
//! and, if both quote numbers, some pair of numbers lies within 0.1.

use crate::utils::normalization::{contains_phrase, normalize_text, strip_unit_tokens};
use crate::utils::numeric::extract_numbers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Largest difference between two figures still considered the same reading
pub const NUMERIC_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssueCategory {
    PotassiumDeficiency,
    SoilAcidity,
    PhosphorusDeficiency,
    CationExchange,
    OrganicMatter,
    Micronutrients,
    YieldImpact,
    EconomicImpact,
}

static DEFICIENCY_QUALIFIERS: &[&str] = &[
    "deficient",
    "deficiency",
    "deficiencies",
    "low",
    "below",
    "shortage",
    "lacking",
    "insufficient",
    "depleted",
];

struct Family {
    category: IssueCategory,
    subjects: &'static [&'static str],
    qualifiers: &'static [&'static str],
}

static FAMILIES: &[Family] = &[
    Family {
        category: IssueCategory::PotassiumDeficiency,
        subjects: &["potassium", "potash", "k", "exch k", "mop"],
        qualifiers: DEFICIENCY_QUALIFIERS,
    },
    Family {
        category: IssueCategory::SoilAcidity,
        subjects: &["ph", "acidity", "acidic", "acid", "lime", "liming"],
        qualifiers: &[],
    },
    Family {
        category: IssueCategory::PhosphorusDeficiency,
        subjects: &["phosphorus", "phosphate", "p", "avail p", "rock phosphate"],
        qualifiers: DEFICIENCY_QUALIFIERS,
    },
    Family {
        category: IssueCategory::CationExchange,
        subjects: &["cec", "cation exchange", "cation exchange capacity", "base saturation"],
        qualifiers: &[],
    },
    Family {
        category: IssueCategory::OrganicMatter,
        subjects: &["organic matter", "organic carbon", "org c", "soil organic"],
        qualifiers: &[],
    },
    Family {
        category: IssueCategory::Micronutrients,
        subjects: &[
            "micronutrient",
            "micronutrients",
            "boron",
            "copper",
            "zinc",
            "iron",
            "manganese",
            "b",
            "cu",
            "zn",
            "fe",
            "mn",
        ],
        qualifiers: &[],
    },
    Family {
        category: IssueCategory::YieldImpact,
        subjects: &["yield", "yields", "production", "productivity", "ffb", "bunch", "bunches"],
        qualifiers: &[],
    },
    Family {
        category: IssueCategory::EconomicImpact,
        subjects: &["cost", "costs", "revenue", "profit", "profitability", "economic", "income", "roi", "rm", "usd"],
        qualifiers: &[],
    },
];

/// Issue families and quoted figures of one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueProfile {
    pub categories: BTreeSet<IssueCategory>,
    pub numbers: Vec<f64>,
}

impl IssueProfile {
    pub fn from_text(text: &str) -> Self {
        let words = strip_unit_tokens(&normalize_text(text));
        let categories = FAMILIES
            .iter()
            .filter(|family| {
                family.subjects.iter().any(|s| contains_phrase(&words, s))
                    && (family.qualifiers.is_empty() || family.qualifiers.iter().any(|q| contains_phrase(&words, q)))
            })
            .map(|family| family.category)
            .collect();

        Self {
            categories,
            numbers: extract_numbers(text),
        }
    }

    /// Combined profile of several statements
    pub fn merge(&mut self, other: &IssueProfile) {
        self.categories.extend(other.categories.iter().copied());
        self.numbers.extend(other.numbers.iter().copied());
    }

    pub fn shares_issue(&self, other: &IssueProfile) -> bool {
        if self.categories.is_disjoint(&other.categories) {
            return false;
        }
        if self.numbers.is_empty() || other.numbers.is_empty() {
            return true;
        }
        self.numbers
            .iter()
            .any(|a| other.numbers.iter().any(|b| (a - b).abs() <= NUMERIC_TOLERANCE + 1e-9))
    }
}

/// Whether two statements reference a common issue with compatible figures
pub fn same_issue(a: &str, b: &str) -> bool {
    IssueProfile::from_text(a).shares_issue(&IssueProfile::from_text(b))
}
