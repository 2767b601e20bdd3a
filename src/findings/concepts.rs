//! Finding Concept Extractor
//!
//! Reduces a free-text finding to an unordered set of normalized domain
//! tokens:
//!   (a) nutrient names, with chemical symbols folded onto the name ("k" → "potassium")
//!   (b) parameter and unit terms ("ph", "cec", "organic matter", "%", "mg/kg")
//!   (c) condition words ("deficient", "excess", "low", "critical", ...)
//!   (d) every positive numeric literal, formatted canonically ("4.10" → "4.1")
//!
//! Unit phrases are matched first and removed from the text, so "mg" in
//! "mg/kg" is never read as magnesium.

use crate::utils::normalization::{contains_phrase, normalize_text, strip_unit_tokens};
use crate::utils::numeric::{extract_numbers, format_number};
use std::collections::BTreeSet;

/// Order-independent concept set
pub type ConceptSet = BTreeSet<String>;

// ============================================================================
// VOCABULARY
// (phrase as it appears in normalized text, concept token)
// ============================================================================

static UNIT_TERMS: &[(&str, &str)] = &[
    ("cmol c kg", "cmol/kg"),
    ("cmolc kg", "cmol/kg"),
    ("cmol kg", "cmol/kg"),
    ("meq 100 g", "meq"),
    ("meq 100g", "meq"),
    ("meq", "meq"),
    ("mg kg", "mg/kg"),
    ("ppm", "mg/kg"),
    ("mg l", "mg/l"),
    ("g kg", "g/kg"),
];

static NUTRIENT_TERMS: &[(&str, &str)] = &[
    ("nitrogen", "nitrogen"),
    ("n", "nitrogen"),
    ("phosphorus", "phosphorus"),
    ("phosphate", "phosphorus"),
    ("p", "phosphorus"),
    ("potassium", "potassium"),
    ("potash", "potassium"),
    ("k", "potassium"),
    ("calcium", "calcium"),
    ("ca", "calcium"),
    ("magnesium", "magnesium"),
    ("mg", "magnesium"),
    ("sulphur", "sulfur"),
    ("sulfur", "sulfur"),
    ("boron", "boron"),
    ("b", "boron"),
    ("copper", "copper"),
    ("cu", "copper"),
    ("zinc", "zinc"),
    ("zn", "zinc"),
    ("iron", "iron"),
    ("fe", "iron"),
    ("manganese", "manganese"),
    ("mn", "manganese"),
];

static PARAMETER_TERMS: &[(&str, &str)] = &[
    ("ph", "ph"),
    ("cec", "cec"),
    ("cation exchange capacity", "cec"),
    ("organic matter", "organic matter"),
    ("organic carbon", "organic carbon"),
    ("org c", "organic carbon"),
    ("base saturation", "base saturation"),
    ("yield", "yield"),
    ("yields", "yield"),
    ("ratio", "ratio"),
];

static CONDITION_TERMS: &[&str] = &[
    "deficient",
    "deficiency",
    "excess",
    "excessive",
    "low",
    "high",
    "critical",
    "critically",
    "moderate",
    "mild",
    "severe",
    "severely",
    "optimal",
    "adequate",
    "sufficient",
    "toxic",
    "toxicity",
    "acidic",
    "alkaline",
    "below",
    "above",
    "imbalance",
];

/// Extract the concept set of a finding
pub fn extract_concepts(text: &str) -> ConceptSet {
    let mut concepts = ConceptSet::new();
    let normalized = normalize_text(text);

    for (phrase, concept) in UNIT_TERMS {
        if contains_phrase(&normalized, phrase) {
            concepts.insert((*concept).to_string());
        }
    }
    if text.contains('%') {
        concepts.insert("%".to_string());
    }

    let words = strip_unit_tokens(&normalized);

    for (phrase, concept) in NUTRIENT_TERMS.iter().chain(PARAMETER_TERMS) {
        if contains_phrase(&words, phrase) {
            concepts.insert((*concept).to_string());
        }
    }

    for word in CONDITION_TERMS {
        if contains_phrase(&words, word) {
            concepts.insert(condition_concept(word).to_string());
        }
    }

    for value in extract_numbers(text) {
        concepts.insert(format_number(value));
    }

    concepts
}

/// Adverb forms share the adjective's concept
fn condition_concept(word: &str) -> &str {
    match word {
        "critically" => "critical",
        "severely" => "severe",
        other => other,
    }
}

/// Nutrient concepts of a set, in vocabulary order
pub fn nutrient_concepts(concepts: &ConceptSet) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for (_, concept) in NUTRIENT_TERMS {
        if concepts.contains(*concept) && !out.contains(concept) {
            out.push(*concept);
        }
    }
    out
}

/// Numeric tokens of a concept set, ascending
pub fn numeric_concepts(concepts: &ConceptSet) -> Vec<f64> {
    let mut values: Vec<f64> = concepts.iter().filter_map(|c| c.parse::<f64>().ok()).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// |A ∩ B| / |A ∪ B|; zero when both are empty
pub fn overlap_ratio(a: &ConceptSet, b: &ConceptSet) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// |A ∩ B| / max(|A|, |B|); zero when both are empty
pub fn dominant_ratio(a: &ConceptSet, b: &ConceptSet) -> f64 {
    let larger = a.len().max(b.len());
    if larger == 0 {
        0.0
    } else {
        a.intersection(b).count() as f64 / larger as f64
    }
}
