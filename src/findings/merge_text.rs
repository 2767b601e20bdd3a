//! Merge-Text Synthesis
//!
//! Composes one statement for a cluster of findings:
//!
//!   "{Parameter} shows {severity} levels (values reported: a, b) with
//!    {context} noted. {closing}"
//!
//! Severity descriptor by priority: critical/severe > high > low > "notable".
//! Context is the union of deficiency / excess / below-optimal /
//! above-optimal cues. The closing clause scales with severity.

use crate::findings::concepts::{nutrient_concepts, ConceptSet};
use crate::utils::numeric::{extract_numbers, format_number};

pub const FALLBACK_LABEL: &str = "Nutrient status";

const CLOSING_CRITICAL: &str = "This directly impacts crop yield and requires immediate corrective action.";
const CLOSING_HIGH: &str = "This significantly affects nutrient balance and crop performance.";
const CLOSING_DEFAULT: &str = "This should be monitored and addressed in the nutrient management plan.";

/// Overall severity word for a concept set
pub fn severity_descriptor(concepts: &ConceptSet) -> &'static str {
    if concepts.contains("critical") {
        "critical"
    } else if concepts.contains("severe") {
        "severe"
    } else if concepts.contains("high") {
        "high"
    } else if concepts.contains("low") {
        "low"
    } else {
        "notable"
    }
}

fn closing_clause(severity: &str) -> &'static str {
    match severity {
        "critical" | "severe" => CLOSING_CRITICAL,
        "high" => CLOSING_HIGH,
        _ => CLOSING_DEFAULT,
    }
}

/// Qualitative context cues present in a concept set
pub fn context_phrases(concepts: &ConceptSet) -> Vec<&'static str> {
    let mut phrases = Vec::new();
    if concepts.contains("deficient") || concepts.contains("deficiency") {
        phrases.push("deficiency");
    }
    if concepts.contains("excess") || concepts.contains("excessive") || concepts.contains("toxic") || concepts.contains("toxicity") {
        phrases.push("excess");
    }
    if concepts.contains("below") {
        phrases.push("below optimal range");
    }
    if concepts.contains("above") {
        phrases.push("above optimal range");
    }
    phrases
}

/// Label when no canonical parameter was recognized
pub fn fallback_label(concepts: &ConceptSet) -> String {
    if let Some(nutrient) = nutrient_concepts(concepts).first() {
        return capitalize(nutrient);
    }
    if concepts.contains("ph") {
        return "pH".to_string();
    }
    if concepts.contains("cec") {
        return "CEC".to_string();
    }
    FALLBACK_LABEL.to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "a", "a and b", "a, b and c"
fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Distinct positive figures quoted by the member texts, ascending
pub fn reported_values(texts: &[&str]) -> Vec<String> {
    let mut values: Vec<f64> = texts.iter().flat_map(|t| extract_numbers(t)).collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let mut out: Vec<String> = Vec::new();
    for v in values {
        let token = format_number(v);
        if out.last() != Some(&token) {
            out.push(token);
        }
    }
    out
}

/// Compose the consolidated statement
///
/// `concepts` is the union of the member concept sets; `texts` are the
/// member texts the figures are taken from.
pub fn synthesize(label: &str, texts: &[&str], concepts: &ConceptSet) -> String {
    let severity = severity_descriptor(concepts);
    let mut sentence = format!("{} shows {} levels", label, severity);

    let values = reported_values(texts);
    if !values.is_empty() {
        sentence.push_str(&format!(" (values reported: {})", values.join(", ")));
    }

    let context: Vec<String> = context_phrases(concepts).into_iter().map(String::from).collect();
    if !context.is_empty() {
        sentence.push_str(&format!(" with {} noted", join_list(&context)));
    }

    format!("{}. {}", sentence, closing_clause(severity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::concepts::extract_concepts;

    fn union(texts: &[&str]) -> ConceptSet {
        texts.iter().flat_map(|t| extract_concepts(t)).collect()
    }

    #[test]
    fn test_severity_priority() {
        assert_eq!(severity_descriptor(&union(&["low and critical"])), "critical");
        assert_eq!(severity_descriptor(&union(&["severely low"])), "severe");
        assert_eq!(severity_descriptor(&union(&["high but low"])), "high");
        assert_eq!(severity_descriptor(&union(&["low"])), "low");
        assert_eq!(severity_descriptor(&union(&["observed"])), "notable");
    }

    #[test]
    fn test_synthesize_ph() {
        let texts = ["Soil pH is low at 4.1", "pH deficiency observed, value 4.1"];
        let text = synthesize("pH", &texts, &union(&texts));
        assert_eq!(
            text,
            "pH shows low levels (values reported: 4.1) with deficiency noted. \
             This should be monitored and addressed in the nutrient management plan."
        );
    }

    #[test]
    fn test_synthesize_critical_with_context() {
        let texts = [
            "Exchangeable K critically deficient at 0.05",
            "Potassium below optimum, 0.08 cmol/kg",
        ];
        let text = synthesize("Exchangeable potassium", &texts, &union(&texts));
        assert!(text.starts_with("Exchangeable potassium shows critical levels (values reported: 0.05, 0.08)"));
        assert!(text.contains("with deficiency and below optimal range noted"));
        assert!(text.ends_with(CLOSING_CRITICAL));
    }

    #[test]
    fn test_synthesize_without_figures() {
        let texts = ["Copper is high", "Excess copper in leaves"];
        let text = synthesize("Copper", &texts, &union(&texts));
        assert_eq!(
            text,
            "Copper shows high levels with excess noted. This significantly affects nutrient balance and crop performance."
        );
    }

    #[test]
    fn test_fallback_label() {
        assert_eq!(fallback_label(&union(&["zinc and iron"])), "Zinc");
        assert_eq!(fallback_label(&union(&["yield loss"])), FALLBACK_LABEL);
    }

    #[test]
    fn test_join_list() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_list(&items), "a, b and c");
        assert_eq!(join_list(&items[..2]), "a and b");
        assert_eq!(join_list(&items[..1]), "a");
    }
}
