//! Name and Text Normalization
//!
//! Produces the lookup keys shared by the canonicalizer (raw column names)
//! and the finding engine (free text). Both sides must normalize the same
//! way, otherwise aliases registered in the table never match text.

/// Unit spellings that trail parameter names in lab exports.
/// Matched as whole token sequences so that "mg" (magnesium) alone survives.
const UNIT_PATTERNS: &[&[&str]] = &[
    &["cmol", "c", "kg"],
    &["cmolc", "kg"],
    &["cmol", "kg"],
    &["meq", "100", "g"],
    &["meq", "100g"],
    &["mg", "kg"],
    &["mg", "l"],
    &["g", "kg"],
    &["ppm"],
];

/// Lowercase, replace every non-alphanumeric character with a space and
/// collapse whitespace. Parenthetical content is kept.
pub fn normalize_text(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalization key for a raw parameter name
///
/// 1. Strip parenthetical/bracketed segments ("(mg/kg)", "[%]")
/// 2. Lowercase, punctuation (`%`, `.`, `/`, ...) to spaces, collapse whitespace
/// 3. Drop unit token sequences ("mg kg", "cmol kg", "ppm")
///
/// "Exch. K (cmol/kg)" → "exch k", "Avail P mg/kg" → "avail p"
pub fn normalization_key(raw: &str) -> String {
    let stripped = strip_parentheticals(raw);
    let text = normalize_text(&stripped);
    strip_unit_tokens(&text)
}

/// Remove "(...)" and "[...]" segments, tolerating unbalanced brackets
fn strip_parentheticals(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;

    for c in raw.chars() {
        match c {
            '(' | '[' => {
                depth += 1;
                out.push(' ');
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                out.push(' ');
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    out
}

/// Remove unit token sequences from an already-normalized string
pub fn strip_unit_tokens(normalized: &str) -> String {
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());

    let mut i = 0;
    'outer: while i < tokens.len() {
        for pattern in UNIT_PATTERNS {
            let end = i + pattern.len();
            if end <= tokens.len() && tokens[i..end] == **pattern {
                i = end;
                continue 'outer;
            }
        }
        kept.push(tokens[i]);
        i += 1;
    }

    kept.join(" ")
}

/// Position of `phrase` in `haystack` on whole-word boundaries
///
/// Both arguments must already be normalized (single spaces, no punctuation).
/// Returns the byte offset of the match within `haystack`.
pub fn find_phrase(haystack: &str, phrase: &str) -> Option<usize> {
    if phrase.is_empty() || haystack.is_empty() {
        return None;
    }

    let padded_haystack = format!(" {} ", haystack);
    let padded_phrase = format!(" {} ", phrase);
    padded_haystack.find(&padded_phrase)
}

/// Whether `phrase` occurs in `haystack` as a whole-word sequence
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    find_phrase(haystack, phrase).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_key() {
        assert_eq!(normalization_key("Exch. K (cmol/kg)"), "exch k");
        assert_eq!(normalization_key("  Avail   P (mg/kg) "), "avail p");
        assert_eq!(normalization_key("Org. C (%)"), "org c");
        assert_eq!(normalization_key("Org.C"), "org c");
        assert_eq!(normalization_key("N%"), "n");
        assert_eq!(normalization_key("pH (H2O)"), "ph");
        assert_eq!(normalization_key("Total P mg/kg"), "total p");
        assert_eq!(normalization_key("C.E.C."), "c e c");
    }

    #[test]
    fn test_magnesium_symbol_survives_unit_stripping() {
        assert_eq!(normalization_key("Mg"), "mg");
        assert_eq!(normalization_key("Exch Mg cmol/kg"), "exch mg");
        assert_eq!(normalization_key("Leaf Boron mg/kg"), "leaf boron");
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(normalization_key("CEC (meq/100g"), "cec");
        assert_eq!(normalization_key("CEC) x"), "cec x");
        assert_eq!(normalization_key("(mg/kg)"), "");
    }

    #[test]
    fn test_find_phrase_word_boundaries() {
        let text = normalize_text("Soil pH is low at 4.1 mg/kg");
        assert_eq!(text, "soil ph is low at 4 1 mg kg");
        assert!(contains_phrase(&text, "ph"));
        assert!(contains_phrase(&text, "soil ph"));
        assert!(!contains_phrase(&text, "p"));
        assert!(!contains_phrase(&text, "k"));
        assert!(find_phrase(&text, "soil").unwrap() < find_phrase(&text, "low").unwrap());
        assert!(!contains_phrase(&text, ""));
    }
}
