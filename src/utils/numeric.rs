//! Numeric Parsing Utilities
//!
//! Interprets raw sample values (numbers, sentinel strings, unit-suffixed
//! strings) and pulls numeric literals out of free text.

use crate::data::RawValue;
use regex::Regex;
use std::sync::OnceLock;

/// Outcome of interpreting one raw value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedValue {
    /// A finite numeric reading
    Value(f64),
    /// A "not determined" marker: "N.D.", "N/A", empty, detection-limit strings, null
    NotDetermined,
    /// Text that is neither a sentinel nor a number
    Unparseable,
}

impl ParsedValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            ParsedValue::Value(v) => Some(*v),
            _ => None,
        }
    }
}

const LEADING_NUMBER_PATTERN: &str = r"^([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)\s*(.*)$";
const LITERAL_PATTERN: &str = r"\d+(?:\.\d+)?";

/// Compiled once; `None` only if the pattern fails to compile
fn leading_number_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile(LEADING_NUMBER_PATTERN)).as_ref()
}

fn literal_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile(LITERAL_PATTERN)).as_ref()
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("Invalid numeric pattern {:?}: {}", pattern, e);
            None
        }
    }
}

/// Whether a string is a "not determined" sentinel
///
/// Case and punctuation insensitive: "N.D.", "nd", "N/A", "n.a.", "".
pub fn is_sentinel(text: &str) -> bool {
    let squeezed: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '/')
        .collect::<String>()
        .to_lowercase();

    matches!(squeezed.as_str(), "" | "nd" | "na")
}

/// Parse a measurement string, allowing a trailing unit ("12.3 mg/kg", "0.25%")
pub fn parse_measurement(text: &str) -> ParsedValue {
    let trimmed = text.trim();

    if is_sentinel(trimmed) {
        return ParsedValue::NotDetermined;
    }

    // Detection-limit readings ("<0.01", ">500") carry no usable value
    if trimmed.starts_with('<') || trimmed.starts_with('>') {
        return ParsedValue::NotDetermined;
    }

    let Some(caps) = leading_number_regex().and_then(|re| re.captures(trimmed)) else {
        return ParsedValue::Unparseable;
    };

    let rest = caps.get(2).map_or("", |m| m.as_str());
    let unit_like = rest
        .chars()
        .next()
        .map_or(true, |c| c.is_alphabetic() || c == '%' || c == '/');
    if !unit_like {
        return ParsedValue::Unparseable;
    }

    match caps[1].parse::<f64>() {
        Ok(v) if v.is_finite() => ParsedValue::Value(v),
        _ => ParsedValue::Unparseable,
    }
}

/// Interpret a raw sample value
pub fn parse_raw_value(raw: &RawValue) -> ParsedValue {
    match raw {
        RawValue::Number(v) if v.is_finite() => ParsedValue::Value(*v),
        RawValue::Number(_) => ParsedValue::NotDetermined,
        RawValue::Text(s) => parse_measurement(s),
        RawValue::Missing => ParsedValue::NotDetermined,
    }
}

/// Every positive numeric literal in `text`, in order of appearance
pub fn extract_numbers(text: &str) -> Vec<f64> {
    let Some(re) = literal_regex() else {
        return Vec::new();
    };
    re.find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect()
}

/// Canonical token for a number: "4.10" and "4.1" both become "4.1"
pub fn format_number(value: f64) -> String {
    value.to_string()
}
