//! Utility modules shared across the engine
//!
//! - Normalization: lookup keys for parameter names and finding text
//! - Numeric: raw value interpretation and numeric literal extraction

pub mod normalization;
pub mod numeric;

// Re-export commonly used helpers
pub use normalization::{contains_phrase, find_phrase, normalization_key, normalize_text};
pub use numeric::{extract_numbers, format_number, parse_measurement, parse_raw_value, ParsedValue};
