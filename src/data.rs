//! Sample Data Model and Ingestion
//!
//! Holds the per-sample records produced by the extraction step and converts
//! the shapes it hands over (JSON objects, spreadsheet exports) into
//! `SampleRecord`s.
//!
//! Malformed records are skipped with a warning; a single bad record never
//! aborts a batch.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Sample category (which laboratory panel the values come from)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Soil,
    Leaf,
}

impl Category {
    /// Fixed iteration order used whenever no category hint is given
    pub const ALL: [Category; 2] = [Category::Soil, Category::Leaf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Soil => "soil",
            Category::Leaf => "leaf",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "soil" => Ok(Category::Soil),
            "leaf" | "foliar" => Ok(Category::Leaf),
            other => anyhow::bail!("Unknown sample category: '{}'", other),
        }
    }
}

/// Raw value as delivered by the extraction step
///
/// Numbers, strings ("N.D.", "12.3 mg/kg", "") and nulls all occur in
/// practice. Interpretation happens in `utils::numeric`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Convert one JSON cell into a raw value
    pub fn from_json(key: &str, value: &Value) -> Result<Self, IngestError> {
        match value {
            Value::Null => Ok(RawValue::Missing),
            Value::Number(n) => n
                .as_f64()
                .map(RawValue::Number)
                .ok_or_else(|| IngestError::UnsupportedValue {
                    key: key.to_string(),
                    found: "number",
                }),
            Value::String(s) => Ok(RawValue::Text(s.clone())),
            Value::Bool(_) => Err(IngestError::UnsupportedValue {
                key: key.to_string(),
                found: "bool",
            }),
            Value::Array(_) => Err(IngestError::UnsupportedValue {
                key: key.to_string(),
                found: "array",
            }),
            Value::Object(_) => Err(IngestError::UnsupportedValue {
                key: key.to_string(),
                found: "object",
            }),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// Per-record ingestion problems
#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("sample record is not an object (found {found})")]
    NotAnObject { found: &'static str },

    #[error("sample record '{sample_id}' has no measurements")]
    NoMeasurements { sample_id: String },

    #[error("value for '{key}' has unsupported type {found}")]
    UnsupportedValue { key: String, found: &'static str },
}

/// Keys that identify the sample rather than carry a measurement
const ID_KEYS: [&str; 5] = ["sample_id", "Sample ID", "sample", "Sample No", "id"];

/// One sample: identifier plus raw parameter name → raw value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub sample_id: String,
    pub values: BTreeMap<String, RawValue>,
}

impl SampleRecord {
    pub fn new(sample_id: impl Into<String>) -> Self {
        Self {
            sample_id: sample_id.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly for tests and fixtures
    pub fn with_value(mut self, raw_name: &str, value: impl Into<RawValue>) -> Self {
        self.values.insert(raw_name.to_string(), value.into());
        self
    }

    /// Parse one JSON object into a record
    ///
    /// Unsupported cell types are logged and kept as `Missing` so the sample
    /// still counts toward `missing_count` for that parameter.
    pub fn from_json(value: &Value, fallback_id: &str) -> Result<Self, IngestError> {
        let object = match value {
            Value::Object(map) => map,
            Value::Null => return Err(IngestError::NotAnObject { found: "null" }),
            Value::Bool(_) => return Err(IngestError::NotAnObject { found: "bool" }),
            Value::Number(_) => return Err(IngestError::NotAnObject { found: "number" }),
            Value::String(_) => return Err(IngestError::NotAnObject { found: "string" }),
            Value::Array(_) => return Err(IngestError::NotAnObject { found: "array" }),
        };

        let sample_id = ID_KEYS
            .iter()
            .find_map(|k| object.get(*k))
            .and_then(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| fallback_id.to_string());

        let mut record = SampleRecord::new(sample_id);
        for (key, cell) in object {
            if ID_KEYS.contains(&key.as_str()) {
                continue;
            }
            let raw = match RawValue::from_json(key, cell) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Sample '{}': {}; treating as missing", record.sample_id, e);
                    RawValue::Missing
                }
            };
            record.values.insert(key.clone(), raw);
        }

        if record.values.is_empty() {
            return Err(IngestError::NoMeasurements {
                sample_id: record.sample_id,
            });
        }

        Ok(record)
    }
}

/// Convert a JSON array of sample objects, skipping malformed entries
pub fn records_from_json(values: &[Value]) -> Vec<SampleRecord> {
    values
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| {
            let fallback = format!("sample-{}", idx + 1);
            match SampleRecord::from_json(v, &fallback) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping sample #{}: {}", idx + 1, e);
                    None
                }
            }
        })
        .collect()
}

/// Convert a spreadsheet-style DataFrame (one row per sample) into records
///
/// Every column other than `id_column` is treated as a raw parameter name.
/// String columns keep their text so sentinels like "N.D." survive; numeric
/// columns are cast to f64.
pub fn records_from_dataframe(df: &DataFrame, id_column: &str) -> Result<Vec<SampleRecord>> {
    let n = df.height();

    let ids: Vec<String> = match df.column(id_column) {
        Ok(col) => {
            let as_text = col
                .cast(&DataType::String)
                .with_context(|| format!("Column '{}' cannot be read as text", id_column))?;
            let ca = as_text.str()?;
            (0..n)
                .map(|i| {
                    ca.get(i)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| format!("sample-{}", i + 1))
                })
                .collect()
        }
        Err(_) => {
            tracing::warn!("Id column '{}' not found; numbering samples by row", id_column);
            (0..n).map(|i| format!("sample-{}", i + 1)).collect()
        }
    };

    let mut records: Vec<SampleRecord> = ids.into_iter().map(SampleRecord::new).collect();

    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == id_column {
            continue;
        }

        let cells = column_raw_values(column)
            .with_context(|| format!("Failed to read column '{}'", name))?;

        for (record, cell) in records.iter_mut().zip(cells) {
            record.values.insert(name.to_string(), cell);
        }
    }

    Ok(records)
}

/// Read one column as raw values
fn column_raw_values(column: &Column) -> Result<Vec<RawValue>> {
    if matches!(column.dtype(), DataType::String) {
        let ca = column.str()?;
        return Ok(ca
            .into_iter()
            .map(|opt| opt.map_or(RawValue::Missing, |s| RawValue::Text(s.to_string())))
            .collect());
    }

    match column.cast(&DataType::Float64) {
        Ok(cast) => {
            let ca = cast.f64()?;
            Ok(ca
                .into_iter()
                .map(|opt| opt.map_or(RawValue::Missing, RawValue::Number))
                .collect())
        }
        Err(_) => {
            let cast = column.cast(&DataType::String)?;
            let ca = cast.str()?;
            Ok(ca
                .into_iter()
                .map(|opt| opt.map_or(RawValue::Missing, |s| RawValue::Text(s.to_string())))
                .collect())
        }
    }
}

/// Load a CSV export of lab results
///
/// Schema inference is disabled so every cell arrives as text and
/// sentinel strings are not coerced to null.
pub fn load_csv_records(path: &Path, id_column: &str) -> Result<Vec<SampleRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {:?}", path))?;

    tracing::info!("Loaded {} rows × {} columns from {:?}", df.height(), df.width(), path);

    records_from_dataframe(&df, id_column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_parse() {
        assert_eq!("Soil".parse::<Category>().unwrap(), Category::Soil);
        assert_eq!(" leaf ".parse::<Category>().unwrap(), Category::Leaf);
        assert!("water".parse::<Category>().is_err());
    }

    #[test]
    fn test_raw_value_deserialize() {
        let values: Vec<RawValue> = serde_json::from_value(json!([4.2, "N.D.", null, 3])).unwrap();
        assert_eq!(values[0], RawValue::Number(4.2));
        assert_eq!(values[1], RawValue::Text("N.D.".to_string()));
        assert_eq!(values[2], RawValue::Missing);
        assert_eq!(values[3], RawValue::Number(3.0));
    }

    #[test]
    fn test_record_from_json() {
        let v = json!({"sample_id": "S1", "pH": 4.2, "Avail P": "12.3 mg/kg", "CEC": null});
        let record = SampleRecord::from_json(&v, "fallback").unwrap();
        assert_eq!(record.sample_id, "S1");
        assert_eq!(record.values.len(), 3);
        assert_eq!(record.values["pH"], RawValue::Number(4.2));
    }

    #[test]
    fn test_record_fallback_id_and_bad_cell() {
        let v = json!({"pH": [1, 2], "K": 0.2});
        let record = SampleRecord::from_json(&v, "sample-7").unwrap();
        assert_eq!(record.sample_id, "sample-7");
        assert_eq!(record.values["pH"], RawValue::Missing);
    }

    #[test]
    fn test_malformed_records_skipped() {
        let values = vec![
            json!({"sample_id": "S1", "pH": 4.0}),
            json!("not a record"),
            json!({"sample_id": "S3"}),
            json!({"pH": 4.4}),
        ];
        let records = records_from_json(&values);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sample_id, "S1");
        assert_eq!(records[1].sample_id, "sample-4");
    }

    #[test]
    fn test_not_an_object_error() {
        let err = SampleRecord::from_json(&json!(42), "x").unwrap_err();
        assert_eq!(err, IngestError::NotAnObject { found: "number" });
    }

    #[test]
    fn test_records_from_dataframe() {
        let df = df! {
            "sample_id" => &["S1", "S2"],
            "pH" => &["4.0", "N.D."],
            "CEC" => &[Some(12.5), None::<f64>]
        }
        .unwrap();

        let records = records_from_dataframe(&df, "sample_id").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].values["pH"], RawValue::Text("4.0".to_string()));
        assert_eq!(records[1].values["pH"], RawValue::Text("N.D.".to_string()));
        assert_eq!(records[0].values["CEC"], RawValue::Number(12.5));
        assert_eq!(records[1].values["CEC"], RawValue::Missing);
    }
}
