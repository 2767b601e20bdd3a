//! Ingestion Integration Tests
//!
//! CSV exports, JSON batch files and knowledge overrides read from disk.

use approx::assert_relative_eq;
use nutrient_gap_rust::metrics::GapStatus;
use nutrient_gap_rust::{
    aggregate_records, load_batch, load_csv_records, Category, KnowledgeBase, NutrientAnalyzer, RawValue,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn csv_export_keeps_sentinels() {
    let csv = "\
sample_id,pH (H2O),Exch. K (cmol/kg),Avail P (mg/kg),Moisture
S1,4.0,0.12,N.D.,21
S2,4.2,0,12.5,19
S3,,0.20,17.5,20
";
    let file = write_temp(csv, ".csv");
    let records = load_csv_records(file.path(), "sample_id").unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].sample_id, "S1");
    assert_eq!(records[0].values["Avail P (mg/kg)"], RawValue::Text("N.D.".to_string()));

    let kb = KnowledgeBase::builtin();
    let outcome = aggregate_records(&records, Category::Soil, &kb);

    let ph = &outcome.statistics[0];
    assert_eq!(ph.parameter_id, "pH");
    assert_eq!(ph.count, 2);
    assert_eq!(ph.missing_count, 1);
    assert_relative_eq!(ph.average.unwrap(), 4.1, epsilon = 1e-9);

    let k = outcome
        .statistics
        .iter()
        .find(|s| s.parameter_id == "Exch. K (cmol/kg)")
        .unwrap();
    assert_eq!(k.count, 2);
    assert_relative_eq!(k.average.unwrap(), 0.16, epsilon = 1e-9);

    assert_eq!(outcome.unmapped.len(), 1);
    assert_eq!(outcome.unmapped[0].raw_name, "Moisture");
}

#[test]
fn missing_csv_is_an_error() {
    let err = load_csv_records(std::path::Path::new("/nonexistent/results.csv"), "sample_id").unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/results.csv"));
}

#[test]
fn batch_file_round() {
    let batch = r#"{
        "leaf_samples": [
            {"Sample ID": "L1", "Leaf K": "0.70 %", "Leaf N": 2.5},
            {"Sample ID": "L2", "Leaf K": 0.74, "Leaf N": "N/A"}
        ],
        "findings": [
            {"text": "Leaf potassium is critically low", "source_label": "leaf"},
            {"text": "Potassium deficiency in fronds (0.72%)", "source_label": "summary"}
        ]
    }"#;
    let file = write_temp(batch, ".json");
    let input = load_batch(file.path()).unwrap();

    let kb = KnowledgeBase::builtin();
    let report = NutrientAnalyzer::new(&kb).analyze(&input);

    let k = report.gap_for("K (%)", Category::Leaf).unwrap();
    assert_eq!(k.status, GapStatus::CriticalLow);
    let n = report.gap_for("N (%)", Category::Leaf).unwrap();
    assert_eq!(n.status, GapStatus::Balanced);

    assert_eq!(report.findings.len(), 1);
    let merged = &report.findings[0];
    assert_eq!(merged.parameter_id.as_deref(), Some("K (%)"));
    assert!(merged.text.starts_with("Leaf potassium shows critical levels (values reported: 0.72)"));
    assert!(merged.text.ends_with("requires immediate corrective action."));
}

#[test]
fn overrides_change_evaluation() {
    let overrides = r#"{
        "version": "estate-b",
        "reference_standards": [
            {"parameter_id": "K (%)", "category": "leaf", "optimal_min": 0.7, "optimal_max": 1.0}
        ],
        "aliases": [
            {"category": "leaf", "alias": "Foliar Potash", "canonical_id": "K (%)"}
        ]
    }"#;
    let file = write_temp(overrides, ".json");
    let kb = KnowledgeBase::with_overrides(file.path()).unwrap();
    assert_eq!(kb.version(), "builtin-1+estate-b");

    let input = nutrient_gap_rust::parse_batch(
        r#"{"leaf_samples": [{"sample_id": "L1", "Foliar Potash": 0.72}]}"#,
    )
    .unwrap();
    let report = NutrientAnalyzer::new(&kb).analyze(&input);

    let k = report.gap_for("K (%)", Category::Leaf).unwrap();
    assert_eq!(k.status, GapStatus::Balanced);
    assert_eq!(report.knowledge_version, "builtin-1+estate-b");
}

#[test]
fn invalid_override_is_rejected() {
    let overrides = r#"{"reference_standards": [{"parameter_id": "pH", "category": "soil", "optimal_min": 6.0, "optimal_max": 4.0}]}"#;
    let file = write_temp(overrides, ".json");
    let err = KnowledgeBase::with_overrides(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("optimal_min"));
}
