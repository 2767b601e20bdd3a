//! Pipeline Integration Tests
//!
//! Exercises the public API end to end: canonicalization, aggregation,
//! gap evaluation, finding consolidation and the analyzer.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nutrient_gap_rust::knowledge::{AliasTable, ReferenceStandard};
use nutrient_gap_rust::metrics::{evaluate_statistics, GapStatus, Severity};
use nutrient_gap_rust::{
    aggregate_records, aggregate_values, canonicalize, deduplicate_findings, evaluate_gap, sort_by_priority,
    AnalysisInput, Category, Finding, KnowledgeBase, NutrientAnalyzer, RawValue, SampleRecord,
};

fn numbers(values: &[f64]) -> Vec<RawValue> {
    values.iter().copied().map(RawValue::Number).collect()
}

// ============================================================================
// Canonicalization
// ============================================================================

#[test]
fn canonicalization_is_deterministic() {
    let kb = KnowledgeBase::builtin();
    for raw in ["pH", "Exch. K", "avail p (mg/kg)", "Leaf Boron content", "Sand %", "Exch", ""] {
        for hint in [None, Some(Category::Soil), Some(Category::Leaf)] {
            let first = canonicalize(raw, hint, &kb.aliases);
            let second = canonicalize(raw, hint, &kb.aliases);
            assert_eq!(first, second, "{:?} / {:?}", raw, hint);
        }
    }
}

#[test]
fn every_builtin_alias_canonicalizes_to_its_parameter() {
    let kb = KnowledgeBase::builtin();
    for category in Category::ALL {
        for (raw, id) in AliasTable::builtin_spellings(category) {
            assert_eq!(
                canonicalize(raw, Some(category), &kb.aliases).id,
                id,
                "alias {:?} ({})",
                raw,
                category
            );
        }
    }
}

#[test]
fn unmapped_name_is_returned_unchanged() {
    let kb = KnowledgeBase::builtin();
    let c = canonicalize("Electrical Conductivity", Some(Category::Soil), &kb.aliases);
    assert_eq!(c.id, "Electrical Conductivity");
    assert!(!c.is_mapped());
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn ambiguous_zero_is_missing_for_ph() {
    let kb = KnowledgeBase::builtin();
    let stats = aggregate_values("pH", Category::Soil, &numbers(&[0.0, 0.0, 5.2]), &kb.missing_policy);
    assert_eq!(stats.count, 1);
    assert_eq!(stats.missing_count, 2);
    assert_relative_eq!(stats.average.unwrap(), 5.2);
}

#[test]
fn zero_is_a_reading_outside_the_ambiguous_set() {
    let kb = KnowledgeBase::builtin();
    let stats = aggregate_values("Cu (mg/kg)", Category::Leaf, &numbers(&[0.0, 3.0]), &kb.missing_policy);
    assert_eq!(stats.count, 2);
    assert_relative_eq!(stats.average.unwrap(), 1.5);
}

#[test]
fn count_plus_missing_equals_records() {
    let kb = KnowledgeBase::builtin();
    let records = vec![
        SampleRecord::new("S1").with_value("pH", 4.4).with_value("CEC", "N.D."),
        SampleRecord::new("S2").with_value("Avail P", "<5"),
        SampleRecord::new("S3").with_value("pH", "").with_value("CEC", 9.5).with_value("Avail P", "18 mg/kg"),
        SampleRecord::new("S4").with_value("Exch Mg", 0.0),
    ];
    let outcome = aggregate_records(&records, Category::Soil, &kb);
    assert!(!outcome.statistics.is_empty());
    for s in &outcome.statistics {
        assert_eq!(s.count + s.missing_count, records.len(), "{}", s.parameter_id);
    }
    let mg = outcome
        .statistics
        .iter()
        .find(|s| s.parameter_id == "Exch. Mg (cmol/kg)")
        .unwrap();
    assert_eq!(mg.count, 0);
    assert_eq!(mg.average, None);
}

// ============================================================================
// Gap evaluation
// ============================================================================

#[test]
fn gap_boundaries() {
    let standard = ReferenceStandard::new("pH", Category::Soil, 4.5, 6.0).unwrap();

    let at_min = evaluate_gap("pH", Category::Soil, Some(4.5), Some(&standard));
    assert_eq!(at_min.percent_gap, Some(0.0));
    assert_eq!(at_min.severity, Some(Severity::Balanced));

    let low = evaluate_gap("pH", Category::Soil, Some(4.0), Some(&standard));
    assert_abs_diff_eq!(low.percent_gap.unwrap(), -11.1, epsilon = 0.05);
    assert_eq!(low.severity, Some(Severity::Low));

    let critical = evaluate_gap("pH", Category::Soil, Some(3.0), Some(&standard));
    assert_abs_diff_eq!(critical.percent_gap.unwrap(), -33.3, epsilon = 0.05);
    assert_eq!(critical.severity, Some(Severity::Critical));
}

#[test]
fn severity_breakpoints() {
    assert_eq!(Severity::from_gap_magnitude(5.0), Severity::Balanced);
    assert_eq!(Severity::from_gap_magnitude(5.01), Severity::Low);
    assert_eq!(Severity::from_gap_magnitude(15.0), Severity::Low);
    assert_eq!(Severity::from_gap_magnitude(15.01), Severity::Critical);
}

#[test]
fn missing_standard_is_not_determined_and_sorts_last() {
    let kb = KnowledgeBase::builtin();
    let records = vec![
        SampleRecord::new("L1")
            .with_value("Leaf K", 1.1)
            .with_value("Mo (ppm)", 0.4)
            .with_value("Zinc", 8.0),
    ];
    let outcome = aggregate_records(&records, Category::Leaf, &kb);
    let mut gaps = evaluate_statistics(&outcome.statistics, &kb.standards);
    sort_by_priority(&mut gaps);

    let last = gaps.last().unwrap();
    assert_eq!(last.parameter_id, "Mo (ppm)");
    assert_eq!(last.status, GapStatus::NotDetermined);
    assert_eq!(gaps[0].parameter_id, "Zn (mg/kg)");
    assert_eq!(gaps[0].severity, Some(Severity::Critical));
}

// ============================================================================
// Findings
// ============================================================================

#[test]
fn identical_findings_merge_with_both_sources() {
    let kb = KnowledgeBase::builtin();
    let findings = vec![
        Finding::new("Leaf magnesium is deficient", "leaf_analysis"),
        Finding::new("Leaf magnesium is deficient", "recommendations"),
    ];
    let out = deduplicate_findings(&findings, &kb.aliases);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].sources.len(), 2);
    assert_eq!(out[0].text, "Leaf magnesium is deficient");
}

#[test]
fn empty_findings_are_dropped() {
    let kb = KnowledgeBase::builtin();
    let findings = vec![Finding::new("   ", "a"), Finding::new("...", "b")];
    assert!(deduplicate_findings(&findings, &kb.aliases).is_empty());
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn end_to_end_ph_scenario() {
    let kb = KnowledgeBase::builtin();
    let input = AnalysisInput {
        soil_samples: vec![
            SampleRecord::new("S1").with_value("pH", 4.0),
            SampleRecord::new("S2").with_value("pH", 4.2),
            SampleRecord::new("S3").with_value("pH", 4.1),
        ],
        leaf_samples: Vec::new(),
        findings: vec![
            Finding::new("Soil pH is low at 4.1", "step2"),
            Finding::new("pH deficiency observed, value 4.1", "step3"),
        ],
    };

    let report = NutrientAnalyzer::new(&kb).analyze(&input);

    let stats = &report.statistics[0];
    assert_eq!(stats.parameter_id, "pH");
    assert_relative_eq!(stats.average.unwrap(), 4.1, epsilon = 1e-9);

    let gap = report.gap_for("pH", Category::Soil).unwrap();
    assert_eq!(gap.status, GapStatus::Low);
    assert_eq!(gap.severity, Some(Severity::Low));
    assert_abs_diff_eq!(gap.gap_magnitude.unwrap(), 8.9, epsilon = 0.05);

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert!(finding.text.contains("pH"));
    assert!(finding.text.contains("4.1"));
    assert_eq!(finding.sources.len(), 2);

    let json = report.to_json_pretty().unwrap();
    assert!(json.contains("\"status\": \"Low\""));
}

#[test]
fn parallel_batches_match_sequential() {
    let kb = KnowledgeBase::builtin();
    let analyzer = NutrientAnalyzer::new(&kb);
    let inputs: Vec<AnalysisInput> = (0..8)
        .map(|i| AnalysisInput {
            soil_samples: vec![SampleRecord::new(format!("S{}", i)).with_value("CEC", 4.0 + i as f64 * 3.0)],
            leaf_samples: vec![SampleRecord::new(format!("L{}", i)).with_value("Leaf N", 2.0 + i as f64 * 0.1)],
            findings: vec![Finding::new(format!("CEC is low at {}", 4 + i * 3), "step")],
        })
        .collect();

    let parallel = analyzer.analyze_batches(&inputs);
    let sequential: Vec<_> = inputs.iter().map(|i| analyzer.analyze(i)).collect();
    assert_eq!(parallel, sequential);
}
