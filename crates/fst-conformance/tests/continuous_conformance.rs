//! End-to-end conformance run for the continuous reference family.

use fst_conformance::scenario::Category;
use fst_conformance::{
    CheckOutcome, ContinuousFamily, HarnessConfig, emit_report_json, emit_report_markdown,
    run_continuous_conformance,
};
use fst_distribution::reference::Exponential;

const EXPONENTIAL: ContinuousFamily<Exponential> = ContinuousFamily {
    name: "exponential",
    parameter_names: &["mean"],
    make: |params| Exponential::new(params[0]),
    accessors: &[("mean", |d: &Exponential| d.mean_parameter())],
    invalid_parameters: &[&[0.0], &[-2.0], &[f64::NAN], &[f64::INFINITY]],
};

#[test]
fn exponential_family_conforms() {
    let report = run_continuous_conformance(&EXPONENTIAL, &HarnessConfig::default_paths())
        .expect("fixtures should load");
    assert!(report.all_passed(), "{}", emit_report_markdown(&report));
    assert_eq!(report.fixture_count, 1);

    let by = |category| report.category(category).expect("category present");
    assert_eq!(by(Category::Probability).outcome, CheckOutcome::Pass);
    assert_eq!(by(Category::Cumulative).outcome, CheckOutcome::Pass);
    assert_eq!(by(Category::Survival).outcome, CheckOutcome::Pass);
    assert_eq!(by(Category::InverseCumulative).outcome, CheckOutcome::Pass);
    assert_eq!(by(Category::Moments).outcome, CheckOutcome::Pass);
    assert_eq!(by(Category::Sampling).outcome, CheckOutcome::Pass);

    // both high-precision regions are populated for the exponential
    assert_eq!(by(Category::CumulativeHighPrecision).outcome, CheckOutcome::Pass);
    assert_eq!(by(Category::CumulativeHighPrecision).assertion_count, 1);
    assert_eq!(by(Category::SurvivalHighPrecision).outcome, CheckOutcome::Pass);
    assert_eq!(by(Category::SurvivalHighPrecision).assertion_count, 2);

    // there is no probability-sums reconstruction for continuous domains
    assert!(report.category(Category::ProbabilitySums).is_none());
}

#[test]
fn report_serializes_and_round_trips() {
    let report = run_continuous_conformance(&EXPONENTIAL, &HarnessConfig::default_paths())
        .expect("fixtures should load");
    let json = emit_report_json(&report).expect("report should serialize");
    let decoded: fst_conformance::FamilyReport =
        serde_json::from_str(&json).expect("report should parse");
    assert_eq!(decoded, report);
}
