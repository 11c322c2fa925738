//! End-to-end conformance runs for the discrete reference families against
//! the fixture files shipped with the crate.

use fst_conformance::scenario::Category;
use fst_conformance::{
    CheckOutcome, ConformanceError, DiscreteFamily, HarnessConfig, emit_report_markdown,
    load_discrete_data, run_discrete_conformance,
};
use fst_distribution::DiscreteDistribution;
use fst_distribution::reference::{Binomial, DiscreteUniform, Geometric};

const BINOMIAL: DiscreteFamily<Binomial> = DiscreteFamily {
    name: "binomial",
    parameter_names: &["number_of_trials", "probability_of_success"],
    make: |params| Binomial::new(params[0] as i64, params[1]),
    accessors: &[
        ("number_of_trials", |d: &Binomial| d.number_of_trials()),
        ("probability_of_success", |d: &Binomial| d.probability_of_success()),
    ],
    invalid_parameters: &[&[-1.0, 0.5], &[10.0, -0.1], &[10.0, 1.5], &[10.0, f64::NAN]],
};

const GEOMETRIC: DiscreteFamily<Geometric> = DiscreteFamily {
    name: "geometric",
    parameter_names: &["probability_of_success"],
    make: |params| Geometric::new(params[0]),
    accessors: &[("probability_of_success", |d: &Geometric| d.probability_of_success())],
    invalid_parameters: &[&[0.0], &[1.0], &[-0.5], &[f64::NAN]],
};

const DUNIFORM: DiscreteFamily<DiscreteUniform> = DiscreteFamily {
    name: "duniform",
    parameter_names: &["lower", "upper"],
    make: |params| DiscreteUniform::new(params[0] as i64, params[1] as i64),
    accessors: &[
        ("lower", |d: &DiscreteUniform| d.lower()),
        ("upper", |d: &DiscreteUniform| d.upper()),
    ],
    invalid_parameters: &[&[5.0, -3.0]],
};

fn outcome(report: &fst_conformance::FamilyReport, category: Category) -> CheckOutcome {
    report.category(category).expect("category present").outcome
}

#[test]
fn binomial_family_conforms() {
    let report = run_discrete_conformance(&BINOMIAL, &HarnessConfig::default_paths())
        .expect("fixtures should load");
    assert!(report.all_passed(), "{}", emit_report_markdown(&report));
    assert_eq!(report.fixture_count, 2);
    assert_eq!(report.fixture_ids.len(), 2);

    assert_eq!(outcome(&report, Category::Probability), CheckOutcome::Pass);
    assert_eq!(outcome(&report, Category::Cumulative), CheckOutcome::Pass);
    assert_eq!(outcome(&report, Category::InverseCumulative), CheckOutcome::Pass);
    assert_eq!(outcome(&report, Category::InverseMapping), CheckOutcome::Pass);
    assert_eq!(outcome(&report, Category::ProbabilitySums), CheckOutcome::Pass);
    assert_eq!(outcome(&report, Category::Parameters), CheckOutcome::Pass);
    assert_eq!(outcome(&report, Category::InvalidParameters), CheckOutcome::Pass);
    // the binomial fixtures carry no high-precision regions
    assert_eq!(outcome(&report, Category::CumulativeHighPrecision), CheckOutcome::Skip);
    assert_eq!(outcome(&report, Category::SurvivalHighPrecision), CheckOutcome::Skip);
    // fixture 1's tested points cover ~30% of the mass and are skipped;
    // fixture 2 still runs, so the category passes
    let sampling = report.category(Category::Sampling).unwrap();
    assert_eq!(sampling.outcome, CheckOutcome::Pass);
    assert_eq!(sampling.scenario_count, 1);
}

#[test]
fn geometric_family_conforms() {
    let report = run_discrete_conformance(&GEOMETRIC, &HarnessConfig::default_paths())
        .expect("fixtures should load");
    assert!(report.all_passed(), "{}", emit_report_markdown(&report));

    // the deep-tail survival region exercises the direct survival path
    let hp = report.category(Category::SurvivalHighPrecision).unwrap();
    assert_eq!(hp.outcome, CheckOutcome::Pass);
    assert_eq!(hp.assertion_count, 2);
    // unbounded support: the fixture's `upper = Infinity` must map onto the
    // sentinel bound
    assert_eq!(outcome(&report, Category::Support), CheckOutcome::Pass);
    assert_eq!(outcome(&report, Category::OutsideSupport), CheckOutcome::Pass);
}

#[test]
fn duniform_family_conforms() {
    let report = run_discrete_conformance(&DUNIFORM, &HarnessConfig::default_paths())
        .expect("fixtures should load");
    assert!(report.all_passed(), "{}", emit_report_markdown(&report));
    assert_eq!(report.fixture_count, 2);

    // fixture 1 is the degenerate single-point distribution: its sampling
    // run asserts twenty exact draws instead of the statistical test
    let sampling = report.category(Category::Sampling).unwrap();
    assert_eq!(sampling.outcome, CheckOutcome::Pass);
    assert_eq!(sampling.scenario_count, 2);
    assert!(sampling.assertion_count > 20);
}

#[test]
fn binomial_coefficient_scenario() {
    // C(10, 5) * 0.5^10 = 252 / 1024
    let dist = Binomial::new(10, 0.5).expect("valid parameters");
    assert!((dist.probability(5) - 0.24609375).abs() <= 1e-9);
    let data = load_discrete_data(
        &HarnessConfig::default_paths(),
        "binomial",
        BINOMIAL.parameter_names,
    )
    .expect("fixtures should load");
    assert_eq!(data[0].cdf_points, vec![0, 2, 5, 9, 10]);
    assert_eq!(data[0].cdf_values[2], 0.623046875);
}

#[test]
fn fixture_batches_are_memoized_per_family() {
    let config = HarnessConfig::default_paths();
    let first = load_discrete_data(&config, "geometric", GEOMETRIC.parameter_names)
        .expect("fixtures should load");
    let second = load_discrete_data(&config, "geometric", GEOMETRIC.parameter_names)
        .expect("fixtures should load");
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let other = load_discrete_data(&config, "duniform", DUNIFORM.parameter_names)
        .expect("fixtures should load");
    assert!(!std::sync::Arc::ptr_eq(&first, &other));
}

#[test]
fn malformed_fixture_fails_the_whole_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("test.broken.1.properties"),
        "parameters = 3 0.5\nmean = 1.5\nvariance = 0.75\n",
    )
    .expect("write fixture");
    std::fs::write(
        dir.path().join("test.broken.2.properties"),
        "parameters = 3 0.5\nmean = 1.5\nvariance = 0.75\n\
         cdf.points = 0, 1, 2\ncdf.values = 0.125, 0.5\n",
    )
    .expect("write fixture");

    const BROKEN: DiscreteFamily<Binomial> = DiscreteFamily {
        name: "broken",
        parameter_names: &["number_of_trials", "probability_of_success"],
        make: |params| Binomial::new(params[0] as i64, params[1]),
        accessors: &[],
        invalid_parameters: &[],
    };
    let config = HarnessConfig::with_fixture_root(dir.path());
    let err = run_discrete_conformance(&BROKEN, &config).unwrap_err();
    // the well-formed first fixture is discarded along with the batch
    assert!(matches!(err, ConformanceError::Fixture(_)), "unexpected error: {err}");
}

#[test]
fn reports_are_deterministic() {
    let config = HarnessConfig::default_paths();
    let first = run_discrete_conformance(&BINOMIAL, &config).expect("fixtures should load");
    let second = run_discrete_conformance(&BINOMIAL, &config).expect("fixtures should load");
    assert_eq!(first, second);
}
