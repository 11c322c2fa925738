//! Sampling goodness-of-fit validation.
//!
//! Discrete distributions are validated by drawing a fixed-size sample,
//! tallying draws that exactly match the fixture's mass points (anything
//! else is silently discarded), and running a chi-square acceptance
//! decision against the expected frequencies. Continuous distributions are
//! bucketed into quartiles obtained from the inverse CDF.

use crate::fixture::{ContinuousTestData, DiscreteTestData};
use crate::scenario::{self, Category};
use crate::{CategoryReport, CategoryRun, ContinuousFamily, DiscreteFamily};
use fst_distribution::{ContinuousDistribution, DiscreteDistribution};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Draws per statistical sampling run.
pub const SAMPLE_SIZE: usize = 1000;

/// Draws used by the degenerate single-point shortcut.
pub const DEGENERATE_SAMPLE_SIZE: usize = 20;

/// Significance level of the chi-square decision. This is also the
/// probability that a correct sampler fails the check by bad luck.
pub const SIGNIFICANCE_LEVEL: f64 = 0.001;

/// Fixed seed so every run draws the same sample.
pub const SAMPLER_SEED: u64 = 1234567890;

/// Minimum share of the total mass the tested points must carry for the
/// statistical test to be meaningful.
const MIN_MASS_COVERAGE: f64 = 0.5;

/// Outcome of the chi-square acceptance decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareDecision {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    pub reject: bool,
}

/// Goodness-of-fit decision comparing expected frequencies to observed
/// counts at significance level `alpha`.
///
/// Expected counts are rescaled to the observed total when the sums differ
/// (draws outside the tested points were discarded upstream). Returns
/// `None` when the test is not computable: fewer than two buckets,
/// mismatched lengths, or a non-positive expected count.
#[must_use]
pub fn chi_square_decision(
    expected: &[f64],
    observed: &[u64],
    alpha: f64,
) -> Option<ChiSquareDecision> {
    if expected.len() < 2 || expected.len() != observed.len() {
        return None;
    }
    if expected.iter().any(|&e| !(e > 0.0)) {
        return None;
    }
    let sum_expected: f64 = expected.iter().sum();
    let sum_observed: f64 = observed.iter().map(|&c| c as f64).sum();
    let ratio =
        if (sum_expected - sum_observed).abs() > 1e-6 { sum_observed / sum_expected } else { 1.0 };
    let statistic: f64 = expected
        .iter()
        .zip(observed)
        .map(|(&e, &o)| {
            let scaled = ratio * e;
            let diff = o as f64 - scaled;
            diff * diff / scaled
        })
        .sum();
    let degrees_of_freedom = (expected.len() - 1) as f64;
    let chi2 = ChiSquared::new(degrees_of_freedom).ok()?;
    let p_value = chi2.sf(statistic);
    Some(ChiSquareDecision { statistic, p_value, degrees_of_freedom, reject: p_value < alpha })
}

/// Drops zero-mass entries from parallel point/value arrays.
#[must_use]
pub fn eliminate_zero_mass_points<P: Copy>(points: &[P], values: &[f64]) -> (Vec<P>, Vec<f64>) {
    points
        .iter()
        .zip(values)
        .filter(|&(_, &v)| v > 0.0)
        .map(|(&p, &v)| (p, v))
        .unzip()
}

fn chi_square_detail<P: std::fmt::Display>(
    points: &[P],
    expected: &[f64],
    observed: &[u64],
    decision: &ChiSquareDecision,
) -> String {
    let mut out = format!(
        "chi-square statistic = {}, p-value = {}, df = {}\nvalue\texpected\tobserved\n",
        decision.statistic, decision.p_value, decision.degrees_of_freedom
    );
    for ((point, e), o) in points.iter().zip(expected).zip(observed) {
        out.push_str(&format!("{point}\t{e:.2}\t{o}\n"));
    }
    out.push_str(&format!(
        "this check fails randomly with probability {SIGNIFICANCE_LEVEL} (the significance level)"
    ));
    out
}

pub(crate) fn check_discrete_sampling<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Sampling);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some(s) = scenario::value_scenario(Category::Sampling, d) else { continue };
        let (points, mass) = eliminate_zero_mass_points(s.points, s.values);

        // The tally silently discards unknown draws, so the test is only
        // reliable when the tested points carry most of the mass.
        let coverage: f64 = mass.iter().sum();
        if coverage <= MIN_MASS_COVERAGE {
            continue;
        }
        run.scenario();

        let mut sampler = dist.create_sampler(SAMPLER_SEED);
        if points.len() == 1 {
            // All tested mass on a single point: assert the draws directly.
            let point = points[0];
            for _ in 0..DEGENERATE_SAMPLE_SIZE {
                let x = sampler.sample();
                run.check_true(
                    i,
                    x == point,
                    "degenerate draw".to_owned(),
                    point.to_string(),
                    x.to_string(),
                    "single-point distribution must always draw its point",
                );
            }
            continue;
        }

        let expected: Vec<f64> = mass.iter().map(|m| m * SAMPLE_SIZE as f64).collect();
        let mut observed = vec![0u64; points.len()];
        for _ in 0..SAMPLE_SIZE {
            let x = sampler.sample();
            if let Some(j) = points.iter().position(|&p| p == x) {
                observed[j] += 1;
            }
        }
        record_decision(&mut run, i, &points, &expected, &observed);
    }
    run.finish("no fixture supplies sampling data with enough mass coverage")
}

pub(crate) fn check_continuous_sampling<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Sampling);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        if d.disable_sample {
            continue;
        }
        run.scenario();

        let mut quartiles = [0.0; 3];
        let mut resolved = true;
        for (slot, p) in quartiles.iter_mut().zip([0.25, 0.5, 0.75]) {
            match dist.inverse_cumulative_probability(p) {
                Ok(x) => *slot = x,
                Err(err) => {
                    run.check_true(
                        i,
                        false,
                        format!("p = {p}"),
                        "a quartile".to_owned(),
                        format!("error: {err}"),
                        "quartile computation failed",
                    );
                    resolved = false;
                }
            }
        }
        if !resolved {
            continue;
        }

        let mut sampler = dist.create_sampler(SAMPLER_SEED);
        let mut observed = [0u64; 4];
        for _ in 0..SAMPLE_SIZE {
            let value = sampler.sample();
            let bucket = if value > quartiles[1] {
                if value <= quartiles[2] { 2 } else { 3 }
            } else if value <= quartiles[0] {
                0
            } else {
                1
            };
            observed[bucket] += 1;
        }
        let expected = [SAMPLE_SIZE as f64 / 4.0; 4];
        let labels = ["q1", "q2", "q3", "q4"];
        record_decision(&mut run, i, &labels, &expected, &observed);
    }
    run.finish("no fixture enables sampling")
}

fn record_decision<P: std::fmt::Display>(
    run: &mut CategoryRun,
    fixture: usize,
    points: &[P],
    expected: &[f64],
    observed: &[u64],
) {
    match chi_square_decision(expected, observed, SIGNIFICANCE_LEVEL) {
        Some(decision) => {
            let detail = if decision.reject {
                chi_square_detail(points, expected, observed, &decision)
            } else {
                String::new()
            };
            run.check_true(
                fixture,
                !decision.reject,
                "chi-square goodness of fit".to_owned(),
                format!("p-value >= {SIGNIFICANCE_LEVEL}"),
                format!("p-value = {}", decision.p_value),
                &detail,
            );
        }
        None => run.check_true(
            fixture,
            false,
            "chi-square goodness of fit".to_owned(),
            "a computable test".to_owned(),
            "degenerate inputs".to_owned(),
            "chi-square decision was not computable",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckOutcome;
    use crate::fixture::blank;
    use fst_distribution::reference::{Binomial, DiscreteUniform, Exponential};

    const UNIFORM: DiscreteFamily<DiscreteUniform> = DiscreteFamily {
        name: "duniform",
        parameter_names: &["lower", "upper"],
        make: |params| DiscreteUniform::new(params[0] as i64, params[1] as i64),
        accessors: &[],
        invalid_parameters: &[],
    };

    #[test]
    fn chi_square_accepts_matching_counts() {
        let decision = chi_square_decision(&[250.0, 250.0, 250.0, 250.0], &[260, 245, 251, 244], 0.001)
            .expect("computable");
        assert!(!decision.reject, "p-value {} should accept", decision.p_value);
        assert_eq!(decision.degrees_of_freedom, 3.0);
    }

    #[test]
    fn chi_square_rejects_gross_mismatch() {
        let decision =
            chi_square_decision(&[500.0, 500.0], &[900, 100], 0.001).expect("computable");
        assert!(decision.reject);
        assert!(decision.p_value < 1e-6);
    }

    #[test]
    fn chi_square_rescales_to_observed_total() {
        // half the draws were discarded; relative frequencies still match
        let decision =
            chi_square_decision(&[500.0, 500.0], &[251, 249], 0.001).expect("computable");
        assert!(!decision.reject, "p-value {} should accept", decision.p_value);
    }

    #[test]
    fn chi_square_refuses_degenerate_inputs() {
        assert!(chi_square_decision(&[1000.0], &[1000], 0.001).is_none());
        assert!(chi_square_decision(&[500.0, 0.0], &[500, 0], 0.001).is_none());
        assert!(chi_square_decision(&[500.0, 500.0], &[500], 0.001).is_none());
    }

    #[test]
    fn zero_mass_points_are_eliminated() {
        let (points, values) = eliminate_zero_mass_points(&[1, 2, 3, 4], &[0.5, 0.0, 0.25, 0.0]);
        assert_eq!(points, vec![1, 3]);
        assert_eq!(values, vec![0.5, 0.25]);
    }

    fn uniform_data(a: i64, b: i64) -> DiscreteTestData {
        let mut d = blank::<i64>();
        d.parameters = smallvec::smallvec![a as f64, b as f64];
        let n = (b - a + 1) as f64;
        d.density_points = (a..=b).collect();
        d.density_values = vec![1.0 / n; (b - a + 1) as usize];
        d
    }

    #[test]
    fn sampling_accepts_the_reference_uniform() {
        let data = vec![uniform_data(-3, 5)];
        let dists = vec![DiscreteUniform::new(-3, 5).unwrap()];
        let report = check_discrete_sampling(&UNIFORM, &dists, &data);
        assert_eq!(report.outcome, CheckOutcome::Pass, "{:?}", report.failures);
    }

    #[test]
    fn sampling_flags_a_mismatched_sampler() {
        // fixture claims uniform over 0..=3 but the sampler draws 0..=1
        let mut d = uniform_data(0, 3);
        d.parameters = smallvec::smallvec![0.0, 1.0];
        let dists = vec![DiscreteUniform::new(0, 1).unwrap()];
        let report = check_discrete_sampling(&UNIFORM, &dists, &[d]);
        assert_eq!(report.outcome, CheckOutcome::Fail);
        let failure = &report.failures[0];
        assert!(failure.detail.contains("chi-square statistic"));
        assert!(failure.detail.contains("fails randomly with probability"));
    }

    #[test]
    fn degenerate_single_point_uses_exact_draws() {
        let data = vec![uniform_data(7, 7)];
        let dists = vec![DiscreteUniform::new(7, 7).unwrap()];
        let report = check_discrete_sampling(&UNIFORM, &dists, &data);
        assert_eq!(report.outcome, CheckOutcome::Pass, "{:?}", report.failures);
        assert_eq!(report.assertion_count, DEGENERATE_SAMPLE_SIZE);
    }

    #[test]
    fn low_coverage_skips_the_statistical_test() {
        let mut d = uniform_data(0, 9);
        // only two of ten equally likely points are tested: 20% coverage
        d.density_points.truncate(2);
        d.density_values.truncate(2);
        let dists = vec![DiscreteUniform::new(0, 9).unwrap()];
        let report = check_discrete_sampling(&UNIFORM, &dists, &[d]);
        assert_eq!(report.outcome, CheckOutcome::Skip);
    }

    #[test]
    fn disable_flag_skips_sampling() {
        let mut d = uniform_data(-3, 5);
        d.disable_sample = true;
        let dists = vec![DiscreteUniform::new(-3, 5).unwrap()];
        let report = check_discrete_sampling(&UNIFORM, &dists, &[d]);
        assert_eq!(report.outcome, CheckOutcome::Skip);
    }

    #[test]
    fn continuous_sampling_buckets_quartiles() {
        const EXPONENTIAL: ContinuousFamily<Exponential> = ContinuousFamily {
            name: "exponential",
            parameter_names: &["mean"],
            make: |params| Exponential::new(params[0]),
            accessors: &[],
            invalid_parameters: &[],
        };
        let mut d = blank::<f64>();
        d.parameters = smallvec::smallvec![2.0];
        let dists = vec![Exponential::new(2.0).unwrap()];
        let report = check_continuous_sampling(&EXPONENTIAL, &dists, &[d]);
        assert_eq!(report.outcome, CheckOutcome::Pass, "{:?}", report.failures);
    }
}
