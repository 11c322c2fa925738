//! The fixed battery of mathematical-consistency checks for discrete
//! distributions.
//!
//! Every check consumes the scenarios one category yields across the
//! fixture batch and reports failures with the offending input; a failing
//! assertion never stops the remaining assertions or sibling checks.

use crate::scenario::{self, Category};
use crate::tolerance::DoubleTolerance;
use crate::{CategoryReport, CategoryRun, DiscreteFamily};
use fst_distribution::DiscreteDistribution;

use crate::fixture::DiscreteTestData;

type Check<D> = fn(&DiscreteFamily<D>, &[D], &[DiscreteTestData]) -> CategoryReport;

/// Runs every category in [`Category::DISCRETE`] order. The registration
/// table below is the single binding between categories and check code.
pub fn run_discrete_battery<D: DiscreteDistribution>(
    family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> Vec<CategoryReport> {
    let table: [(Category, Check<D>); 18] = [
        (Category::Probability, check_probability),
        (Category::LogProbability, check_log_probability),
        (Category::Cumulative, check_cumulative),
        (Category::Survival, check_survival),
        (Category::CumulativeHighPrecision, check_cumulative_high_precision),
        (Category::SurvivalHighPrecision, check_survival_high_precision),
        (Category::InverseCumulative, check_inverse_cumulative),
        (Category::InverseMapping, check_inverse_mapping),
        (Category::Complement, check_complement),
        (Category::Consistency, check_consistency),
        (Category::OutsideSupport, check_outside_support),
        (Category::InvalidProbability, check_invalid_probability),
        (Category::ProbabilitySums, check_probability_sums),
        (Category::Support, check_support),
        (Category::Moments, check_moments),
        (Category::Parameters, check_parameters),
        (Category::InvalidParameters, check_invalid_parameters),
        (Category::Sampling, crate::sampling::check_discrete_sampling),
    ];
    debug_assert_eq!(table.len(), Category::DISCRETE.len());
    table
        .into_iter()
        .map(|(category, check)| {
            let report = check(family, dists, data);
            debug_assert_eq!(report.category, category);
            report
        })
        .collect()
}

fn check_probability<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Probability);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some(s) = scenario::value_scenario(Category::Probability, d) else { continue };
        run.scenario();
        for (&x, &expected) in s.points.iter().zip(s.values) {
            run.check_value(
                i,
                s.tolerance,
                expected,
                dist.probability(x),
                format!("x = {x}"),
                "incorrect probability mass",
            );
        }
    }
    run.finish("no fixture supplies probability mass data")
}

fn check_log_probability<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::LogProbability);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some(s) = scenario::value_scenario(Category::LogProbability, d) else { continue };
        run.scenario();
        for (&x, &expected) in s.points.iter().zip(s.values) {
            run.check_value(
                i,
                s.tolerance,
                expected,
                dist.log_probability(x),
                format!("x = {x}"),
                "incorrect log probability mass",
            );
        }
    }
    run.finish("no fixture supplies log probability mass data")
}

fn check_cumulative<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Cumulative);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some(s) = scenario::value_scenario(Category::Cumulative, d) else { continue };
        run.scenario();
        for (&x, &expected) in s.points.iter().zip(s.values) {
            run.check_value(
                i,
                s.tolerance,
                expected,
                dist.cumulative_probability(x),
                format!("x = {x}"),
                "incorrect cumulative probability",
            );
        }
        // Every ordered pair must agree with the CDF difference; every
        // reversed pair must be rejected.
        for (j, &x0) in s.points.iter().enumerate() {
            for (k, &x1) in s.points.iter().enumerate() {
                let input = format!("range ({x0}, {x1})");
                if x0 <= x1 {
                    match dist.range_probability(x0, x1) {
                        Ok(actual) => run.check_value(
                            i,
                            s.tolerance,
                            s.values[k] - s.values[j],
                            actual,
                            input,
                            "range probability must match the cdf difference",
                        ),
                        Err(err) => run.check_true(
                            i,
                            false,
                            input,
                            (s.values[k] - s.values[j]).to_string(),
                            format!("error: {err}"),
                            "range probability failed for ordered bounds",
                        ),
                    }
                } else {
                    let result = dist.range_probability(x0, x1);
                    run.check_true(
                        i,
                        result.is_err(),
                        input,
                        "invalid-argument error".to_owned(),
                        render_range_result(&result),
                        "reversed bounds must be rejected",
                    );
                }
            }
        }
    }
    run.finish("no fixture supplies cumulative data")
}

fn render_range_result(result: &Result<f64, fst_distribution::DistributionError>) -> String {
    match result {
        Ok(v) => v.to_string(),
        Err(err) => format!("error: {err}"),
    }
}

fn check_survival<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Survival);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some(s) = scenario::value_scenario(Category::Survival, d) else { continue };
        run.scenario();
        for (&x, &expected) in s.points.iter().zip(s.values) {
            run.check_value(
                i,
                s.tolerance,
                expected,
                dist.survival_probability(x),
                format!("x = {x}"),
                "incorrect survival probability",
            );
        }
    }
    run.finish("no fixture supplies survival data")
}

fn check_cumulative_high_precision<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::CumulativeHighPrecision);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some(s) = scenario::value_scenario(Category::CumulativeHighPrecision, d) else {
            continue;
        };
        run.scenario();
        for (&x, &expected) in s.points.iter().zip(s.values) {
            run.check_value(
                i,
                s.tolerance,
                expected,
                dist.cumulative_probability(x),
                format!("x = {x}"),
                "cumulative probability is not precise near zero",
            );
        }
    }
    run.finish("no fixture supplies high-precision cumulative data")
}

fn check_survival_high_precision<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::SurvivalHighPrecision);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some(s) = scenario::value_scenario(Category::SurvivalHighPrecision, d) else {
            continue;
        };
        run.scenario();
        for (&x, &expected) in s.points.iter().zip(s.values) {
            run.check_value(
                i,
                s.tolerance,
                expected,
                dist.survival_probability(x),
                format!("x = {x}"),
                "survival probability is not precise near zero",
            );
        }
    }
    run.finish("no fixture supplies high-precision survival data")
}

fn check_inverse_cumulative<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::InverseCumulative);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some((probabilities, expected_points)) = scenario::inverse_scenario(d) else {
            continue;
        };
        run.scenario();
        let lower = dist.support_lower_bound();
        let upper = dist.support_upper_bound();
        for (&p, &expected) in probabilities.iter().zip(expected_points) {
            // Expected values outside the support are ignored.
            if expected < lower || expected > upper {
                continue;
            }
            match dist.inverse_cumulative_probability(p) {
                Ok(actual) => run.check_true(
                    i,
                    actual == expected,
                    format!("p = {p}"),
                    expected.to_string(),
                    actual.to_string(),
                    "incorrect inverse cumulative probability",
                ),
                Err(err) => run.check_true(
                    i,
                    false,
                    format!("p = {p}"),
                    expected.to_string(),
                    format!("error: {err}"),
                    "inverse cumulative probability failed for a valid probability",
                ),
            }
        }
    }
    run.finish("no fixture supplies inverse cumulative data")
}

fn check_inverse_mapping<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::InverseMapping);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some((points, _)) = scenario::point_scenario(Category::InverseMapping, d) else {
            continue;
        };
        run.scenario();
        let lower = dist.support_lower_bound();
        let upper = dist.support_upper_bound();
        for &x in points {
            if x < lower || x > upper {
                continue;
            }
            let p = dist.cumulative_probability(x);
            if p == 1.0 {
                // At saturation several points share cdf = 1, so the
                // mapping need not be a bijection.
                continue;
            }
            match dist.inverse_cumulative_probability(p) {
                Ok(actual) => run.check_true(
                    i,
                    actual == x,
                    format!("x = {x}, cdf(x) = {p}"),
                    x.to_string(),
                    actual.to_string(),
                    "inverse mapping must return the original point",
                ),
                Err(err) => run.check_true(
                    i,
                    false,
                    format!("x = {x}, cdf(x) = {p}"),
                    x.to_string(),
                    format!("error: {err}"),
                    "inverse mapping failed for an in-range probability",
                ),
            }
        }
    }
    run.finish("no fixture supplies cdf points for the inverse mapping")
}

fn check_complement<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Complement);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some((points, tolerance)) = scenario::point_scenario(Category::Complement, d) else {
            continue;
        };
        run.scenario();
        for &x in points {
            run.check_value(
                i,
                tolerance,
                1.0,
                dist.survival_probability(x) + dist.cumulative_probability(x),
                format!("x = {x}"),
                "survival plus cumulative probability must equal one",
            );
        }
    }
    run.finish("no fixture supplies cdf points for the complement identity")
}

fn check_consistency<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Consistency);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some((points, tolerance)) = scenario::point_scenario(Category::Consistency, d) else {
            continue;
        };
        run.scenario();
        for w in points.windows(2) {
            let x = w[1];
            match dist.range_probability(x, x) {
                Ok(actual) => run.check_exact(
                    i,
                    0.0,
                    actual,
                    format!("range ({x}, {x})"),
                    "probability over an empty range must be zero",
                ),
                Err(err) => run.check_true(
                    i,
                    false,
                    format!("range ({x}, {x})"),
                    "0".to_owned(),
                    format!("error: {err}"),
                    "probability over an empty range failed",
                ),
            }
            let lower = w[0].min(w[1]);
            let upper = w[0].max(w[1]);
            let diff = dist.cumulative_probability(upper) - dist.cumulative_probability(lower);
            match dist.range_probability(lower, upper) {
                Ok(direct) => run.check_value(
                    i,
                    tolerance,
                    diff,
                    direct,
                    format!("range ({lower}, {upper})"),
                    "range probability inconsistent with the cdf difference",
                ),
                Err(err) => run.check_true(
                    i,
                    false,
                    format!("range ({lower}, {upper})"),
                    diff.to_string(),
                    format!("error: {err}"),
                    "range probability failed for ordered bounds",
                ),
            }
        }
    }
    run.finish("no fixture supplies cdf points for the consistency identity")
}

fn check_outside_support<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::OutsideSupport);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        run.scenario();
        let tolerance = DoubleTolerance::Absolute(d.tolerance);
        let lo = dist.support_lower_bound();
        let hi = dist.support_upper_bound();
        run.check_true(
            i,
            lo <= hi,
            "support bounds".to_owned(),
            "lower <= upper".to_owned(),
            format!("lower = {lo}, upper = {hi}"),
            "support bounds must be ordered",
        );

        run.check_value(
            i,
            tolerance,
            dist.probability(lo),
            dist.cumulative_probability(lo),
            format!("x = {lo}"),
            "pmf(lower) must equal cdf(lower)",
        );
        match dist.inverse_cumulative_probability(0.0) {
            Ok(actual) => run.check_true(
                i,
                actual == lo,
                "p = 0".to_owned(),
                lo.to_string(),
                actual.to_string(),
                "icdf(0) must be the support lower bound",
            ),
            Err(err) => run.check_true(
                i,
                false,
                "p = 0".to_owned(),
                lo.to_string(),
                format!("error: {err}"),
                "icdf(0) failed",
            ),
        }
        if lo != i64::MIN {
            let below = lo - 1;
            let input = format!("x = {below}");
            run.check_exact(i, 0.0, dist.probability(below), input.clone(), "pmf below support");
            run.check_exact(
                i,
                f64::NEG_INFINITY,
                dist.log_probability(below),
                input.clone(),
                "logpmf below support",
            );
            run.check_exact(
                i,
                0.0,
                dist.cumulative_probability(below),
                input.clone(),
                "cdf below support",
            );
            run.check_exact(i, 1.0, dist.survival_probability(below), input, "sf below support");
        }

        run.check_exact(
            i,
            1.0,
            dist.cumulative_probability(hi),
            format!("x = {hi}"),
            "cdf at the upper bound must be one",
        );
        run.check_exact(
            i,
            0.0,
            dist.survival_probability(hi),
            format!("x = {hi}"),
            "sf at the upper bound must be zero",
        );
        run.check_value(
            i,
            tolerance,
            dist.probability(hi),
            dist.survival_probability(hi - 1),
            format!("x = {hi}"),
            "pmf(upper) must equal sf(upper - 1)",
        );
        match dist.inverse_cumulative_probability(1.0) {
            Ok(actual) => run.check_true(
                i,
                actual == hi,
                "p = 1".to_owned(),
                hi.to_string(),
                actual.to_string(),
                "icdf(1) must be the support upper bound",
            ),
            Err(err) => run.check_true(
                i,
                false,
                "p = 1".to_owned(),
                hi.to_string(),
                format!("error: {err}"),
                "icdf(1) failed",
            ),
        }
        if hi != i64::MAX {
            let above = hi + 1;
            let input = format!("x = {above}");
            run.check_exact(i, 0.0, dist.probability(above), input.clone(), "pmf above support");
            run.check_exact(
                i,
                f64::NEG_INFINITY,
                dist.log_probability(above),
                input.clone(),
                "logpmf above support",
            );
            run.check_exact(
                i,
                1.0,
                dist.cumulative_probability(above),
                input.clone(),
                "cdf above support",
            );
            run.check_exact(i, 0.0, dist.survival_probability(above), input, "sf above support");
        }

        // The log mass may stay meaningful where the plain mass underflows
        // to zero, so only the exponentiated direction is asserted.
        run.check_value(
            i,
            tolerance,
            dist.probability(lo),
            dist.log_probability(lo).exp(),
            format!("x = {lo}"),
            "pmf(lower) must equal exp(logpmf(lower))",
        );
        run.check_value(
            i,
            tolerance,
            dist.probability(hi),
            dist.log_probability(hi).exp(),
            format!("x = {hi}"),
            "pmf(upper) must equal exp(logpmf(upper))",
        );
    }
    run.finish("no fixtures loaded")
}

fn check_invalid_probability<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    _data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::InvalidProbability);
    for (i, dist) in dists.iter().enumerate() {
        run.scenario();
        let lo = dist.support_lower_bound();
        let hi = dist.support_upper_bound();
        if lo < hi {
            let result = dist.range_probability(hi, lo);
            run.check_true(
                i,
                result.is_err(),
                format!("range ({hi}, {lo})"),
                "invalid-argument error".to_owned(),
                render_range_result(&result),
                "reversed support bounds must be rejected",
            );
        }
        for p in [-1.0, 2.0] {
            run.check_true(
                i,
                dist.inverse_cumulative_probability(p).is_err(),
                format!("p = {p}"),
                "invalid-argument error".to_owned(),
                "accepted".to_owned(),
                "probability outside [0, 1] must be rejected",
            );
        }
    }
    run.finish("no fixtures loaded")
}

fn check_probability_sums<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::ProbabilitySums);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some(s) = scenario::value_scenario(Category::ProbabilitySums, d) else { continue };
        run.scenario();
        // Keep only points with expected CDF well inside (0, 1); sums over
        // the extreme tails are dominated by reference rounding.
        let mut points: Vec<i64> = s
            .points
            .iter()
            .zip(s.values)
            .filter(|&(_, &v)| !v.is_nan() && v >= 1e-5 && v <= 1.0 - 1e-5)
            .map(|(&x, _)| x)
            .collect();
        points.sort_unstable();
        for w in points.windows(2) {
            let (x0, x1) = (w[0], w[1]);
            if x1 - x0 > 50 {
                continue;
            }
            let sum: f64 = (x0 + 1..=x1).map(|k| dist.probability(k)).sum();
            match dist.range_probability(x0, x1) {
                Ok(expected) => run.check_value(
                    i,
                    s.tolerance,
                    expected,
                    sum,
                    format!("sum over ({x0}, {x1}]"),
                    "mass sum must reconstruct the range probability",
                ),
                Err(err) => run.check_true(
                    i,
                    false,
                    format!("sum over ({x0}, {x1}]"),
                    sum.to_string(),
                    format!("error: {err}"),
                    "range probability failed for ordered bounds",
                ),
            }
        }
    }
    run.finish("no fixture supplies data for probability sums")
}

fn discrete_bound_matches(expected: f64, actual: i64) -> bool {
    if expected == f64::NEG_INFINITY {
        return actual == i64::MIN;
    }
    if expected == f64::INFINITY {
        return actual == i64::MAX;
    }
    actual as f64 == expected
}

fn check_support<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Support);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        run.scenario();
        let lower = dist.support_lower_bound();
        let upper = dist.support_upper_bound();
        run.check_true(
            i,
            discrete_bound_matches(d.lower, lower),
            "support lower bound".to_owned(),
            d.lower.to_string(),
            lower.to_string(),
            "unexpected support lower bound",
        );
        run.check_true(
            i,
            discrete_bound_matches(d.upper, upper),
            "support upper bound".to_owned(),
            d.upper.to_string(),
            upper.to_string(),
            "unexpected support upper bound",
        );
        run.check_true(
            i,
            dist.is_support_connected() == d.connected,
            "support connectivity".to_owned(),
            d.connected.to_string(),
            dist.is_support_connected().to_string(),
            "unexpected support connectivity",
        );
    }
    run.finish("no fixtures loaded")
}

fn check_moments<D: DiscreteDistribution>(
    _family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Moments);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        run.scenario();
        let tolerance = DoubleTolerance::Absolute(d.tolerance);
        // NaN expectations mean the moment is untested for this fixture.
        if !d.mean.is_nan() {
            run.check_value(i, tolerance, d.mean, dist.mean(), "mean".to_owned(), "incorrect mean");
        }
        if !d.variance.is_nan() {
            run.check_value(
                i,
                tolerance,
                d.variance,
                dist.variance(),
                "variance".to_owned(),
                "incorrect variance",
            );
        }
    }
    run.finish("no fixtures loaded")
}

fn check_parameters<D: DiscreteDistribution>(
    family: &DiscreteFamily<D>,
    dists: &[D],
    data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Parameters);
    if family.accessors.is_empty() {
        return run.finish("family declares no parameter accessors");
    }
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        run.scenario();
        for (position, (name, accessor)) in family.accessors.iter().enumerate() {
            match d.parameters.get(position) {
                Some(&expected) => run.check_true(
                    i,
                    accessor(dist) == expected,
                    format!("parameter `{name}`"),
                    expected.to_string(),
                    accessor(dist).to_string(),
                    "accessor must return the construction parameter",
                ),
                None => run.check_true(
                    i,
                    false,
                    format!("parameter `{name}`"),
                    format!("a value at position {position}"),
                    "missing".to_owned(),
                    "fixture supplies fewer parameters than the accessor table",
                ),
            }
        }
    }
    run.finish("no fixtures loaded")
}

fn check_invalid_parameters<D: DiscreteDistribution>(
    family: &DiscreteFamily<D>,
    _dists: &[D],
    _data: &[DiscreteTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::InvalidParameters);
    for (i, params) in family.invalid_parameters.iter().enumerate() {
        run.scenario();
        let rejected = (family.make)(params).is_err();
        run.check_true(
            i,
            rejected,
            format!("parameters {params:?}"),
            "construction error".to_owned(),
            if rejected { "rejected".to_owned() } else { "constructed".to_owned() },
            "invalid parameters must be rejected",
        );
    }
    run.finish("family declares no invalid parameter sets")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckOutcome;
    use crate::fixture::blank;
    use fst_distribution::reference::{Binomial, DiscreteUniform};
    use fst_distribution::{DiscreteSampler, DistributionError, require_probability};

    const BINOMIAL: DiscreteFamily<Binomial> = DiscreteFamily {
        name: "binomial",
        parameter_names: &["trials", "probability_of_success"],
        make: |params| Binomial::new(params[0] as i64, params[1]),
        accessors: &[
            ("trials", |d: &Binomial| d.number_of_trials()),
            ("probability_of_success", |d: &Binomial| d.probability_of_success()),
        ],
        invalid_parameters: &[&[-1.0, 0.5], &[10.0, -0.1], &[10.0, 1.5]],
    };

    fn binomial_data() -> DiscreteTestData {
        let mut d = blank::<i64>();
        d.parameters = smallvec::smallvec![10.0, 0.5];
        d.mean = 5.0;
        d.variance = 2.5;
        d.lower = 0.0;
        d.upper = 10.0;
        d.tolerance = 1e-9;
        d.cdf_points = vec![0, 2, 5, 9, 10];
        d.cdf_values = vec![0.0009765625, 0.0546875, 0.623046875, 0.9990234375, 1.0];
        d.density_points = d.cdf_points.clone();
        d.density_values = vec![0.0009765625, 0.0439453125, 0.24609375, 0.009765625, 0.0009765625];
        d.log_density_values = d.density_values.iter().map(|v| v.ln()).collect();
        d.sf_points = d.cdf_points.clone();
        d.sf_values = d.cdf_values.iter().map(|v| 1.0 - v).collect();
        d.icdf_points = vec![0.001, 0.01, 0.025, 0.05, 0.1, 0.999, 0.99, 0.975, 0.95, 0.9];
        d.icdf_values = vec![1, 1, 2, 2, 3, 9, 9, 8, 8, 7];
        d
    }

    fn run_binomial() -> Vec<CategoryReport> {
        let data = vec![binomial_data()];
        let dists = vec![Binomial::new(10, 0.5).unwrap()];
        run_discrete_battery(&BINOMIAL, &dists, &data)
    }

    #[test]
    fn full_battery_passes_for_reference_binomial() {
        let reports = run_binomial();
        assert_eq!(reports.len(), Category::DISCRETE.len());
        for report in &reports {
            assert_ne!(
                report.outcome,
                CheckOutcome::Fail,
                "{} failed: {:?}",
                report.category.as_str(),
                report.failures
            );
        }
    }

    #[test]
    fn battery_covers_every_discrete_category_in_order() {
        let reports = run_binomial();
        let categories: Vec<Category> = reports.iter().map(|r| r.category).collect();
        assert_eq!(categories, Category::DISCRETE);
    }

    #[test]
    fn cumulative_check_rejects_wrong_reference_values() {
        let mut d = binomial_data();
        d.cdf_values[2] += 1e-3;
        let reports = run_discrete_battery(&BINOMIAL, &[Binomial::new(10, 0.5).unwrap()], &[d]);
        let cumulative = reports.iter().find(|r| r.category == Category::Cumulative).unwrap();
        assert_eq!(cumulative.outcome, CheckOutcome::Fail);
        // consistency only checks the distribution against itself
        let consistency = reports.iter().find(|r| r.category == Category::Consistency).unwrap();
        assert_eq!(consistency.outcome, CheckOutcome::Pass);
    }

    #[test]
    fn disabled_cdf_still_runs_complement_and_consistency() {
        let mut d = binomial_data();
        d.disable_cdf = true;
        let reports = run_discrete_battery(&BINOMIAL, &[Binomial::new(10, 0.5).unwrap()], &[d]);
        let by = |c: Category| reports.iter().find(|r| r.category == c).unwrap().outcome;
        assert_eq!(by(Category::Cumulative), CheckOutcome::Skip);
        assert_eq!(by(Category::Complement), CheckOutcome::Pass);
        assert_eq!(by(Category::Consistency), CheckOutcome::Pass);
    }

    #[test]
    fn empty_batch_skips_every_category() {
        let reports = run_discrete_battery(&BINOMIAL, &[], &[]);
        for report in reports {
            // invalid parameter sets are family data, not fixture data
            if report.category == Category::InvalidParameters {
                assert_eq!(report.outcome, CheckOutcome::Pass);
            } else {
                assert_eq!(report.outcome, CheckOutcome::Skip, "{}", report.category.as_str());
            }
        }
    }

    #[test]
    fn parameter_accessor_table_detects_drift() {
        let mut d = binomial_data();
        d.parameters[1] = 0.25; // fixture lies about the parameter
        let reports = run_discrete_battery(&BINOMIAL, &[Binomial::new(10, 0.5).unwrap()], &[d]);
        let params = reports.iter().find(|r| r.category == Category::Parameters).unwrap();
        assert_eq!(params.outcome, CheckOutcome::Fail);
        assert!(params.failures[0].input.contains("probability_of_success"));
    }

    #[test]
    fn invalid_parameters_check_requires_rejection() {
        let reports = run_binomial();
        let invalid = reports.iter().find(|r| r.category == Category::InvalidParameters).unwrap();
        assert_eq!(invalid.outcome, CheckOutcome::Pass);
        assert_eq!(invalid.scenario_count, BINOMIAL.invalid_parameters.len());
    }

    /// A distribution that accepts reversed range bounds, which the battery
    /// must flag.
    struct Lax(DiscreteUniform);

    impl DiscreteDistribution for Lax {
        fn probability(&self, x: i64) -> f64 {
            self.0.probability(x)
        }
        fn cumulative_probability(&self, x: i64) -> f64 {
            self.0.cumulative_probability(x)
        }
        fn range_probability(&self, x0: i64, x1: i64) -> Result<f64, DistributionError> {
            // swallows the ordering violation
            Ok(self.cumulative_probability(x1.max(x0)) - self.cumulative_probability(x1.min(x0)))
        }
        fn inverse_cumulative_probability(&self, p: f64) -> Result<i64, DistributionError> {
            require_probability(p)?;
            self.0.inverse_cumulative_probability(p)
        }
        fn support_lower_bound(&self) -> i64 {
            self.0.support_lower_bound()
        }
        fn support_upper_bound(&self) -> i64 {
            self.0.support_upper_bound()
        }
        fn mean(&self) -> f64 {
            self.0.mean()
        }
        fn variance(&self) -> f64 {
            self.0.variance()
        }
        fn create_sampler(&self, seed: u64) -> Box<dyn DiscreteSampler> {
            self.0.create_sampler(seed)
        }
    }

    const LAX: DiscreteFamily<Lax> = DiscreteFamily {
        name: "lax",
        parameter_names: &["a", "b"],
        make: |params| DiscreteUniform::new(params[0] as i64, params[1] as i64).map(Lax),
        accessors: &[],
        invalid_parameters: &[],
    };

    #[test]
    fn missing_invalid_argument_error_is_a_failure() {
        let mut d = blank::<i64>();
        d.parameters = smallvec::smallvec![0.0, 3.0];
        d.lower = 0.0;
        d.upper = 3.0;
        d.cdf_points = vec![0, 2];
        d.cdf_values = vec![0.25, 0.75];
        let dist = (LAX.make)(&[0.0, 3.0]).unwrap();
        let reports = run_discrete_battery(&LAX, &[dist], &[d]);
        let cumulative = reports.iter().find(|r| r.category == Category::Cumulative).unwrap();
        assert_eq!(cumulative.outcome, CheckOutcome::Fail);
        assert!(cumulative.failures.iter().any(|f| f.detail.contains("reversed bounds")));
        let invalid =
            reports.iter().find(|r| r.category == Category::InvalidProbability).unwrap();
        assert_eq!(invalid.outcome, CheckOutcome::Fail);
    }

    #[test]
    fn probability_sums_reconstruct_ranges() {
        let reports = run_binomial();
        let sums = reports.iter().find(|r| r.category == Category::ProbabilitySums).unwrap();
        assert_eq!(sums.outcome, CheckOutcome::Pass);
        // points 0 and 10 are filtered by the CDF window, 2..5 and 5..9 remain
        assert!(sums.assertion_count >= 2);
    }

    #[test]
    fn unbounded_support_maps_to_sentinels() {
        use fst_distribution::reference::Geometric;
        const GEOMETRIC: DiscreteFamily<Geometric> = DiscreteFamily {
            name: "geometric",
            parameter_names: &["probability_of_success"],
            make: |params| Geometric::new(params[0]),
            accessors: &[("probability_of_success", |d: &Geometric| d.probability_of_success())],
            invalid_parameters: &[],
        };
        let mut d = blank::<i64>();
        d.parameters = smallvec::smallvec![0.5];
        d.mean = 1.0;
        d.variance = 2.0;
        d.lower = 0.0;
        d.upper = f64::INFINITY;
        let dist = Geometric::new(0.5).unwrap();
        let reports = run_discrete_battery(&GEOMETRIC, &[dist], &[d]);
        let support = reports.iter().find(|r| r.category == Category::Support).unwrap();
        assert_eq!(support.outcome, CheckOutcome::Pass, "{:?}", support.failures);
        let outside = reports.iter().find(|r| r.category == Category::OutsideSupport).unwrap();
        assert_eq!(outside.outcome, CheckOutcome::Pass, "{:?}", outside.failures);
    }
}
