//! The consistency battery for continuous distributions.
//!
//! Mirrors the discrete battery with the point semantics a real-valued
//! domain needs: boundary behavior is probed with the adjacent
//! representable values instead of integer offsets, the inverse checks
//! compare within the fixture tolerance, and there is no probability-sums
//! reconstruction.

use crate::scenario::{self, Category};
use crate::tolerance::DoubleTolerance;
use crate::{CategoryReport, CategoryRun, ContinuousFamily};
use fst_distribution::{ContinuousDistribution, DistributionError};

use crate::fixture::ContinuousTestData;

type Check<D> = fn(&ContinuousFamily<D>, &[D], &[ContinuousTestData]) -> CategoryReport;

/// Runs every category in [`Category::CONTINUOUS`] order.
pub fn run_continuous_battery<D: ContinuousDistribution>(
    family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
) -> Vec<CategoryReport> {
    let table: [(Category, Check<D>); 17] = [
        (Category::Probability, check_density),
        (Category::LogProbability, check_log_density),
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
        (Category::Support, check_support),
        (Category::Moments, check_moments),
        (Category::Parameters, check_parameters),
        (Category::InvalidParameters, check_invalid_parameters),
        (Category::Sampling, crate::sampling::check_continuous_sampling),
    ];
    debug_assert_eq!(table.len(), Category::CONTINUOUS.len());
    table
        .into_iter()
        .map(|(category, check)| {
            let report = check(family, dists, data);
            debug_assert_eq!(report.category, category);
            report
        })
        .collect()
}

fn render_range_result(result: &Result<f64, DistributionError>) -> String {
    match result {
        Ok(v) => v.to_string(),
        Err(err) => format!("error: {err}"),
    }
}

fn check_density<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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
                dist.density(x),
                format!("x = {x}"),
                "incorrect probability density",
            );
        }
    }
    run.finish("no fixture supplies density data")
}

fn check_log_density<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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
                dist.log_density(x),
                format!("x = {x}"),
                "incorrect log probability density",
            );
        }
    }
    run.finish("no fixture supplies log density data")
}

fn check_cumulative<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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

fn check_survival<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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

fn check_cumulative_high_precision<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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

fn check_survival_high_precision<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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

fn check_inverse_cumulative<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::InverseCumulative);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some((probabilities, expected_points)) = scenario::inverse_scenario(d) else {
            continue;
        };
        run.scenario();
        let tolerance = DoubleTolerance::Absolute(d.tolerance);
        let lower = dist.support_lower_bound();
        let upper = dist.support_upper_bound();
        for (&p, &expected) in probabilities.iter().zip(expected_points) {
            if expected < lower || expected > upper {
                continue;
            }
            match dist.inverse_cumulative_probability(p) {
                Ok(actual) => run.check_value(
                    i,
                    tolerance,
                    expected,
                    actual,
                    format!("p = {p}"),
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

fn check_inverse_mapping<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::InverseMapping);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        let Some((points, tolerance)) = scenario::point_scenario(Category::InverseMapping, d)
        else {
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
                // saturated region: several points share cdf = 1
                continue;
            }
            match dist.inverse_cumulative_probability(p) {
                Ok(actual) => run.check_value(
                    i,
                    tolerance,
                    x,
                    actual,
                    format!("x = {x}, cdf(x) = {p}"),
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

fn check_complement<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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

fn check_consistency<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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

fn check_outside_support<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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

        match dist.inverse_cumulative_probability(0.0) {
            Ok(actual) => run.check_exact(
                i,
                lo,
                actual,
                "p = 0".to_owned(),
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
        if lo.is_finite() {
            // limiting value just below the support
            let below = lo.next_down();
            let input = format!("x = {below}");
            run.check_exact(i, 0.0, dist.density(below), input.clone(), "density below support");
            run.check_exact(
                i,
                f64::NEG_INFINITY,
                dist.log_density(below),
                input.clone(),
                "log density below support",
            );
            run.check_exact(
                i,
                0.0,
                dist.cumulative_probability(below),
                input.clone(),
                "cdf below support",
            );
            run.check_exact(i, 1.0, dist.survival_probability(below), input, "sf below support");
            run.check_value(
                i,
                tolerance,
                dist.density(lo),
                dist.log_density(lo).exp(),
                format!("x = {lo}"),
                "density(lower) must equal exp(log density(lower))",
            );
        }

        match dist.inverse_cumulative_probability(1.0) {
            Ok(actual) => run.check_exact(
                i,
                hi,
                actual,
                "p = 1".to_owned(),
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
        if hi.is_finite() {
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
            let above = hi.next_up();
            let input = format!("x = {above}");
            run.check_exact(i, 0.0, dist.density(above), input.clone(), "density above support");
            run.check_exact(
                i,
                f64::NEG_INFINITY,
                dist.log_density(above),
                input.clone(),
                "log density above support",
            );
            run.check_exact(
                i,
                1.0,
                dist.cumulative_probability(above),
                input.clone(),
                "cdf above support",
            );
            run.check_exact(i, 0.0, dist.survival_probability(above), input, "sf above support");
            run.check_value(
                i,
                tolerance,
                dist.density(hi),
                dist.log_density(hi).exp(),
                format!("x = {hi}"),
                "density(upper) must equal exp(log density(upper))",
            );
        }
    }
    run.finish("no fixtures loaded")
}

fn check_invalid_probability<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::InvalidProbability);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        run.scenario();
        // Probe the reversed-range rejection with the fixture's own cdf
        // points when it supplies at least two distinct ones.
        let mut bounds = None;
        for &x in &d.cdf_points {
            bounds = match bounds {
                None => Some((x, x)),
                Some((min, max)) => Some((x.min(min), x.max(max))),
            };
        }
        if let Some((min, max)) = bounds
            && min < max
        {
            let result = dist.range_probability(max, min);
            run.check_true(
                i,
                result.is_err(),
                format!("range ({max}, {min})"),
                "invalid-argument error".to_owned(),
                render_range_result(&result),
                "reversed bounds must be rejected",
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

fn check_support<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Support);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        run.scenario();
        run.check_exact(
            i,
            d.lower,
            dist.support_lower_bound(),
            "support lower bound".to_owned(),
            "unexpected support lower bound",
        );
        run.check_exact(
            i,
            d.upper,
            dist.support_upper_bound(),
            "support upper bound".to_owned(),
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

fn check_moments<D: ContinuousDistribution>(
    _family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
) -> CategoryReport {
    let mut run = CategoryRun::new(Category::Moments);
    for (i, (dist, d)) in dists.iter().zip(data).enumerate() {
        run.scenario();
        let tolerance = DoubleTolerance::Absolute(d.tolerance);
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

fn check_parameters<D: ContinuousDistribution>(
    family: &ContinuousFamily<D>,
    dists: &[D],
    data: &[ContinuousTestData],
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

fn check_invalid_parameters<D: ContinuousDistribution>(
    family: &ContinuousFamily<D>,
    _dists: &[D],
    _data: &[ContinuousTestData],
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
