//! Projects loaded fixtures into per-category argument sets.
//!
//! A category yields no scenario for a fixture when the fixture's disable
//! flag suppresses it or its required point array is empty; both are silent
//! skips, not failures. A category with zero scenarios across every fixture
//! is skipped wholesale by the battery.

use crate::fixture::DistributionTestData;
use crate::tolerance::DoubleTolerance;
use serde::{Deserialize, Serialize};

/// Fixed absolute tolerance for the probability-sums reconstruction check,
/// used regardless of the fixture tolerance.
pub const PROBABILITY_SUMS_TOLERANCE: DoubleTolerance = DoubleTolerance::Absolute(1e-9);

/// The named check categories run by the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Probability,
    LogProbability,
    Cumulative,
    Survival,
    CumulativeHighPrecision,
    SurvivalHighPrecision,
    InverseCumulative,
    InverseMapping,
    Complement,
    Consistency,
    OutsideSupport,
    InvalidProbability,
    ProbabilitySums,
    Support,
    Moments,
    Parameters,
    InvalidParameters,
    Sampling,
}

impl Category {
    /// Battery order for discrete distributions.
    pub const DISCRETE: &'static [Category] = &[
        Category::Probability,
        Category::LogProbability,
        Category::Cumulative,
        Category::Survival,
        Category::CumulativeHighPrecision,
        Category::SurvivalHighPrecision,
        Category::InverseCumulative,
        Category::InverseMapping,
        Category::Complement,
        Category::Consistency,
        Category::OutsideSupport,
        Category::InvalidProbability,
        Category::ProbabilitySums,
        Category::Support,
        Category::Moments,
        Category::Parameters,
        Category::InvalidParameters,
        Category::Sampling,
    ];

    /// Battery order for continuous distributions. Probability sums are a
    /// discrete-only reconstruction.
    pub const CONTINUOUS: &'static [Category] = &[
        Category::Probability,
        Category::LogProbability,
        Category::Cumulative,
        Category::Survival,
        Category::CumulativeHighPrecision,
        Category::SurvivalHighPrecision,
        Category::InverseCumulative,
        Category::InverseMapping,
        Category::Complement,
        Category::Consistency,
        Category::OutsideSupport,
        Category::InvalidProbability,
        Category::Support,
        Category::Moments,
        Category::Parameters,
        Category::InvalidParameters,
        Category::Sampling,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Probability => "probability",
            Self::LogProbability => "log_probability",
            Self::Cumulative => "cumulative",
            Self::Survival => "survival",
            Self::CumulativeHighPrecision => "cumulative_high_precision",
            Self::SurvivalHighPrecision => "survival_high_precision",
            Self::InverseCumulative => "inverse_cumulative",
            Self::InverseMapping => "inverse_mapping",
            Self::Complement => "complement",
            Self::Consistency => "consistency",
            Self::OutsideSupport => "outside_support",
            Self::InvalidProbability => "invalid_probability",
            Self::ProbabilitySums => "probability_sums",
            Self::Support => "support",
            Self::Moments => "moments",
            Self::Parameters => "parameters",
            Self::InvalidParameters => "invalid_parameters",
            Self::Sampling => "sampling",
        }
    }
}

/// Point/value argument set for one fixture within one category.
#[derive(Debug, Clone, Copy)]
pub struct ValueScenario<'a, P> {
    pub points: &'a [P],
    pub values: &'a [f64],
    pub tolerance: DoubleTolerance,
}

/// Selects the point/value pair and tolerance a category tests against.
/// Returns `None` (skip) when the fixture disables the category or supplies
/// no data for it, and for categories that carry no point/value pair.
#[must_use]
pub fn value_scenario<'a, P>(
    category: Category,
    data: &'a DistributionTestData<P>,
) -> Option<ValueScenario<'a, P>> {
    let tolerance = DoubleTolerance::Absolute(data.tolerance);
    let hp = DoubleTolerance::Absolute(data.high_precision_tolerance);
    let (disabled, points, values, tolerance) = match category {
        Category::Probability => {
            (data.disable_density, &data.density_points, &data.density_values, tolerance)
        }
        Category::LogProbability => {
            (data.disable_density, &data.density_points, &data.log_density_values, tolerance)
        }
        Category::Cumulative => (data.disable_cdf, &data.cdf_points, &data.cdf_values, tolerance),
        Category::Survival => (data.disable_sf, &data.sf_points, &data.sf_values, tolerance),
        Category::CumulativeHighPrecision => {
            (false, &data.cdf_hp_points, &data.cdf_hp_values, hp)
        }
        Category::SurvivalHighPrecision => (false, &data.sf_hp_points, &data.sf_hp_values, hp),
        Category::ProbabilitySums => (
            data.disable_density,
            &data.cdf_points,
            &data.cdf_values,
            PROBABILITY_SUMS_TOLERANCE,
        ),
        Category::Sampling => {
            (data.disable_sample, &data.density_points, &data.density_values, tolerance)
        }
        _ => return None,
    };
    if disabled || points.is_empty() {
        return None;
    }
    Some(ValueScenario { points, values, tolerance })
}

/// Selects the bare point set for the categories that test internal
/// identities over the CDF points.
///
/// Complement and consistency deliberately ignore `disable.cdf`: that flag
/// suppresses comparisons against reference values, while these categories
/// test the distribution against itself.
#[must_use]
pub fn point_scenario<'a, P>(
    category: Category,
    data: &'a DistributionTestData<P>,
) -> Option<(&'a [P], DoubleTolerance)> {
    let tolerance = DoubleTolerance::Absolute(data.tolerance);
    match category {
        Category::Complement | Category::Consistency => {}
        Category::InverseMapping => {
            if data.disable_cdf_inverse {
                return None;
            }
        }
        _ => return None,
    }
    if data.cdf_points.is_empty() {
        return None;
    }
    Some((&data.cdf_points, tolerance))
}

/// Selects the (probability, expected point) pairs for the inverse check.
#[must_use]
pub fn inverse_scenario<'a, P>(data: &'a DistributionTestData<P>) -> Option<(&'a [f64], &'a [P])> {
    if data.icdf_points.is_empty() {
        return None;
    }
    Some((&data.icdf_points, &data.icdf_values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::DiscreteTestData;

    fn data() -> DiscreteTestData {
        let mut d = crate::fixture::blank::<i64>();
        d.cdf_points = vec![0, 1];
        d.cdf_values = vec![0.25, 1.0];
        d.density_points = vec![0, 1];
        d.density_values = vec![0.25, 0.75];
        d.log_density_values = vec![0.25f64.ln(), 0.75f64.ln()];
        d.sf_points = vec![0, 1];
        d.sf_values = vec![0.75, 0.0];
        d
    }

    #[test]
    fn disable_flags_suppress_their_category_only() {
        let mut d = data();
        d.disable_density = true;
        assert!(value_scenario(Category::Probability, &d).is_none());
        assert!(value_scenario(Category::LogProbability, &d).is_none());
        assert!(value_scenario(Category::ProbabilitySums, &d).is_none());
        assert!(value_scenario(Category::Cumulative, &d).is_some());
        assert!(value_scenario(Category::Survival, &d).is_some());
    }

    #[test]
    fn complement_and_consistency_ignore_disable_cdf() {
        let mut d = data();
        d.disable_cdf = true;
        assert!(value_scenario(Category::Cumulative, &d).is_none());
        assert!(point_scenario(Category::Complement, &d).is_some());
        assert!(point_scenario(Category::Consistency, &d).is_some());
    }

    #[test]
    fn empty_arrays_skip_silently() {
        let d = crate::fixture::blank::<i64>();
        assert!(value_scenario(Category::Probability, &d).is_none());
        assert!(value_scenario(Category::CumulativeHighPrecision, &d).is_none());
        assert!(point_scenario(Category::InverseMapping, &d).is_none());
        assert!(inverse_scenario(&d).is_none());
    }

    #[test]
    fn high_precision_uses_tighter_tolerance() {
        let mut d = data();
        d.cdf_hp_points = vec![0];
        d.cdf_hp_values = vec![1e-30];
        let plain = value_scenario(Category::Cumulative, &d).expect("cdf scenario");
        let hp = value_scenario(Category::CumulativeHighPrecision, &d).expect("hp scenario");
        assert_eq!(plain.tolerance, DoubleTolerance::Absolute(d.tolerance));
        assert_eq!(hp.tolerance, DoubleTolerance::Absolute(d.high_precision_tolerance));
    }

    #[test]
    fn probability_sums_use_fixed_tolerance() {
        let d = data();
        let s = value_scenario(Category::ProbabilitySums, &d).expect("sums scenario");
        assert_eq!(s.tolerance, PROBABILITY_SUMS_TOLERANCE);
        // sums read the CDF data, not the mass data
        assert_eq!(s.values, d.cdf_values.as_slice());
    }
}
