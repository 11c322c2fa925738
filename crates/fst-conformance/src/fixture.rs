//! Typed in-memory model of one parameterized test case.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Default tolerance for expected-vs-actual equality assertions.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Default tolerance for the high-precision near-zero-probability regions.
pub const DEFAULT_HIGH_PRECISION_TOLERANCE: f64 = 1e-22;

/// One parameterized instance of a distribution under test: construction
/// parameters, expected moments and bounds, per-function test points and
/// values, tolerances, and per-category disable flags.
///
/// Generic over the point scalar: `i64` for discrete distributions, `f64`
/// for continuous ones. Every `*_points` / `*_values` pair is parallel and
/// length-validated at load time; an empty pair means "no data provided"
/// and silently skips the corresponding checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionTestData<P> {
    /// SHA-256 hex digest of the raw key-value source this was loaded from.
    pub fixture_id: String,
    /// Construction parameters, in declaration order. Immutable once loaded.
    pub parameters: SmallVec<[f64; 4]>,
    /// Expected mean; NaN means untested.
    pub mean: f64,
    /// Expected variance; NaN means untested.
    pub variance: f64,
    /// Expected support lower bound (may be `-inf`).
    pub lower: f64,
    /// Expected support upper bound (may be `+inf`).
    pub upper: f64,
    /// Expected support connectivity.
    pub connected: bool,
    pub tolerance: f64,
    pub high_precision_tolerance: f64,
    pub cdf_points: Vec<P>,
    pub cdf_values: Vec<f64>,
    /// Defaults to `cdf_points`.
    pub density_points: Vec<P>,
    pub density_values: Vec<f64>,
    /// Defaults to the elementwise log of `density_values`.
    pub log_density_values: Vec<f64>,
    /// Defaults to `cdf_points`.
    pub sf_points: Vec<P>,
    /// Defaults to `1 - cdf_values` elementwise.
    pub sf_values: Vec<f64>,
    pub cdf_hp_points: Vec<P>,
    pub cdf_hp_values: Vec<f64>,
    pub sf_hp_points: Vec<P>,
    pub sf_hp_values: Vec<f64>,
    /// Probabilities for the inverse-cumulative check; empty means ignore.
    pub icdf_points: Vec<f64>,
    /// Expected inverse-cumulative results, parallel to `icdf_points`.
    pub icdf_values: Vec<P>,
    pub disable_sample: bool,
    pub disable_density: bool,
    pub disable_cdf: bool,
    pub disable_sf: bool,
    pub disable_cdf_inverse: bool,
}

/// Fixture for an integer-valued distribution.
pub type DiscreteTestData = DistributionTestData<i64>;

/// Fixture for a real-valued distribution.
pub type ContinuousTestData = DistributionTestData<f64>;

/// An all-defaults fixture for assembling test data programmatically.
#[cfg(test)]
pub(crate) fn blank<P>() -> DistributionTestData<P> {
    DistributionTestData {
        fixture_id: String::new(),
        parameters: SmallVec::new(),
        mean: f64::NAN,
        variance: f64::NAN,
        lower: f64::NEG_INFINITY,
        upper: f64::INFINITY,
        connected: true,
        tolerance: DEFAULT_TOLERANCE,
        high_precision_tolerance: DEFAULT_HIGH_PRECISION_TOLERANCE,
        cdf_points: Vec::new(),
        cdf_values: Vec::new(),
        density_points: Vec::new(),
        density_values: Vec::new(),
        log_density_values: Vec::new(),
        sf_points: Vec::new(),
        sf_values: Vec::new(),
        cdf_hp_points: Vec::new(),
        cdf_hp_values: Vec::new(),
        sf_hp_points: Vec::new(),
        sf_hp_values: Vec::new(),
        icdf_points: Vec::new(),
        icdf_values: Vec::new(),
        disable_sample: false,
        disable_density: false,
        disable_cdf: false,
        disable_sf: false,
        disable_cdf_inverse: false,
    }
}
