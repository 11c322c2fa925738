#![forbid(unsafe_code)]

//! Data-driven conformance harness for probability distribution
//! implementations.
//!
//! The harness loads parameterized fixtures from key-value property files,
//! projects each fixture into per-category argument sets, and runs a fixed
//! battery of mathematical-consistency checks against a distribution
//! constructed from the fixture parameters. Check failures are accumulated
//! into reports rather than aborting sibling checks; categories with no
//! applicable data are skipped, not failed.
//!
//! ```no_run
//! use fst_conformance::{DiscreteFamily, HarnessConfig, run_discrete_conformance};
//! use fst_distribution::reference::Binomial;
//!
//! const BINOMIAL: DiscreteFamily<Binomial> = DiscreteFamily {
//!     name: "binomial",
//!     parameter_names: &["trials", "probability_of_success"],
//!     make: |params| Binomial::new(params[0] as i64, params[1]),
//!     accessors: &[
//!         ("trials", |d: &Binomial| d.number_of_trials()),
//!         ("probability_of_success", |d: &Binomial| d.probability_of_success()),
//!     ],
//!     invalid_parameters: &[&[-1.0, 0.5], &[10.0, 1.5]],
//! };
//!
//! let report = run_discrete_conformance(&BINOMIAL, &HarnessConfig::default_paths())?;
//! assert!(report.all_passed());
//! # Ok::<(), fst_conformance::ConformanceError>(())
//! ```

pub mod battery;
pub mod continuous;
pub mod fixture;
pub mod loader;
pub mod sampling;
pub mod scenario;
pub mod tolerance;

use fst_distribution::{ContinuousDistribution, DiscreteDistribution, DistributionError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use crate::fixture::{ContinuousTestData, DiscreteTestData};
use crate::loader::FixtureFormatError;
use crate::scenario::Category;
use crate::tolerance::DoubleTolerance;

/// Where the harness finds fixture property files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub fixture_root: PathBuf,
}

impl HarnessConfig {
    /// The `fixtures/` directory shipped with this crate.
    #[must_use]
    pub fn default_paths() -> Self {
        Self { fixture_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures") }
    }

    #[must_use]
    pub fn with_fixture_root(fixture_root: impl Into<PathBuf>) -> Self {
        Self { fixture_root: fixture_root.into() }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::default_paths()
    }
}

/// Registration entry binding a discrete distribution type to its fixture
/// family: how to construct it, how its parameters are named, and the
/// accessor table checked against fixture parameters.
pub struct DiscreteFamily<D: DiscreteDistribution + 'static> {
    /// Family identifier; fixture files are `test.<name>.<n>.properties`.
    pub name: &'static str,
    /// Positional parameter names, used in load diagnostics and by the
    /// parameters check.
    pub parameter_names: &'static [&'static str],
    /// Constructs one immutable distribution instance from fixture
    /// parameters.
    pub make: fn(&[f64]) -> Result<D, DistributionError>,
    /// `(name, accessor)` pairs checked positionally against the fixture
    /// parameters. Empty skips the parameters check.
    pub accessors: &'static [(&'static str, fn(&D) -> f64)],
    /// Parameter sets that must fail construction. Empty skips the check.
    pub invalid_parameters: &'static [&'static [f64]],
}

/// Registration entry for a continuous distribution family.
pub struct ContinuousFamily<D: ContinuousDistribution + 'static> {
    pub name: &'static str,
    pub parameter_names: &'static [&'static str],
    pub make: fn(&[f64]) -> Result<D, DistributionError>,
    pub accessors: &'static [(&'static str, fn(&D) -> f64)],
    pub invalid_parameters: &'static [&'static [f64]],
}

/// Hard failure preventing a conformance run from producing a report.
#[derive(Debug)]
pub enum ConformanceError {
    /// The fixture batch failed to load; no check ran.
    Fixture(FixtureFormatError),
    /// A fixture's parameters were rejected by the family constructor.
    Construction { family: &'static str, fixture: usize, source: DistributionError },
}

impl fmt::Display for ConformanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixture(err) => write!(f, "fixture batch load failed: {err}"),
            Self::Construction { family, fixture, source } => write!(
                f,
                "family `{family}` fixture #{fixture} failed construction: {source}"
            ),
        }
    }
}

impl std::error::Error for ConformanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fixture(err) => Some(err),
            Self::Construction { source, .. } => Some(source),
        }
    }
}

impl From<FixtureFormatError> for ConformanceError {
    fn from(value: FixtureFormatError) -> Self {
        Self::Fixture(value)
    }
}

// ── Reports ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Pass,
    Fail,
    Skip,
}

/// One failed assertion: the offending input plus expected and actual
/// values, attached to the fixture (scenario ordinal) that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckFailure {
    pub fixture: usize,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: Category,
    pub outcome: CheckOutcome,
    /// Fixtures that actually exercised this category.
    pub scenario_count: usize,
    pub assertion_count: usize,
    pub failures: Vec<CheckFailure>,
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyReport {
    pub family: String,
    pub fixture_count: usize,
    /// SHA-256 digests of the raw fixture sources, in load order.
    pub fixture_ids: Vec<String>,
    pub categories: Vec<CategoryReport>,
}

impl FamilyReport {
    /// True when no category failed. Skipped categories do not count
    /// against a pass.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.categories.iter().all(|c| c.outcome != CheckOutcome::Fail)
    }

    #[must_use]
    pub fn category(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn failures(&self) -> impl Iterator<Item = (Category, &CheckFailure)> {
        self.categories.iter().flat_map(|c| c.failures.iter().map(move |f| (c.category, f)))
    }
}

/// Accumulates one category's assertions while the battery runs it.
pub(crate) struct CategoryRun {
    category: Category,
    scenario_count: usize,
    assertion_count: usize,
    failures: Vec<CheckFailure>,
}

impl CategoryRun {
    pub(crate) fn new(category: Category) -> Self {
        Self { category, scenario_count: 0, assertion_count: 0, failures: Vec::new() }
    }

    /// Marks one fixture as exercising this category.
    pub(crate) fn scenario(&mut self) {
        self.scenario_count += 1;
    }

    /// Records one boolean assertion.
    pub(crate) fn check_true(
        &mut self,
        fixture: usize,
        passed: bool,
        input: String,
        expected: String,
        actual: String,
        detail: &str,
    ) {
        self.assertion_count += 1;
        if !passed {
            self.failures.push(CheckFailure {
                fixture,
                input,
                expected,
                actual,
                detail: detail.to_owned(),
            });
        }
    }

    /// Records one expected-vs-actual comparison under a tolerance.
    pub(crate) fn check_value(
        &mut self,
        fixture: usize,
        tolerance: DoubleTolerance,
        expected: f64,
        actual: f64,
        input: String,
        detail: &str,
    ) {
        let passed = tolerance.test(expected, actual);
        self.check_true(fixture, passed, input, expected.to_string(), actual.to_string(), detail);
    }

    /// Records one exact expected-vs-actual comparison.
    pub(crate) fn check_exact(
        &mut self,
        fixture: usize,
        expected: f64,
        actual: f64,
        input: String,
        detail: &str,
    ) {
        self.check_value(fixture, DoubleTolerance::Exact, expected, actual, input, detail);
    }

    /// Closes the run. Zero exercised scenarios is a soft skip carrying
    /// `empty_reason`, never a failure.
    pub(crate) fn finish(self, empty_reason: &str) -> CategoryReport {
        let (outcome, skip_reason) = if self.scenario_count == 0 {
            (CheckOutcome::Skip, Some(empty_reason.to_owned()))
        } else if self.failures.is_empty() {
            (CheckOutcome::Pass, None)
        } else {
            (CheckOutcome::Fail, None)
        };
        CategoryReport {
            category: self.category,
            outcome,
            scenario_count: self.scenario_count,
            assertion_count: self.assertion_count,
            failures: self.failures,
            skip_reason,
        }
    }
}

// ── Fixture cache ──────────────────────────────────────────────────

// Fixture batches are immutable once loaded, so each (root, family) pair is
// read at most once per process.
type FixtureCache<T> = Mutex<FxHashMap<(PathBuf, String), Arc<Vec<T>>>>;

static DISCRETE_CACHE: OnceLock<FixtureCache<DiscreteTestData>> = OnceLock::new();
static CONTINUOUS_CACHE: OnceLock<FixtureCache<ContinuousTestData>> = OnceLock::new();

fn cached<T: Clone>(
    cache: &FixtureCache<T>,
    fixture_root: &PathBuf,
    family: &str,
    load: impl FnOnce() -> Result<Vec<T>, FixtureFormatError>,
) -> Result<Arc<Vec<T>>, FixtureFormatError> {
    let key = (fixture_root.clone(), family.to_owned());
    {
        let guard = match cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(hit) = guard.get(&key) {
            return Ok(Arc::clone(hit));
        }
    }
    // Load outside the lock; failed loads are not cached.
    let data = Arc::new(load()?);
    let mut guard = match cache.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    Ok(Arc::clone(guard.entry(key).or_insert(data)))
}

/// Loads (or returns the memoized) discrete fixture batch for a family.
pub fn load_discrete_data(
    config: &HarnessConfig,
    family: &str,
    parameter_names: &[&str],
) -> Result<Arc<Vec<DiscreteTestData>>, FixtureFormatError> {
    let cache = DISCRETE_CACHE.get_or_init(|| Mutex::new(FxHashMap::default()));
    cached(cache, &config.fixture_root, family, || {
        loader::load_discrete_family(&config.fixture_root, family, parameter_names)
    })
}

/// Loads (or returns the memoized) continuous fixture batch for a family.
pub fn load_continuous_data(
    config: &HarnessConfig,
    family: &str,
    parameter_names: &[&str],
) -> Result<Arc<Vec<ContinuousTestData>>, FixtureFormatError> {
    let cache = CONTINUOUS_CACHE.get_or_init(|| Mutex::new(FxHashMap::default()));
    cached(cache, &config.fixture_root, family, || {
        loader::load_continuous_family(&config.fixture_root, family, parameter_names)
    })
}

// ── Runners ────────────────────────────────────────────────────────

/// Loads the family's fixtures, constructs one distribution instance per
/// fixture, and runs the full discrete battery.
pub fn run_discrete_conformance<D: DiscreteDistribution>(
    family: &DiscreteFamily<D>,
    config: &HarnessConfig,
) -> Result<FamilyReport, ConformanceError> {
    let data = load_discrete_data(config, family.name, family.parameter_names)?;
    let mut dists = Vec::with_capacity(data.len());
    for (fixture, d) in data.iter().enumerate() {
        let dist = (family.make)(&d.parameters).map_err(|source| {
            ConformanceError::Construction { family: family.name, fixture, source }
        })?;
        dists.push(dist);
    }
    Ok(FamilyReport {
        family: family.name.to_owned(),
        fixture_count: data.len(),
        fixture_ids: data.iter().map(|d| d.fixture_id.clone()).collect(),
        categories: battery::run_discrete_battery(family, &dists, &data),
    })
}

/// Continuous counterpart of [`run_discrete_conformance`].
pub fn run_continuous_conformance<D: ContinuousDistribution>(
    family: &ContinuousFamily<D>,
    config: &HarnessConfig,
) -> Result<FamilyReport, ConformanceError> {
    let data = load_continuous_data(config, family.name, family.parameter_names)?;
    let mut dists = Vec::with_capacity(data.len());
    for (fixture, d) in data.iter().enumerate() {
        let dist = (family.make)(&d.parameters).map_err(|source| {
            ConformanceError::Construction { family: family.name, fixture, source }
        })?;
        dists.push(dist);
    }
    Ok(FamilyReport {
        family: family.name.to_owned(),
        fixture_count: data.len(),
        fixture_ids: data.iter().map(|d| d.fixture_id.clone()).collect(),
        categories: continuous::run_continuous_battery(family, &dists, &data),
    })
}

// ── Report emitters ────────────────────────────────────────────────

pub fn emit_report_json(report: &FamilyReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[must_use]
pub fn emit_report_markdown(report: &FamilyReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Conformance Report: {}\n\n", report.family));
    out.push_str(&format!("Fixtures: {}\n\n", report.fixture_count));

    out.push_str("| Category | Outcome | Scenarios | Assertions | Failures |\n");
    out.push_str("|---|---|---|---|---|\n");
    for c in &report.categories {
        out.push_str(&format!(
            "| {} | {:?} | {} | {} | {} |\n",
            c.category.as_str(),
            c.outcome,
            c.scenario_count,
            c.assertion_count,
            c.failures.len()
        ));
    }

    let mut failures = report.failures().peekable();
    if failures.peek().is_some() {
        out.push_str("\n## Failures\n\n");
        for (category, f) in failures {
            out.push_str(&format!(
                "- `{}` fixture #{}: {} — expected {}, got {} ({})\n",
                category.as_str(),
                f.fixture,
                f.input,
                f.expected,
                f.actual,
                f.detail
            ));
        }
    }

    out
}
