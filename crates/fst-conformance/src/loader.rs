//! Reads ordered sequences of key-value fixture sources into typed
//! [`DistributionTestData`] models.
//!
//! Sources use Java-style properties text: `key = value` lines, `#`/`!`
//! comments, and `\` line continuations. Fixture files for a family are
//! numbered sequentially from one (`test.<family>.1.properties`,
//! `test.<family>.2.properties`, ...) and loaded in order. Any malformed
//! source fails the whole batch; no partial fixture set is ever returned.

use crate::fixture::{
    DEFAULT_HIGH_PRECISION_TOLERANCE, DEFAULT_TOLERANCE, ContinuousTestData, DistributionTestData,
    DiscreteTestData,
};
use sha2::{Digest, Sha256};
use smallvec::SmallVec;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Batch-fatal fixture load error.
#[derive(Debug)]
pub enum FixtureFormatError {
    Io { path: PathBuf, source: std::io::Error },
    MissingKey { path: PathBuf, key: String },
    InvalidToken { path: PathBuf, key: String, token: String },
    LengthMismatch {
        path: PathBuf,
        points_key: String,
        values_key: String,
        points: usize,
        values: usize,
    },
}

impl fmt::Display for FixtureFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed reading fixture {}: {source}", path.display())
            }
            Self::MissingKey { path, key } => {
                write!(f, "fixture {} is missing mandatory key `{key}`", path.display())
            }
            Self::InvalidToken { path, key, token } => write!(
                f,
                "fixture {}: key `{key}` has unparseable token `{token}`",
                path.display()
            ),
            Self::LengthMismatch { path, points_key, values_key, points, values } => write!(
                f,
                "fixture {}: `{points_key}` has {points} entries but `{values_key}` has {values}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for FixtureFormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// An opaque ordered key-value source. Later entries shadow earlier ones,
/// matching `java.util.Properties` semantics.
#[derive(Debug, Clone, Default)]
pub struct PropertySource {
    entries: Vec<(String, String)>,
}

impl PropertySource {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let mut logical = line.to_owned();
            while logical.ends_with('\\') {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }
            if let Some((key, value)) = logical.split_once('=') {
                entries.push((key.trim().to_owned(), value.trim().to_owned()));
            }
        }
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().rev().find(|(k, _)| k.as_str() == key).map(|(_, v)| v.as_str())
    }
}

/// Point scalar parseable from a fixture token.
pub trait PointToken: Copy {
    fn parse_token(token: &str) -> Option<Self>;
}

impl PointToken for i64 {
    fn parse_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }
}

impl PointToken for f64 {
    // f64 parsing accepts the NaN / Infinity / -Infinity literals.
    fn parse_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }
}

struct Reader<'a> {
    path: &'a Path,
    source: &'a PropertySource,
}

impl Reader<'_> {
    fn missing(&self, key: &str) -> FixtureFormatError {
        FixtureFormatError::MissingKey { path: self.path.to_path_buf(), key: key.to_owned() }
    }

    fn invalid(&self, key: &str, token: &str) -> FixtureFormatError {
        FixtureFormatError::InvalidToken {
            path: self.path.to_path_buf(),
            key: key.to_owned(),
            token: token.to_owned(),
        }
    }

    fn required_f64(&self, key: &str) -> Result<f64, FixtureFormatError> {
        let raw = self.source.get(key).ok_or_else(|| self.missing(key))?;
        raw.parse().map_err(|_| self.invalid(key, raw))
    }

    fn optional_f64(&self, key: &str, default: f64) -> Result<f64, FixtureFormatError> {
        match self.source.get(key) {
            Some(raw) => raw.parse().map_err(|_| self.invalid(key, raw)),
            None => Ok(default),
        }
    }

    fn optional_bool(&self, key: &str, default: bool) -> Result<bool, FixtureFormatError> {
        match self.source.get(key) {
            Some(raw) => raw.parse().map_err(|_| self.invalid(key, raw)),
            None => Ok(default),
        }
    }

    /// Mandatory whitespace-separated construction parameters. The caller's
    /// parameter-name list is used purely to name a bad token.
    fn parameters(
        &self,
        parameter_names: &[&str],
    ) -> Result<SmallVec<[f64; 4]>, FixtureFormatError> {
        let raw = self.source.get("parameters").ok_or_else(|| self.missing("parameters"))?;
        let mut out = SmallVec::new();
        for (i, token) in raw.split_whitespace().enumerate() {
            let value: f64 = token.parse().map_err(|_| {
                let label = match parameter_names.get(i) {
                    Some(name) => format!("parameters ({name})"),
                    None => format!("parameters (#{i})"),
                };
                self.invalid(&label, token)
            })?;
            out.push(value);
        }
        if out.is_empty() {
            return Err(self.missing("parameters"));
        }
        Ok(out)
    }

    /// Optional comma-separated array; absent or blank means empty.
    fn array<P: PointToken>(&self, key: &str) -> Result<Vec<P>, FixtureFormatError> {
        let Some(raw) = self.source.get(key) else {
            return Ok(Vec::new());
        };
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        raw.split(',')
            .map(|token| {
                let token = token.trim();
                P::parse_token(token).ok_or_else(|| self.invalid(key, token))
            })
            .collect()
    }

    fn check_pair(
        &self,
        points_key: &str,
        points: usize,
        values_key: &str,
        values: usize,
    ) -> Result<(), FixtureFormatError> {
        if points == values {
            return Ok(());
        }
        Err(FixtureFormatError::LengthMismatch {
            path: self.path.to_path_buf(),
            points_key: points_key.to_owned(),
            values_key: values_key.to_owned(),
            points,
            values,
        })
    }
}

/// Loads one fixture. `density_prefix` selects the mass/density key family
/// (`pmf` for discrete sources, `pdf` for continuous ones).
fn load_fixture<P: PointToken>(
    path: &Path,
    density_prefix: &str,
    parameter_names: &[&str],
) -> Result<DistributionTestData<P>, FixtureFormatError> {
    let text = fs::read_to_string(path)
        .map_err(|source| FixtureFormatError::Io { path: path.to_path_buf(), source })?;
    let fixture_id = {
        let digest = Sha256::digest(text.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect::<String>()
    };
    let source = PropertySource::parse(&text);
    let reader = Reader { path, source: &source };

    let density_points_key = format!("{density_prefix}.points");
    let density_values_key = format!("{density_prefix}.values");
    let log_density_values_key = format!("log{density_prefix}.values");
    let disable_density_key = format!("disable.{density_prefix}");

    let parameters = reader.parameters(parameter_names)?;
    let mean = reader.required_f64("mean")?;
    let variance = reader.required_f64("variance")?;
    let lower = reader.optional_f64("lower", f64::NEG_INFINITY)?;
    let upper = reader.optional_f64("upper", f64::INFINITY)?;
    let connected = reader.optional_bool("connected", true)?;
    let tolerance = reader.optional_f64("tolerance", DEFAULT_TOLERANCE)?;
    let high_precision_tolerance =
        reader.optional_f64("tolerance.hp", DEFAULT_HIGH_PRECISION_TOLERANCE)?;

    let cdf_points: Vec<P> = reader.array("cdf.points")?;
    let cdf_values: Vec<f64> = reader.array("cdf.values")?;
    let mut density_points: Vec<P> = reader.array(&density_points_key)?;
    let density_values: Vec<f64> = reader.array(&density_values_key)?;
    let mut log_density_values: Vec<f64> = reader.array(&log_density_values_key)?;
    let mut sf_points: Vec<P> = reader.array("sf.points")?;
    let mut sf_values: Vec<f64> = reader.array("sf.values")?;
    let cdf_hp_points: Vec<P> = reader.array("cdf.hp.points")?;
    let cdf_hp_values: Vec<f64> = reader.array("cdf.hp.values")?;
    let sf_hp_points: Vec<P> = reader.array("sf.hp.points")?;
    let sf_hp_values: Vec<f64> = reader.array("sf.hp.values")?;
    let icdf_points: Vec<f64> = reader.array("icdf.points")?;
    let icdf_values: Vec<P> = reader.array("icdf.values")?;

    // Defaults: density points fall back to the CDF points, log values to
    // the log of the plain values, and the survival data to the CDF
    // complement.
    if density_points.is_empty() && !density_values.is_empty() {
        density_points = cdf_points.clone();
    }
    if log_density_values.is_empty() && !density_values.is_empty() {
        log_density_values = density_values.iter().map(|v| v.ln()).collect();
    }
    if sf_points.is_empty() {
        sf_points = cdf_points.clone();
    }
    if sf_values.is_empty() && !cdf_values.is_empty() {
        sf_values = cdf_values.iter().map(|v| 1.0 - v).collect();
    }

    reader.check_pair("cdf.points", cdf_points.len(), "cdf.values", cdf_values.len())?;
    reader.check_pair(
        &density_points_key,
        density_points.len(),
        &density_values_key,
        density_values.len(),
    )?;
    reader.check_pair(
        &density_points_key,
        density_points.len(),
        &log_density_values_key,
        log_density_values.len(),
    )?;
    reader.check_pair("sf.points", sf_points.len(), "sf.values", sf_values.len())?;
    reader.check_pair("cdf.hp.points", cdf_hp_points.len(), "cdf.hp.values", cdf_hp_values.len())?;
    reader.check_pair("sf.hp.points", sf_hp_points.len(), "sf.hp.values", sf_hp_values.len())?;
    reader.check_pair("icdf.points", icdf_points.len(), "icdf.values", icdf_values.len())?;

    Ok(DistributionTestData {
        fixture_id,
        parameters,
        mean,
        variance,
        lower,
        upper,
        connected,
        tolerance,
        high_precision_tolerance,
        cdf_points,
        cdf_values,
        density_points,
        density_values,
        log_density_values,
        sf_points,
        sf_values,
        cdf_hp_points,
        cdf_hp_values,
        sf_hp_points,
        sf_hp_values,
        icdf_points,
        icdf_values,
        disable_sample: reader.optional_bool("disable.sample", false)?,
        disable_density: reader.optional_bool(&disable_density_key, false)?,
        disable_cdf: reader.optional_bool("disable.cdf", false)?,
        disable_sf: reader.optional_bool("disable.sf", false)?,
        disable_cdf_inverse: reader.optional_bool("disable.cdf.inverse", false)?,
    })
}

pub fn load_discrete_fixture(
    path: &Path,
    parameter_names: &[&str],
) -> Result<DiscreteTestData, FixtureFormatError> {
    load_fixture(path, "pmf", parameter_names)
}

pub fn load_continuous_fixture(
    path: &Path,
    parameter_names: &[&str],
) -> Result<ContinuousTestData, FixtureFormatError> {
    load_fixture(path, "pdf", parameter_names)
}

fn numbered_paths(fixture_root: &Path, family: &str) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for n in 1.. {
        let path = fixture_root.join(format!("test.{family}.{n}.properties"));
        if !path.exists() {
            break;
        }
        out.push(path);
    }
    out
}

/// Loads every numbered fixture for a discrete family, in order. The first
/// malformed source aborts the batch.
pub fn load_discrete_family(
    fixture_root: &Path,
    family: &str,
    parameter_names: &[&str],
) -> Result<Vec<DiscreteTestData>, FixtureFormatError> {
    numbered_paths(fixture_root, family)
        .iter()
        .map(|path| load_discrete_fixture(path, parameter_names))
        .collect()
}

/// Loads every numbered fixture for a continuous family, in order.
pub fn load_continuous_family(
    fixture_root: &Path,
    family: &str,
    parameter_names: &[&str],
) -> Result<Vec<ContinuousTestData>, FixtureFormatError> {
    numbered_paths(fixture_root, family)
        .iter()
        .map(|path| load_continuous_fixture(path, parameter_names))
        .collect()
}
