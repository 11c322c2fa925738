//! Reference distributions used by the conformance harness's own tests.
//!
//! These are deliberately small closed-form implementations. They exist to
//! exercise the harness end to end, not to be fast or numerically heroic;
//! the survival functions and the exponential CDF do take the direct route
//! so the high-precision battery checks have something real to verify.

use crate::{
    ContinuousDistribution, ContinuousSampler, DiscreteDistribution, DiscreteSampler,
    DistributionError, require_probability,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Inverse-transform sampler over any discrete distribution.
struct InverseSampler<D> {
    dist: D,
    rng: StdRng,
}

impl<D: DiscreteDistribution> DiscreteSampler for InverseSampler<D> {
    fn sample(&mut self) -> i64 {
        let u: f64 = rand::Rng::random(&mut self.rng);
        // u lies in [0, 1) so the inverse always resolves
        self.dist
            .inverse_cumulative_probability(u)
            .unwrap_or_else(|_| self.dist.support_lower_bound())
    }
}

/// Inverse-transform sampler over any continuous distribution.
struct ContinuousInverseSampler<D> {
    dist: D,
    rng: StdRng,
}

impl<D: ContinuousDistribution> ContinuousSampler for ContinuousInverseSampler<D> {
    fn sample(&mut self) -> f64 {
        let u: f64 = rand::Rng::random(&mut self.rng);
        self.dist
            .inverse_cumulative_probability(u)
            .unwrap_or_else(|_| self.dist.support_lower_bound())
    }
}

// ── Binomial ───────────────────────────────────────────────────────

/// Binomial distribution: number of successes in `n` trials at success
/// probability `p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binomial {
    n: i64,
    p: f64,
}

impl Binomial {
    pub fn new(n: i64, p: f64) -> Result<Self, DistributionError> {
        if n < 0 {
            return Err(DistributionError::InvalidParameters(format!(
                "number of trials {n} is negative"
            )));
        }
        if p.is_nan() || !(0.0..=1.0).contains(&p) {
            return Err(DistributionError::InvalidParameters(format!(
                "success probability {p} is not in [0, 1]"
            )));
        }
        Ok(Self { n, p })
    }

    #[must_use]
    pub fn number_of_trials(&self) -> f64 {
        self.n as f64
    }

    #[must_use]
    pub fn probability_of_success(&self) -> f64 {
        self.p
    }

    fn pmf(&self, k: i64) -> f64 {
        if k < 0 || k > self.n {
            return 0.0;
        }
        // Multiplicative binomial coefficient; every intermediate is an
        // exactly representable integer for the small n used in fixtures.
        let mut coeff = 1.0;
        for i in 1..=k {
            coeff = coeff * ((self.n - k + i) as f64) / (i as f64);
        }
        coeff * self.p.powi(k as i32) * (1.0 - self.p).powi((self.n - k) as i32)
    }
}

impl DiscreteDistribution for Binomial {
    fn probability(&self, x: i64) -> f64 {
        self.pmf(x)
    }

    fn cumulative_probability(&self, x: i64) -> f64 {
        if x < 0 {
            return 0.0;
        }
        if x >= self.n {
            return 1.0;
        }
        (0..=x).map(|k| self.pmf(k)).sum()
    }

    fn survival_probability(&self, x: i64) -> f64 {
        if x < 0 {
            return 1.0;
        }
        if x >= self.n {
            return 0.0;
        }
        // Summed from the upper tail so the value stays accurate near one.
        (x + 1..=self.n).map(|k| self.pmf(k)).sum()
    }

    fn inverse_cumulative_probability(&self, p: f64) -> Result<i64, DistributionError> {
        require_probability(p)?;
        if p == 0.0 {
            return Ok(0);
        }
        if p == 1.0 {
            return Ok(self.n);
        }
        let mut cum = 0.0;
        for k in 0..self.n {
            cum += self.pmf(k);
            if cum >= p {
                return Ok(k);
            }
        }
        Ok(self.n)
    }

    fn support_lower_bound(&self) -> i64 {
        0
    }

    fn support_upper_bound(&self) -> i64 {
        self.n
    }

    fn mean(&self) -> f64 {
        self.n as f64 * self.p
    }

    fn variance(&self) -> f64 {
        self.n as f64 * self.p * (1.0 - self.p)
    }

    fn create_sampler(&self, seed: u64) -> Box<dyn DiscreteSampler> {
        Box::new(InverseSampler { dist: *self, rng: StdRng::seed_from_u64(seed) })
    }
}

// ── Geometric ──────────────────────────────────────────────────────

/// Geometric distribution: number of failures before the first success.
/// Support is `0..` with no upper bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometric {
    p: f64,
    q: f64,
}

impl Geometric {
    pub fn new(p: f64) -> Result<Self, DistributionError> {
        if p.is_nan() || p <= 0.0 || p >= 1.0 {
            return Err(DistributionError::InvalidParameters(format!(
                "success probability {p} is not in (0, 1)"
            )));
        }
        Ok(Self { p, q: 1.0 - p })
    }

    #[must_use]
    pub fn probability_of_success(&self) -> f64 {
        self.p
    }

    fn sf(&self, x: i64) -> f64 {
        if x < 0 {
            return 1.0;
        }
        match x.checked_add(1).and_then(|exp| i32::try_from(exp).ok()) {
            Some(exp) => self.q.powi(exp),
            None => 0.0,
        }
    }
}

impl DiscreteDistribution for Geometric {
    fn probability(&self, x: i64) -> f64 {
        if x < 0 {
            return 0.0;
        }
        match i32::try_from(x) {
            Ok(exp) => self.q.powi(exp) * self.p,
            // beyond i32 the geometric mass has long underflowed anyway
            Err(_) => 0.0,
        }
    }

    fn log_probability(&self, x: i64) -> f64 {
        if x < 0 {
            return f64::NEG_INFINITY;
        }
        // Finite long after the plain mass underflows to zero.
        (x as f64) * self.q.ln() + self.p.ln()
    }

    fn cumulative_probability(&self, x: i64) -> f64 {
        1.0 - self.sf(x)
    }

    fn survival_probability(&self, x: i64) -> f64 {
        self.sf(x)
    }

    fn inverse_cumulative_probability(&self, p: f64) -> Result<i64, DistributionError> {
        require_probability(p)?;
        if p == 0.0 {
            return Ok(0);
        }
        if p == 1.0 {
            return Ok(i64::MAX);
        }
        let estimate = ((-p).ln_1p() / self.q.ln()).ceil() as i64 - 1;
        let mut k = estimate.max(0);
        while k > 0 && self.cumulative_probability(k - 1) >= p {
            k -= 1;
        }
        while self.cumulative_probability(k) < p {
            k += 1;
        }
        Ok(k)
    }

    fn support_lower_bound(&self) -> i64 {
        0
    }

    fn support_upper_bound(&self) -> i64 {
        i64::MAX
    }

    fn mean(&self) -> f64 {
        self.q / self.p
    }

    fn variance(&self) -> f64 {
        self.q / (self.p * self.p)
    }

    fn create_sampler(&self, seed: u64) -> Box<dyn DiscreteSampler> {
        Box::new(InverseSampler { dist: *self, rng: StdRng::seed_from_u64(seed) })
    }
}

// ── Discrete uniform ───────────────────────────────────────────────

/// Uniform distribution over the integers `a..=b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscreteUniform {
    a: i64,
    b: i64,
}

impl DiscreteUniform {
    pub fn new(a: i64, b: i64) -> Result<Self, DistributionError> {
        if a > b {
            return Err(DistributionError::InvalidParameters(format!(
                "lower bound {a} exceeds upper bound {b}"
            )));
        }
        Ok(Self { a, b })
    }

    #[must_use]
    pub fn lower(&self) -> f64 {
        self.a as f64
    }

    #[must_use]
    pub fn upper(&self) -> f64 {
        self.b as f64
    }

    fn count(&self) -> f64 {
        (self.b - self.a + 1) as f64
    }
}

impl DiscreteDistribution for DiscreteUniform {
    fn probability(&self, x: i64) -> f64 {
        if x < self.a || x > self.b { 0.0 } else { 1.0 / self.count() }
    }

    fn cumulative_probability(&self, x: i64) -> f64 {
        if x < self.a {
            return 0.0;
        }
        if x >= self.b {
            return 1.0;
        }
        ((x - self.a + 1) as f64) / self.count()
    }

    fn survival_probability(&self, x: i64) -> f64 {
        if x < self.a {
            return 1.0;
        }
        if x >= self.b {
            return 0.0;
        }
        ((self.b - x) as f64) / self.count()
    }

    fn inverse_cumulative_probability(&self, p: f64) -> Result<i64, DistributionError> {
        require_probability(p)?;
        if p == 0.0 {
            return Ok(self.a);
        }
        if p == 1.0 {
            return Ok(self.b);
        }
        let estimate = self.a + (p * self.count()).ceil() as i64 - 1;
        let mut k = estimate.clamp(self.a, self.b);
        while k > self.a && self.cumulative_probability(k - 1) >= p {
            k -= 1;
        }
        while k < self.b && self.cumulative_probability(k) < p {
            k += 1;
        }
        Ok(k)
    }

    fn support_lower_bound(&self) -> i64 {
        self.a
    }

    fn support_upper_bound(&self) -> i64 {
        self.b
    }

    fn mean(&self) -> f64 {
        (self.a as f64 + self.b as f64) / 2.0
    }

    fn variance(&self) -> f64 {
        let n = self.count();
        (n * n - 1.0) / 12.0
    }

    fn create_sampler(&self, seed: u64) -> Box<dyn DiscreteSampler> {
        Box::new(InverseSampler { dist: *self, rng: StdRng::seed_from_u64(seed) })
    }
}

// ── Exponential ────────────────────────────────────────────────────

/// Exponential distribution parameterized by its mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    mean: f64,
}

impl Exponential {
    pub fn new(mean: f64) -> Result<Self, DistributionError> {
        if !(mean.is_finite() && mean > 0.0) {
            return Err(DistributionError::InvalidParameters(format!(
                "mean {mean} is not finite and positive"
            )));
        }
        Ok(Self { mean })
    }

    #[must_use]
    pub fn mean_parameter(&self) -> f64 {
        self.mean
    }
}

impl ContinuousDistribution for Exponential {
    fn density(&self, x: f64) -> f64 {
        if x < 0.0 { 0.0 } else { (-x / self.mean).exp() / self.mean }
    }

    fn log_density(&self, x: f64) -> f64 {
        if x < 0.0 { f64::NEG_INFINITY } else { -x / self.mean - self.mean.ln() }
    }

    fn cumulative_probability(&self, x: f64) -> f64 {
        // exp_m1 keeps the value accurate where 1 - exp(-x/mean) cancels.
        if x <= 0.0 { 0.0 } else { -(-x / self.mean).exp_m1() }
    }

    fn survival_probability(&self, x: f64) -> f64 {
        if x <= 0.0 { 1.0 } else { (-x / self.mean).exp() }
    }

    fn inverse_cumulative_probability(&self, p: f64) -> Result<f64, DistributionError> {
        require_probability(p)?;
        Ok(-self.mean * (-p).ln_1p())
    }

    fn support_lower_bound(&self) -> f64 {
        0.0
    }

    fn support_upper_bound(&self) -> f64 {
        f64::INFINITY
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn variance(&self) -> f64 {
        self.mean * self.mean
    }

    fn create_sampler(&self, seed: u64) -> Box<dyn ContinuousSampler> {
        Box::new(ContinuousInverseSampler { dist: *self, rng: StdRng::seed_from_u64(seed) })
    }
}
