//! Equality predicates used by every battery check.

use serde::{Deserialize, Serialize};

/// How close an actual value must be to an expected value to pass.
///
/// NaN equals NaN, and infinities must match in sign exactly, under every
/// variant; the variants only differ for finite expected values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleTolerance {
    /// Bitwise-style equality (`==`, so `-0.0` matches `0.0`).
    Exact,
    /// `|actual - expected| <= tol`.
    Absolute(f64),
    /// `|actual - expected| <= tol * |expected|`; expected zero demands
    /// `|actual| <= tol`.
    Relative(f64),
    /// `|actual - expected| <= atol + rtol * |expected|`.
    Combined { atol: f64, rtol: f64 },
}

impl DoubleTolerance {
    #[must_use]
    pub fn test(self, expected: f64, actual: f64) -> bool {
        if expected.is_nan() || actual.is_nan() {
            return expected.is_nan() && actual.is_nan();
        }
        if expected.is_infinite() || actual.is_infinite() {
            return expected == actual;
        }
        match self {
            Self::Exact => expected == actual,
            Self::Absolute(tol) => (actual - expected).abs() <= tol,
            Self::Relative(tol) => {
                if expected == 0.0 {
                    actual.abs() <= tol
                } else {
                    (actual - expected).abs() <= tol * expected.abs()
                }
            }
            Self::Combined { atol, rtol } => {
                (actual - expected).abs() <= atol + rtol * expected.abs()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nan_matches_only_nan() {
        for tol in [
            DoubleTolerance::Exact,
            DoubleTolerance::Absolute(1.0),
            DoubleTolerance::Relative(1.0),
            DoubleTolerance::Combined { atol: 1.0, rtol: 1.0 },
        ] {
            assert!(tol.test(f64::NAN, f64::NAN));
            assert!(!tol.test(f64::NAN, 0.0));
            assert!(!tol.test(0.0, f64::NAN));
        }
    }

    #[test]
    fn infinities_must_match_sign() {
        let tol = DoubleTolerance::Absolute(f64::MAX);
        assert!(tol.test(f64::INFINITY, f64::INFINITY));
        assert!(tol.test(f64::NEG_INFINITY, f64::NEG_INFINITY));
        assert!(!tol.test(f64::INFINITY, f64::NEG_INFINITY));
        assert!(!tol.test(f64::INFINITY, 1.0));
    }

    #[test]
    fn exact_accepts_signed_zero() {
        assert!(DoubleTolerance::Exact.test(0.0, -0.0));
        assert!(!DoubleTolerance::Exact.test(0.0, 1e-300));
    }

    #[test]
    fn relative_scales_with_magnitude() {
        let tol = DoubleTolerance::Relative(1e-9);
        assert!(tol.test(1e6, 1e6 + 1e-4));
        assert!(!tol.test(1e-6, 1e-6 + 1e-4));
        assert!(tol.test(0.0, 1e-10));
    }

    proptest! {
        #[test]
        fn absolute_is_symmetric(e in -1e12f64..1e12, a in -1e12f64..1e12, t in 0.0f64..1e6) {
            let tol = DoubleTolerance::Absolute(t);
            prop_assert_eq!(tol.test(e, a), tol.test(a, e));
        }

        #[test]
        fn combined_is_never_stricter_than_absolute(
            e in -1e12f64..1e12, a in -1e12f64..1e12, t in 0.0f64..1e6
        ) {
            let abs = DoubleTolerance::Absolute(t);
            let comb = DoubleTolerance::Combined { atol: t, rtol: 1e-9 };
            if abs.test(e, a) {
                prop_assert!(comb.test(e, a));
            }
        }

        #[test]
        fn identical_finite_values_always_pass(v in -1e300f64..1e300) {
            prop_assert!(DoubleTolerance::Exact.test(v, v));
            prop_assert!(DoubleTolerance::Absolute(0.0).test(v, v));
            prop_assert!(DoubleTolerance::Relative(0.0).test(v, v));
        }
    }
}
