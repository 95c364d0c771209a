use crate::{CoreError, CoreResult};

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute + relative closeness band.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// Band used to decide whether a command or input moved enough to start a new step.
    ///
    /// 10 % relative with an absolute floor, so jitter around a steady command
    /// never re-triggers a transition.
    pub const CHANGE_DETECTION: Tolerances = Tolerances { abs: 1e-3, rel: 0.1 };

    /// Band for signals tracked as absolute values (temperatures, levels, CO2),
    /// where any move past the absolute floor is a real change.
    pub const VALUE_TRACKING: Tolerances = Tolerances { abs: 1e-3, rel: 0.0 };

    pub fn validate(&self) -> CoreResult<()> {
        if !(self.abs.is_finite() && self.rel.is_finite()) {
            return Err(CoreError::InvalidArg {
                what: "tolerances must be finite",
            });
        }
        if self.abs < 0.0 || self.rel < 0.0 {
            return Err(CoreError::InvalidArg {
                what: "tolerances must be non-negative",
            });
        }
        Ok(())
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn change_detection_band() {
        let tol = Tolerances::CHANGE_DETECTION;
        // within 10 % of the larger magnitude
        assert!(nearly_equal(100.0, 95.0, tol));
        assert!(!nearly_equal(100.0, 50.0, tol));
        // the absolute floor keeps zero from always looking "changed"
        assert!(nearly_equal(0.0, 0.0005, tol));
        assert!(!nearly_equal(0.0, 0.01, tol));
    }

    #[test]
    fn value_tracking_sees_small_moves() {
        let tol = Tolerances::VALUE_TRACKING;
        assert!(!nearly_equal(21.0, 19.95, tol));
        assert!(nearly_equal(21.0, 21.0005, tol));
    }

    #[test]
    fn negative_tolerance_is_invalid_arg() {
        let tol = Tolerances { abs: -1.0, rel: 0.1 };
        assert!(matches!(tol.validate(), Err(CoreError::InvalidArg { .. })));
        assert!(Tolerances { abs: 0.0, rel: f64::NAN }.validate().is_err());
        assert!(Tolerances::CHANGE_DETECTION.validate().is_ok());
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    proptest! {
        #[test]
        fn change_detection_is_symmetric(a in -1e6_f64..1e6, b in -1e6_f64..1e6) {
            let tol = Tolerances::CHANGE_DETECTION;
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
            prop_assert!(nearly_equal(a, a, tol));
        }
    }
}
