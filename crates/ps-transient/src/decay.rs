//! Exponential decay curves driving every transient step.
//!
//! A curve maps elapsed time since its origin to a dimensionless progress
//! fraction: `1 − e^(−t/τ)` when rising, its negation when dropping. Once the
//! magnitude reaches [`SETTLE_FRACTION`] the curve reports exactly ±1 so that
//! settled contributions add up without floating drift.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Progress magnitude at which a curve counts as fully settled.
pub const SETTLE_FRACTION: f64 = 0.99;

/// Sign of a curve's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Rising,
    Dropping,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::Rising => 1.0,
            Self::Dropping => -1.0,
        }
    }

    /// Direction that moves toward a signed delta.
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 { Self::Rising } else { Self::Dropping }
    }
}

/// First-order step-response curve.
///
/// Read-only once started: the origin and direction are fixed by [`rise`] or
/// [`drop`], after which [`value_at`] is a pure function of time.
///
/// [`rise`]: DecayCurve::rise
/// [`drop`]: DecayCurve::drop
/// [`value_at`]: DecayCurve::value_at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayCurve {
    tau: f64,
    direction: Direction,
    t0: f64,
}

impl DecayCurve {
    /// Create a curve with time constant `tau` (seconds).
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `tau` is not a positive finite number.
    pub fn new(tau: f64) -> SimResult<Self> {
        if !tau.is_finite() || tau <= 0.0 {
            return Err(SimError::config(format!("tau must be positive, got {tau}")));
        }
        Ok(Self {
            tau,
            direction: Direction::Rising,
            t0: 0.0,
        })
    }

    /// Start a rising curve at `t0`. Returns the immediate progress (0).
    pub fn rise(&mut self, t0: f64) -> f64 {
        self.start(Direction::Rising, t0)
    }

    /// Start a dropping curve at `t0`. Returns the immediate progress (0).
    pub fn drop(&mut self, t0: f64) -> f64 {
        self.start(Direction::Dropping, t0)
    }

    fn start(&mut self, direction: Direction, t0: f64) -> f64 {
        self.direction = direction;
        self.t0 = t0;
        self.value_at(t0)
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn origin(&self) -> f64 {
        self.t0
    }

    /// Unsigned progress in [0, 1], snapped to 1 once settled.
    pub fn magnitude_at(&self, now: f64) -> f64 {
        let elapsed = (now - self.t0).max(0.0);
        // 1 - e^(-t/τ) without cancellation near t = 0
        let raw = -(-elapsed / self.tau).exp_m1();
        if raw >= SETTLE_FRACTION { 1.0 } else { raw }
    }

    /// Signed progress: [0, 1] rising, [−1, 0] dropping.
    pub fn value_at(&self, now: f64) -> f64 {
        self.direction.sign() * self.magnitude_at(now)
    }

    pub fn is_settled(&self, now: f64) -> bool {
        self.magnitude_at(now) >= 1.0
    }

    /// Elapsed time after which the curve reports settled: `τ·ln(1/(1−0.99))`.
    pub fn settling_time(&self) -> f64 {
        -self.tau * (1.0 - SETTLE_FRACTION).ln()
    }
}
